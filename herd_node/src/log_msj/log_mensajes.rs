//! Helpers de logging frecuentes, cada uno tomando el `Logger` del nodo y
//! formateando un mensaje con su modulo de origen.
use logger::logger::Logger;
use std::io::Error as IoError;
use std::net::SocketAddr;

/// Envia un error al aceptar una conexion entrante.
pub fn log_error_accepting_connection(own_name: &str, logger: &Logger, e: IoError) {
    logger.error(&format!("[{own_name}] error accepting connection: {e}"), "Node");
}

/// Envia un error al fallar el bind de un socket address.
pub fn log_bind_error(own_name: &str, addr: &SocketAddr, logger: &Logger, e: &IoError) {
    logger.error(&format!("[{own_name}] failed to bind to {addr}: {e}"), "Node");
}

/// Envia al logger la confirmacion de arranque correcto del nodo.
pub fn log_nodo_start(logger: &Logger, own_name: &str) {
    logger.info(&format!("node {own_name} listening"), "Node");
}
