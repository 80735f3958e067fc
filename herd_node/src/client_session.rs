//! Ciclo de vida de una conexion TCP entrante. Una conexion puede resultar
//! ser un cliente comun o el extremo de un `NeighborLink` que se anuncia con
//! una linea `PEER <nombre>` antes de empezar a mandar lineas AT.
use crate::flood::FloodSource;
use crate::node::Node;
use crate::protocol;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;

/// Atiende una conexion entrante hasta que el peer la cierra o llega una
/// linea que no se puede volver a sincronizar.
pub fn handle_connection(node: Arc<Node>, stream: TcpStream) {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let reader_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            node.logger()
                .error(&format!("failed to clone stream for {peer_addr}: {e}"), "Session");
            return;
        }
    };
    let mut writer = stream;
    let mut reader = BufReader::new(reader_stream);
    let mut source_peer_name: Option<String> = None;
    let mut line = String::new();

    node.logger()
        .info(&format!("accepted connection from {peer_addr}"), "Session");

    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\n', '\r']);
                if trimmed.is_empty() {
                    continue;
                }
                if source_peer_name.is_none() {
                    if let Some(name) = trimmed.strip_prefix("PEER ") {
                        source_peer_name = Some(name.trim().to_string());
                        continue;
                    }
                }
                let source = match &source_peer_name {
                    Some(name) => FloodSource::Neighbor(name.clone()),
                    None => FloodSource::Local,
                };
                if let Some(reply) = protocol::handle_line(&node, trimmed, source) {
                    if let Err(e) = writer.write_all(reply.as_bytes()) {
                        node.logger()
                            .warn(&format!("write to {peer_addr} failed: {e}"), "Session");
                        break;
                    }
                }
            }
            Err(e) => {
                node.logger()
                    .warn(&format!("read from {peer_addr} failed: {e}"), "Session");
                break;
            }
        }
    }

    node.logger()
        .info(&format!("connection from {peer_addr} closed"), "Session");
}
