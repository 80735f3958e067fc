//! Implementacion principal de un miembro del herd.
use crate::config::config_parser::Config;
use crate::errors::HerdError;
use crate::flood::FloodEngine;
use crate::location_store::LocationStore;
use crate::log_msj::log_mensajes::{
    log_bind_error, log_error_accepting_connection, log_nodo_start,
};
use crate::peer::neighbor_link::NeighborLink;
use crate::places::places_client::PlacesClient;
use crate::client_session::handle_connection;
use logger::logger::Logger;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{sleep, spawn};
use std::time::Duration;

const ACCEPT_POLL: Duration = Duration::from_millis(100);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Un miembro del herd: su identidad, su almacen de posiciones, sus
/// enlaces salientes a vecinos y el adaptador hacia el servicio de lugares.
pub struct Node {
    pub(crate) own_name: String,
    pub(crate) listen_addr: SocketAddr,
    pub(crate) store: Arc<LocationStore>,
    pub(crate) links: Arc<HashMap<String, NeighborLink>>,
    pub(crate) flood: FloodEngine,
    pub(crate) places: Arc<dyn PlacesClient>,
    pub(crate) whatsat_timeout: Duration,
    pub(crate) logger: Logger,
    pub(crate) shutdown: Arc<AtomicBool>,
}

impl Node {
    /// Construye un nodo a partir de una configuracion ya validada y un
    /// adaptador de lugares (real o doble de test).
    pub fn new(config: &Config, places: Arc<dyn PlacesClient>) -> Self {
        let logger = Logger::new(&config.logging().filename);
        let listen_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), config.own_port());

        let mut links = HashMap::new();
        for neighbor in config.neighbors() {
            if let Some(port) = config.peer_port(neighbor) {
                let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
                let link = NeighborLink::spawn(
                    config.own_name().to_string(),
                    neighbor.clone(),
                    addr,
                    config.peer_queue_bound(),
                    logger.clone(),
                );
                links.insert(neighbor.clone(), link);
            }
        }
        let links = Arc::new(links);
        let store = Arc::new(LocationStore::new());
        let flood = FloodEngine::new(store.clone(), links.clone());

        Node {
            own_name: config.own_name().to_string(),
            listen_addr,
            store,
            links,
            flood,
            places,
            whatsat_timeout: Duration::from_secs_f64(config.whatsat_timeout_secs()),
            logger,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn own_name(&self) -> &str {
        &self.own_name
    }

    pub fn store(&self) -> &LocationStore {
        &self.store
    }

    pub fn flood(&self) -> &FloodEngine {
        &self.flood
    }

    pub fn places(&self) -> &Arc<dyn PlacesClient> {
        &self.places
    }

    pub fn whatsat_timeout(&self) -> Duration {
        self.whatsat_timeout
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Señala a este nodo que debe dejar de aceptar conexiones y apagar sus
    /// enlaces salientes; `run` retorna una vez drenada la ventana de gracia.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Acepta conexiones en el puerto configurado y lanza un hilo por cada
    /// una. Bloquea hasta que se pide apagado o falla el bind.
    pub fn run(self: Arc<Self>) -> Result<(), HerdError> {
        let listener = self.try_bind_listener(self.listen_addr)?;
        listener
            .set_nonblocking(true)
            .map_err(|e| HerdError::bind(self.listen_addr, &e))?;

        log_nodo_start(&self.logger, self.own_name());

        while !self.shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, _addr)) => {
                    let node = self.clone();
                    spawn(move || handle_connection(node, stream));
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    log_error_accepting_connection(self.own_name(), &self.logger, e);
                }
            }
        }

        self.drain_links();
        Ok(())
    }

    fn drain_links(&self) {
        sleep(SHUTDOWN_GRACE);
        for link in self.links.values() {
            link.shutdown();
        }
    }

    fn try_bind_listener(&self, addr: SocketAddr) -> Result<TcpListener, HerdError> {
        TcpListener::bind(addr).map_err(|e| {
            log_bind_error(self.own_name(), &addr, &self.logger, &e);
            HerdError::bind(addr, &e)
        })
    }
}
