//! Builder de `Node` pensado para tests: permite construir un nodo sin
//! pasar por la carga de configuracion ni por el bind de un socket real.
use crate::flood::FloodEngine;
use crate::location_store::LocationStore;
use crate::node::Node;
use crate::peer::neighbor_link::NeighborLink;
use crate::places::places_client::{NullPlacesClient, PlacesClient};
use logger::logger::Logger;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

pub struct NodeBuilder {
    own_name: Option<String>,
    listen_addr: Option<SocketAddr>,
    store: Option<Arc<LocationStore>>,
    links: Option<HashMap<String, NeighborLink>>,
    places: Option<Arc<dyn PlacesClient>>,
    whatsat_timeout: Option<Duration>,
    logger: Option<Logger>,
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeBuilder {
    pub fn new() -> Self {
        NodeBuilder {
            own_name: None,
            listen_addr: None,
            store: None,
            links: None,
            places: None,
            whatsat_timeout: None,
            logger: None,
        }
    }

    pub fn own_name(mut self, name: impl Into<String>) -> Self {
        self.own_name = Some(name.into());
        self
    }

    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = Some(addr);
        self
    }

    pub fn store(mut self, store: Arc<LocationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn links(mut self, links: HashMap<String, NeighborLink>) -> Self {
        self.links = Some(links);
        self
    }

    pub fn places(mut self, places: Arc<dyn PlacesClient>) -> Self {
        self.places = Some(places);
        self
    }

    pub fn whatsat_timeout(mut self, timeout: Duration) -> Self {
        self.whatsat_timeout = Some(timeout);
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Node {
        let store = self.store.unwrap_or_else(|| Arc::new(LocationStore::new()));
        let links = Arc::new(self.links.unwrap_or_default());
        let flood = FloodEngine::new(store.clone(), links.clone());

        Node {
            own_name: self.own_name.unwrap_or_else(|| "Test".to_string()),
            listen_addr: self
                .listen_addr
                .unwrap_or_else(|| SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)),
            store,
            links,
            flood,
            places: self.places.unwrap_or_else(|| Arc::new(NullPlacesClient)),
            whatsat_timeout: self.whatsat_timeout.unwrap_or(Duration::from_secs(5)),
            logger: self.logger.unwrap_or_else(Logger::null),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }
}
