//! Decide si un update AT es novedoso y, de serlo, lo reenvia a todos los
//! vecinos salvo a aquel del que llego.
use crate::location_store::{ApplyOutcome, LocationStore};
use crate::peer::neighbor_link::NeighborLink;
use crate::record::LocationRecord;
use std::collections::HashMap;
use std::sync::Arc;

/// De donde llego el update que se esta por aplicar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloodSource {
    Local,
    Neighbor(String),
}

pub struct FloodEngine {
    store: Arc<LocationStore>,
    links: Arc<HashMap<String, NeighborLink>>,
}

impl FloodEngine {
    pub fn new(store: Arc<LocationStore>, links: Arc<HashMap<String, NeighborLink>>) -> Self {
        FloodEngine { store, links }
    }

    /// Aplica `record` al almacen y, si resulta novedoso, lo encola en cada
    /// vecino distinto de `source`. El encolado nunca bloquea: una cola
    /// llena descarta su entrada mas vieja en el propio `NeighborLink`.
    pub fn apply(&self, record: LocationRecord, source: FloodSource) -> ApplyOutcome {
        let outcome = self.store.apply(record.clone());
        if outcome == ApplyOutcome::Applied {
            for (peer_name, link) in self.links.iter() {
                if let FloodSource::Neighbor(from) = &source {
                    if from == peer_name {
                        continue;
                    }
                }
                link.enqueue(record.raw_at_line.clone());
            }
        }
        outcome
    }
}
