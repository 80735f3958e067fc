//! Almacen de la ultima posicion aceptada por client_id, compartido por
//! todos los hilos de conexion y de propagacion de un mismo proceso.
use crate::record::LocationRecord;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Ignored,
}

/// Unico `RwLock` que serializa todo acceso al mapa de ultimas posiciones.
#[derive(Debug, Default)]
pub struct LocationStore {
    records: RwLock<HashMap<String, LocationRecord>>,
}

impl LocationStore {
    pub fn new() -> Self {
        LocationStore {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Acepta `record` solo si mejora estrictamente el timestamp ya
    /// almacenado para ese client_id, o si no habia registro previo.
    /// Ante timestamps iguales gana el que llego primero.
    pub fn apply(&self, record: LocationRecord) -> ApplyOutcome {
        let mut guard = self.records.write().unwrap_or_else(|e| e.into_inner());
        match guard.get(&record.client_id) {
            Some(existing) if record.client_timestamp <= existing.client_timestamp => {
                ApplyOutcome::Ignored
            }
            _ => {
                guard.insert(record.client_id.clone(), record);
                ApplyOutcome::Applied
            }
        }
    }

    pub fn get(&self, client_id: &str) -> Option<LocationRecord> {
        let guard = self.records.read().unwrap_or_else(|e| e.into_inner());
        guard.get(client_id).cloned()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }
}
