//! Este módulo contiene la estructura que parsea y valida la configuración
//! del herd a partir de un documento YAML
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

const DEFAULT_WHATSAT_TIMEOUT_SECS: f64 = 5.0;
const DEFAULT_PEER_QUEUE_BOUND: usize = 1024;

/// Representación tal cual del documento YAML, antes de validarse.
#[derive(Debug, Deserialize)]
struct RawConfig {
    servers: HashMap<String, u16>,
    neighbors: HashMap<String, Vec<String>>,
    api_key: String,
    places_endpoint: String,
    #[serde(default)]
    whatsat_timeout: Option<f64>,
    #[serde(default)]
    peer_queue_bound: Option<usize>,
    #[serde(default)]
    logging: Option<LoggingConfig>,
    #[serde(default)]
    benchmark: Option<serde_yaml::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_filename")]
    pub filename: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_filename() -> String {
    "herd.log".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            filename: default_log_filename(),
            format: default_log_format(),
        }
    }
}

/// Snapshot inmutable de la configuración de un miembro del herd, validado
/// a partir del documento YAML compartido por todo el herd.
#[derive(Debug, Clone)]
pub struct Config {
    own_name: String,
    own_port: u16,
    servers: HashMap<String, u16>,
    neighbors: Vec<String>,
    api_key: String,
    places_endpoint: String,
    whatsat_timeout_secs: f64,
    peer_queue_bound: usize,
    logging: LoggingConfig,
}

impl Config {
    /// Crea una nueva instancia de Config a partir de un archivo YAML y el
    /// nombre de este miembro dentro del herd.
    ///
    /// Recibe:
    /// - `path`: ruta al documento de configuración compartido por el herd.
    /// - `own_name`: nombre de este miembro, debe figurar en `servers`.
    ///
    /// Retorna:
    /// - `Ok(Config)` si la configuración se carga y valida correctamente.
    pub fn from_file(path: &str, own_name: &str) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("error leyendo archivo de configuración '{path}': {e}"))?;
        Self::from_yaml_str(&contents, own_name)
    }

    fn from_yaml_str(contents: &str, own_name: &str) -> Result<Self, String> {
        let raw: RawConfig = serde_yaml::from_str(contents)
            .map_err(|e| format!("documento de configuración mal formado: {e}"))?;

        let own_port = *raw.servers.get(own_name).ok_or_else(|| {
            format!("el nombre de servidor '{own_name}' no figura en 'servers'")
        })?;

        Self::validate_neighbors_symmetry(&raw.neighbors, &raw.servers)?;
        let neighbors = raw.neighbors.get(own_name).cloned().unwrap_or_default();

        let whatsat_timeout_secs = raw.whatsat_timeout.unwrap_or(DEFAULT_WHATSAT_TIMEOUT_SECS);
        if !whatsat_timeout_secs.is_finite() || whatsat_timeout_secs <= 0.0 {
            return Err(format!(
                "'whatsat_timeout' debe ser un número finito y positivo, recibido {whatsat_timeout_secs}"
            ));
        }

        let peer_queue_bound = raw.peer_queue_bound.unwrap_or(DEFAULT_PEER_QUEUE_BOUND);
        if peer_queue_bound == 0 {
            return Err("'peer_queue_bound' debe ser mayor que 0".to_string());
        }

        if raw.api_key.trim().is_empty() {
            return Err("'api_key' no puede estar vacío".to_string());
        }

        Ok(Config {
            own_name: own_name.to_string(),
            own_port,
            servers: raw.servers,
            neighbors,
            api_key: raw.api_key,
            places_endpoint: raw.places_endpoint,
            whatsat_timeout_secs,
            peer_queue_bound,
            logging: raw.logging.unwrap_or_default(),
        })
    }

    /// El grafo de vecinos declarado en la configuración debe ser simétrico:
    /// si A declara a B como vecino, B debe declarar a A.
    fn validate_neighbors_symmetry(
        neighbors: &HashMap<String, Vec<String>>,
        servers: &HashMap<String, u16>,
    ) -> Result<(), String> {
        for (name, peers) in neighbors {
            if !servers.contains_key(name) {
                return Err(format!(
                    "'neighbors' declara al servidor desconocido '{name}'"
                ));
            }
            for peer in peers {
                if !servers.contains_key(peer) {
                    return Err(format!(
                        "'{name}' declara un vecino desconocido '{peer}'"
                    ));
                }
                let reciprocal = neighbors
                    .get(peer)
                    .map(|back| back.contains(name))
                    .unwrap_or(false);
                if !reciprocal {
                    return Err(format!(
                        "grafo de vecinos asimétrico: '{name}' declara a '{peer}' pero no a la inversa"
                    ));
                }
            }
        }
        Ok(())
    }

    // funciones publicas :: getters

    pub fn own_name(&self) -> &str {
        &self.own_name
    }

    pub fn own_port(&self) -> u16 {
        self.own_port
    }

    pub fn neighbors(&self) -> &[String] {
        &self.neighbors
    }

    pub fn peer_port(&self, peer_name: &str) -> Option<u16> {
        self.servers.get(peer_name).copied()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn places_endpoint(&self) -> &str {
        &self.places_endpoint
    }

    pub fn whatsat_timeout_secs(&self) -> f64 {
        self.whatsat_timeout_secs
    }

    pub fn peer_queue_bound(&self) -> usize {
        self.peer_queue_bound
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }
}
