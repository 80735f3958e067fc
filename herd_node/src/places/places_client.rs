//! Adaptador hacia el servicio externo de puntos de interes. Hace un unico
//! GET por llamada y nunca propaga un panico al handler que la invoca.
use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum PlacesError {
    Network(String),
    Api(String),
    Timeout,
}

impl fmt::Display for PlacesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacesError::Network(msg) => write!(f, "network error contacting places service: {msg}"),
            PlacesError::Api(msg) => write!(f, "places service returned an error: {msg}"),
            PlacesError::Timeout => write!(f, "places service call timed out"),
        }
    }
}

impl std::error::Error for PlacesError {}

/// Contrato que cumple tanto el cliente real como cualquier doble de test.
pub trait PlacesClient: Send + Sync {
    fn lookup(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
        max_results: u32,
        deadline: Duration,
    ) -> Result<Vec<u8>, PlacesError>;
}

/// Cliente real, basado en `reqwest::blocking`, tal como `RealLlm` en la
/// integracion con el microservicio de LLM.
pub struct RealPlacesClient {
    endpoint: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl RealPlacesClient {
    pub fn new(endpoint: String, api_key: String) -> Self {
        RealPlacesClient {
            endpoint,
            api_key,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl PlacesClient for RealPlacesClient {
    fn lookup(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
        max_results: u32,
        deadline: Duration,
    ) -> Result<Vec<u8>, PlacesError> {
        let radius_m = (radius_km * 1000.0).round() as i64;
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(deadline)
            .query(&[
                ("location", format!("{lat},{lon}")),
                ("radius", radius_m.to_string()),
                ("maxresults", max_results.to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    PlacesError::Timeout
                } else {
                    PlacesError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(PlacesError::Api(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| PlacesError::Network(e.to_string()))
    }
}

/// Doble de `PlacesClient` que siempre falla; util como valor por defecto
/// en builders y en tests que no ejercitan la integracion con el servicio
/// externo.
pub struct NullPlacesClient;

impl PlacesClient for NullPlacesClient {
    fn lookup(
        &self,
        _lat: f64,
        _lon: f64,
        _radius_km: f64,
        _max_results: u32,
        _deadline: Duration,
    ) -> Result<Vec<u8>, PlacesError> {
        Err(PlacesError::Network("no places client configured".to_string()))
    }
}
