//! Este modulo contiene los errores usados internamente por el herd member

use std::fmt;
use std::io;

#[derive(Debug)]
pub struct HerdError {
    pub error_type: HerdErrorKind,
    pub description: String,
    pub module: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum HerdErrorKind {
    Config,
    Bind,
    Lock,
    Io,
}

impl HerdError {
    pub fn new(kind: HerdErrorKind, description: String, module: &'static str) -> Self {
        HerdError {
            error_type: kind,
            description,
            module: module.to_string(),
        }
    }

    /// Crea un HerdError correspondiente a un fallo de carga o validacion de config
    pub fn config(description: impl Into<String>) -> Self {
        HerdError::new(HerdErrorKind::Config, description.into(), "CONFIG")
    }

    /// Crea un HerdError correspondiente a un fallo al hacer bind del listener
    pub fn bind(addr: impl fmt::Display, e: &io::Error) -> Self {
        HerdError::new(
            HerdErrorKind::Bind,
            format!("failed to bind to {addr}: {e}"),
            "LISTENER",
        )
    }

    /// Crea un HerdError correspondiente al fallo al obtener un lock
    pub fn lock(what: &'static str, module: &'static str) -> Self {
        HerdError::new(
            HerdErrorKind::Lock,
            format!("poisoned lock on '{what}'"),
            module,
        )
    }
}

impl fmt::Display for HerdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.error_type, self.module, self.description)
    }
}

impl std::error::Error for HerdError {}
