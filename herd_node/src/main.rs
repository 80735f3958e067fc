use herd_node::config::config_parser::Config;
use herd_node::node::Node;
use herd_node::places::places_client::RealPlacesClient;
use std::process::ExitCode;
use std::sync::Arc;

const DEFAULT_CONFIG_PATH: &str = "herd.yaml";

/// Punto de entrada de un miembro del herd.
///
/// Uso: `server <ServerName> [config-path]` — `config-path` por defecto es
/// `herd.yaml` en el directorio actual. `ServerName` debe ser una clave del
/// mapa `servers` de la configuracion.
fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Uso: {} <ServerName> [config-path]", args[0]);
        return ExitCode::FAILURE;
    }

    let server_name = &args[1];
    let config_path = args.get(2).map(String::as_str).unwrap_or(DEFAULT_CONFIG_PATH);

    let config = match Config::from_file(config_path, server_name) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error al cargar la configuracion: {e}");
            return ExitCode::FAILURE;
        }
    };

    let places = Arc::new(RealPlacesClient::new(
        config.places_endpoint().to_string(),
        config.api_key().to_string(),
    ));
    let node = Arc::new(Node::new(&config, places));

    println!("{server_name} listening on port {}", config.own_port());
    match node.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error fatal: {e}");
            ExitCode::FAILURE
        }
    }
}
