//! Parser y despachador del protocolo de linea: IAMAT, WHATSAT, AT y la
//! respuesta de error generica `? <line>`.
use crate::flood::FloodSource;
use crate::node::Node;
use crate::record::{self, LocationRecord};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const MIN_RADIUS_KM: f64 = 0.0;
const MAX_RADIUS_KM: f64 = 50.0;
const MIN_RESULTS: i64 = 1;
const MAX_RESULTS: i64 = 20;

#[derive(Debug, PartialEq)]
enum Command {
    Iamat {
        client_id: String,
        coords_raw: String,
        lat: f64,
        lon: f64,
        client_timestamp: f64,
        client_timestamp_raw: String,
    },
    Whatsat {
        client_id: String,
        radius_km: f64,
        max_results: u32,
    },
    At(LocationRecord),
    Invalid,
}

fn parse_command(line: &str) -> Command {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.first() {
        Some(&"IAMAT") => parse_iamat(&tokens).unwrap_or(Command::Invalid),
        Some(&"WHATSAT") => parse_whatsat(&tokens).unwrap_or(Command::Invalid),
        Some(&"AT") => record::parse_at_line(line)
            .map(Command::At)
            .unwrap_or(Command::Invalid),
        _ => Command::Invalid,
    }
}

fn parse_iamat(tokens: &[&str]) -> Option<Command> {
    if tokens.len() != 4 {
        return None;
    }
    let client_id = tokens[1].to_string();
    let coords_raw = tokens[2].to_string();
    let (lat, lon) = record::parse_coords(&coords_raw)?;
    let client_timestamp_raw = tokens[3].to_string();
    let client_timestamp: f64 = client_timestamp_raw.parse().ok()?;
    if !client_timestamp.is_finite() {
        return None;
    }
    Some(Command::Iamat {
        client_id,
        coords_raw,
        lat,
        lon,
        client_timestamp,
        client_timestamp_raw,
    })
}

fn parse_whatsat(tokens: &[&str]) -> Option<Command> {
    if tokens.len() != 4 {
        return None;
    }
    let client_id = tokens[1].to_string();
    let radius_km: f64 = tokens[2].parse().ok()?;
    if !radius_km.is_finite() || radius_km <= MIN_RADIUS_KM || radius_km > MAX_RADIUS_KM {
        return None;
    }
    let max_results: i64 = tokens[3].parse().ok()?;
    if !(MIN_RESULTS..=MAX_RESULTS).contains(&max_results) {
        return None;
    }
    Some(Command::Whatsat {
        client_id,
        radius_km,
        max_results: max_results as u32,
    })
}

/// Procesa una linea ya leida de una conexion y devuelve, si corresponde,
/// el texto completo (ya terminado en LF) a escribir de vuelta.
pub fn handle_line(node: &Node, line: &str, source: FloodSource) -> Option<String> {
    match parse_command(line) {
        Command::Iamat {
            client_id,
            coords_raw,
            lat,
            lon,
            client_timestamp,
            client_timestamp_raw,
        } => Some(handle_iamat(
            node,
            &client_id,
            &coords_raw,
            lat,
            lon,
            client_timestamp,
            &client_timestamp_raw,
        )),
        Command::Whatsat {
            client_id,
            radius_km,
            max_results,
        } => Some(handle_whatsat(node, &client_id, radius_km, max_results, line)),
        Command::At(record) => {
            node.flood().apply(record, source);
            None
        }
        Command::Invalid => Some(format!("? {line}\n")),
    }
}

fn handle_iamat(
    node: &Node,
    client_id: &str,
    coords_raw: &str,
    lat: f64,
    lon: f64,
    client_timestamp: f64,
    client_timestamp_raw: &str,
) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64();
    let time_skew = now - client_timestamp;

    let record = record::build_record(
        node.own_name(),
        time_skew,
        client_id,
        coords_raw,
        lat,
        lon,
        client_timestamp,
        client_timestamp_raw,
    );
    let reply = format!("{}\n", record.raw_at_line);
    node.flood().apply(record, FloodSource::Local);
    reply
}

fn handle_whatsat(node: &Node, client_id: &str, radius_km: f64, max_results: u32, line: &str) -> String {
    let Some(record) = node.store().get(client_id) else {
        return format!("? {line}\n");
    };

    match node
        .places()
        .lookup(record.lat, record.lon, radius_km, max_results, node.whatsat_timeout())
    {
        Ok(body) => {
            let body_text = String::from_utf8_lossy(&body);
            format!("{}\n{}\n\n", record.raw_at_line, body_text.trim_end())
        }
        Err(e) => {
            node.logger().warn(
                &format!("places lookup failed for {client_id}: {e}"),
                "Protocol",
            );
            format!("{}\n{{}}\n\n", record.raw_at_line)
        }
    }
}
