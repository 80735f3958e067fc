//! Modelo de datos de una posicion de cliente y su representacion de texto
//! en la linea AT, la forma canonica que se usa tanto para responder a un
//! cliente como para propagarla a los vecinos.
use std::fmt;

/// Ultima posicion aceptada para un client_id.
///
/// `raw_at_line` se preserva byte a byte desde el momento en que se acepta
/// el update: ni los campos numericos ni el timestamp se vuelven a
/// renderizar al reenviarla, para no perder precision ni cambiar el
/// redondeo.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub client_id: String,
    pub lat: f64,
    pub lon: f64,
    pub coords_raw: String,
    pub client_timestamp: f64,
    pub client_timestamp_raw: String,
    pub origin_server: String,
    pub time_skew_raw: String,
    pub raw_at_line: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RecordParseError(pub String);

impl fmt::Display for RecordParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for RecordParseError {}

/// Construye la linea `AT <own_name> <signed_time_skew> <client_id> <coords> <client_timestamp>`
/// a partir de un IAMAT recien aceptado.
pub fn build_record(
    origin_server: &str,
    time_skew_secs: f64,
    client_id: &str,
    coords_raw: &str,
    lat: f64,
    lon: f64,
    client_timestamp: f64,
    client_timestamp_raw: &str,
) -> LocationRecord {
    let time_skew_raw = format_time_skew(time_skew_secs);
    let raw_at_line = format!(
        "AT {origin_server} {time_skew_raw} {client_id} {coords_raw} {client_timestamp_raw}"
    );
    LocationRecord {
        client_id: client_id.to_string(),
        lat,
        lon,
        coords_raw: coords_raw.to_string(),
        client_timestamp,
        client_timestamp_raw: client_timestamp_raw.to_string(),
        origin_server: origin_server.to_string(),
        time_skew_raw,
        raw_at_line,
    }
}

/// Formatea un time_skew con signo explicito y al menos 9 digitos
/// fraccionarios, para distinguir eventos de sub-milisegundo.
pub fn format_time_skew(secs: f64) -> String {
    let sign = if secs.is_sign_negative() { "-" } else { "+" };
    format!("{sign}{:.9}", secs.abs())
}

/// Parsea una linea `AT ...` recibida de un vecino en un `LocationRecord`.
pub fn parse_at_line(line: &str) -> Result<LocationRecord, RecordParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 6 || tokens[0] != "AT" {
        return Err(RecordParseError(format!("malformed AT line: {line:?}")));
    }
    let origin_server = tokens[1].to_string();
    let time_skew_raw = tokens[2].to_string();
    let client_id = tokens[3].to_string();
    let coords_raw = tokens[4].to_string();
    let client_timestamp_raw = tokens[5].to_string();

    if !is_signed_decimal(&time_skew_raw) {
        return Err(RecordParseError(format!(
            "malformed time_skew in AT line: {time_skew_raw:?}"
        )));
    }
    let (lat, lon) = parse_coords(&coords_raw)
        .ok_or_else(|| RecordParseError(format!("malformed coords: {coords_raw:?}")))?;
    let client_timestamp: f64 = client_timestamp_raw
        .parse()
        .map_err(|_| RecordParseError(format!("malformed timestamp: {client_timestamp_raw:?}")))?;
    if !client_timestamp.is_finite() {
        return Err(RecordParseError("timestamp is not finite".to_string()));
    }

    Ok(LocationRecord {
        client_id,
        lat,
        lon,
        coords_raw,
        client_timestamp,
        client_timestamp_raw,
        origin_server,
        time_skew_raw,
        raw_at_line: line.to_string(),
    })
}

/// Parsea `<coords>`: la concatenacion sin separador de una latitud y una
/// longitud con signo explicito, por ejemplo `+34.068930-118.445127`.
pub fn parse_coords(coords: &str) -> Option<(f64, f64)> {
    let bytes = coords.as_bytes();
    if bytes.is_empty() || (bytes[0] != b'+' && bytes[0] != b'-') {
        return None;
    }
    let second_sign = coords[1..]
        .find(['+', '-'])
        .map(|idx| idx + 1)?;
    let (lat_str, lon_str) = coords.split_at(second_sign);
    if lat_str.is_empty() || lon_str.is_empty() {
        return None;
    }
    let lat: f64 = lat_str.parse().ok()?;
    let lon: f64 = lon_str.parse().ok()?;
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    Some((lat, lon))
}

fn is_signed_decimal(s: &str) -> bool {
    if !(s.starts_with('+') || s.starts_with('-')) {
        return false;
    }
    s[1..].parse::<f64>().map(|v| v.is_finite()).unwrap_or(false)
}
