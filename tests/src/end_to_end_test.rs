//! Escenarios de un solo miembro: IAMAT basico, last-writer-wins,
//! degradacion del places client por timeout, y comando invalido.
use crate::utils::*;
use std::io::BufReader;
use std::time::Duration;

#[test]
fn basic_iamat_reply() {
    let config = write_herd_config(
        "single_clark.yaml",
        &[MemberSpec::new("Clark", 20099, &[])],
        5.0,
    );
    let _node = spawn_server("Clark", &config);

    let mut stream = connect_with_retry(20099, Duration::from_secs(10));
    send_line(&mut stream, "IAMAT kiwi +34.068930-118.445127 1621464827.959498503");

    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let reply = read_line(&mut reader);

    assert!(reply.starts_with("AT Clark "));
    assert!(reply.contains("kiwi +34.068930-118.445127 1621464827.959498503"));
}

#[test]
fn last_writer_wins_by_timestamp() {
    let config = write_herd_config(
        "single_clark_lww.yaml",
        &[MemberSpec::new("Clark", 20100, &[])],
        5.0,
    );
    let _node = spawn_server("Clark", &config);

    let mut stream = connect_with_retry(20100, Duration::from_secs(10));
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    send_line(&mut stream, "IAMAT kiwi +34.068930-118.445127 2000");
    let _ = read_line(&mut reader);
    send_line(&mut stream, "IAMAT kiwi +34.068930-118.445127 1000");
    let _ = read_line(&mut reader);

    send_line(&mut stream, "WHATSAT kiwi 1 1");
    let (at_line, _body) = read_whatsat_reply(&mut reader);

    assert!(at_line.contains(" kiwi +34.068930-118.445127 2000"));
}

#[test]
fn places_timeout_degrades_gracefully() {
    let config = write_herd_config(
        "single_clark_timeout.yaml",
        &[MemberSpec::new("Clark", 20101, &[])],
        0.001,
    );
    let _node = spawn_server("Clark", &config);

    let mut stream = connect_with_retry(20101, Duration::from_secs(10));
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    send_line(&mut stream, "IAMAT kiwi +34.068930-118.445127 1621464827.959498503");
    let _ = read_line(&mut reader);

    let start = std::time::Instant::now();
    send_line(&mut stream, "WHATSAT kiwi 1 1");
    let (_at_line, body) = read_whatsat_reply(&mut reader);
    let elapsed = start.elapsed();

    assert_eq!(body.trim_end(), "{}");
    assert!(elapsed < Duration::from_millis(100), "WHATSAT tardo {elapsed:?}");
}

#[test]
fn invalid_command_is_echoed_and_connection_stays_open() {
    let config = write_herd_config(
        "single_clark_invalid.yaml",
        &[MemberSpec::new("Clark", 20102, &[])],
        5.0,
    );
    let _node = spawn_server("Clark", &config);

    let mut stream = connect_with_retry(20102, Duration::from_secs(10));
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    send_line(&mut stream, "FOO bar baz");
    let reply = read_line(&mut reader);
    assert_eq!(reply, "? FOO bar baz\n");

    send_line(&mut stream, "IAMAT kiwi +34.068930-118.445127 1000");
    let reply = read_line(&mut reader);
    assert!(reply.starts_with("AT Clark "));
}
