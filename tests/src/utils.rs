//! Harness de tests de integracion: cada escenario levanta uno o mas
//! binarios `server` reales como subprocesos y los conduce por TCP crudo,
//! igual que el protocolo que hablan los clientes del herd.
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use std::{fs, thread};

/// Un miembro a incluir en una configuracion YAML generada para un test.
pub struct MemberSpec {
    pub name: &'static str,
    pub port: u16,
    pub neighbors: &'static [&'static str],
}

impl MemberSpec {
    pub fn new(name: &'static str, port: u16, neighbors: &'static [&'static str]) -> Self {
        MemberSpec { name, port, neighbors }
    }
}

/// Escribe un documento YAML valido para el herd descripto por `members` y
/// retorna la ruta del archivo generado.
pub fn write_herd_config(path: &str, members: &[MemberSpec], whatsat_timeout: f64) -> String {
    let mut servers = String::new();
    for m in members {
        servers.push_str(&format!("  {}: {}\n", m.name, m.port));
    }

    let mut neighbors = String::new();
    for m in members {
        let list = m.neighbors.join(", ");
        neighbors.push_str(&format!("  {}: [{}]\n", m.name, list));
    }

    let contents = format!(
        "servers:\n{servers}neighbors:\n{neighbors}api_key: test-api-key\nplaces_endpoint: \"http://127.0.0.1:1/disabled\"\nwhatsat_timeout: {whatsat_timeout}\npeer_queue_bound: 64\nlogging:\n  level: info\n  filename: {path}.log\n  format: text\n"
    );

    fs::write(path, contents).expect("no se pudo escribir la configuracion de test");
    path.to_string()
}

/// Subproceso `server` en ejecucion; se mata al dropear para que un test que
/// falla no deje nodos huerfanos entre corridas.
pub struct HerdProcess {
    child: Child,
}

impl Drop for HerdProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Lanza `server <name> <config_path>` como subproceso contra el binario
/// compilado del workspace.
pub fn spawn_server(name: &str, config_path: &str) -> HerdProcess {
    let child = Command::new("cargo")
        .arg("run")
        .arg("--quiet")
        .arg("--bin")
        .arg("server")
        .arg("--")
        .arg(name)
        .arg(config_path)
        .current_dir("..")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("no se pudo iniciar el nodo");
    HerdProcess { child }
}

/// Reintenta la conexion hasta `timeout`, dado que el bind del listener
/// ocurre en background en el subproceso recien lanzado.
pub fn connect_with_retry(port: u16, timeout: Duration) -> TcpStream {
    let deadline = Instant::now() + timeout;
    loop {
        match TcpStream::connect(("127.0.0.1", port)) {
            Ok(stream) => return stream,
            Err(e) => {
                if Instant::now() >= deadline {
                    panic!("no se pudo conectar a 127.0.0.1:{port}: {e}");
                }
                thread::sleep(Duration::from_millis(100));
            }
        }
    }
}

pub fn send_line(stream: &mut TcpStream, line: &str) {
    writeln!(stream, "{line}").expect("error al escribir linea");
    stream.flush().expect("error al flushear stream");
}

/// Lee exactamente una linea LF-terminada de la conexion.
pub fn read_line(reader: &mut BufReader<TcpStream>) -> String {
    let mut line = String::new();
    reader.read_line(&mut line).expect("error al leer linea");
    line
}

/// Lee una respuesta WHATSAT completa: la linea AT, el cuerpo, y la linea
/// en blanco que cierra la doble-LF.
pub fn read_whatsat_reply(reader: &mut BufReader<TcpStream>) -> (String, String) {
    let at_line = read_line(reader);
    let body = read_line(reader);
    let terminator = read_line(reader);
    assert_eq!(terminator, "\n", "WHATSAT debe cerrar con una linea en blanco");
    (at_line, body)
}

