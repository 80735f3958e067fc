//! Enlace saliente hacia un vecino del herd: un hilo dedicado que redial-ea
//! con backoff exponencial y drena una cola de salida acotada.
use logger::logger::Logger;
use rand::Rng;
use std::collections::VecDeque;
use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const POP_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

struct OutboundQueue {
    lines: Mutex<VecDeque<String>>,
    signal: Condvar,
    bound: usize,
}

impl OutboundQueue {
    fn new(bound: usize) -> Self {
        OutboundQueue {
            lines: Mutex::new(VecDeque::new()),
            signal: Condvar::new(),
            bound,
        }
    }

    /// Encola `line`; si la cola ya esta en el limite, descarta la entrada
    /// mas vieja antes de agregar la nueva.
    fn push(&self, line: String, dropped: &AtomicU64) {
        let mut guard = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        if guard.len() >= self.bound {
            guard.pop_front();
            dropped.fetch_add(1, Ordering::Relaxed);
        }
        guard.push_back(line);
        self.signal.notify_one();
    }

    fn pop_wait(&self, timeout: Duration) -> Option<String> {
        let guard = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        let (mut guard, _) = self
            .signal
            .wait_timeout_while(guard, timeout, |q| q.is_empty())
            .unwrap_or_else(|e| e.into_inner());
        guard.pop_front()
    }
}

/// Enlace saliente hacia un vecino; expone una operacion de encolado no
/// bloqueante y mantiene su propio estado de conexion.
pub struct NeighborLink {
    peer_name: String,
    queue: Arc<OutboundQueue>,
    dropped: Arc<AtomicU64>,
    state: Arc<RwLock<LinkState>>,
    shutdown: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl NeighborLink {
    pub fn spawn(
        own_name: String,
        peer_name: String,
        peer_addr: SocketAddr,
        queue_bound: usize,
        logger: Logger,
    ) -> Self {
        let queue = Arc::new(OutboundQueue::new(queue_bound));
        let dropped = Arc::new(AtomicU64::new(0));
        let state = Arc::new(RwLock::new(LinkState::Disconnected));
        let shutdown = Arc::new(AtomicBool::new(false));

        let thread_queue = queue.clone();
        let thread_state = state.clone();
        let thread_shutdown = shutdown.clone();
        let thread_peer_name = peer_name.clone();
        let handle = thread::spawn(move || {
            run_sender(
                own_name,
                thread_peer_name,
                peer_addr,
                thread_queue,
                thread_state,
                thread_shutdown,
                logger,
            );
        });

        NeighborLink {
            peer_name,
            queue,
            dropped,
            state,
            shutdown,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub fn peer_name(&self) -> &str {
        &self.peer_name
    }

    /// Encola una linea AT para este vecino sin bloquear el llamador.
    pub fn enqueue(&self, line: String) {
        self.queue.push(line, &self.dropped);
    }

    pub fn state(&self) -> LinkState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Señala al hilo emisor que debe dejar de reintentar y espera a que
    /// termine, respetando la ventana de gracia del llamador.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.queue.signal.notify_all();
        let taken = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = taken {
            let _ = handle.join();
        }
    }
}

fn set_state(state: &Arc<RwLock<LinkState>>, value: LinkState) {
    if let Ok(mut guard) = state.write() {
        *guard = value;
    }
}

fn run_sender(
    own_name: String,
    peer_name: String,
    peer_addr: SocketAddr,
    queue: Arc<OutboundQueue>,
    state: Arc<RwLock<LinkState>>,
    shutdown: Arc<AtomicBool>,
    logger: Logger,
) {
    let mut backoff = INITIAL_BACKOFF;
    while !shutdown.load(Ordering::Relaxed) {
        set_state(&state, LinkState::Connecting);
        match TcpStream::connect(peer_addr) {
            Ok(mut stream) => {
                set_state(&state, LinkState::Connected);
                backoff = INITIAL_BACKOFF;
                logger.info(
                    &format!("connected to neighbor {peer_name} at {peer_addr}"),
                    "Peer",
                );
                if let Err(e) = writeln!(stream, "PEER {own_name}") {
                    logger.warn(
                        &format!("failed to announce identity to {peer_name}: {e}"),
                        "Peer",
                    );
                }
                while !shutdown.load(Ordering::Relaxed) {
                    let Some(line) = queue.pop_wait(POP_POLL) else {
                        continue;
                    };
                    if let Err(e) = writeln!(stream, "{line}") {
                        logger.warn(
                            &format!("write to neighbor {peer_name} failed: {e}"),
                            "Peer",
                        );
                        break;
                    }
                }
            }
            Err(e) => {
                logger.info(
                    &format!("dial to neighbor {peer_name} at {peer_addr} failed: {e}"),
                    "Peer",
                );
            }
        }
        set_state(&state, LinkState::Disconnected);
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        thread::sleep(jittered(backoff));
        backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
    }
}

/// Aplica jitter restando hasta un 25% de `d`, nunca sumando mas alla del
/// propio backoff: el peor caso sigue acotado por `MAX_BACKOFF`.
fn jittered(d: Duration) -> Duration {
    let mut rng = rand::rng();
    let max_jitter_ms = (d.as_millis() as u64 / 4).max(1);
    let jitter_ms = rng.random_range(0..max_jitter_ms);
    d - Duration::from_millis(jitter_ms)
}
