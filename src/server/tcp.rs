//! # Servidor TCP con Multiplexación
//! src/server/tcp.rs
//!
//! Un único loop de `mio` detecta qué sockets están listos para leer:
//!
//! ```text
//!                 ┌──────────────┐
//!  listener ────► │   mio::Poll  │ ──► LISTENER: accept + register
//!  conexiones ──► │  (1 thread)  │ ──► conexión lista: deregister + spawn worker
//!  waker ───────► └──────────────┘ ──► WAKER: revisar flag de parada
//! ```
//!
//! Cada conexión lista se atiende en su propio thread (sin límite):
//! read → parse → respond → write → close. Un request por conexión.

use crate::application::Application;
use crate::config::Config;
use crate::error::Result;
use crate::http::{Body, BodyRegistry, Request, Response, StatusCode, SERVER_SOFTWARE};
use crate::metrics::MetricsCollector;
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{self, Shutdown, SocketAddr};
use std::os::fd::OwnedFd;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::socket;

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CONNECTION: usize = 2;

/// Tiempo máximo esperando bytes o escribiendo en un socket
const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle para detener el servidor desde otro thread
#[derive(Debug, Clone)]
pub struct ServerHandle {
    running: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ServerHandle {
    /// Detiene el loop después del poll en curso
    ///
    /// Los workers en vuelo no se cancelan.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Err(e) = self.waker.wake() {
            warn!(error = %e, "Failed to wake the poll loop");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Servidor HTTP/1.1 con multiplexación de conexiones
pub struct HttpServer {
    poll: Poll,
    listener: TcpListener,
    local_addr: SocketAddr,
    handle: ServerHandle,

    /// Conexiones aceptadas esperando datos
    connections: HashMap<Token, (TcpStream, SocketAddr)>,
    next_token: usize,

    application: Option<Arc<Application>>,
    body_registry: BodyRegistry,
    max_request_size: usize,
    metrics: MetricsCollector,
}

/// Estado compartido (solo lectura) por los workers
struct WorkerContext {
    application: Option<Arc<Application>>,
    body_registry: BodyRegistry,
    max_request_size: usize,
    metrics: MetricsCollector,
}

impl HttpServer {
    /// Crea el socket de escucha y lo registra en el poll
    pub fn bind(config: &Config) -> Result<Self> {
        let addr = socket::resolve(&config.address())?;
        let std_listener = socket::create_listening_socket(addr, config.backlog)?;
        let mut listener = TcpListener::from_std(std_listener);

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);

        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, backlog = config.backlog, "Server listening");

        Ok(Self {
            poll,
            listener,
            local_addr,
            handle: ServerHandle {
                running: Arc::new(AtomicBool::new(true)),
                waker,
            },
            connections: HashMap::new(),
            next_token: FIRST_CONNECTION,
            application: None,
            body_registry: BodyRegistry::default(),
            max_request_size: config.max_request_size,
            metrics: MetricsCollector::new(),
        })
    }

    /// Dirección real de escucha (útil con puerto 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Asigna la aplicación que responde los requests
    pub fn serve(&mut self, application: Application) {
        info!(
            application = application.name(),
            root = %application.root().display(),
            "Application attached"
        );
        self.application = Some(Arc::new(application));
    }

    /// Registra un decoder de body para un content-type
    pub fn register_body_handler<F>(&mut self, content_type: &str, decoder: F)
    where
        F: Fn(&str) -> Result<Body> + Send + Sync + 'static,
    {
        self.body_registry.register(content_type, decoder);
    }

    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    pub fn stop(&self) {
        self.handle.stop();
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// Collector compartido con los workers
    pub fn metrics(&self) -> MetricsCollector {
        self.metrics.clone()
    }

    /// Procesa eventos hasta que se llame a `stop()`
    pub fn start(&mut self) -> Result<()> {
        let context = Arc::new(WorkerContext {
            application: self.application.clone(),
            body_registry: self.body_registry.clone(),
            max_request_size: self.max_request_size,
            metrics: self.metrics.clone(),
        });

        let mut events = Events::with_capacity(1024);
        info!(address = %self.local_addr, "Server started");

        while self.handle.is_running() {
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                error!(error = %e, "Poll failed");
                return Err(e.into());
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_connections(),
                    WAKER => {}
                    token => self.dispatch(token, &context),
                }
            }
        }

        info!(pending = self.connections.len(), "Server stopped");
        Ok(())
    }

    /// Acepta todas las conexiones pendientes
    fn accept_connections(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;

                    if let Err(e) = self
                        .poll
                        .registry()
                        .register(&mut stream, token, Interest::READABLE)
                    {
                        warn!(client = %peer, error = %e, "Failed to register connection");
                        continue;
                    }
                    debug!(client = %peer, token = token.0, "Connection accepted");
                    self.connections.insert(token, (stream, peer));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    break;
                }
            }
        }
    }

    /// Entrega una conexión lista a un worker nuevo
    fn dispatch(&mut self, token: Token, context: &Arc<WorkerContext>) {
        // Tokens desconocidos: conexión ya entregada
        let Some((mut stream, peer)) = self.connections.remove(&token) else {
            return;
        };

        if let Err(e) = self.poll.registry().deregister(&mut stream) {
            debug!(client = %peer, error = %e, "Failed to deregister connection");
        }
        let stream = net::TcpStream::from(OwnedFd::from(stream));

        let context = Arc::clone(context);
        context.metrics.increment_active_workers();

        let spawned = thread::Builder::new()
            .name(format!("frask-worker-{}", token.0))
            .spawn({
                let context = Arc::clone(&context);
                move || {
                    handle_connection(stream, peer, &context);
                    context.metrics.decrement_active_workers();
                }
            });

        if let Err(e) = spawned {
            error!(client = %peer, error = %e, "Failed to spawn worker");
            context.metrics.decrement_active_workers();
            context.metrics.record_dropped();
        }
    }
}

/// Atiende un intercambio completo en el thread del worker
fn handle_connection(mut stream: net::TcpStream, peer: SocketAddr, context: &WorkerContext) {
    let started = Instant::now();

    if let Err(e) = configure_stream(&stream) {
        debug!(client = %peer, error = %e, "Failed to configure connection");
        context.metrics.record_dropped();
        return;
    }

    let mut buffer = vec![0u8; context.max_request_size];
    let read = match stream.read(&mut buffer) {
        Ok(0) => {
            debug!(client = %peer, "Connection closed without data");
            return;
        }
        Ok(n) => n,
        Err(e) => {
            debug!(client = %peer, error = %e, "Read failed, dropping connection");
            context.metrics.record_dropped();
            return;
        }
    };
    let raw = &buffer[..read];

    let (response, request_line, path) =
        match Request::parse_with(raw, &context.body_registry, Some(peer)) {
            Ok(request) => {
                let response = context.respond(&request);
                (response, request.request_line(), request.path().to_string())
            }
            Err(e) if e.is_protocol_error() => {
                debug!(client = %peer, error = %e, "Malformed request");
                (
                    Response::new(StatusCode::NOT_IMPLEMENTED),
                    first_line(raw),
                    "-".to_string(),
                )
            }
            Err(e) => {
                debug!(client = %peer, error = %e, "Unreadable request, dropping connection");
                context.metrics.record_dropped();
                return;
            }
        };

    let response = with_server_headers(response);
    let status_code = response.status();
    let status = status_code.as_u16();

    let written = stream
        .write_all(&response.to_bytes())
        .and_then(|_| stream.flush());

    match written {
        Ok(()) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            if status_code.is_server_error() {
                warn!(
                    client = %peer,
                    request = %request_line,
                    status,
                    elapsed_ms,
                    "Request failed"
                );
            } else {
                info!(
                    client = %peer,
                    request = %request_line,
                    status,
                    elapsed_ms,
                    "Request served"
                );
            }
            context.metrics.record_request(&path, status, started.elapsed());
            let _ = stream.shutdown(Shutdown::Write);
        }
        Err(e) => {
            warn!(
                client = %peer,
                request = %request_line,
                status,
                error = %e,
                "Write failed, closing connection"
            );
            context.metrics.record_dropped();
        }
    }
}

impl WorkerContext {
    fn respond(&self, request: &Request) -> Response {
        let Some(application) = &self.application else {
            return Response::new(StatusCode::NOT_FOUND);
        };

        panic::catch_unwind(AssertUnwindSafe(|| application.respond(request))).unwrap_or_else(
            |_| {
                error!(request = %request.request_line(), "Application panicked");
                Response::new(StatusCode::BAD_GATEWAY)
            },
        )
    }
}

fn configure_stream(stream: &net::TcpStream) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(IO_TIMEOUT))?;
    stream.set_write_timeout(Some(IO_TIMEOUT))?;
    Ok(())
}

/// `Server` y `Connection: close` salvo que el handler los haya definido
fn with_server_headers(mut response: Response) -> Response {
    if response.headers().get_ignore_case("Server").is_none() {
        response.add_header("Server", SERVER_SOFTWARE);
    }
    if response.headers().get_ignore_case("Connection").is_none() {
        response.add_header("Connection", "close");
    }
    response
}

fn first_line(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.lines().next().unwrap_or_default().trim().to_string()
}
