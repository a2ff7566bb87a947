//! HTTP listener.
//!
//! Accepts connections and serves each one on its own task until shutdown.

use crate::server::handle_request;
use crate::state::AppState;
use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument};

/// The API server.
pub struct ApiServer {
    /// Bound listener.
    listener: TcpListener,
    /// Shared state handed to every request.
    state: AppState,
}

impl ApiServer {
    /// Bind to the configured listen address.
    pub async fn bind(state: AppState) -> std::io::Result<Self> {
        let listener = TcpListener::bind(state.config().server.listen).await?;

        info!(
            listen = %listener.local_addr()?,
            metrics_enabled = state.config().metrics.enabled,
            metrics_path = %state.config().metrics.path,
            "api server bound"
        );

        Ok(Self { listener, state })
    }

    /// The address actually bound, useful when listening on port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the server, accepting connections until shutdown.
    #[instrument(skip_all, name = "api_server")]
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!("api server starting");

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                _ = shutdown.recv() => {
                    info!("api server shutting down");
                    break;
                }
            }
        }
    }

    /// Serve one connection on a new task.
    fn handle_connection(&self, stream: TcpStream, client_addr: SocketAddr) {
        let state = self.state.clone();

        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req: Request<Incoming>| {
                let state = state.clone();
                async move { handle_request(req, &state).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!(client = %client_addr, error = %e, "connection error");
            }
        });
    }
}
