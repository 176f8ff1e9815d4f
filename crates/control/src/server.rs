//! Control-plane listener.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{info, info_span, Instrument};

/// Bound control-plane socket. Binding is separate from serving so the
/// caller can learn the actual port before requests are accepted.
pub struct ControlServer {
    listener: TcpListener,
}

impl ControlServer {
    pub async fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve `router` until `signal` resolves, then drain in-flight requests.
    ///
    /// Each connection is handled on its own task.
    pub async fn serve_with_shutdown<F>(self, router: Router, signal: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = self.local_addr()?;
        let span = info_span!("control_server", addr = %local);
        self.run(router, signal).instrument(span).await
    }

    async fn run<F>(self, router: Router, signal: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("control plane listening");
        axum::serve(self.listener, router)
            .with_graceful_shutdown(signal)
            .await?;
        info!("control plane stopped");
        Ok(())
    }
}
