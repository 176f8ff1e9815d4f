//! Accept-loop helper shared by the TCP services.

use std::future::Future;
use std::io;
use std::time::Duration;

use tracing::warn;

/// Pause after a failed accept before trying again.
pub(crate) const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Keep calling `accept` until it yields a connection.
///
/// Accept errors (EMFILE, ECONNABORTED, ...) concern one connection attempt,
/// not the listener, so they are logged and retried after `backoff`.
pub(crate) async fn next_connection<T, F, Fut>(mut accept: F, backoff: Duration) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(conn) => return conn,
            Err(e) => {
                warn!(error = %e, ?backoff, "accept failed; retrying");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
