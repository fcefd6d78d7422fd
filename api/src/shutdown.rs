//! Graceful shutdown: stop accepting on the first signal, give in-flight
//! requests a bounded grace period, and give up early on a second signal.

use std::future::{Future, IntoFuture};
use std::io;
use std::time::Duration;

use tokio::sync::oneshot;

/// How a server run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// All connections finished (or the server stopped on its own).
    Drained,
    /// Connections were still open when the grace period ran out.
    TimedOut,
    /// A second signal arrived while draining.
    Forced,
}

/// Drive `server` until it stops.
///
/// `signalled` fires when the server's own graceful shutdown has started.
/// From then on the server gets `grace` to finish; `force` cuts that short.
pub async fn drain<S, F>(
    server: S,
    signalled: oneshot::Receiver<()>,
    grace: Duration,
    force: F,
) -> io::Result<Outcome>
where
    S: IntoFuture<Output = io::Result<()>>,
    F: Future<Output = ()>,
{
    let server = server.into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result.map(|()| Outcome::Drained),
        Ok(()) = signalled => {}
    }

    tokio::select! {
        result = tokio::time::timeout(grace, &mut server) => match result {
            Ok(result) => result.map(|()| Outcome::Drained),
            Err(_) => Ok(Outcome::TimedOut),
        },
        () = force => Ok(Outcome::Forced),
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
