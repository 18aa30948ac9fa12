//! Termination trigger: Ctrl+C and, on unix, SIGTERM.
//!
//! Signals are received on a small tokio runtime running on its own thread.
//! The first request is delivered to the waiting caller; later requests are
//! logged and otherwise ignored, so shutdown cannot be repeated or cancelled.

use std::io;
use std::thread::{self, JoinHandle};

use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::core::FacilityError;

/// Which environment request triggered shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationRequest {
    /// Ctrl+C / SIGINT.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

#[cfg(unix)]
struct Terminate(tokio::signal::unix::Signal);

#[cfg(unix)]
impl Terminate {
    fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).map(Self)
    }

    async fn recv(&mut self) {
        if self.0.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
struct Terminate;

#[cfg(not(unix))]
impl Terminate {
    #[allow(clippy::unnecessary_wraps)]
    fn install() -> io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) {
        std::future::pending::<()>().await;
    }
}

/// Waits for the first termination request from the environment.
pub struct TerminationListener {
    first: oneshot::Receiver<TerminationRequest>,
    _thread: JoinHandle<()>,
}

impl TerminationListener {
    /// Install the signal handlers and start listening.
    ///
    /// # Errors
    ///
    /// - `FacilityError::Signal` if the runtime or a handler cannot be set up
    /// - `FacilityError::Spawn` if the listener thread cannot be started
    pub fn install() -> Result<Self, FacilityError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(FacilityError::Signal)?;
        let terminate = {
            let _guard = runtime.enter();
            Terminate::install().map_err(FacilityError::Signal)?
        };

        let (tx, first) = oneshot::channel();
        let name = "tq-signals".to_string();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let (requests, rx) = mpsc::channel(4);
                runtime.block_on(async {
                    tokio::join!(watch(requests, terminate), deliver_first(rx, tx));
                });
            })
            .map_err(|source| FacilityError::Spawn { name, source })?;

        Ok(Self {
            first,
            _thread: handle,
        })
    }

    /// Block until the first termination request.
    ///
    /// Returns `None` if the listener stopped without receiving one.
    pub fn wait(self) -> Option<TerminationRequest> {
        self.first.blocking_recv().ok()
    }
}

/// Watch the environment for termination requests and forward each one.
async fn watch(requests: mpsc::Sender<TerminationRequest>, mut terminate: Terminate) {
    loop {
        let request = tokio::select! {
            res = tokio::signal::ctrl_c() => match res {
                Ok(()) => TerminationRequest::Interrupt,
                Err(e) => {
                    error!(error = %e, "Failed to listen for Ctrl+C");
                    return;
                }
            },
            () = terminate.recv() => TerminationRequest::Terminate,
        };
        if requests.send(request).await.is_err() {
            return;
        }
    }
}

/// Deliver the first request on `first`; log and drop the rest.
async fn deliver_first(
    mut requests: mpsc::Receiver<TerminationRequest>,
    first: oneshot::Sender<TerminationRequest>,
) {
    let mut first = Some(first);
    while let Some(request) = requests.recv().await {
        match first.take() {
            Some(tx) => {
                info!(?request, "Termination requested");
                let _ = tx.send(request);
            }
            None => warn!(?request, "Shutdown already in progress, ignoring termination request"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_only_first_request_is_delivered() {
        let (requests, rx) = mpsc::channel(4);
        let (tx, first) = oneshot::channel();

        requests.send(TerminationRequest::Terminate).await.unwrap();
        requests.send(TerminationRequest::Interrupt).await.unwrap();
        drop(requests);

        deliver_first(rx, tx).await;
        assert_eq!(first.await.ok(), Some(TerminationRequest::Terminate));
    }

    #[tokio::test]
    async fn test_repeated_requests_after_waiter_gone_are_ignored() {
        let (requests, rx) = mpsc::channel(4);
        let (tx, first) = oneshot::channel();
        drop(first);

        for _ in 0..3 {
            requests.send(TerminationRequest::Interrupt).await.unwrap();
        }
        drop(requests);

        // Returns normally once the watcher side hangs up.
        deliver_first(rx, tx).await;
    }

    #[tokio::test]
    async fn test_no_request_leaves_waiter_empty() {
        let (requests, rx) = mpsc::channel::<TerminationRequest>(1);
        let (tx, first) = oneshot::channel();
        drop(requests);

        deliver_first(rx, tx).await;
        assert!(first.await.is_err());
    }
}
