//! Server façade: owns a set of transports, a shutdown broadcast, and the
//! join handles of every listener task (`spec.md` §4.9).

use crate::clock::{Clock, SharedClock, SystemClock};
use crate::error::{Result, TransportError};
use crate::handler::Handler;
use crate::transport::Transport;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Hosts any number of transports behind one shutdown signal. `start` is
/// idempotent: calling it again while already running is a no-op.
pub struct Server {
    handler: Arc<dyn Handler>,
    clock: SharedClock,
    transports: Vec<Arc<dyn Transport>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<Result<()>>>,
    started: bool,
}

impl Server {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self::with_clock(handler, Arc::new(SystemClock))
    }

    pub fn with_clock(handler: Arc<dyn Handler>, clock: SharedClock) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Server {
            handler,
            clock,
            transports: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
            started: false,
        }
    }

    /// Registers a transport. Must be called before `start`.
    pub fn add_transport(&mut self, transport: Arc<dyn Transport>) {
        self.transports.push(transport);
    }

    /// Spawns every registered transport's listen loop. Idempotent: a
    /// second call while already started returns `Ok(())` without spawning
    /// anything again. Errors if no transports were registered.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        if self.transports.is_empty() {
            return Err(TransportError::NoTransports);
        }

        for transport in &self.transports {
            let transport = transport.clone();
            let handler = self.handler.clone();
            let clock = self.clock.clone();
            let shutdown = self.shutdown_rx.clone();
            let name = transport.name();
            let task = tokio::spawn(async move {
                let result = transport.listen(handler, clock, shutdown).await;
                if let Err(ref e) = result {
                    tracing::error!(transport = name, error = %e, "transport listener exited with error");
                }
                result
            });
            self.tasks.push(task);
        }

        self.started = true;
        Ok(())
    }

    /// Broadcasts shutdown to every transport. Does not wait for tasks to
    /// finish; call `wait` for that.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Blocks until every spawned listener task has exited, returning the
    /// first error any of them reported.
    pub async fn wait(&mut self) -> Result<()> {
        let mut first_err = None;
        for task in self.tasks.drain(..) {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
                Err(join_err) => {
                    tracing::error!(error = %join_err, "transport task panicked");
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
