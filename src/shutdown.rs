// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Shutdown Coordination
//!
//! A [`Shutdown`] token is handed to every publisher and consumer at
//! construction. Each instance installs a [`ShutdownHook`]: a supervising
//! task that owns the teardown of that instance's channel and connection.
//! The hook runs when the token fires, or when the instance is closed or
//! dropped.
//!
//! [`Shutdown::listen_for_signals`] wires SIGINT and SIGTERM to the token and
//! terminates the process once every hook has released its connection.
//! In-flight messages are not drained; unacknowledged deliveries go back to
//! the broker.

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, warn};

/// Upper bound on how long a signal waits for hooks before exiting anyway.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Why the token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// [`Shutdown::trigger`] was called.
    Requested,
    /// SIGINT or SIGTERM was received.
    Signal,
}

/// Releases broker resources. Implemented by
/// [`BrokerConnection`](crate::channel::BrokerConnection).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Teardown: Send + Sync + 'static {
    /// Best-effort release; never fails.
    async fn teardown(&self);
}

/// Cloneable cancellation token shared by a group of instances.
#[derive(Clone)]
pub struct Shutdown {
    state: Arc<watch::Sender<Option<ShutdownReason>>>,
    pending_hooks: Arc<watch::Sender<usize>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Shutdown::new()
    }
}

impl Shutdown {
    /// Creates a token that has not fired and has no hooks installed.
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        let (pending_hooks, _) = watch::channel(0);

        Shutdown {
            state: Arc::new(state),
            pending_hooks: Arc::new(pending_hooks),
        }
    }

    /// Fires the token. Only the first call has an effect.
    pub fn trigger(&self) {
        self.trigger_with(ShutdownReason::Requested);
    }

    pub(crate) fn trigger_with(&self, reason: ShutdownReason) {
        let fired = self.state.send_if_modified(|current| match current {
            Some(_) => false,
            None => {
                *current = Some(reason);
                true
            }
        });

        if fired {
            debug!(?reason, "shutdown triggered");
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Returns the reason the token fired, or `None` while it has not.
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.state.borrow()
    }

    /// Resolves once the token has fired, immediately if it already has.
    pub async fn cancelled(&self) -> ShutdownReason {
        let mut rx = self.state.subscribe();
        let reason = match rx.wait_for(Option::is_some).await {
            Ok(reason) => *reason,
            Err(_) => None,
        };

        reason.unwrap_or(ShutdownReason::Requested)
    }

    /// Number of installed hooks that have not finished their teardown.
    pub fn pending_hooks(&self) -> usize {
        *self.pending_hooks.borrow()
    }

    /// Waits until every installed hook has released its resources, or until
    /// `grace` elapses. Returns false on timeout.
    pub async fn wait_for_hooks(&self, grace: Duration) -> bool {
        let mut rx = self.pending_hooks.subscribe();
        let done = tokio::time::timeout(grace, rx.wait_for(|pending| *pending == 0))
            .await
            .is_ok();
        done
    }

    /// Spawns the process signal listener.
    ///
    /// On SIGINT or SIGTERM the token fires, the hooks get up to
    /// [`DEFAULT_SHUTDOWN_GRACE`] to close their connections and the process
    /// exits with status 1. Call this once per process.
    pub fn listen_for_signals(&self) -> JoinHandle<()> {
        let shutdown = self.clone();

        tokio::spawn(async move {
            wait_for_signal().await;
            warn!("termination signal received, shutting down");

            shutdown.trigger_with(ShutdownReason::Signal);
            if !shutdown.wait_for_hooks(DEFAULT_SHUTDOWN_GRACE).await {
                warn!(
                    pending = shutdown.pending_hooks(),
                    "hooks did not finish before the grace period"
                );
            }

            std::process::exit(1);
        })
    }

    fn hook_installed(&self) {
        self.pending_hooks.send_modify(|pending| *pending += 1);
    }

    fn hook_finished(&self) {
        self.pending_hooks
            .send_modify(|pending| *pending = pending.saturating_sub(1));
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = ctrl_c => {},
                _ = terminate.recv() => {},
            }
        }
        Err(err) => {
            warn!(error = err.to_string(), "failure to install SIGTERM handler");
            let _ = ctrl_c.await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Per-instance supervising task that owns teardown.
///
/// Dropping the hook releases the resources as well, so an instance that
/// goes out of scope does not leak its connection.
pub struct ShutdownHook {
    close_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ShutdownHook {
    /// Registers `resource` with `shutdown` and spawns the supervising task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Parameters
    /// * `shutdown` - Token whose firing triggers the teardown
    /// * `resource` - What to release; owned by the supervising task from now on
    ///
    /// # Returns
    /// The hook; keep it alive for as long as the resource is in use
    pub fn install<T: Teardown>(shutdown: &Shutdown, resource: T) -> ShutdownHook {
        let (close_tx, close_rx) = oneshot::channel::<()>();
        let shutdown = shutdown.clone();
        shutdown.hook_installed();

        let handle = tokio::spawn(async move {
            tokio::select! {
                reason = shutdown.cancelled() => debug!(?reason, "releasing broker resources"),
                _ = close_rx => debug!("instance closed, releasing broker resources"),
            }

            resource.teardown().await;
            shutdown.hook_finished();
        });

        ShutdownHook {
            close_tx: Some(close_tx),
            handle: Some(handle),
        }
    }

    /// Releases the resources now and waits for the teardown to finish.
    pub async fn close(mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(error = err.to_string(), "shutdown hook task failed");
            }
        }
    }
}

impl Drop for ShutdownHook {
    fn drop(&mut self) {
        // the supervising task sees the closed sender and tears down
        self.close_tx.take();
    }
}
