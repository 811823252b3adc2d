//! Background tasks
//!
//! The expiry sweep is the only periodic work. Chain events arrive on an
//! mpsc channel fed by block processing.

use crate::core::ChainEvent;
use crate::multisig::state_machine::{EventOutcome, TransactionStateMachine};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity of the chain event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// How long [`MultisigService::shutdown`] waits for queued chain events
pub const LISTENER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Spawn the periodic expiry sweep
///
/// Runs until a message arrives on `shutdown` or its sender is dropped.
/// Resolves to the number of evicted registrations.
pub fn spawn_expiry_sweeper(
    machine: Arc<TransactionStateMachine>,
    period: Duration,
    mut shutdown: mpsc::Receiver<()>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        let mut evicted = 0;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let expired = machine.evict_expired(Utc::now());
                    if !expired.is_empty() {
                        log::info!("Expiry sweep removed {} pending registrations", expired.len());
                    }
                    evicted += expired.len();
                }
                _ = shutdown.recv() => {
                    log::debug!("Expiry sweeper stopping");
                    break;
                }
            }
        }
        evicted
    })
}

/// Apply chain events until the channel closes
///
/// Resolves to the number of events handled.
pub async fn run_chain_listener(
    machine: Arc<TransactionStateMachine>,
    mut events: mpsc::Receiver<ChainEvent>,
) -> usize {
    let mut handled = 0;
    while let Some(event) = events.recv().await {
        match machine.handle_event(event) {
            EventOutcome::Applied(report) => {
                for (tx_id, e) in &report.failed {
                    log::debug!("Block {} left {} unconfirmed: {}", report.block_id, tx_id, e);
                }
            }
            EventOutcome::Reverted(report) => {
                for (tx_id, reason) in &report.discarded {
                    log::debug!("Revert of {} discarded {}: {}", report.block_id, tx_id, reason);
                }
            }
        }
        handled += 1;
    }
    log::debug!("Chain event channel closed after {} events", handled);
    handled
}

/// Running engine tasks
pub struct MultisigService {
    machine: Arc<TransactionStateMachine>,
    events_tx: mpsc::Sender<ChainEvent>,
    shutdown_tx: mpsc::Sender<()>,
    sweeper: JoinHandle<usize>,
    listener: JoinHandle<usize>,
}

impl MultisigService {
    /// Start the sweeper and the chain listener on the current runtime
    pub fn start(machine: Arc<TransactionStateMachine>) -> Self {
        let period = Duration::from_secs(machine.config().sweep_interval_secs);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let (events_tx, events_rx) = mpsc::channel::<ChainEvent>(EVENT_CHANNEL_CAPACITY);

        let sweeper = spawn_expiry_sweeper(machine.clone(), period, shutdown_rx);
        let listener = tokio::spawn(run_chain_listener(machine.clone(), events_rx));
        log::info!("Multisignature service started (sweep every {:?})", period);

        Self {
            machine,
            events_tx,
            shutdown_tx,
            sweeper,
            listener,
        }
    }

    /// Sender for block processing to publish chain events
    pub fn events(&self) -> mpsc::Sender<ChainEvent> {
        self.events_tx.clone()
    }

    pub fn machine(&self) -> &Arc<TransactionStateMachine> {
        &self.machine
    }

    /// Stop both tasks, draining queued chain events first
    ///
    /// Senders obtained from [`events`](Self::events) keep the listener
    /// running. If any are still alive after [`LISTENER_DRAIN_TIMEOUT`]
    /// the listener is aborted and its count is reported as `None`.
    pub async fn shutdown(self) -> (usize, Option<usize>) {
        self.shutdown_within(LISTENER_DRAIN_TIMEOUT).await
    }

    /// [`shutdown`](Self::shutdown) with an explicit drain timeout
    pub async fn shutdown_within(self, drain: Duration) -> (usize, Option<usize>) {
        let Self {
            events_tx,
            shutdown_tx,
            sweeper,
            mut listener,
            ..
        } = self;
        let _ = shutdown_tx.send(()).await;
        drop(events_tx);

        let evicted = sweeper.await.unwrap_or_else(|e| {
            log::error!("Expiry sweeper failed: {}", e);
            0
        });
        let handled = match tokio::time::timeout(drain, &mut listener).await {
            Ok(Ok(handled)) => Some(handled),
            Ok(Err(e)) => {
                log::error!("Chain listener failed: {}", e);
                None
            }
            Err(_) => {
                log::warn!(
                    "Chain listener still has open senders after {:?}; aborting",
                    drain
                );
                listener.abort();
                None
            }
        };
        log::info!("Multisignature service stopped");
        (evicted, handled)
    }
}
