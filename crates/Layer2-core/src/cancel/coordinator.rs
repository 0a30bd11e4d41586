//! Cancellation coordinator
//!
//! Supervises one interrupt lifecycle:
//!
//! ```text
//! Armed ──signal──▶ SignalReceived ──cancel token──▶ CancellationPropagated
//!                                                          │
//!                                  Terminated ◀── RestorationAwaited
//!                           (notified, or timeout elapsed)
//! ```
//!
//! The coordinator never restores anything itself. It cancels the shared
//! token, waits for the workflow to report that restoration finished, and
//! bounds that wait so the process always exits.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::signals::{InterruptKind, SignalSource};

/// Default bound on waiting for restoration after an interrupt
pub const DEFAULT_RESTORATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Armed,
    SignalReceived,
    CancellationPropagated,
    RestorationAwaited,
    Terminated,
}

/// How the restoration wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorationOutcome {
    Completed,
    TimedOut,
}

/// Result of a supervised interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Termination {
    pub signal: InterruptKind,
    pub restoration: RestorationOutcome,
    /// Signals observed after the first one and ignored
    pub discarded_signals: usize,
}

impl Termination {
    pub fn exit_code(&self) -> u8 {
        self.signal.exit_code()
    }

    pub fn timed_out(&self) -> bool {
        self.restoration == RestorationOutcome::TimedOut
    }
}

/// Held by the workflow. Notifying or dropping it reports that restoration
/// (or the normal path) is finished.
#[derive(Debug)]
pub struct RestorationNotifier {
    tx: Option<oneshot::Sender<()>>,
}

impl RestorationNotifier {
    pub fn notify(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Single-fire interrupt supervisor
#[derive(Debug)]
pub struct CancellationCoordinator {
    token: CancellationToken,
    fired: AtomicBool,
    state: Mutex<CoordinatorState>,
    restoration_done: Mutex<Option<oneshot::Receiver<()>>>,
    restoration_timeout: Duration,
}

impl CancellationCoordinator {
    pub fn new(restoration_timeout: Duration) -> (Self, RestorationNotifier) {
        let (tx, rx) = oneshot::channel();
        let coordinator = Self {
            token: CancellationToken::new(),
            fired: AtomicBool::new(false),
            state: Mutex::new(CoordinatorState::Armed),
            restoration_done: Mutex::new(Some(rx)),
            restoration_timeout,
        };
        (coordinator, RestorationNotifier { tx: Some(tx) })
    }

    /// The shared cancellation context handed to every blocking operation
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn state(&self) -> CoordinatorState {
        *self.state.lock()
    }

    pub fn restoration_timeout(&self) -> Duration {
        self.restoration_timeout
    }

    /// Whether an interrupt has been acted upon
    pub fn signal_received(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    fn transition(&self, next: CoordinatorState) {
        let mut state = self.state.lock();
        debug!(from = ?*state, to = ?next, "coordinator transition");
        *state = next;
    }

    /// Claim the single transition out of `Armed`. Only the first caller wins.
    fn fire(&self) -> bool {
        !self.fired.swap(true, Ordering::SeqCst)
    }

    /// Run the state machine until one interrupt has been handled.
    ///
    /// Returns `None` if the signal source closes before any signal arrives.
    pub async fn supervise<S: SignalSource>(&self, mut signals: S) -> Option<Termination> {
        let signal = loop {
            let kind = signals.recv().await?;
            if self.fire() {
                break kind;
            }
            debug!(signal = %kind, "signal already handled; discarding");
        };

        self.transition(CoordinatorState::SignalReceived);
        info!(signal = %signal, "interrupt received; cancelling");

        self.token.cancel();
        self.transition(CoordinatorState::CancellationPropagated);

        let done = self.restoration_done.lock().take();
        self.transition(CoordinatorState::RestorationAwaited);

        let mut discarded_signals = 0;
        let restoration = match done {
            None => RestorationOutcome::Completed,
            Some(mut done) => {
                let deadline = tokio::time::sleep(self.restoration_timeout);
                tokio::pin!(deadline);
                let mut signals_open = true;

                loop {
                    tokio::select! {
                        // sender dropped counts as finished
                        _ = &mut done => break RestorationOutcome::Completed,
                        _ = &mut deadline => {
                            warn!(timeout = ?self.restoration_timeout, "restoration did not finish in time");
                            break RestorationOutcome::TimedOut;
                        }
                        repeated = signals.recv(), if signals_open => match repeated {
                            Some(kind) => {
                                discarded_signals += 1;
                                debug!(signal = %kind, "repeated signal during restoration; discarding");
                            }
                            None => signals_open = false,
                        },
                    }
                }
            }
        };

        self.transition(CoordinatorState::Terminated);
        Some(Termination {
            signal,
            restoration,
            discarded_signals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::ChannelSignals;

    #[tokio::test]
    async fn test_completed_restoration() {
        let (coordinator, notifier) = CancellationCoordinator::new(Duration::from_secs(5));
        let (tx, source) = ChannelSignals::channel();
        let token = coordinator.token();

        let workflow = async move {
            token.cancelled().await;
            notifier.notify();
        };
        tx.send(InterruptKind::Interrupt);

        let (termination, ()) = tokio::join!(coordinator.supervise(source), workflow);
        let termination = termination.unwrap();
        assert_eq!(termination.exit_code(), 130);
        assert_eq!(termination.restoration, RestorationOutcome::Completed);
        assert_eq!(coordinator.state(), CoordinatorState::Terminated);
    }

    #[tokio::test]
    async fn test_dropped_notifier_counts_as_done() {
        let (coordinator, notifier) = CancellationCoordinator::new(Duration::from_secs(5));
        let (tx, source) = ChannelSignals::channel();
        drop(notifier);
        tx.send(InterruptKind::Terminate);

        let termination = coordinator.supervise(source).await.unwrap();
        assert_eq!(termination.exit_code(), 143);
        assert!(!termination.timed_out());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_when_restoration_hangs() {
        let (coordinator, _notifier) = CancellationCoordinator::new(Duration::from_secs(5));
        let (tx, source) = ChannelSignals::channel();
        tx.send(InterruptKind::Interrupt);

        let termination = coordinator.supervise(source).await.unwrap();
        assert!(termination.timed_out());
        assert_eq!(termination.exit_code(), 130);
        assert!(coordinator.token().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_signals_are_discarded() {
        let (coordinator, _notifier) = CancellationCoordinator::new(Duration::from_secs(5));
        let (tx, source) = ChannelSignals::channel();
        tx.send(InterruptKind::Interrupt);
        tx.send(InterruptKind::Interrupt);
        tx.send(InterruptKind::Terminate);

        let termination = coordinator.supervise(source).await.unwrap();
        assert_eq!(termination.signal, InterruptKind::Interrupt);
        assert_eq!(termination.discarded_signals, 2);
        assert_eq!(termination.exit_code(), 130);
    }

    #[tokio::test]
    async fn test_closed_source_never_fires() {
        let (coordinator, _notifier) = CancellationCoordinator::new(Duration::from_secs(5));
        let (tx, source) = ChannelSignals::channel();
        drop(tx);

        assert!(coordinator.supervise(source).await.is_none());
        assert_eq!(coordinator.state(), CoordinatorState::Armed);
        assert!(!coordinator.token().is_cancelled());
    }

    #[test]
    fn test_armed_until_first_signal() {
        let (coordinator, _notifier) = CancellationCoordinator::new(DEFAULT_RESTORATION_TIMEOUT);
        let (_tx, source) = ChannelSignals::channel();

        let mut supervise = tokio_test::task::spawn(coordinator.supervise(source));
        tokio_test::assert_pending!(supervise.poll());
        assert_eq!(coordinator.state(), CoordinatorState::Armed);
        assert!(!coordinator.token().is_cancelled());
    }

    #[test]
    fn test_fire_is_single_shot() {
        let (coordinator, _notifier) = CancellationCoordinator::new(DEFAULT_RESTORATION_TIMEOUT);
        assert!(coordinator.fire());
        assert!(!coordinator.fire());
        assert!(coordinator.signal_received());
    }
}
