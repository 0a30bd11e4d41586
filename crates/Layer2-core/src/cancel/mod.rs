//! Interrupt handling
//!
//! - `signals`: `SignalSource` trait, OS and channel-backed sources
//! - `coordinator`: the single-fire `CancellationCoordinator`

mod coordinator;
mod signals;

pub use coordinator::{
    CancellationCoordinator, CoordinatorState, RestorationNotifier, RestorationOutcome,
    Termination, DEFAULT_RESTORATION_TIMEOUT,
};
pub use signals::{ChannelSignals, InterruptKind, OsSignals, SignalSender, SignalSource};
