//! Interrupt signal sources

use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

/// Which interrupt arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptKind {
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl InterruptKind {
    /// Conventional exit code: 128 + signal number
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Interrupt => 130,
            Self::Terminate => 143,
        }
    }
}

impl fmt::Display for InterruptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Stream of interrupt signals
#[async_trait]
pub trait SignalSource: Send {
    /// Next signal, or `None` once the source can deliver no more
    async fn recv(&mut self) -> Option<InterruptKind>;
}

// ============================================================================
// OS signals
// ============================================================================

/// SIGINT and (on unix) SIGTERM from the operating system.
///
/// Handlers are installed on construction, so the default "kill the
/// process" action is replaced before the workflow touches the index.
pub struct OsSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl OsSignals {
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }
}

#[async_trait]
impl SignalSource for OsSignals {
    #[cfg(unix)]
    async fn recv(&mut self) -> Option<InterruptKind> {
        tokio::select! {
            received = self.interrupt.recv() => received.map(|_| InterruptKind::Interrupt),
            received = self.terminate.recv() => received.map(|_| InterruptKind::Terminate),
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> Option<InterruptKind> {
        tokio::signal::ctrl_c()
            .await
            .ok()
            .map(|_| InterruptKind::Interrupt)
    }
}

// ============================================================================
// Channel signals
// ============================================================================

/// Sending half of a [`ChannelSignals`] source
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: mpsc::UnboundedSender<InterruptKind>,
}

impl SignalSender {
    /// Deliver a signal; false once the source is gone
    pub fn send(&self, kind: InterruptKind) -> bool {
        self.tx.send(kind).is_ok()
    }
}

/// Signals delivered over a channel
pub struct ChannelSignals {
    rx: mpsc::UnboundedReceiver<InterruptKind>,
}

impl ChannelSignals {
    pub fn channel() -> (SignalSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SignalSender { tx }, Self { rx })
    }
}

#[async_trait]
impl SignalSource for ChannelSignals {
    async fn recv(&mut self) -> Option<InterruptKind> {
        self.rx.recv().await
    }
}
