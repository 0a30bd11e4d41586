//! Staging lifecycle
//!
//! Snapshot the index before the run, auto-stage on the user's behalf, and
//! return the index to the snapshot when the run is aborted.
//!
//! ```text
//! StagingSession
//!   ├── capture     StagingStateCapturer  (once, first)
//!   ├── auto_stage  AutoStager            (all-or-nothing)
//!   └── restore     RestorationPlanner    (at most once, current − pre)
//! ```

mod auto_stage;
mod capture;
mod error;
mod restoration;
mod session;
mod state;

pub use auto_stage::{AutoStageMode, AutoStager};
pub use capture::StagingStateCapturer;
pub use error::StagingError;
pub use restoration::{RestorationPlan, RestorationPlanner};
pub use session::StagingSession;
pub use state::{AutoStagingResult, StagingFailure, StagingState};
