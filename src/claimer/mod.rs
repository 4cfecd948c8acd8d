pub mod api;
pub mod fleet;
pub mod polling;
pub mod retry;
pub mod session;

pub use fleet::{FleetOrchestrator, FleetStartSummary};
pub use polling::{LoopState, PollingLoop, PollingSchedule, StartOutcome};
pub use retry::{RetryDecision, RetryPolicy, RetryState};
pub use session::{IdentitySession, ReportOutcome};
