//! Fleet orchestration
//!
//! ```text
//! FleetLoop ──► WalletCycleRunner ──► StateFetcher ──► decide ──► ActionExecutor
//!                      │
//!                      └──► StatusFormatter (log lines)
//! ```

pub mod fleet_loop;
pub mod runner;
pub mod status;

pub use fleet_loop::{FleetLoop, FleetState, FleetTiming, RoundReport, Sleeper, TokioSleeper};
pub use runner::{CycleOutcome, CycleStage, Inspection, WalletCycleRunner};
pub use status::StatusFormatter;
