//! Validator runtime: competition loops, maintenance cadences and
//! cooperative shutdown.

pub mod arena;
pub mod shutdown;

pub use arena::{build_roster, CompetitionLoop, MaintenanceLoop, Round};
pub use shutdown::{GameGuard, ShutdownCoordinator};
