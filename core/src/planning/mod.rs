//! Scoring and scheduling: turning routing records into an ordered stream of
//! attempts to make.

mod board;
mod plan;
mod scheduler;

pub use board::Board;
pub use plan::{PlanError, TransportPlan, TransportRequest};
pub use scheduler::{PlanStream, Scheduler};
