//! Space and chart reconciliation.

pub mod error;
pub mod plan;
pub mod space;

pub use error::{ChartFailure, ChartOp, ReconcileError};
pub use plan::{plan_charts, validate_space, ChartPlan};
pub use space::{SpaceReconciler, SpaceReport};
