pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod export;
pub mod instance_type;
pub mod plan;
pub mod snapshot;

pub use config::ConfdiffConfig;
pub use diff::{
    diff_lines, render_diff, ChangeKind, Diff, DiffFormat, DiffFormatter, DiffStats, Segment,
};
pub use error::{ConfdiffError, Result};
pub use export::{DiffExporter, ExportConfig};
pub use plan::{plan_application, Plan, PlanOptions, Rollout, RolloutKind};
