pub mod adjust;
pub mod dataset;
pub mod describe;
pub mod errors;
pub mod ranks;
pub mod report;
pub mod significance;
pub mod wait;

pub use dataset::{load_records, load_records_from_path, AnalysisRecord};
pub use describe::{crosstab_state_vs_group, summarize_by_group, Crosstab, GroupSummary, Summary};
pub use errors::AnalysisError;
pub use report::{render_report, Report};
pub use significance::{pairwise_posthoc, test_group_wait_equality, DunnMatrix, KruskalWallis};
pub use wait::recompute_open_wait;
