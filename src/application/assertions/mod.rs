mod canonicalize;
mod partition;
mod prepare;

pub use canonicalize::{Content, canonicalize};
pub use partition::{AssertionContent, count_distinct_subjects, partition};
pub use prepare::{PreparedDataset, prepare_dataset};
