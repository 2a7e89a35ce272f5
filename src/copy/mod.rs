mod census;
mod engine;

pub use engine::{CopyJob, CopySummary, copy_tree};
