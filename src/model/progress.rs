/// Cumulative copy progress after one file has been written.
///
/// Totals come from the census pass and never change during a run;
/// `copied_*` only grow and never exceed their totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyProgress {
    pub total_files: u64,
    pub copied_files: u64,
    pub total_size: u64,
    pub copied_size: u64,
}

impl CopyProgress {
    pub fn new(total_files: u64, total_size: u64) -> Self {
        Self {
            total_files,
            total_size,
            ..Self::default()
        }
    }

    /// Percentage of files copied. An empty tree reports 0.
    pub fn file_percent(&self) -> f64 {
        if self.total_files == 0 {
            return 0.0;
        }
        self.copied_files as f64 / self.total_files as f64 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.copied_files == self.total_files && self.copied_size == self.total_size
    }
}
