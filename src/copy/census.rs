use std::fs;
use std::path::Path;

use ignore::{DirEntry, Walk, WalkBuilder};

use crate::error::CopyError;

/// File count and byte total of a tree, taken before anything is copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Census {
    pub files: u64,
    pub bytes: u64,
}

/// Walker shared by the census and copy passes.
///
/// Entries are yielded depth-first with siblings in byte-wise name order, so
/// both passes see the same sequence. Ignore files and hidden-file filtering
/// are disabled: every entry is copied.
pub(crate) fn walker(root: &Path) -> Walk {
    WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
}

pub(crate) fn is_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_some_and(|file_type| file_type.is_dir())
}

/// Counts every non-directory entry under `root` and sums their sizes.
///
/// Sizes follow symlinks, so a dangling link fails here before any copying starts.
pub fn take(root: &Path) -> Result<Census, CopyError> {
    let mut census = Census::default();

    for entry in walker(root) {
        let entry = entry.map_err(|err| CopyError::walk(root, err))?;
        if is_dir(&entry) {
            continue;
        }

        let metadata =
            fs::metadata(entry.path()).map_err(|err| CopyError::io("stat", entry.path(), err))?;
        census.files += 1;
        census.bytes += metadata.len();
    }

    Ok(census)
}
