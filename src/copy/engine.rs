use std::fs::{self, File, Permissions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, trace};

use crate::copy::census;
use crate::error::CopyError;
use crate::model::progress::CopyProgress;

/// What a finished copy wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopySummary {
    pub files: u64,
    pub bytes: u64,
}

/// A copy running on a background thread.
///
/// Iterating yields one [`CopyProgress`] per copied file, in copy order, and
/// ends when the worker is done. The channel is a rendezvous: the worker
/// blocks on every snapshot until it is received, so the copy never runs
/// ahead of the consumer. Call [`CopyJob::finish`] afterwards to learn
/// whether the walk succeeded.
pub struct CopyJob {
    progress: Receiver<CopyProgress>,
    worker: JoinHandle<Result<CopySummary, CopyError>>,
}

impl CopyJob {
    /// Joins the worker.
    ///
    /// Pending snapshots are discarded first. If the consumer stopped early the
    /// worker sees the closed channel and reports [`CopyError::Disconnected`].
    pub fn finish(self) -> Result<CopySummary, CopyError> {
        let Self { progress, worker } = self;
        drop(progress);
        worker.join().map_err(|_| CopyError::WorkerPanicked)?
    }
}

impl Iterator for CopyJob {
    type Item = CopyProgress;

    fn next(&mut self) -> Option<Self::Item> {
        self.progress.recv().ok()
    }
}

/// Starts copying the tree under `source` into `destination`.
///
/// The tree is walked twice: once to count files and bytes, once to copy.
/// Directory and file permission bits are mirrored from the source. On error
/// the copy stops and whatever was already written stays in place.
pub fn copy_tree(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> CopyJob {
    let source = source.into();
    let destination = destination.into();
    let (tx, rx) = mpsc::sync_channel(0);

    let worker = thread::spawn(move || run(&source, &destination, &tx));

    CopyJob {
        progress: rx,
        worker,
    }
}

fn run(
    source: &Path,
    destination: &Path,
    progress: &SyncSender<CopyProgress>,
) -> Result<CopySummary, CopyError> {
    let root_metadata = fs::metadata(source).map_err(|err| CopyError::io("stat", source, err))?;
    if !root_metadata.is_dir() {
        return Err(CopyError::NotADirectory {
            path: source.to_path_buf(),
        });
    }

    let census = census::take(source)?;
    info!(
        source = %source.display(),
        destination = %destination.display(),
        files = census.files,
        bytes = census.bytes,
        "copy census complete"
    );

    fs::create_dir_all(destination).map_err(|err| CopyError::io("mkdir", destination, err))?;

    // Directory modes are applied last so a read-only source directory does
    // not block writing its own children.
    let mut directories: Vec<(PathBuf, Permissions)> =
        vec![(destination.to_path_buf(), root_metadata.permissions())];
    let mut snapshot = CopyProgress::new(census.files, census.bytes);

    for entry in census::walker(source) {
        let entry = entry.map_err(|err| CopyError::walk(source, err))?;
        if entry.depth() == 0 {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| CopyError::OutsideRoot {
                path: entry.path().to_path_buf(),
            })?;
        let target = destination.join(relative);

        if census::is_dir(&entry) {
            fs::create_dir_all(&target).map_err(|err| CopyError::io("mkdir", &target, err))?;
            let permissions = fs::metadata(entry.path())
                .map_err(|err| CopyError::io("stat", entry.path(), err))?
                .permissions();
            directories.push((target, permissions));
            continue;
        }

        let bytes = copy_file(entry.path(), &target)?;
        snapshot.copied_files += 1;
        snapshot.copied_size += bytes;
        if snapshot.copied_files > snapshot.total_files || snapshot.copied_size > snapshot.total_size
        {
            return Err(CopyError::TreeChanged {
                files: census.files,
                bytes: census.bytes,
            });
        }

        trace!(path = %target.display(), bytes, "copied file");
        progress
            .send(snapshot)
            .map_err(|_| CopyError::Disconnected)?;
    }

    for (path, permissions) in directories.into_iter().rev() {
        fs::set_permissions(&path, permissions)
            .map_err(|err| CopyError::io("chmod", &path, err))?;
    }

    debug!(
        files = snapshot.copied_files,
        bytes = snapshot.copied_size,
        "copy finished"
    );

    Ok(CopySummary {
        files: snapshot.copied_files,
        bytes: snapshot.copied_size,
    })
}

/// Copies one file byte for byte, then applies the source's permission bits.
fn copy_file(source: &Path, target: &Path) -> Result<u64, CopyError> {
    let mut reader = File::open(source).map_err(|err| CopyError::io("open", source, err))?;
    let permissions = reader
        .metadata()
        .map_err(|err| CopyError::io("stat", source, err))?
        .permissions();

    let mut writer = File::create(target).map_err(|err| CopyError::io("create", target, err))?;
    let bytes =
        io::copy(&mut reader, &mut writer).map_err(|err| CopyError::io("write", target, err))?;

    writer
        .set_permissions(permissions)
        .map_err(|err| CopyError::io("chmod", target, err))?;

    Ok(bytes)
}
