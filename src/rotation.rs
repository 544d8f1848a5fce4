//! Size-based log file rotation with compressed backups.
//!
//! [`RotatingFileWriter`] is the file sink handed to the subscriber: it opens
//! the daily log file lazily, rotates it into a timestamped backup once it
//! would exceed the size limit, gzip-compresses backups, and prunes backups
//! by count and age.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use chrono::Local;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing_subscriber::fmt::MakeWriter;

/// Rotation and retention policy for the file sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Maximum size of the current log file in megabytes before rotation
    pub max_file_size_mb: u64,
    /// Maximum number of rotated backups to retain
    pub max_backups: usize,
    /// Backups older than this many days are deleted
    pub max_age_days: u64,
    /// Gzip-compress rotated backups
    pub compress_backups: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_backups: 30,
            max_age_days: 7,
            compress_backups: true,
        }
    }
}

impl RotationPolicy {
    fn max_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

#[derive(Default)]
struct WriterState {
    file: Option<File>,
    written: u64,
}

struct Inner {
    path: PathBuf,
    policy: RotationPolicy,
    state: Mutex<WriterState>,
}

/// Shared rotating file writer.
///
/// Clones share the same file handle and size accounting, so the writer can
/// serve as a `MakeWriter` factory for the subscriber while many threads log
/// through it. The file is opened on the first write, not at construction.
#[derive(Clone)]
pub struct RotatingFileWriter {
    inner: Arc<Inner>,
}

impl RotatingFileWriter {
    /// Create a writer for the given log file path
    pub fn new(path: PathBuf, policy: RotationPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                path,
                policy,
                state: Mutex::new(WriterState::default()),
            }),
        }
    }

    /// Path of the current log file
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Rotation policy in effect
    pub fn policy(&self) -> RotationPolicy {
        self.inner.policy
    }

    fn open_current(path: &Path) -> io::Result<(File, u64)> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok((file, written))
    }

    fn ensure_open(&self, state: &mut WriterState) -> io::Result<()> {
        if state.file.is_none() {
            let (file, written) = Self::open_current(&self.inner.path)?;
            state.file = Some(file);
            state.written = written;
        }
        Ok(())
    }

    /// Move the current file aside, compress it, and prune old backups.
    fn rotate(&self, state: &mut WriterState) -> io::Result<()> {
        state.file = None;
        state.written = 0;

        let backup = backup_path(&self.inner.path);
        fs::rename(&self.inner.path, &backup)?;

        if self.inner.policy.compress_backups {
            // An uncompressed backup is still a valid backup
            let _ = compress_backup(&backup);
        }

        if let Some(dir) = self.inner.path.parent() {
            let _ = prune_backups(dir, &self.inner.path, &self.inner.policy);
        }

        Ok(())
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .inner
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "rotating writer lock poisoned"))?;

        // Open first so a pre-existing daily file (e.g. after a process
        // restart) counts toward the limit, then rotate before the write
        // that would cross it. A single record larger than the limit is
        // still written into a fresh file.
        self.ensure_open(&mut state)?;
        if state.written > 0 && state.written + buf.len() as u64 > self.inner.policy.max_bytes() {
            self.rotate(&mut state)?;
            self.ensure_open(&mut state)?;
        }

        if let Some(file) = state.file.as_mut() {
            file.write_all(buf)?;
            file.flush()?;
            state.written += buf.len() as u64;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Ok(mut state) = self.inner.state.lock() {
            if let Some(file) = state.file.as_mut() {
                return file.flush();
            }
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Pick a timestamped backup name next to the current file, avoiding
/// collisions with backups from earlier rotations.
fn backup_path(current: &Path) -> PathBuf {
    let stem = current
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("log");
    let timestamp = Local::now().format("%Y-%m-%dT%H-%M-%S%.3f");

    let mut candidate = current.with_file_name(format!("{stem}-{timestamp}.log"));
    let mut n = 1;
    while candidate.exists() || candidate.with_extension("log.gz").exists() {
        candidate = current.with_file_name(format!("{stem}-{timestamp}-{n}.log"));
        n += 1;
    }
    candidate
}

/// Gzip a rotated backup in place, replacing the `.log` file with `.log.gz`.
fn compress_backup(backup: &Path) -> io::Result<PathBuf> {
    let gz_path = backup.with_extension("log.gz");

    let mut input = File::open(backup)?;
    let output = File::create(&gz_path)?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.flush()?;

    fs::remove_file(backup)?;
    Ok(gz_path)
}

/// Delete backups of the given log file beyond the retention policy.
///
/// Only files named `<stem>-...` with a `.log` or `.log.gz` suffix are
/// considered; everything else in the directory is left alone. Returns the
/// number of files deleted.
fn prune_backups(dir: &Path, current: &Path, policy: &RotationPolicy) -> io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let stem = current
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("log");
    let prefix = format!("{stem}-");

    let retention = Duration::from_secs(policy.max_age_days * 24 * 60 * 60);
    let cutoff = SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut backups = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if !name.starts_with(&prefix) || !(name.ends_with(".log") || name.ends_with(".log.gz"))
            {
                continue;
            }
        } else {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        backups.push((path, modified));
    }

    // Newest first; everything past max_backups or older than the cutoff goes
    backups.sort_by(|a, b| b.1.cmp(&a.1));

    let mut deleted_count = 0;
    for (index, (path, modified)) in backups.iter().enumerate() {
        if (index >= policy.max_backups || *modified < cutoff) && fs::remove_file(path).is_ok() {
            deleted_count += 1;
        }
    }

    Ok(deleted_count)
}
