//! Rolling Logger
//!
//! Size-rotated file logging installed as a `tracing` subscriber, plus a
//! ring-buffered tail of the active log file. Records emitted through the
//! `log` facade are bridged into the same subscriber.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::{self, format::Writer, time::FormatTime, writer::MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Size at which the active log file is rotated
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;
/// Number of rotated files kept next to the active one
pub const DEFAULT_MAX_FILES: usize = 3;
/// Fixed-capacity buffer of recent log lines
#[derive(Clone)]
pub struct RingBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() == self.capacity {
                lines.pop_front();
            }
            lines.push_back(line);
        }
    }

    /// Oldest first
    pub fn snapshot(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Log file that rotates `<name>.log` into `<name>.log.1 .. <name>.log.N`
/// once it grows past `max_bytes`.
pub struct RollingFile {
    dir: PathBuf,
    base_name: String,
    max_bytes: u64,
    max_files: usize,
    file: File,
    written: u64,
}

impl RollingFile {
    pub fn open(dir: impl AsRef<Path>, app_name: &str) -> io::Result<Self> {
        Self::with_limits(dir, app_name, DEFAULT_MAX_BYTES, DEFAULT_MAX_FILES)
    }

    pub fn with_limits(
        dir: impl AsRef<Path>,
        app_name: &str,
        max_bytes: u64,
        max_files: usize,
    ) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let base_name = format!("{}.log", app_name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(&base_name))?;
        let written = file.metadata()?.len();

        Ok(Self {
            dir,
            base_name,
            max_bytes,
            max_files,
            file,
            written,
        })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.base_name)
    }

    fn rotated_path(&self, n: usize) -> PathBuf {
        self.dir.join(format!("{}.{}", self.base_name, n))
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.max_files == 0 {
            self.file = File::create(self.path())?;
            self.written = 0;
            return Ok(());
        }

        let oldest = self.rotated_path(self.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..self.max_files).rev() {
            let from = self.rotated_path(n);
            if from.exists() {
                fs::rename(&from, self.rotated_path(n + 1))?;
            }
        }
        fs::rename(self.path(), self.rotated_path(1))?;

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path())?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global subscriber: rolling file in `log_dir`, warnings and
/// errors also on stderr.
///
/// Filtering follows `RUST_LOG`, defaulting to `info`. Fails if a global
/// subscriber is already installed.
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), String> {
    let file = RollingFile::open(log_dir.as_ref(), app_name)
        .map_err(|e| format!("Failed to open log file: {}", e))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_timer(LocalTimer)
                .with_writer(io::stderr.with_max_level(tracing::Level::WARN)),
        )
        .with(
            fmt::layer()
                .with_timer(LocalTimer)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| format!("Failed to install logger: {}", e))?;

    tracing::info!(app = app_name, dir = %log_dir.as_ref().display(), "logger initialised");
    Ok(())
}

/// Emit a message at the given `log` level
pub fn record(level: log::Level, message: &str) -> Result<(), String> {
    match level {
        log::Level::Error => tracing::error!("{}", message),
        log::Level::Warn => tracing::warn!("{}", message),
        log::Level::Info => tracing::info!("{}", message),
        log::Level::Debug => tracing::debug!("{}", message),
        log::Level::Trace => tracing::trace!("{}", message),
    }
    Ok(())
}

pub fn info(message: &str) -> Result<(), String> {
    record(log::Level::Info, message)
}

pub fn warn(message: &str) -> Result<(), String> {
    record(log::Level::Warn, message)
}

pub fn error(message: &str) -> Result<(), String> {
    record(log::Level::Error, message)
}

/// Last `lines` lines of the active log file, oldest first
pub fn tail(log_dir: impl AsRef<Path>, app_name: &str, lines: usize) -> io::Result<Vec<String>> {
    let path = log_dir.as_ref().join(format!("{}.log", app_name));
    if !path.exists() {
        return Ok(Vec::new());
    }
    let buffer = RingBuffer::new(lines);
    for line in BufReader::new(File::open(path)?).lines() {
        buffer.push(line?);
    }
    Ok(buffer.snapshot())
}
