//! Rolling Logger
//!
//! File logger for the todo-sync tools. Events go through a
//! `tracing-subscriber` fmt subscriber (which also captures `log` records)
//! into `<log_dir>/<app_name>.log`. The file is rotated by size and the most
//! recent lines are kept in a circular buffer so they can be shown without
//! reading the disk.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;
pub const DEFAULT_MAX_FILES: usize = 3;
pub const DEFAULT_BUFFER_LINES: usize = 200;

/// Size limits for the log files and the in-memory buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingConfig {
    /// Rotate once the active file would grow past this many bytes
    pub max_file_bytes: u64,
    /// Number of rotated files kept next to the active one
    pub max_files: usize,
    /// Lines kept in the circular buffer
    pub buffer_lines: usize,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: DEFAULT_MAX_FILES,
            buffer_lines: DEFAULT_BUFFER_LINES,
        }
    }
}

type RecentLines = Arc<Mutex<VecDeque<String>>>;

static RECENT: OnceLock<RecentLines> = OnceLock::new();

/// Size-rotated log file that mirrors complete lines into a circular buffer
pub struct RollingFile {
    dir: PathBuf,
    app_name: String,
    file: File,
    written: u64,
    config: RollingConfig,
    recent: RecentLines,
    partial: String,
}

impl RollingFile {
    /// Open (or create) `<dir>/<app_name>.log` in append mode
    pub fn open(dir: impl Into<PathBuf>, app_name: &str, config: RollingConfig) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let file = open_append(&log_path(&dir, app_name, 0))?;
        let written = file.metadata()?.len();

        Ok(Self {
            dir,
            app_name: app_name.to_string(),
            file,
            written,
            config,
            recent: Arc::new(Mutex::new(VecDeque::with_capacity(config.buffer_lines))),
            partial: String::new(),
        })
    }

    /// Path of the active log file
    pub fn path(&self) -> PathBuf {
        log_path(&self.dir, &self.app_name, 0)
    }

    /// Shared handle to the circular buffer
    pub fn recent(&self) -> Arc<Mutex<VecDeque<String>>> {
        self.recent.clone()
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.config.max_files == 0 {
            self.file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(self.path())?;
            self.written = 0;
            return Ok(());
        }

        let oldest = log_path(&self.dir, &self.app_name, self.config.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (0..self.config.max_files).rev() {
            let from = log_path(&self.dir, &self.app_name, index);
            if from.exists() {
                fs::rename(&from, log_path(&self.dir, &self.app_name, index + 1))?;
            }
        }

        self.file = open_append(&self.path())?;
        self.written = 0;
        Ok(())
    }

    fn remember(&mut self, buf: &[u8]) {
        if self.config.buffer_lines == 0 {
            return;
        }
        self.partial.push_str(&String::from_utf8_lossy(buf));

        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            let Ok(mut recent) = self.recent.lock() else {
                return;
            };
            while recent.len() >= self.config.buffer_lines {
                recent.pop_front();
            }
            recent.push_back(line.trim_end().to_string());
        }
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.config.max_file_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        self.remember(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn log_path(dir: &Path, app_name: &str, index: usize) -> PathBuf {
    if index == 0 {
        dir.join(format!("{}.log", app_name))
    } else {
        dir.join(format!("{}.log.{}", app_name, index))
    }
}

struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global logger with default limits
pub fn init_logger(log_dir: impl Into<PathBuf>, app_name: &str) -> Result<(), String> {
    init_logger_with(log_dir, app_name, RollingConfig::default())
}

/// Install the global logger
///
/// Fails if a global subscriber is already installed.
pub fn init_logger_with(
    log_dir: impl Into<PathBuf>,
    app_name: &str,
    config: RollingConfig,
) -> Result<(), String> {
    let file = RollingFile::open(log_dir, app_name, config)
        .map_err(|e| format!("Failed to open log file: {}", e))?;
    let recent = file.recent();

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_timer(LocalTime)
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .map_err(|e| format!("Failed to install logger: {}", e))?;

    let _ = RECENT.set(recent);
    Ok(())
}

/// Lines most recently written, oldest first
pub fn recent_lines() -> Vec<String> {
    RECENT
        .get()
        .and_then(|recent| recent.lock().ok().map(|lines| lines.iter().cloned().collect()))
        .unwrap_or_default()
}

/// Emit a message at the given level
pub fn log_at(level: log::Level, message: &str) -> Result<(), String> {
    if RECENT.get().is_none() {
        return Err("Logger not initialized".to_string());
    }
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
    log_at(log::Level::Info, message)
}

pub fn warn(message: &str) -> Result<(), String> {
    log_at(log::Level::Warn, message)
}

pub fn error(message: &str) -> Result<(), String> {
    log_at(log::Level::Error, message)
}
