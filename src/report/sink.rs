//! Filesystem persistence for reports.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::MonitorError;

/// Writes report files into a directory and appends to a shared log.
#[derive(Debug, Clone)]
pub struct ReportSink {
    reports_dir: PathBuf,
    log_file: PathBuf,
}

impl ReportSink {
    /// Open the sink, creating the reports directory (and the log file's
    /// parent directory) if absent.
    pub fn open(
        reports_dir: impl Into<PathBuf>,
        log_file: impl Into<PathBuf>,
    ) -> Result<Self, MonitorError> {
        let reports_dir = reports_dir.into();
        let log_file = log_file.into();

        fs::create_dir_all(&reports_dir).map_err(|e| MonitorError::io(&reports_dir, e))?;
        if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| MonitorError::io(parent, e))?;
        }

        Ok(Self {
            reports_dir,
            log_file,
        })
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Delete everything under the reports directory, recursively.
    ///
    /// Returns the number of top-level entries removed.
    pub fn purge(&self) -> Result<usize, MonitorError> {
        let entries = fs::read_dir(&self.reports_dir)
            .map_err(|e| MonitorError::io(&self.reports_dir, e))?;

        let mut removed = 0;
        for entry in entries {
            let path = entry.map_err(|e| MonitorError::io(&self.reports_dir, e))?.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            result.map_err(|e| MonitorError::io(&path, e))?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Write a report file and return its full path.
    pub fn write_report(&self, filename: &str, contents: &str) -> Result<PathBuf, MonitorError> {
        let path = self.reports_dir.join(filename);
        fs::write(&path, contents).map_err(|e| MonitorError::io(&path, e))?;
        Ok(path)
    }

    /// Append one line to the shared log file.
    pub fn append_log(&self, line: &str) -> Result<(), MonitorError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .map_err(|e| MonitorError::io(&self.log_file, e))?;
        writeln!(file, "{}", line).map_err(|e| MonitorError::io(&self.log_file, e))
    }
}
