//! File appender implementation

use crate::core::{
    internal_log, render_event, Append, AppenderSkeleton, Layout, LoggerError, LoggingEvent,
    Result, TextLayout,
};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes formatted events to a file
///
/// The file is opened on activation and locked exclusively so that no other
/// appender (in this or another process) writes through the same file.
pub struct FileSink {
    path: PathBuf,
    append: bool,
    immediate_flush: bool,
    buffer_size: usize,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: true,
            immediate_flush: true,
            buffer_size: 8 * 1024,
            writer: None,
        }
    }

    /// Append to an existing file instead of truncating it
    #[must_use]
    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Flush after every event
    #[must_use]
    pub fn with_immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.immediate_flush = immediate_flush;
        self
    }

    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn open(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    LoggerError::io_operation(
                        "creating log directory",
                        parent.display().to_string(),
                        e,
                    )
                })?;
            }
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if self.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.open(&self.path).map_err(|e| {
            LoggerError::io_operation("opening log file", self.path.display().to_string(), e)
        })?;

        FileExt::try_lock_exclusive(&file)
            .map_err(|_| LoggerError::file_lock(self.path.display().to_string()))?;

        internal_log::debug(format_args!("Opened log file {}", self.path.display()));
        self.writer = Some(BufWriter::with_capacity(self.buffer_size, file));
        Ok(())
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))
    }

    fn release(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            let file = writer
                .into_inner()
                .map_err(|e| LoggerError::writer(e.to_string()))?;
            FileExt::unlock(&file)?;
        }
        Ok(())
    }
}

impl Append for FileSink {
    fn append(&mut self, event: &LoggingEvent, layout: Option<&dyn Layout>) -> Result<()> {
        let layout = layout.ok_or_else(|| LoggerError::writer("file sink has no layout"))?;
        let text = render_event(event, layout);
        let immediate_flush = self.immediate_flush;
        let writer = self.writer()?;
        writer.write_all(text.as_bytes())?;
        if immediate_flush {
            writer.flush()?;
        }
        Ok(())
    }

    fn activate(&mut self, layout: Option<&dyn Layout>) -> Result<()> {
        // Reactivation reopens the file
        self.release()?;
        self.open()?;
        if let Some(header) = layout.and_then(|l| l.header()) {
            let writer = self.writer()?;
            writeln!(writer, "{}", header)?;
            writer.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn close(&mut self, layout: Option<&dyn Layout>) -> Result<()> {
        if let Some(footer) = layout.and_then(|l| l.footer()) {
            if let Some(writer) = self.writer.as_mut() {
                writeln!(writer, "{}", footer)?;
            }
        }
        self.release()
    }

    fn requires_layout(&self) -> bool {
        true
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.release();
    }
}

pub type FileAppender = AppenderSkeleton<FileSink>;

impl AppenderSkeleton<FileSink> {
    /// Text layout, appending to `path`
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(name, FileSink::new(path)).with_layout(TextLayout::new())
    }
}
