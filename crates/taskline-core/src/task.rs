//! A named unit of tracked work: title, error/complete/hidden state, a
//! shared text buffer fed by leveled logging calls, and an optional backing
//! log file that mirrors everything the buffer retains.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::buffer::TextBuffer;
use crate::error::Result;
use crate::verbosity::Verbosity;

/// Maps a message and its level to the text actually stored, e.g. to prefix
/// the task id and apply a per-level color.
pub type Formatter = Box<dyn Fn(&str, Verbosity) -> String + Send + Sync>;

/// Construction-time settings for a [`Task`].
pub struct TaskConfig {
    /// Formatter applied to every retained leveled message. Defaults to the
    /// identity.
    pub formatter: Option<Formatter>,
    /// Verbosity ceiling; messages ranked above it are dropped.
    pub verbosity: Verbosity,
    /// Hidden tasks never appear in the live region; their output drains to
    /// scrollback. Fixed for the task's lifetime.
    pub hidden: bool,
    /// Backing log file, created (truncated) by [`Task::new`] and closed
    /// exactly once by [`Task::done`].
    pub log_path: Option<PathBuf>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            formatter: None,
            verbosity: Verbosity::Info,
            hidden: false,
            log_path: None,
        }
    }
}

/// A tracked task. All methods take `&self` and are safe to call from any
/// number of threads; none of them blocks on an in-progress render.
pub struct Task {
    title: RwLock<String>,
    formatter: Formatter,
    err: AtomicBool,
    complete: AtomicBool,
    hidden: bool,
    verbosity: Verbosity,
    buffer: TextBuffer,
    log_file: Mutex<Option<File>>,
}

impl Task {
    /// Builds a task. Fails only if the configured log file (or its parent
    /// directory) cannot be created.
    pub fn new(title: impl Into<String>, config: TaskConfig) -> Result<Self> {
        let log_file = match &config.log_path {
            Some(path) => {
                if let Some(dir) = path.parent() {
                    fs::create_dir_all(dir)?;
                }
                Some(File::create(path)?)
            }
            None => None,
        };

        Ok(Self {
            title: RwLock::new(title.into()),
            formatter: config
                .formatter
                .unwrap_or_else(|| Box::new(|msg, _| msg.to_string())),
            err: AtomicBool::new(false),
            complete: AtomicBool::new(false),
            hidden: config.hidden,
            verbosity: config.verbosity,
            buffer: TextBuffer::new(),
            log_file: Mutex::new(log_file),
        })
    }

    fn log(&self, msg: &str, level: Verbosity) {
        if !self.verbosity.retains(level) {
            return;
        }
        let formatted = (self.formatter)(msg, level);
        self.retain(&formatted);
    }

    /// Appends already-formatted text to the buffer and mirrors it to the
    /// backing log file. Mirror failures are swallowed: logging never fails
    /// observably.
    fn retain(&self, text: &str) {
        self.buffer.append(text);
        if let Some(file) = self.log_file.lock().unwrap().as_mut() {
            let _ = file.write_all(text.as_bytes());
        }
    }

    pub fn error(&self, msg: &str) {
        self.err.store(true, Ordering::Relaxed);
        self.log(msg, Verbosity::Error);
    }

    pub fn errorln(&self, msg: &str) {
        self.error(&format!("{msg}\n"));
    }

    pub fn warn(&self, msg: &str) {
        self.log(msg, Verbosity::Warning);
    }

    pub fn warnln(&self, msg: &str) {
        self.warn(&format!("{msg}\n"));
    }

    pub fn info(&self, msg: &str) {
        self.log(msg, Verbosity::Info);
    }

    pub fn infoln(&self, msg: &str) {
        self.info(&format!("{msg}\n"));
    }

    pub fn debug(&self, msg: &str) {
        self.log(msg, Verbosity::Debug);
    }

    pub fn debugln(&self, msg: &str) {
        self.debug(&format!("{msg}\n"));
    }

    pub fn trace(&self, msg: &str) {
        self.log(msg, Verbosity::Trace);
    }

    pub fn traceln(&self, msg: &str) {
        self.trace(&format!("{msg}\n"));
    }

    /// Raw bytes (e.g. captured subprocess output) bypass the verbosity
    /// filter and the formatter.
    pub fn write_raw(&self, bytes: &[u8]) {
        self.retain(&String::from_utf8_lossy(bytes));
    }

    /// Atomically replaces the title.
    pub fn set_status(&self, status: impl Into<String>) {
        *self.title.write().unwrap() = status.into();
    }

    pub fn title(&self) -> String {
        self.title.read().unwrap().clone()
    }

    /// Full snapshot of the retained output.
    pub fn text(&self) -> String {
        self.buffer.get()
    }

    /// Drains the retained output, leaving the buffer empty.
    pub fn take_text(&self) -> String {
        self.buffer.take()
    }

    /// The most recent `max_lines` physical lines and the number of rows
    /// they occupy at `width` columns. See [`TextBuffer::last_lines`].
    pub fn last_lines(&self, max_lines: usize, width: usize) -> (String, usize) {
        self.buffer.last_lines(max_lines, width)
    }

    /// Marks the task complete and closes the backing log file. The close
    /// happens exactly once even when racing a concurrent removal; later
    /// logging calls still append to the buffer but no longer reach the
    /// file.
    pub fn done(&self) {
        if let Some(file) = self.log_file.lock().unwrap().take() {
            drop(file);
        }
        self.complete.store(true, Ordering::Relaxed);
    }

    pub fn is_err(&self) -> bool {
        self.err.load(Ordering::Relaxed)
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Relaxed)
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}

/// `io::Write` adapter over a shared task, so a task can serve directly as
/// the stdout/stderr sink of a spawned subprocess.
pub struct TaskWriter(Arc<Task>);

impl TaskWriter {
    pub fn new(task: Arc<Task>) -> Self {
        Self(task)
    }
}

impl Write for TaskWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_raw(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_task(verbosity: Verbosity) -> Task {
        Task::new(
            "test",
            TaskConfig {
                verbosity,
                ..TaskConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_verbosity_ceiling_filters() {
        let task = plain_task(Verbosity::Info);
        task.traceln("noise");
        task.debugln("details");
        task.infoln("progress");
        task.warnln("careful");
        task.errorln("broken");

        let text = task.text();
        assert!(!text.contains("noise"));
        assert!(!text.contains("details"));
        assert!(text.contains("progress"));
        assert!(text.contains("careful"));
        assert!(text.contains("broken"));
    }

    #[test]
    fn test_error_flag_is_sticky() {
        let task = plain_task(Verbosity::Info);
        assert!(!task.is_err());
        task.errorln("boom");
        assert!(task.is_err());
        task.infoln("recovered");
        task.debugln("still fine");
        assert!(task.is_err());
    }

    #[test]
    fn test_error_flag_independent_of_filter_path() {
        // The flag is raised before the message enters the filter/formatter
        // path, so it never depends on what the buffer retains.
        let task = plain_task(Verbosity::Error);
        task.error("boom");
        assert!(task.is_err());
        assert!(task.text().contains("boom"));
    }

    #[test]
    fn test_formatter_applied_to_retained_messages() {
        let task = Task::new(
            "test",
            TaskConfig {
                formatter: Some(Box::new(|msg, level| format!("[{level}] {msg}"))),
                ..TaskConfig::default()
            },
        )
        .unwrap();
        task.warnln("careful");
        assert_eq!(task.text(), "[warning] careful\n");
    }

    #[test]
    fn test_write_raw_bypasses_filter() {
        let task = plain_task(Verbosity::Error);
        task.write_raw(b"subprocess says hi\n");
        assert_eq!(task.text(), "subprocess says hi\n");
    }

    #[test]
    fn test_set_status_replaces_title() {
        let task = plain_task(Verbosity::Info);
        assert_eq!(task.title(), "test");
        task.set_status("test (3/4)");
        assert_eq!(task.title(), "test (3/4)");
    }

    #[test]
    fn test_done_is_terminal() {
        let task = plain_task(Verbosity::Info);
        assert!(!task.is_complete());
        task.done();
        assert!(task.is_complete());
        task.done();
        assert!(task.is_complete());
    }

    #[test]
    fn test_take_text_drains() {
        let task = plain_task(Verbosity::Info);
        task.infoln("one");
        assert_eq!(task.take_text(), "one\n");
        assert_eq!(task.text(), "");
    }

    #[test]
    fn test_log_file_mirrors_retained_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");
        let task = Task::new(
            "test",
            TaskConfig {
                verbosity: Verbosity::Info,
                log_path: Some(path.clone()),
                ..TaskConfig::default()
            },
        )
        .unwrap();

        task.infoln("kept");
        task.debugln("dropped");
        task.write_raw(b"raw\n");
        task.done();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "kept\nraw\n");

        // After done() the file no longer receives output, and a second
        // done() must not panic.
        task.infoln("late");
        task.done();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "kept\nraw\n");
    }

    #[test]
    fn test_new_fails_on_unwritable_log_path() {
        let dir = tempfile::tempdir().unwrap();
        // The parent "file.txt" is a file, so creating a log under it fails.
        let blocker = dir.path().join("file.txt");
        std::fs::write(&blocker, "x").unwrap();
        let result = Task::new(
            "test",
            TaskConfig {
                log_path: Some(blocker.join("run.log")),
                ..TaskConfig::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_task_writer_appends() {
        let task = Arc::new(plain_task(Verbosity::Error));
        let mut writer = TaskWriter::new(task.clone());
        writer.write_all(b"line one\n").unwrap();
        writer.write_all(b"line two\n").unwrap();
        assert_eq!(task.text(), "line one\nline two\n");
    }
}
