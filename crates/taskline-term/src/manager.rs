//! The output manager: owns the task registry, the scrollback queue, and
//! the dedicated render-loop thread that repaints the live region.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::Local;
use is_terminal::IsTerminal;
use owo_colors::Style;
use taskline_core::{Formatter, Task, TaskConfig, TaskRegistry, Verbosity};

use crate::error::{Error, Result};
use crate::style::{self, DEFAULT_SPINNER_FRAMES};
use crate::terminal;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Default cap on the rows one task may occupy in the live region,
/// including its status line.
pub const DEFAULT_TASK_TAIL_ROWS: usize = 5;

/// Probe for the terminal dimensions as (columns, rows); consulted once per
/// frame so live resizes are tracked. Substitutable for tests.
pub type SizeProbe = Box<dyn Fn() -> Option<(u16, u16)> + Send + Sync>;

/// Per-task settings for [`OutputManager::create_task_with`].
#[derive(Default)]
pub struct TaskOptions {
    /// Hidden tasks never occupy the live region; their output drains to
    /// scrollback every tick.
    pub hidden: bool,
    /// Overrides the manager's verbosity ceiling for this task.
    pub verbosity: Option<Verbosity>,
}

/// State shared between the manager handle, producer threads holding task
/// references, and the render loop. Every field carries its own lock so
/// logging never waits on an in-progress render.
struct Shared {
    sink: Mutex<Box<dyn Write + Send>>,
    scrollback: Mutex<String>,
    tasks: TaskRegistry,
    tty: bool,
    keep_output: bool,
    keep_summary: bool,
    verbosity: Verbosity,
    colors: HashMap<Verbosity, Style>,
    spinner_frames: Vec<String>,
    tail_rows: usize,
    refresh: Duration,
    size_probe: SizeProbe,
    logs_root: Option<PathBuf>,
    run_stamp: String,
}

impl Shared {
    /// Enqueues finalized output. The scrollback queue holds whole lines,
    /// so a chunk without a trailing line feed gets one.
    fn push_scrollback(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut scrollback = self.scrollback.lock().unwrap();
        scrollback.push_str(text);
        if !text.ends_with('\n') {
            scrollback.push('\n');
        }
    }
}

/// Builder for [`OutputManager`]. All settings have defaults; `build` fails
/// only if the logs root cannot be created.
pub struct OutputManagerBuilder {
    sink: Option<Box<dyn Write + Send>>,
    verbosity: Verbosity,
    refresh: Duration,
    raw_output: bool,
    keep_output: bool,
    keep_summary: bool,
    tty: Option<bool>,
    colors: HashMap<Verbosity, Style>,
    spinner_frames: Vec<String>,
    tail_rows: usize,
    size_probe: SizeProbe,
    logs_root: Option<PathBuf>,
}

impl Default for OutputManagerBuilder {
    fn default() -> Self {
        let colors = [
            Verbosity::Error,
            Verbosity::Warning,
            Verbosity::Info,
            Verbosity::Debug,
            Verbosity::Trace,
        ]
        .into_iter()
        .map(|level| (level, style::level_style(level)))
        .collect();

        Self {
            sink: None,
            verbosity: Verbosity::Info,
            refresh: DEFAULT_REFRESH_INTERVAL,
            raw_output: false,
            keep_output: false,
            keep_summary: false,
            tty: None,
            colors,
            spinner_frames: DEFAULT_SPINNER_FRAMES.iter().map(|s| s.to_string()).collect(),
            tail_rows: DEFAULT_TASK_TAIL_ROWS,
            size_probe: Box::new(terminal::probe_size),
            logs_root: None,
        }
    }
}

impl OutputManagerBuilder {
    /// Replaces the output sink (default: stdout). With a custom sink the
    /// tty flag defaults to off; override it with [`Self::tty`].
    pub fn sink(mut self, sink: impl Write + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Default verbosity ceiling for tasks created through the manager.
    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh = interval;
        self
    }

    /// Treats the sink as an append log: disables live-region redraw and
    /// forces keep-output and keep-completed-summary.
    pub fn raw_output(mut self) -> Self {
        self.raw_output = true;
        self
    }

    /// Keeps finished tasks' output by draining it into scrollback instead
    /// of discarding it.
    pub fn keep_output(mut self, keep: bool) -> Self {
        self.keep_output = keep;
        self
    }

    /// Emits a final `✔ <title>` / `✘ <title>` scrollback line when a task
    /// is removed. Only takes effect together with keep-output.
    pub fn keep_completed_summary(mut self, keep: bool) -> Self {
        self.keep_summary = keep;
        self
    }

    /// Forces the tty flag instead of probing stdout.
    pub fn tty(mut self, tty: bool) -> Self {
        self.tty = Some(tty);
        self
    }

    /// Overrides the color for one level.
    pub fn color(mut self, level: Verbosity, style: Style) -> Self {
        self.colors.insert(level, style);
        self
    }

    pub fn spinner_frames(mut self, frames: &[&str]) -> Self {
        if !frames.is_empty() {
            self.spinner_frames = frames.iter().map(|s| s.to_string()).collect();
        }
        self
    }

    /// Caps the rows one task may occupy in the live region, status line
    /// included.
    pub fn task_tail_rows(mut self, rows: usize) -> Self {
        self.tail_rows = rows.max(1);
        self
    }

    /// Substitutes the terminal-dimensions probe (used by tests to pin a
    /// fixed size).
    pub fn size_probe(
        mut self,
        probe: impl Fn() -> Option<(u16, u16)> + Send + Sync + 'static,
    ) -> Self {
        self.size_probe = Box::new(probe);
        self
    }

    /// Enables per-task persistent log files under `root`.
    pub fn logs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.logs_root = Some(root.into());
        self
    }

    pub fn build(self) -> Result<OutputManager> {
        if let Some(root) = &self.logs_root {
            fs::create_dir_all(root).map_err(|err| {
                Error::Setup(format!(
                    "failed creating logs root {}: {}",
                    root.display(),
                    err
                ))
            })?;
        }

        let custom_sink = self.sink.is_some();
        let tty = if self.raw_output {
            false
        } else {
            self.tty
                .unwrap_or_else(|| !custom_sink && io::stdout().is_terminal())
        };
        let (keep_output, keep_summary) = if self.raw_output {
            (true, true)
        } else {
            (self.keep_output, self.keep_summary)
        };

        Ok(OutputManager {
            shared: Arc::new(Shared {
                sink: Mutex::new(self.sink.unwrap_or_else(|| Box::new(io::stdout()))),
                scrollback: Mutex::new(String::new()),
                tasks: TaskRegistry::new(),
                tty,
                keep_output,
                keep_summary,
                verbosity: self.verbosity,
                colors: self.colors,
                spinner_frames: self.spinner_frames,
                tail_rows: self.tail_rows,
                refresh: self.refresh,
                size_probe: self.size_probe,
                logs_root: self.logs_root,
                run_stamp: Local::now().format("%Y_%m_%d_%H_%M_%S").to_string(),
            }),
            handle: Mutex::new(None),
            stop_tx: Mutex::new(None),
        })
    }
}

/// Renders live progress for concurrently-running named tasks: one status
/// line per task plus a bounded output tail, repainted in place, with
/// finished and hidden tasks' output scrolling back above the live region.
pub struct OutputManager {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
    stop_tx: Mutex<Option<Sender<()>>>,
}

impl OutputManager {
    pub fn builder() -> OutputManagerBuilder {
        OutputManagerBuilder::default()
    }

    /// Default verbosity ceiling handed to tasks created through the
    /// manager.
    pub fn verbosity(&self) -> Verbosity {
        self.shared.verbosity
    }

    pub fn task_count(&self) -> usize {
        self.shared.tasks.len()
    }

    /// Creates a task wired with the manager's formatter (level-colored
    /// `"<id>: <msg>"`), verbosity ceiling, and, when a logs root is
    /// configured, a per-task log file, then registers it. Fails only if
    /// the log file cannot be created.
    pub fn create_task(&self, id: &str, title: impl Into<String>) -> Result<Arc<Task>> {
        self.create_task_with(id, title, TaskOptions::default())
    }

    pub fn create_task_with(
        &self,
        id: &str,
        title: impl Into<String>,
        options: TaskOptions,
    ) -> Result<Arc<Task>> {
        let colors = self.shared.colors.clone();
        let tty = self.shared.tty;
        let prefix = id.to_string();
        let formatter: Formatter = Box::new(move |msg, level| {
            style::paint(
                &format!("{prefix}: {msg}"),
                colors.get(&level).copied(),
                tty,
            )
        });

        let log_path = self.shared.logs_root.as_ref().map(|root| {
            root.join(id.replace(['/', '\\'], "_"))
                .join(format!("{}.log", self.shared.run_stamp))
        });

        let task = Arc::new(Task::new(
            title,
            TaskConfig {
                formatter: Some(formatter),
                verbosity: options.verbosity.unwrap_or(self.shared.verbosity),
                hidden: options.hidden,
                log_path,
            },
        )?);
        self.add_task(id, task.clone());
        Ok(task)
    }

    /// Registers an externally built task. An existing task under the same
    /// id is replaced in place.
    pub fn add_task(&self, id: impl Into<String>, task: Arc<Task>) {
        self.shared.tasks.insert(id, task);
    }

    /// Marks the task done, then removes it. Unknown ids are a silent
    /// no-op.
    pub fn complete_task(&self, id: &str) {
        let Some(task) = self.shared.tasks.get(id) else {
            return;
        };
        task.done();
        self.remove_task(id);
    }

    /// Removes the task from the live region. With keep-output its
    /// remaining buffer drains into scrollback, and with
    /// keep-completed-summary a final `✔`/`✘` title line follows exactly
    /// once, only if the task was still registered. Unknown ids are a
    /// silent no-op.
    pub fn remove_task(&self, id: &str) {
        let Some(task) = self.shared.tasks.remove(id) else {
            return;
        };

        if self.shared.keep_output {
            self.shared.push_scrollback(&task.take_text());
            if self.shared.keep_summary {
                let (glyph, glyph_style) = style::status_glyph(task.is_err(), true, "");
                self.shared.push_scrollback(&format!(
                    "{} {}\n",
                    style::paint(glyph, glyph_style, self.shared.tty),
                    task.title()
                ));
            }
        }
    }

    /// Spawns the render-loop thread. A second call while the loop is
    /// running is a no-op.
    pub fn start(&self) -> Result<()> {
        let mut handle = self.handle.lock().unwrap();
        if handle.is_some() {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel();
        let shared = self.shared.clone();
        let joiner = std::thread::Builder::new()
            .name("taskline-render".to_string())
            .spawn(move || render_loop(shared, rx))?;

        *self.stop_tx.lock().unwrap() = Some(tx);
        *handle = Some(joiner);
        Ok(())
    }

    /// Signals the loop to shut down and blocks until it has performed one
    /// final render pass and exited, so no buffered scrollback is dropped.
    /// Safe to call repeatedly, or without a prior `start`.
    pub fn stop(&self) {
        let stop_tx = self.stop_tx.lock().unwrap().take();
        if let Some(tx) = stop_tx {
            let _ = tx.send(());
        }
        let handle = self.handle.lock().unwrap().take();
        if let Some(joiner) = handle {
            let _ = joiner.join();
        }
    }
}

/// Spinner position and previous-frame height live on the loop thread
/// alone; producers never touch them.
struct RenderState {
    spinner: usize,
    prev_lines: usize,
}

fn render_loop(shared: Arc<Shared>, stop_rx: Receiver<()>) {
    let mut state = RenderState {
        spinner: 0,
        prev_lines: 0,
    };
    loop {
        // Sink failures are best-effort: the frame is abandoned, the loop
        // keeps ticking.
        let _ = render_tick(&shared, &mut state, false);
        match stop_rx.recv_timeout(shared.refresh) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = render_tick(&shared, &mut state, true);
                return;
            }
        }
    }
}

fn render_tick(shared: &Shared, state: &mut RenderState, final_pass: bool) -> io::Result<()> {
    let mut snapshot: Vec<(String, Arc<Task>)> = Vec::new();
    shared
        .tasks
        .for_each(|id, task| snapshot.push((id.to_string(), task.clone())));

    if snapshot.is_empty() && shared.scrollback.lock().unwrap().is_empty() {
        return Ok(());
    }

    let size = (shared.size_probe)();
    let width = size.map(|(w, _)| w as usize).unwrap_or(80);
    let budget = {
        let per_task = match size {
            Some((_, h)) if !snapshot.is_empty() => (h as usize).saturating_sub(1) / snapshot.len(),
            _ => 1,
        };
        per_task.min(shared.tail_rows).max(1)
    };

    let mut frame = String::new();
    let mut frame_lines = 0;

    for (_, task) in &snapshot {
        if shared.tty && !task.is_hidden() {
            let spinner_frame = &shared.spinner_frames[state.spinner];
            let (glyph, glyph_style) =
                style::status_glyph(task.is_err(), task.is_complete(), spinner_frame);
            frame.push_str(&style::paint(glyph, glyph_style, true));
            frame.push(' ');
            frame.push_str(&task.title());
            frame.push('\n');
            frame_lines += 1;

            // On the final pass only failed or kept-output tasks still show
            // their tail.
            let include_tail = !final_pass || task.is_err() || shared.keep_output;
            if include_tail && budget > 1 {
                let tail_width = width.saturating_sub(2).max(1);
                let (tail, rows) = task.last_lines(budget - 1, tail_width);
                if rows > 0 {
                    frame.push_str(&tail);
                    if !tail.ends_with('\n') {
                        frame.push('\n');
                    }
                    frame_lines += rows;
                }
            }
        } else {
            shared.push_scrollback(&task.take_text());
        }
    }

    let mut sink = shared.sink.lock().unwrap();
    if state.prev_lines > 0 && shared.tty {
        terminal::clear_lines_up(&mut *sink, state.prev_lines)?;
    }

    let pending = std::mem::take(&mut *shared.scrollback.lock().unwrap());
    sink.write_all(pending.as_bytes())?;
    sink.write_all(frame.as_bytes())?;

    if state.prev_lines > frame_lines && shared.tty {
        let shrinkage = state.prev_lines - frame_lines;
        for _ in 0..shrinkage {
            sink.write_all(b"\n")?;
        }
        terminal::clear_lines_up(&mut *sink, shrinkage)?;
    }
    sink.flush()?;

    state.spinner = (state.spinner + 1) % shared.spinner_frames.len();
    state.prev_lines = frame_lines;
    Ok(())
}
