//! End-to-end lifecycle tests: a manager driving real render-loop threads
//! over an in-memory sink.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use taskline_term::{OutputManager, Verbosity};

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn filtered_logging_flows_to_scrollback_with_one_summary() {
    let sink = SharedSink::default();
    let manager = OutputManager::builder()
        .sink(sink.clone())
        .raw_output()
        .verbosity(Verbosity::Warning)
        .refresh_interval(Duration::from_millis(10))
        .build()
        .unwrap();
    manager.start().unwrap();

    let task = manager.create_task("build", "building").unwrap();
    task.info("x");
    task.warn("y");
    task.error("z");
    assert!(task.is_err());

    manager.complete_task("build");
    assert_eq!(manager.task_count(), 0);
    assert!(task.is_complete());

    manager.stop();

    let out = sink.contents();
    assert!(out.contains("build: y"));
    assert!(out.contains("build: z"));
    assert!(!out.contains("build: x"));
    assert_eq!(out.matches("✘ build").count(), 1);
    // Raw-output mode never emits escape sequences.
    assert!(!out.contains('\u{1b}'));
}

#[test]
fn live_region_repaints_while_running() {
    let sink = SharedSink::default();
    let manager = OutputManager::builder()
        .sink(sink.clone())
        .tty(true)
        .size_probe(|| Some((80, 24)))
        .refresh_interval(Duration::from_millis(5))
        .build()
        .unwrap();
    manager.start().unwrap();
    manager.create_task("work", "working away").unwrap();

    // Wait for at least two frames, so the second has erased the first.
    let deadline = Instant::now() + Duration::from_secs(5);
    while sink.contents().matches("working away").count() < 2 {
        assert!(Instant::now() < deadline, "renderer produced no frames");
        std::thread::sleep(Duration::from_millis(5));
    }
    manager.stop();

    let out = sink.contents();
    assert!(out.contains("working away"));
    assert!(out.contains("\u{1b}[1A"));
    assert!(out.contains("\u{1b}[2K"));
}

#[test]
fn stop_is_idempotent_and_joins_the_loop() {
    let manager = OutputManager::builder()
        .sink(SharedSink::default())
        .build()
        .unwrap();

    // Stop before start is a no-op.
    manager.stop();

    manager.start().unwrap();
    // A second start while running changes nothing.
    manager.start().unwrap();
    manager.stop();
    manager.stop();
}

#[test]
fn final_pass_flushes_pending_scrollback() {
    let sink = SharedSink::default();
    let manager = OutputManager::builder()
        .sink(sink.clone())
        .keep_output(true)
        .keep_completed_summary(true)
        // Long interval: only the final pass can flush in time.
        .refresh_interval(Duration::from_secs(3600))
        .build()
        .unwrap();
    manager.start().unwrap();

    // Give the loop a moment to pass its first (empty) tick, then enqueue.
    std::thread::sleep(Duration::from_millis(50));
    let task = manager.create_task("late", "late arrival").unwrap();
    task.warnln("almost missed");
    manager.complete_task("late");
    manager.stop();

    let out = sink.contents();
    assert!(out.contains("late: almost missed"));
    assert_eq!(out.matches("✔ late").count(), 1);
}

#[test]
fn shared_manager_accepts_concurrent_producers() {
    let sink = SharedSink::default();
    let manager = Arc::new(
        OutputManager::builder()
            .sink(sink.clone())
            .raw_output()
            .verbosity(Verbosity::Debug)
            .refresh_interval(Duration::from_millis(5))
            .build()
            .unwrap(),
    );
    manager.start().unwrap();

    let workers: Vec<_> = (0..4)
        .map(|n| {
            let manager = manager.clone();
            std::thread::spawn(move || {
                let id = format!("worker-{n}");
                let task = manager.create_task(&id, format!("worker {n}")).unwrap();
                for step in 0..50 {
                    task.debugln(&format!("step {step}"));
                }
                manager.complete_task(&id);
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    manager.stop();

    assert_eq!(manager.task_count(), 0);
    let out = sink.contents();
    for n in 0..4 {
        assert_eq!(out.matches(&format!("✔ worker {n}")).count(), 1);
        // Per-task program order survives interleaved draining.
        let first = out.find(&format!("worker-{n}: step 0")).unwrap();
        let last = out.find(&format!("worker-{n}: step 49")).unwrap();
        assert!(first < last);
    }
}
