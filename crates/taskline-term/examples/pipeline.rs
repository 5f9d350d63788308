//! Renders a small fake build pipeline: three workers logging concurrently
//! while the manager repaints their status lines and tails in place.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use taskline_term::{OutputManager, Verbosity};

fn main() -> Result<()> {
    let manager = Arc::new(
        OutputManager::builder()
            .verbosity(Verbosity::Debug)
            .keep_output(true)
            .keep_completed_summary(true)
            .build()?,
    );
    manager.start()?;

    let workers: Vec<_> = ["fetch", "compile", "link"]
        .into_iter()
        .enumerate()
        .map(|(n, id)| {
            let manager = manager.clone();
            thread::spawn(move || -> Result<()> {
                let task = manager.create_task(id, format!("{id}: starting"))?;
                for step in 1..=15 {
                    task.set_status(format!("{id} ({step}/15)"));
                    task.debugln(&format!("step {step} of 15"));
                    thread::sleep(Duration::from_millis(120 + 60 * n as u64));
                }
                if id == "link" {
                    task.errorln("undefined symbol: _start");
                } else {
                    task.infoln("ok");
                }
                manager.complete_task(id);
                Ok(())
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker panicked")?;
    }
    manager.stop();
    Ok(())
}
