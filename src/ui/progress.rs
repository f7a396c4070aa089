use crate::engine::GraphStats;
use crate::linker::GlobalLinkerStats;
use crate::ui::progress_message::{ProgressMessage, ProgressPhase};
use console::style;
use indicatif::{HumanDuration, MultiProgress, ProgressBar};
use std::thread;
use std::time::Duration;

pub struct ProgressManager {
    mp: MultiProgress,
    handle: thread::JoinHandle<()>,
}

fn bar(mp: &MultiProgress, bar: ProgressBar) -> ProgressBar {
    if console::Term::stderr().is_term() {
        mp.add(bar)
    } else {
        ProgressBar::hidden()
    }
}

impl ProgressManager {
    pub fn new(total_files: usize) -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();

        let mp = MultiProgress::new();
        let translating = bar(
            &mp,
            ProgressBar::new(total_files as u64).with_message("Translating units"),
        );
        let linking = bar(&mp, ProgressBar::new_spinner().with_message("Linking units"));
        let printer = mp.clone();

        let handle = thread::spawn(move || {
            for msg in rx {
                match msg {
                    ProgressMessage::Started {
                        phase: ProgressPhase::Translating,
                        total,
                    } => translating.set_length(total as u64),
                    ProgressMessage::Progress {
                        phase: ProgressPhase::Translating,
                        file,
                        ..
                    } => {
                        translating.inc(1);
                        if let Some(f) = file {
                            translating.set_message(format!("Translating: {}", f));
                        }
                    }
                    ProgressMessage::Finished {
                        phase: ProgressPhase::Translating,
                    } => translating.finish_with_message("Done"),
                    ProgressMessage::Started {
                        phase: ProgressPhase::Linking,
                        ..
                    } => linking.enable_steady_tick(Duration::from_millis(100)),
                    ProgressMessage::Finished {
                        phase: ProgressPhase::Linking,
                    } => linking.finish_with_message("Done"),
                    ProgressMessage::Error(e) => {
                        printer.println(format!("{} {}", style("aborted").red(), e)).ok();
                    }
                    _ => {}
                }
            }
        });

        (Self { mp, handle }, tx)
    }

    /// Wait for the renderer to drain, then print the summary.
    ///
    /// Every sender must be dropped first or this blocks.
    pub fn finish_with_summary(
        self,
        duration: Duration,
        stats: &GraphStats,
        linker: &GlobalLinkerStats,
        failures: usize,
    ) {
        let Self { mp, handle } = self;
        if handle.join().is_err() {
            tracing::warn!("progress renderer panicked");
        }
        mp.clear().ok();
        eprintln!();
        eprintln!(
            "{}",
            style(format!("Complete in {}", HumanDuration(duration))).green()
        );
        eprintln!(
            "  units {}  nodes {}  edges {}  links {}/{}",
            stats.units, stats.total_nodes, stats.total_edges, linker.resolved, linker.total
        );
        if failures > 0 {
            eprintln!("  {}", style(format!("{} units failed", failures)).red());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_waits_for_renderer() {
        let (progress, tx) = ProgressManager::new(1);
        tx.send(ProgressMessage::Started {
            phase: ProgressPhase::Translating,
            total: 1,
        })
        .unwrap();
        tx.send(ProgressMessage::Finished {
            phase: ProgressPhase::Translating,
        })
        .unwrap();
        drop(tx);

        // returns only once the renderer has drained the channel and exited
        progress.finish_with_summary(
            Duration::from_millis(5),
            &GraphStats::default(),
            &GlobalLinkerStats::default(),
            0,
        );
    }
}
