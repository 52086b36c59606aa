use crate::ui::Icons;
use crate::ui::progress_message::{ProgressMessage, ProgressPhase};
use crate::ui::theme;
use indicatif::{HumanDuration, MultiProgress, ProgressBar};
use owo_colors::OwoColorize;
use std::thread;
use std::time::Duration;

pub struct ProgressManager {
    mp: MultiProgress,
    _handle: thread::JoinHandle<()>,
}

fn bar_or_hidden(bar: ProgressBar) -> ProgressBar {
    if console::Term::stdout().is_term() && !crate::output::is_quiet() {
        bar
    } else {
        ProgressBar::hidden()
    }
}

impl ProgressManager {
    /// Spawn the renderer thread. It exits once every sender is dropped.
    pub fn new() -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();

        let mp = MultiProgress::new();
        let parsing = bar_or_hidden(mp.add(ProgressBar::new(0).with_message("Parsing files")));
        let linking = bar_or_hidden(mp.add(ProgressBar::new_spinner().with_message("Linking")));

        let handle = thread::spawn(move || {
            for msg in rx {
                match msg {
                    ProgressMessage::Started {
                        phase: ProgressPhase::Parsing,
                        total,
                    } => {
                        parsing.set_length(total as u64);
                    }
                    ProgressMessage::Progress {
                        phase: ProgressPhase::Parsing,
                        current,
                        file,
                    } => {
                        parsing.set_position(current as u64);
                        if let Some(ref f) = file {
                            parsing.set_message(format!("Parsing: {}", f));
                        }
                    }
                    ProgressMessage::Finished {
                        phase: ProgressPhase::Parsing,
                    } => {
                        parsing.finish_with_message("Done");
                    }
                    ProgressMessage::Started {
                        phase: ProgressPhase::Linking,
                        total: _,
                    } => {
                        linking.enable_steady_tick(Duration::from_millis(100));
                    }
                    ProgressMessage::Finished {
                        phase: ProgressPhase::Linking,
                    } => {
                        linking.finish_with_message("Done");
                    }
                    ProgressMessage::Error(e) => {
                        parsing.println(format!("{} {}", Icons::WARN, e));
                    }
                    _ => {}
                }
            }
        });

        (Self { mp, _handle: handle }, tx)
    }

    pub fn clear(&self) {
        self.mp.clear().ok();
    }

    pub fn finish_with_summary(&self, duration: Duration, files: usize, functions: usize, edges: usize) {
        self.clear();
        if crate::output::is_quiet() {
            return;
        }
        println!();
        println!(
            "{} {}",
            Icons::DONE.style(theme().success.clone()),
            format!("Complete in {}", HumanDuration(duration)).style(theme().success.clone())
        );
        println!(
            "  {} {}  {} {}  {} {}",
            Icons::FILE.style(theme().info.clone()),
            files,
            Icons::FUNCTION.style(theme().info.clone()),
            functions,
            Icons::EDGE.style(theme().info.clone()),
            edges
        );
    }
}
