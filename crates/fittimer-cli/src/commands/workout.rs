//! Interactive run loop shared by `plank` and `hiit`.
//!
//! The engine ticks on the runtime; this loop only relays stdin keys to it
//! and renders whatever comes back over the watch and cue channels.

use std::future::Future;
use std::io::Write;

use fittimer_core::storage::FeedbackConfig;
use fittimer_core::{Completion, Config, Cue, Database, Lifecycle, SessionRecorder};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// How progress is written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// One status line rewritten in place.
    Clock,
    /// One JSON event per update.
    JsonLines,
}

const KEY_HELP: &str = "keys: p pause, r resume, s stop and save, x discard, q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Pause,
    Resume,
    Stop,
    Discard,
    Quit,
}

impl Key {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(Key::Pause),
            "r" | "resume" => Some(Key::Resume),
            "s" | "stop" => Some(Key::Stop),
            "x" | "discard" => Some(Key::Discard),
            "q" | "quit" => Some(Key::Quit),
            _ => None,
        }
    }
}

pub fn block_on<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    // A stdin read still parked on the blocking pool must not hold up exit.
    runtime.shutdown_background();
    Ok(output)
}

/// Callback for `on_complete` plus the receiving end the run loop awaits.
pub fn completion_channel() -> (
    impl FnMut(Completion) + Send + 'static,
    mpsc::UnboundedReceiver<Completion>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback = move |completion| {
        let _ = tx.send(completion);
    };
    (callback, rx)
}

/// What a cue looks like on the terminal, or `None` when muted.
fn cue_text(cue: Cue, feedback: &FeedbackConfig) -> Option<String> {
    if !feedback.enabled || (cue == Cue::Warning && !feedback.warning) {
        return None;
    }
    let bell = if feedback.bell { "\x07" } else { "" };
    Some(format!("{bell}[{}]", cue.label()))
}

fn render_cue(cue: Cue, feedback: &FeedbackConfig) {
    if let Some(text) = cue_text(cue, feedback) {
        eprintln!("\n{text}");
    }
}

/// Start `timer` and run until it completes or the user ends it.
///
/// Returns the completion the engine reported, if any. End of input on
/// stdin counts as quit.
pub async fn drive<S>(
    timer: &dyn Lifecycle,
    mut updates: watch::Receiver<S>,
    render: impl Fn(&S) -> String,
    mut cues: mpsc::UnboundedReceiver<Cue>,
    mut completions: mpsc::UnboundedReceiver<Completion>,
    feedback: &FeedbackConfig,
    output: Output,
) -> std::io::Result<Option<Completion>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    eprintln!("{KEY_HELP}");
    timer.start();

    let ending = loop {
        tokio::select! {
            line = lines.next_line() => {
                let key = match line? {
                    Some(line) => match Key::parse(&line) {
                        Some(key) => key,
                        None => {
                            eprintln!("{KEY_HELP}");
                            continue;
                        }
                    },
                    None => Key::Quit,
                };
                debug!(?key, "key");
                match key {
                    Key::Pause => {
                        timer.pause();
                    }
                    Key::Resume => {
                        timer.resume();
                    }
                    Key::Stop | Key::Quit => {
                        timer.stop();
                        break completions.try_recv().ok();
                    }
                    Key::Discard => {
                        timer.reset();
                        break None;
                    }
                }
            }
            Some(completion) = completions.recv() => break Some(completion),
            Some(cue) = cues.recv() => render_cue(cue, feedback),
            Ok(()) = updates.changed() => {
                let line = render(&*updates.borrow_and_update());
                match output {
                    Output::Clock => write!(stdout, "\r{line}  ")?,
                    Output::JsonLines => writeln!(stdout, "{line}")?,
                }
                stdout.flush()?;
            }
        }
    };

    while let Ok(cue) = cues.try_recv() {
        render_cue(cue, feedback);
    }
    if output == Output::Clock {
        writeln!(stdout)?;
    }
    Ok(ending)
}

/// Record a finished run and print the resulting event.
pub fn finish(
    db: &Database,
    config: &Config,
    completion: Option<Completion>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(completion) = completion else {
        eprintln!("nothing to record");
        return Ok(());
    };
    let recorder = SessionRecorder::new(db, config.recording.clone());
    let event = recorder.record(&completion)?.into_event();
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}
