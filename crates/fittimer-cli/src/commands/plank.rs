use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use fittimer_core::format::format_clock;
use fittimer_core::{ChannelSink, Config, Database, Event, RunStatus, SimpleTimer, StopwatchState};

use super::workout::{self, Output};

#[derive(Args)]
pub struct PlankArgs {
    /// Stream state updates as JSON lines instead of a clock
    #[arg(long)]
    json: bool,
}

fn status_line(state: &StopwatchState) -> String {
    let clock = format_clock(state.elapsed_secs);
    match state.status {
        RunStatus::Paused => format!("plank {clock} (paused)"),
        _ => format!("plank {clock}"),
    }
}

fn json_line(state: &StopwatchState) -> String {
    let event = Event::StopwatchSnapshot {
        state: state.clone(),
        at: Utc::now(),
    };
    serde_json::to_string(&event).unwrap_or_default()
}

pub fn run(args: PlankArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    let completion = workout::block_on(async {
        let (sink, cues) = ChannelSink::new();
        let timer = SimpleTimer::new(Arc::new(sink));
        let (callback, completions) = workout::completion_channel();
        timer.on_complete(callback);

        let (render, output): (fn(&StopwatchState) -> String, _) = if args.json {
            (json_line, Output::JsonLines)
        } else {
            (status_line, Output::Clock)
        };
        workout::drive(
            &timer,
            timer.subscribe(),
            render,
            cues,
            completions,
            &config.feedback,
            output,
        )
        .await
    })??;

    workout::finish(&db, &config, completion)
}
