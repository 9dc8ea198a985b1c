use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use fittimer_core::format::format_clock;
use fittimer_core::storage::HiitDefaults;
use fittimer_core::{
    ChannelSink, Config, Database, Event, IntervalConfig, IntervalSnapshot, IntervalTimer, Phase,
    RunStatus, ValidationError,
};

use super::workout::{self, Output};

#[derive(Args)]
pub struct HiitArgs {
    /// Work phase length in seconds (1-300)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=300))]
    work: Option<u32>,
    /// Rest phase length in seconds (0-120; 0 switches straight back)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=120))]
    rest: Option<u32>,
    /// Number of work rounds (1-50)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=50))]
    rounds: Option<u32>,
    /// Use a saved preset instead of explicit lengths
    #[arg(long, conflicts_with_all = ["work", "rest", "rounds"])]
    preset: Option<String>,
    /// Stream snapshots as JSON lines instead of a status line
    #[arg(long)]
    json: bool,
}

/// Command-line lengths layered over the configured defaults.
fn layered_config(args: &HiitArgs, defaults: &HiitDefaults) -> Result<IntervalConfig, ValidationError> {
    IntervalConfig::new(
        args.work.unwrap_or(defaults.work_secs),
        args.rest.unwrap_or(defaults.rest_secs),
        args.rounds.unwrap_or(defaults.rounds),
    )
}

fn status_line(snapshot: &IntervalSnapshot) -> String {
    let state = &snapshot.state;
    let phase = match state.phase {
        Phase::Idle => "ready",
        Phase::Work => "WORK",
        Phase::Rest => "rest",
        Phase::Completed => "done",
    };
    let paused = if snapshot.status == RunStatus::Paused {
        " (paused)"
    } else {
        ""
    };
    format!(
        "{phase} {remaining} | round {round}/{rounds} | {elapsed} {pct:.0}%{paused}",
        remaining = format_clock(u64::from(state.time_remaining)),
        round = state.current_round,
        rounds = state.total_rounds,
        elapsed = format_clock(state.total_elapsed),
        pct = snapshot.progress_pct(),
    )
}

fn json_line(snapshot: &IntervalSnapshot) -> String {
    let event = Event::IntervalSnapshot {
        snapshot: *snapshot,
        at: Utc::now(),
    };
    serde_json::to_string(&event).unwrap_or_default()
}

pub fn run(args: HiitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    let interval = match &args.preset {
        Some(name) => {
            db.get_preset(name)?
                .ok_or_else(|| format!("preset not found: {name}"))?
                .config
        }
        None => layered_config(&args, &config.hiit)?,
    };
    eprintln!(
        "{} rounds of {}s work / {}s rest, {} total",
        interval.rounds,
        interval.work_secs,
        interval.rest_secs,
        format_clock(interval.total_secs()),
    );

    let completion = workout::block_on(async {
        let (sink, cues) = ChannelSink::new();
        let timer = IntervalTimer::new(interval, Arc::new(sink));
        let (callback, completions) = workout::completion_channel();
        timer.on_complete(callback);

        let (render, output): (fn(&IntervalSnapshot) -> String, _) = if args.json {
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
