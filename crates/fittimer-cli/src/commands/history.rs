use chrono::Local;
use clap::Subcommand;
use fittimer_core::format::format_duration;
use fittimer_core::{Database, ExerciseType, SessionRecord};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recorded sessions, newest first
    List {
        /// Only show one exercise (plank, hiit)
        #[arg(long)]
        exercise: Option<ExerciseType>,
        /// Maximum number of sessions
        #[arg(long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a session by id
    Delete {
        /// Session id
        id: i64,
    },
}

fn describe(record: &SessionRecord) -> String {
    let started = record.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    let mut line = format!(
        "{:>5}  {started}  {:<5}  {}",
        record.id,
        record.exercise,
        format_duration(record.duration_secs),
    );
    if let Some(config) = &record.hiit_config {
        line.push_str(&format!(
            "  ({}x {}s/{}s)",
            config.rounds, config.work_secs, config.rest_secs
        ));
    }
    line
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HistoryAction::List {
            exercise,
            limit,
            json,
        } => {
            let sessions = db.list_sessions(exercise, limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            } else if sessions.is_empty() {
                println!("no sessions recorded");
            } else {
                for session in &sessions {
                    println!("{}", describe(session));
                }
            }
        }
        HistoryAction::Delete { id } => {
            if !db.delete_session(id)? {
                return Err(format!("session not found: {id}").into());
            }
            println!("session {id} deleted");
        }
    }
    Ok(())
}
