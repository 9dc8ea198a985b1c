use clap::Subcommand;
use fittimer_core::format::format_clock;
use fittimer_core::{Database, IntervalConfig};

#[derive(Subcommand)]
pub enum PresetAction {
    /// Save a preset, replacing any with the same name
    Add {
        /// Preset name
        name: String,
        /// Work phase length in seconds (1-300)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=300))]
        work: u32,
        /// Rest phase length in seconds (0-120)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=120))]
        rest: u32,
        /// Number of work rounds (1-50)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=50))]
        rounds: u32,
    },
    /// List saved presets
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a preset
    Delete {
        /// Preset name
        name: String,
    },
}

pub fn run(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        PresetAction::Add {
            name,
            work,
            rest,
            rounds,
        } => {
            let config = IntervalConfig::new(work, rest, rounds)?;
            let preset = db.save_preset(&name, &config)?;
            println!("{}", serde_json::to_string_pretty(&preset)?);
        }
        PresetAction::List { json } => {
            let presets = db.list_presets()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&presets)?);
            } else {
                for preset in &presets {
                    let c = &preset.config;
                    println!(
                        "{:<16} {}x {}s/{}s  {}",
                        preset.name,
                        c.rounds,
                        c.work_secs,
                        c.rest_secs,
                        format_clock(c.total_secs()),
                    );
                }
            }
        }
        PresetAction::Delete { name } => {
            if !db.delete_preset(&name)? {
                return Err(format!("preset not found: {name}").into());
            }
            println!("preset {name} deleted");
        }
    }
    Ok(())
}
