use clap::Subcommand;
use fittimer_core::Config;

/// Keys are `<section>.<field>` over the `[hiit]`, `[recording]` and
/// `[feedback]` tables of `config.toml`.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting
    Get {
        /// Setting key, e.g. "hiit.rounds", "recording.plank_min_secs", "feedback.bell"
        key: String,
    },
    /// Change one setting and save it
    Set {
        /// Setting key
        key: String,
        /// New value; HIIT lengths are checked before saving
        value: String,
    },
    /// Print every setting
    List {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
    /// Print where the config file lives
    Path,
    /// Restore the default HIIT lengths, recording minimums and feedback
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            let stored = config.get(&key).unwrap_or(value);
            println!("{key} = {stored}");
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            eprintln!("restored defaults in {}", Config::path()?.display());
        }
    }
    Ok(())
}
