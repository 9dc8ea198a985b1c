use clap::Args;
use fittimer_core::{Database, ExerciseType};

#[derive(Args)]
pub struct StatsArgs {
    /// Only count one exercise (plank, hiit)
    #[arg(long)]
    exercise: Option<ExerciseType>,
}

pub fn run(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let stats = db.stats(args.exercise)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
