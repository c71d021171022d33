use clap::{Parser, Subcommand};
use fitgen_core::catalog::{BuiltinSource, FallbackSource, JsonFileSource};
use fitgen_core::config::DataConfig;
use fitgen_core::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

mod interactive;

use interactive::Outcome;

#[derive(Parser)]
#[command(name = "fitgen")]
#[command(about = "Personalized workout generator and session tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or edit the user profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// List exercise definitions
    Catalog {
        /// Only check the catalog for errors
        #[arg(long)]
        validate: bool,
    },

    /// Generate a new workout plan from the profile
    Generate {
        /// Seed the exercise draw (for reproducible plans)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List the current workouts
    Workouts,

    /// Perform a workout
    Start {
        /// Workout id as shown by `fitgen workouts`
        workout_id: String,

        /// Skip every phase and submit immediately (for testing)
        #[arg(long)]
        auto_complete: bool,

        /// Rating from 1 to 5, used with --auto-complete
        #[arg(long, requires = "auto_complete")]
        rating: Option<u8>,

        /// Notes, used with --auto-complete
        #[arg(long, requires = "auto_complete")]
        notes: Option<String>,
    },

    /// Show progress history grouped by day
    History {
        /// Only show the last N days
        #[arg(long)]
        days: Option<i64>,
    },

    /// Show level, streak and achievements
    Stats,

    /// Roll up the progress log to CSV
    Rollup {
        /// Clean up processed log files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print the stored profile
    Show,

    /// Create or replace the profile
    Set {
        #[arg(long)]
        name: String,

        /// beginner, intermediate or advanced
        #[arg(long)]
        level: FitnessLevel,

        #[arg(long = "goal")]
        goals: Vec<String>,

        #[arg(long)]
        equipment: Vec<String>,

        #[arg(long = "focus")]
        focus_areas: Vec<String>,

        /// Workouts per week
        #[arg(long)]
        frequency: Option<u8>,

        /// Preferred workout length in minutes
        #[arg(long)]
        duration: Option<u32>,
    },
}

fn main() -> ExitCode {
    fitgen_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data = DataConfig {
        data_dir: cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone()),
    };

    match cli.command {
        Commands::Profile { action } => cmd_profile(&data, action),
        Commands::Catalog { validate } => cmd_catalog(&config, validate),
        Commands::Generate { seed } => cmd_generate(&data, &config, seed),
        Commands::Workouts => cmd_workouts(&data),
        Commands::Start {
            workout_id,
            auto_complete,
            rating,
            notes,
        } => cmd_start(&data, &config, &workout_id, auto_complete, rating, notes),
        Commands::History { days } => cmd_history(&data, days),
        Commands::Stats => cmd_stats(&data, &config),
        Commands::Rollup { cleanup } => cmd_rollup(&data, cleanup),
    }
}

fn catalog_handle(config: &Config) -> CatalogHandle<Box<dyn ExerciseSource>> {
    let source: Box<dyn ExerciseSource> = match &config.catalog.path {
        Some(path) if config.catalog.fallback_to_builtin => {
            Box::new(FallbackSource::new(JsonFileSource::new(path)))
        }
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => Box::new(BuiltinSource),
    };
    CatalogHandle::new(source)
}

fn cmd_profile(data: &DataConfig, action: ProfileAction) -> Result<()> {
    let store = ProfileStore::new(data.profile_path());

    match action {
        ProfileAction::Show => match store.load() {
            Some(profile) => display_profile(&profile),
            None => println!("No profile yet. Create one with `fitgen profile set`."),
        },
        ProfileAction::Set {
            name,
            level,
            goals,
            equipment,
            focus_areas,
            frequency,
            duration,
        } => {
            // Keep questionnaire answers this command doesn't cover
            let mut profile = store.load().unwrap_or_default();
            profile.name = name;
            profile.fitness_level = level;
            profile.fitness_goals = goals;
            profile.equipment_access = equipment;
            profile.focus_areas = focus_areas;
            profile.workout_frequency = frequency;
            profile.workout_duration_minutes = duration;
            store.save(&profile)?;
            println!("✓ Profile saved");
            display_profile(&profile);
        }
    }

    Ok(())
}

fn cmd_catalog(config: &Config, validate: bool) -> Result<()> {
    let handle = catalog_handle(config);
    let catalog = handle.snapshot()?;

    if validate {
        println!("✓ Catalog valid ({} exercises)", catalog.len());
        return Ok(());
    }

    for def in &catalog.exercises {
        println!(
            "{:<22} {:<12} {:<18} {}",
            def.id,
            def.modality(),
            def.kind.prescription(),
            def.equipment
        );
    }
    println!("\n{} exercises", catalog.len());
    Ok(())
}

fn cmd_generate(data: &DataConfig, config: &Config, seed: Option<u64>) -> Result<()> {
    let Some(profile) = ProfileStore::new(data.profile_path()).load() else {
        return Err(Error::Other(
            "No profile found. Create one with `fitgen profile set --name <NAME> --level <LEVEL>`".into(),
        ));
    };

    let handle = catalog_handle(config);
    let catalog = handle.snapshot()?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut store = JsonWorkoutStore::new(data.workouts_path());
    let mut planner = WorkoutPlanner::new();
    let report = planner.regenerate(&profile, catalog, &mut store, &mut rng, chrono::Utc::now());

    println!("✓ Generated {} workouts for {}", report.generated, profile.name);
    if report.is_partial_failure() {
        println!(
            "⚠ {} of {} workouts could not be saved",
            report.failures.len(),
            report.generated
        );
    }
    println!();
    for workout in planner.workouts() {
        display_workout(workout);
    }
    Ok(())
}

fn cmd_workouts(data: &DataConfig) -> Result<()> {
    let store = JsonWorkoutStore::new(data.workouts_path());
    let planner = WorkoutPlanner::from_workouts(store.list_workouts()?);

    if planner.workouts().is_empty() {
        println!("No workouts yet. Run `fitgen generate` to create a plan.");
        return Ok(());
    }

    for workout in planner.workouts() {
        let mark = if workout.completed { "✓" } else { " " };
        println!(
            "[{}] {}  {:<22} {:>3} min  {} exercises",
            mark,
            workout.id,
            workout.name,
            workout.duration_minutes(),
            workout.exercises.len()
        );
    }

    if let Some(next) = planner.next_workout() {
        println!("\nNext up: {} ({})", next.name, next.id);
    }
    Ok(())
}

fn cmd_start(
    data: &DataConfig,
    config: &Config,
    workout_id: &str,
    auto_complete: bool,
    rating: Option<u8>,
    notes: Option<String>,
) -> Result<()> {
    let mut store = JsonWorkoutStore::new(data.workouts_path());
    let mut recorder = JsonlProgressLog::new(data.progress_log_path());

    let id = Uuid::parse_str(workout_id)
        .map_err(|_| Error::WorkoutNotFound(workout_id.to_string()))?;
    let mut session = WorkoutSession::for_workout(&store.list_workouts()?, id)?
        .with_rest_seconds(config.session.rest_seconds);

    display_workout(session.workout());

    let feedback = if auto_complete {
        skip_to_end(&mut session);
        Feedback {
            rating: rating.map(Rating::try_from).transpose()?,
            notes,
        }
    } else {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut stdout = io::stdout();

        match interactive::run_session(&mut session, &mut input, &mut stdout)? {
            Outcome::Finished => prompt_feedback(&mut input)?,
            Outcome::Abandoned => {
                if let Some(entry) = session.abandon(chrono::Utc::now()) {
                    recorder.record_progress(&entry)?;
                }
                println!("\nWorkout abandoned. Time so far was saved to your history.");
                return Ok(());
            }
        }
    };

    let entry = loop {
        match session.submit(feedback.clone(), &mut recorder, &mut store, chrono::Utc::now()) {
            Ok(entry) => break entry,
            Err(e) if !auto_complete && confirm_retry(&e)? => continue,
            Err(e) => return Err(e),
        }
    };

    println!("\n✓ Workout logged! {} total", format_clock(entry.total_seconds()));
    Ok(())
}

/// Skip every remaining phase without recording time
fn skip_to_end(session: &mut WorkoutSession) {
    session.start();
    while !session.is_finished() {
        let now = chrono::Utc::now();
        session.skip();
        if !session.advance(now) {
            tracing::warn!("Session stuck in phase {:?}", session.phase());
            break;
        }
    }
}

fn prompt_feedback(input: &mut impl io::BufRead) -> Result<Feedback> {
    let rating = loop {
        print!("Rate this workout 1-5 (Enter to skip): ");
        io::stdout().flush()?;
        let Some(line) = interactive::read_line(input)? else {
            break None;
        };
        if line.is_empty() {
            break None;
        }
        match line.parse::<u8>().map_err(|_| Error::Other(line.clone())).and_then(Rating::try_from) {
            Ok(rating) => break Some(rating),
            Err(_) => println!("Please enter a number from 1 to 5."),
        }
    };

    print!("Notes (Enter to skip): ");
    io::stdout().flush()?;
    let notes = interactive::read_line(input)?;

    Ok(Feedback { rating, notes })
}

fn confirm_retry(error: &Error) -> Result<bool> {
    eprintln!("Failed to save workout: {}", error);
    print!("Retry? [y/N] ");
    io::stdout().flush()?;
    let answer = interactive::read_line(&mut io::stdin().lock())?;
    Ok(matches!(answer.as_deref(), Some("y") | Some("Y")))
}

fn cmd_history(data: &DataConfig, days: Option<i64>) -> Result<()> {
    let log_path = data.progress_log_path();
    let csv_path = data.progress_csv_path();
    let entries = match days {
        Some(days) => history::load_recent_entries(&log_path, &csv_path, days)?,
        None => history::load_all_entries(&log_path, &csv_path)?,
    };

    if entries.is_empty() {
        println!("No workouts recorded yet.");
        return Ok(());
    }

    for (day, day_entries) in history::group_by_day(&entries) {
        println!("{}", day.format("%A, %B %-d, %Y"));
        for entry in day_entries {
            let status = if entry.completed { "✓" } else { "✗" };
            let rating = entry
                .rating
                .map(|r| format!("  {}/5", r.value()))
                .unwrap_or_default();
            println!(
                "  {} {:<22} {}{}",
                status,
                entry.workout_name,
                format_clock(entry.total_seconds()),
                rating
            );
            if let Some(notes) = &entry.notes {
                println!("      {}", notes);
            }
        }
    }
    Ok(())
}

fn cmd_stats(data: &DataConfig, config: &Config) -> Result<()> {
    let entries = history::load_all_entries(&data.progress_log_path(), &data.progress_csv_path())?;
    let today = chrono::Utc::now().date_naive();
    let summary = ProgressSummary::from_entries(&entries, config.stats.xp_per_workout, today);

    println!("Level {}  ({} XP, {} to next level)", summary.level, summary.experience, summary.xp_to_next_level);
    println!("Workouts completed: {}", summary.completed_workouts);
    println!("Current streak:     {} days", summary.current_streak_days);
    println!("Time trained:       {} min", summary.total_seconds / 60);
    match summary.average_rating {
        Some(avg) => println!("Average rating:     {:.1}/5", avg),
        None => println!("Average rating:     -"),
    }

    println!("\nAchievements");
    for achievement in summary.achievements() {
        let mark = if achievement.unlocked { "★" } else { "☆" };
        println!(
            "  {} {:<22} {:>4}/{:<4} {}",
            mark, achievement.title, achievement.progress, achievement.target, achievement.description
        );
    }
    Ok(())
}

fn cmd_rollup(data: &DataConfig, cleanup: bool) -> Result<()> {
    let log_path = data.progress_log_path();
    let csv_path = data.progress_csv_path();

    if !log_path.exists() {
        println!("No progress log found - nothing to roll up.");
        return Ok(());
    }

    let count = csv_rollup::log_to_csv_and_archive(&log_path, &csv_path)?;

    println!("✓ Rolled up {} entries to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        if let Some(log_dir) = log_path.parent() {
            let cleaned = csv_rollup::cleanup_processed_logs(log_dir)?;
            if cleaned > 0 {
                println!("✓ Cleaned up {} processed log files", cleaned);
            }
        }
    }

    Ok(())
}

fn display_profile(profile: &UserProfile) {
    println!("Name:      {}", profile.name);
    println!("Level:     {}", profile.fitness_level);
    if !profile.fitness_goals.is_empty() {
        println!("Goals:     {}", profile.fitness_goals.join(", "));
    }
    if !profile.equipment_access.is_empty() {
        println!("Equipment: {}", profile.equipment_access.join(", "));
    }
    if !profile.focus_areas.is_empty() {
        println!("Focus:     {}", profile.focus_areas.join(", "));
    }
    if let Some(frequency) = profile.workout_frequency {
        println!("Frequency: {} per week", frequency);
    }
    if let Some(minutes) = profile.workout_duration_minutes {
        println!("Duration:  {} min", minutes);
    }
}

fn display_workout(workout: &Workout) {
    println!("╭─────────────────────────────────────────╮");
    println!("│  {}", workout.name);
    println!("╰─────────────────────────────────────────╯");
    println!(
        "  {}  |  {} min  |  {}",
        workout.id,
        workout.duration_minutes(),
        workout.difficulty
    );
    for (i, exercise) in workout.exercises.iter().enumerate() {
        println!(
            "  {}. {:<22} {}",
            i + 1,
            exercise.name(),
            exercise.kind().prescription()
        );
    }
    println!();
}
