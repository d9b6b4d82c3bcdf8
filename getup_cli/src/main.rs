use clap::{Parser, Subcommand, ValueEnum};
use getup_core::rep_counter::RepEvent;
use getup_core::wal::WAL_FILE_NAME;
use getup_core::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "getup")]
#[command(about = "Exercise form coaching and rep counting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the exercise catalog
    Exercises {
        /// Only show one category
        #[arg(long, value_enum)]
        category: Option<CategoryArg>,
    },

    /// Replay recorded joint snapshots (one JSON object per line) through a workout
    Replay {
        /// Exercise id, see `getup exercises`
        #[arg(long)]
        exercise: String,

        /// JSON Lines file of joint snapshots
        #[arg(long)]
        frames: PathBuf,

        /// Target sets (default from config)
        #[arg(long)]
        sets: Option<u32>,

        /// Target reps per set, or seconds per set for holds (default from the exercise)
        #[arg(long)]
        reps: Option<u32>,

        /// Rest between sets in seconds (default from config)
        #[arg(long)]
        rest: Option<u32>,

        /// Frames per second of the recording; one tick is injected per this many frames
        #[arg(long, default_value_t = 30)]
        fps: u32,

        /// Skip every rest as soon as it starts
        #[arg(long)]
        skip_rest: bool,

        /// Dry run - replay without logging the session
        #[arg(long)]
        dry_run: bool,
    },

    /// Show recent workouts
    History {
        /// How many days back to look
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Strength,
    Yoga,
}

impl From<CategoryArg> for ExerciseCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Strength => ExerciseCategory::Strength,
            CategoryArg::Yoga => ExerciseCategory::Yoga,
        }
    }
}

/// How far back the replay looks for the previous session of the same exercise
const LAST_SESSION_LOOKBACK_DAYS: i64 = 90;

struct ReplayOptions {
    exercise: String,
    frames: PathBuf,
    sets: Option<u32>,
    reps: Option<u32>,
    rest: Option<u32>,
    fps: u32,
    skip_rest: bool,
    wal_path: PathBuf,
}

fn main() -> Result<()> {
    getup_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let wal_path = data_dir.join("wal").join(WAL_FILE_NAME);

    match cli.command {
        Commands::Exercises { category } => cmd_exercises(category.map(Into::into)),
        Commands::Replay {
            exercise,
            frames,
            sets,
            reps,
            rest,
            fps,
            skip_rest,
            dry_run,
        } => {
            let options = ReplayOptions {
                exercise,
                frames,
                sets,
                reps,
                rest,
                fps,
                skip_rest,
                wal_path: wal_path.clone(),
            };
            if dry_run {
                let session = cmd_replay(&options, &config, MemorySink::default())?;
                if session.is_some() {
                    println!("\n[Dry run - not logging session]");
                }
                Ok(())
            } else {
                let session = cmd_replay(&options, &config, JsonlSink::new(&wal_path))?;
                if session.is_some() {
                    println!("\n✓ Session logged!");
                }
                Ok(())
            }
        }
        Commands::History { days } => cmd_history(&wal_path, days),
    }
}

fn validated_catalog() -> Result<&'static Catalog> {
    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }
    Ok(catalog)
}

fn cmd_exercises(category: Option<ExerciseCategory>) -> Result<()> {
    let catalog = validated_catalog()?;
    let exercises = match category {
        Some(category) => catalog.by_category(category),
        None => catalog.sorted(),
    };

    let mut current = None;
    for definition in exercises {
        if current != Some(definition.category) {
            current = Some(definition.category);
            println!("\n{}", definition.category.label());
        }
        let target = if definition.is_hold_pose() {
            format!("{} x {}s hold", definition.default_sets, definition.default_reps)
        } else {
            format!("{} x {} reps", definition.default_sets, definition.default_reps)
        };
        println!("  {:<18} {:<28} {}", definition.id, definition.name, target);
        println!("  {:<18} {}", "", definition.description);
    }
    println!();

    Ok(())
}

fn cmd_replay<S: SessionSink>(
    options: &ReplayOptions,
    config: &Config,
    sink: S,
) -> Result<Option<WorkoutSession>> {
    if options.fps == 0 {
        return Err(Error::Config("--fps must be at least 1".into()));
    }

    let catalog = validated_catalog()?;
    let definition = catalog.get(&options.exercise)?;
    let plan = WorkoutPlan {
        exercise_id: definition.id.to_string(),
        target_sets: options.sets.unwrap_or(config.workout.default_sets),
        target_reps: options.reps.unwrap_or(definition.default_reps),
        rest_seconds: options.rest.unwrap_or(config.workout.default_rest_seconds),
    };
    let frames = load_frames(&options.frames)?;
    let previous = load_recent_sessions(&options.wal_path, LAST_SESSION_LOOKBACK_DAYS)?;

    let mut controller = WorkoutController::new(plan, catalog, NoCapture, sink)?
        .with_countdown(config.workout.countdown_seconds);

    println!(
        "{}: {} sets x {} {}",
        definition.name,
        controller.plan().target_sets,
        controller.plan().target_reps,
        if definition.is_hold_pose() { "seconds" } else { "reps" }
    );
    if let Some(last) = find_last_session(&previous, definition.id) {
        println!(
            "Last time ({}): {}",
            last.performed_at.format("%Y-%m-%d"),
            last.summary()
        );
    }

    print_events(&controller.start_countdown()?);
    while controller.state() == LifecycleState::Countdown {
        print_events(&controller.tick()?);
    }

    let mut last_message = "";
    for (index, snapshot) in frames.iter().enumerate() {
        let outcome = controller.process_frame(snapshot)?;
        if outcome.feedback.message != last_message {
            last_message = outcome.feedback.message;
            println!(
                "  [{:?}] {}",
                outcome.feedback.quality, outcome.feedback.message
            );
        }
        print_events(&outcome.events);

        if (index as u64 + 1) % options.fps as u64 == 0 {
            print_events(&controller.tick()?);
        }
        if options.skip_rest {
            print_events(&controller.skip_rest()?);
        }
        if controller.state() == LifecycleState::Complete {
            break;
        }
    }

    if controller.state() != LifecycleState::Complete {
        println!("\nRecording ended before the workout finished");
        print_events(&controller.end_workout()?);
    }

    let session = controller.last_session().cloned();
    match &session {
        Some(session) => {
            println!();
            println!("  {}", session.exercise_name);
            println!("  {}", session.summary());
            for set in &session.sets {
                println!(
                    "    Set {}: {} reps, {:.0}% form",
                    set.set_number,
                    set.reps_completed,
                    set.form_score * 100.0
                );
            }
        }
        None => println!("No reps recorded - nothing to save."),
    }

    Ok(session)
}

/// Read one snapshot per line, skipping blank and unparsable lines
fn load_frames(path: &Path) -> Result<Vec<JointSnapshot>> {
    let reader = BufReader::new(File::open(path)?);
    let mut frames = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<JointSnapshot>(&line) {
            Ok(snapshot) => frames.push(snapshot),
            Err(e) => tracing::warn!("Skipping frame at line {}: {}", line_num + 1, e),
        }
    }

    tracing::info!("Loaded {} frames from {:?}", frames.len(), path);
    Ok(frames)
}

fn print_events(events: &[WorkoutEvent]) {
    for event in events {
        match event {
            WorkoutEvent::CountdownTick { remaining } => println!("  {}...", remaining),
            WorkoutEvent::StateChanged { to, .. } => match to {
                LifecycleState::Active => println!("  Go!"),
                LifecycleState::Complete => println!("\n✓ Workout complete!"),
                _ => {}
            },
            WorkoutEvent::Rep(RepEvent::RepCompleted { set, rep }) => {
                println!("  Set {} · rep {}", set, rep)
            }
            WorkoutEvent::Rep(RepEvent::SetCompleted { set }) => {
                println!("  ✓ Set {} done", set)
            }
            WorkoutEvent::Rep(RepEvent::RestStarted { seconds }) => {
                println!("  Rest {}s", seconds)
            }
            WorkoutEvent::Rep(RepEvent::RestCompleted { skipped, next_set }) => {
                let how = if *skipped { "skipped" } else { "over" };
                println!("  Rest {}, starting set {}", how, next_set)
            }
            WorkoutEvent::Rep(RepEvent::RestTick { .. })
            | WorkoutEvent::Rep(RepEvent::WorkoutCompleted)
            | WorkoutEvent::SessionSaved { .. } => {}
        }
    }
}

fn cmd_history(wal_path: &Path, days: i64) -> Result<()> {
    let sessions = load_recent_sessions(wal_path, days)?;
    if sessions.is_empty() {
        println!("No workouts in the last {} days.", days);
        return Ok(());
    }

    let stats = weekly_stats(&sessions, chrono::Utc::now());
    println!(
        "This week: {} workouts · {} reps · {} avg form",
        stats.sessions,
        stats.total_reps,
        stats.form_score_text()
    );
    println!();

    for session in &sessions {
        println!(
            "  {}  {:<24} {}{}",
            session.performed_at.format("%Y-%m-%d %H:%M"),
            session.exercise_name,
            session.summary(),
            if session.ended_early { " (ended early)" } else { "" }
        );
    }

    Ok(())
}
