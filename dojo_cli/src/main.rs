use clap::{Parser, Subcommand};
use dojo_core::*;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dojo")]
#[command(about = "Event-sourced training session engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the built-in workout plans
    Seed,

    /// List stored workout plans
    Workouts,

    /// Show the blocks of one workout plan
    Show {
        /// Workout id
        workout: Uuid,
    },

    /// Create and start a training session
    Start {
        /// Workout id to run
        workout: Uuid,

        /// Reuse a specific session id
        #[arg(long)]
        session: Option<Uuid>,
    },

    /// Drive a session to completion, one tick per interval
    Run {
        /// Session id
        session: Uuid,
    },

    /// Advance a session manually
    Tick {
        /// Session id
        session: Uuid,

        /// Number of ticks to apply
        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// Show current session state
    Status {
        /// Session id
        session: Uuid,
    },

    /// Pause a running session
    Pause {
        /// Session id
        session: Uuid,
    },

    /// Resume a paused session
    Resume {
        /// Session id
        session: Uuid,
    },

    /// Skip to the next block
    SkipBlock {
        /// Session id
        session: Uuid,
    },

    /// Skip to the next round
    SkipRound {
        /// Session id
        session: Uuid,
    },

    /// Export session summaries to CSV
    Export {
        /// Output file (defaults to <data-dir>/sessions.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Keep stdout for command output; logs go through RUST_LOG when wanted
    dojo_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Seed => cmd_seed(&data_dir),
        Commands::Workouts => cmd_workouts(&data_dir),
        Commands::Show { workout } => cmd_show(&data_dir, workout),
        Commands::Start { workout, session } => cmd_start(&data_dir, workout, session),
        Commands::Run { session } => cmd_run(&data_dir, session, &config),
        Commands::Tick { session, count } => cmd_tick(&data_dir, session, count),
        Commands::Status { session } => cmd_status(&data_dir, session),
        Commands::Pause { session } => cmd_pause(&data_dir, session),
        Commands::Resume { session } => cmd_resume(&data_dir, session),
        Commands::SkipBlock { session } => cmd_skip_block(&data_dir, session),
        Commands::SkipRound { session } => cmd_skip_round(&data_dir, session),
        Commands::Export { out } => cmd_export(&data_dir, out),
    }
}

fn cmd_seed(data_dir: &Path) -> Result<()> {
    let service = TrainingService::open(data_dir);
    let workouts = service.seed_workouts()?;

    println!("✓ {} workout plans available:", workouts.len());
    for workout in workouts {
        println!("  {}  {}", workout.id, workout.name);
    }
    Ok(())
}

fn cmd_workouts(data_dir: &Path) -> Result<()> {
    let service = TrainingService::open(data_dir);
    let workouts = service.list_workouts()?;

    if workouts.is_empty() {
        println!("No workouts stored. Run `dojo seed` to install the built-in plans.");
        return Ok(());
    }

    for workout in workouts {
        println!(
            "{}  {}  ({} blocks, created {})",
            workout.id,
            workout.name,
            workout.blocks.len(),
            workout.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

fn cmd_show(data_dir: &Path, workout_id: Uuid) -> Result<()> {
    let service = TrainingService::open(data_dir);
    let workout = service.get_workout(workout_id)?;

    println!("{}", workout.name);
    for (index, block) in workout.blocks.iter().enumerate() {
        println!(
            "  [{}] {}  rounds={} work={}s rest={}s",
            index,
            block.block_type(),
            block.rounds,
            block.work_time,
            block.rest_time
        );
        for exercise in block.detail.exercises() {
            println!("        {} x{}", exercise.name, exercise.reps);
        }
    }
    Ok(())
}

fn cmd_start(data_dir: &Path, workout_id: Uuid, session_id: Option<Uuid>) -> Result<()> {
    let service = TrainingService::open(data_dir);
    let id = service.start_session(workout_id, session_id)?;

    println!("Started session {}", id);
    println!("Drive it with `dojo run {}`", id);
    Ok(())
}

fn cmd_run(data_dir: &Path, session_id: Uuid, config: &Config) -> Result<()> {
    let mut bus = EventBus::new();
    bus.subscribe("AnnouncementTriggered", |event| {
        if let EventPayload::AnnouncementTriggered(announcement) = &event.payload {
            println!(">> {}", announcement.text);
        }
        Ok(())
    });

    let service = TrainingService::open_with_bus(data_dir, bus);
    let interval = Duration::from_millis(config.ticker.interval_ms);

    loop {
        let session = service.tick_session(session_id)?;

        match session.status {
            SessionStatus::Completed => {
                println!("✓ Session complete!");
                return Ok(());
            }
            SessionStatus::Paused => {
                println!("Session is paused; `dojo resume {}` to continue.", session_id);
                return Ok(());
            }
            _ => {}
        }

        thread::sleep(interval);
    }
}

fn cmd_tick(data_dir: &Path, session_id: Uuid, count: u32) -> Result<()> {
    let service = TrainingService::open(data_dir);

    let mut session = service.get_session(session_id)?;
    for _ in 0..count {
        session = service.tick_session(session_id)?;
    }

    print_session(&session);
    Ok(())
}

fn cmd_status(data_dir: &Path, session_id: Uuid) -> Result<()> {
    let service = TrainingService::open(data_dir);
    let session = service.get_session(session_id)?;
    print_session(&session);
    Ok(())
}

fn cmd_pause(data_dir: &Path, session_id: Uuid) -> Result<()> {
    let service = TrainingService::open(data_dir);
    let session = service.pause_session(session_id)?;
    println!("Session {} is now {}", session_id, session.status);
    Ok(())
}

fn cmd_resume(data_dir: &Path, session_id: Uuid) -> Result<()> {
    let service = TrainingService::open(data_dir);
    let session = service.resume_session(session_id)?;
    println!("Session {} is now {}", session_id, session.status);
    Ok(())
}

fn cmd_skip_block(data_dir: &Path, session_id: Uuid) -> Result<()> {
    let service = TrainingService::open(data_dir);
    let session = service.skip_block(session_id)?;
    print_session(&session);
    Ok(())
}

fn cmd_skip_round(data_dir: &Path, session_id: Uuid) -> Result<()> {
    let service = TrainingService::open(data_dir);
    let session = service.skip_round(session_id)?;
    print_session(&session);
    Ok(())
}

fn cmd_export(data_dir: &Path, out: Option<PathBuf>) -> Result<()> {
    let service = TrainingService::open(data_dir);
    let csv_path = out.unwrap_or_else(|| data_dir.join("sessions.csv"));

    let count = service.export_sessions(&csv_path)?;
    println!("✓ Exported {} sessions to {}", count, csv_path.display());
    Ok(())
}

fn print_session(session: &TrainingSession) {
    println!("Session {}", session.id);
    println!("  Workout:  {}", session.workout.name);
    println!("  Status:   {}", session.status);

    if let Some(block) = session.workout.blocks.get(session.current_block_index) {
        let phase = if session.is_work_phase { "work" } else { "rest" };
        println!(
            "  Block:    {}/{} ({})",
            session.current_block_index + 1,
            session.workout.blocks.len(),
            block.block_type()
        );
        println!("  Round:    {}/{}", session.current_round, block.rounds);
        println!("  Phase:    {}", phase);
        println!("  Time left: {}s", session.time_left);
    }
}
