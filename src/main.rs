//! liftplan - Personal strength training tracker
//!
//! 52-week periodized program: monthly increments, 4-week cycles with a
//! deload, and weights auto-regulated from what was actually lifted.

use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::{Level, error, warn};

use liftplan::analytics::{self, ProgramStats};
use liftplan::config;
use liftplan::db::{Database, MemoryStore, TrainingStore};
use liftplan::engine::{DayPlan, Prescription, Program};
use liftplan::exercises::{Exercise, MuscleGroup};
use liftplan::session::{Identity, WorkoutSession};
use liftplan::timer::format_clock;
use liftplan::tui::App;

const DEFAULT_DB_PATH: &str = "liftplan.db";

#[derive(Parser)]
#[command(name = "liftplan")]
#[command(author, version, about = "Periodized strength training tracker")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "LIFTPLAN_DB", default_value = DEFAULT_DB_PATH)]
    db: String,

    /// User id; without one the session runs in demo mode
    #[arg(short, long, global = true, env = "LIFTPLAN_USER")]
    user: Option<String>,

    /// Use a throwaway in-memory store
    #[arg(long, global = true)]
    demo: bool,

    /// Program start date [default: 2025-08-19]
    #[arg(long, global = true, env = "LIFTPLAN_START_DATE")]
    start_date: Option<NaiveDate>,

    /// JSON program file replacing the built-in catalog and schedule
    #[arg(long, global = true, env = "LIFTPLAN_PROGRAM")]
    program: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the workout for a day (default: today)
    Today {
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Show the program week containing a day
    Week {
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Mark a set as done
    Done {
        /// Exercise name (e.g., "bench", "Leg Press")
        exercise: String,

        /// Set number, starting at 1
        set: u32,

        /// Unmark instead
        #[arg(long)]
        undo: bool,

        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Log actual weight and reps for a set (also marks it done)
    Log {
        exercise: String,

        /// Set number, starting at 1
        set: u32,

        #[arg(short, long)]
        weight: f64,

        #[arg(short, long)]
        reps: u32,

        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Attach notes to an exercise for a day
    Note {
        exercise: String,
        text: String,

        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Expected vs actual progression
    Progress {
        /// Exercise name (default: key lifts)
        exercise: Option<String>,

        /// Last week to show
        #[arg(
            short,
            long,
            value_parser = clap::value_parser!(u32).range(1..=analytics::MAX_WEEK as i64)
        )]
        weeks: Option<u32>,
    },

    /// Program statistics and milestones
    Stats,

    /// List the exercise catalog
    Exercises,

    /// Open TUI dashboard
    Tui,

    /// Start Telegram bot
    Bot {
        /// Telegram bot token (or set TELOXIDE_TOKEN env var)
        #[arg(short, long, env = "TELOXIDE_TOKEN")]
        token: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // The dashboard owns the terminal: keep log lines to warnings
    let level = match cli.command {
        None | Some(Commands::Tui) => Level::WARN,
        _ => Level::INFO,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("Something went wrong: {:#}", e);
        eprintln!("Nothing else was changed; fix the problem above and run the command again.");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli { db, user, demo, start_date, program, command } = cli;
    let program = config::load_program(program.as_deref(), start_date)?;
    let today = Local::now().date_naive();
    let open = || open_store(&db, user.as_deref(), demo);

    match command {
        Some(Commands::Bot { token }) => {
            println!("Starting Telegram bot...");
            println!("Database: {}", db);
            liftplan::bot::run_bot(token, &db, program).await?;
        }

        Some(Commands::Today { date }) => {
            let (store, identity) = open();
            let session = WorkoutSession::new(program, store, identity, date.unwrap_or(today));
            print_day(&session);
        }

        Some(Commands::Week { date }) => {
            let (store, _) = open();
            print_week(&program, store.as_ref(), date.unwrap_or(today));
        }

        Some(Commands::Done { exercise, set, undo, date }) => {
            let (store, identity) = open();
            let name = resolve_exercise(&program, &exercise)?;
            let set_index = set_index(set)?;
            let mut session = WorkoutSession::new(program, store, identity, date.unwrap_or(today));
            session.set_completed(&name, set_index, !undo)?;

            let (done, total) = session.progress();
            let verb = if undo { "Unmarked" } else { "Done" };
            println!("{}: {} set {} ({}/{} sets today)", verb, name, set, done, total);
        }

        Some(Commands::Log { exercise, set, weight, reps, date }) => {
            let (store, identity) = open();
            let name = resolve_exercise(&program, &exercise)?;
            let set_index = set_index(set)?;
            let mut session = WorkoutSession::new(program, store, identity, date.unwrap_or(today));
            session.record_set(&name, set_index, weight, reps)?;
            session.set_completed(&name, set_index, true)?;

            let indicator = session
                .performance_indicator(&name, set_index)
                .map(|p| format!(" {}", p.symbol()))
                .unwrap_or_default();
            println!("Logged: {} set {} - {}kg x {}{}", name, set, weight, reps, indicator);
        }

        Some(Commands::Note { exercise, text, date }) => {
            let (store, identity) = open();
            let name = resolve_exercise(&program, &exercise)?;
            let mut session = WorkoutSession::new(program, store, identity, date.unwrap_or(today));
            session.set_notes(&name, &text)?;
            println!("Notes saved for {}", name);
        }

        Some(Commands::Progress { exercise, weeks }) => {
            let exercises: Vec<Exercise> = match exercise {
                Some(query) => vec![program.catalog().find(&query).cloned().ok_or_else(|| {
                    anyhow::anyhow!("unknown exercise: {}", query)
                })?],
                None => analytics::key_exercises(&program).into_iter().cloned().collect(),
            };
            let horizon = match weeks {
                Some(last) => 1..=last,
                None => analytics::default_horizon(&program, today),
            };
            let (store, _) = open();
            for exercise in &exercises {
                print_progress(&program, exercise, horizon.clone(), store.as_ref(), today)?;
            }
        }

        Some(Commands::Stats) => {
            let (store, _) = open();
            let stats = ProgramStats::compute(&program, today, store.as_ref())?;
            println!("Program Statistics");
            println!("{:-<40}", "");
            println!("Started:          {}", program.clock().start());
            println!("Current week:     {}", stats.weeks_passed);
            println!("Phase:            {}", stats.phase);
            println!("Workouts done:    {} / {}", stats.workouts_done, stats.total_workouts);
            println!("Completion:       {}%", stats.completion_rate);
            println!();
            println!("Milestones");
            for m in &stats.milestones {
                let status = if m.reached {
                    "✓".to_string()
                } else {
                    format!("{} weeks", m.weeks_remaining)
                };
                println!("  Week {:>2} {:24} {}", m.week, m.name, status);
            }
        }

        Some(Commands::Exercises) => {
            for group in MuscleGroup::all() {
                let exercises: Vec<_> = program.catalog().in_group(*group).collect();
                if exercises.is_empty() {
                    continue;
                }
                println!("{}", group.label());
                for e in exercises {
                    let accessory = if e.is_accessory { " (accessory)" } else { "" };
                    println!(
                        "  {:28} {:>8} x {:>5} x {}  {:7} {:5} {}{}",
                        e.name, e.base_weight.to_string(), e.base_reps.to_string(), e.base_sets,
                        e.tempo, e.rest.to_string(), e.kind.label(), accessory
                    );
                }
            }
        }

        Some(Commands::Tui) | None => {
            let (store, identity) = open();
            let session = WorkoutSession::new(program, store, identity, today);
            let mut app = App::new(session);
            app.run()?;
        }
    }

    Ok(())
}

/// SQLite for a named user, memory for demo mode or when the database can't be opened
fn open_store(path: &str, user: Option<&str>, demo: bool) -> (Box<dyn TrainingStore>, Identity) {
    let identity = Identity::resolve(user, demo);
    let store: Box<dyn TrainingStore> = match &identity {
        Identity::User(user_id) => match Database::open(path, user_id) {
            Ok(db) => return (Box::new(db), identity),
            Err(e) => {
                warn!("could not open {}: {:#}; running in demo mode", path, e);
                Box::new(MemoryStore::default())
            }
        },
        Identity::Demo => Box::new(MemoryStore::default()),
    };
    eprintln!("(demo mode: nothing is saved)");
    (store, Identity::Demo)
}

fn resolve_exercise(program: &Program, query: &str) -> Result<String> {
    match program.catalog().find(query) {
        Some(exercise) => Ok(exercise.name.clone()),
        None => bail!("unknown exercise: {} (see `liftplan exercises`)", query),
    }
}

/// 1-based set number to index
fn set_index(set: u32) -> Result<u32> {
    match set.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("sets are numbered from 1"),
    }
}

fn prescription_line(p: &Prescription) -> String {
    let adjusted = if p.is_adjusted {
        format!(" ({:+.2})", p.adjustment)
    } else {
        String::new()
    };
    format!("{} x {} x {}{}", p.weight, p.reps, p.sets, adjusted)
}

fn header(plan: &DayPlan) -> String {
    format!(
        "{} {} | Week {} (cycle week {}) | {}",
        plan.date.format("%A"),
        plan.date,
        plan.position.week,
        plan.position.week_in_cycle,
        plan.position.phase
    )
}

fn print_day(session: &WorkoutSession) {
    let plan = session.plan();
    println!("{}", header(plan));
    println!("{:-<72}", "");
    println!("{}", plan.label());
    if plan.is_rest_day() {
        println!("Recover and come back tomorrow.");
        return;
    }

    for p in &plan.exercises {
        let marks: String = (0..p.sets)
            .map(|set| if session.is_completed(&p.exercise, set) { "[x]" } else { "[ ]" })
            .collect();
        println!(
            "  {:28} {:24} {:6} {:5} {}",
            p.exercise,
            prescription_line(p),
            p.tempo,
            p.rest.to_string(),
            marks
        );

        if let Some(record) = session.record(&p.exercise) {
            for set in 0..p.sets {
                let (Some(weight), Some(reps)) =
                    (record.weight(set as usize), record.reps(set as usize))
                else {
                    continue;
                };
                let indicator = session
                    .performance_indicator(&p.exercise, set)
                    .map(|i| i.symbol())
                    .unwrap_or("");
                println!("      set {}: {}kg x {} {}", set + 1, weight, reps, indicator);
            }
            if !record.notes.is_empty() {
                println!("      notes: {}", record.notes);
            }
        }
    }

    if let Some(cardio) = &plan.cardio {
        println!();
        println!(
            "Cardio: {} {} - {}",
            cardio.prescription.exercise, cardio.prescription.reps, cardio.protocol
        );
    }

    let (done, total) = session.progress();
    println!();
    println!("{}/{} sets done", done, total);
    if session.timer().is_running() {
        println!("Rest: {}", format_clock(session.timer().remaining()));
    }
}

fn print_week(program: &Program, store: &dyn TrainingStore, date: NaiveDate) {
    let clock = program.clock();
    let week = clock.week(date);
    let start = clock.week_start(week);
    let position = clock.position(start);
    println!("Week {} (cycle week {}) | {}", week, position.week_in_cycle, position.phase);
    println!("{:-<72}", "");

    for offset in 0..7 {
        let day = start + Duration::days(offset);
        let plan = program.plan_day(day, store);
        let cardio = plan
            .cardio
            .as_ref()
            .map(|c| format!(" + {}", c.prescription.exercise))
            .unwrap_or_default();
        let marker = if day == date { ">" } else { " " };
        println!(
            "{} {} {:10} {} ({} exercises){}",
            marker,
            day,
            day.format("%A").to_string(),
            plan.label(),
            plan.exercises.len(),
            cardio
        );
    }
}

fn print_progress(
    program: &Program,
    exercise: &Exercise,
    weeks: std::ops::RangeInclusive<u32>,
    store: &dyn TrainingStore,
    today: NaiveDate,
) -> Result<()> {
    let points = analytics::project(program, exercise, weeks, store)?;

    println!("{} ({})", exercise.name, exercise.group.label());
    println!("{:-<64}", "");
    println!(
        "{:>4}  {:>10}  {:>6}  {:>10}  {:>9}  {:>10}",
        "Week", "Expected", "Reps", "Actual", "Avg reps", "Volume"
    );
    for p in &points {
        let dash = || "-".to_string();
        let actual = p.actual_weight.map(|w| format!("{:.1}kg", w)).unwrap_or_else(dash);
        let reps = p.actual_reps.map(|r| format!("{:.1}", r)).unwrap_or_else(dash);
        let volume = p.actual_volume.map(|v| format!("{:.0}", v)).unwrap_or_else(dash);
        println!(
            "{:>4}  {:>10}  {:>6}  {:>10}  {:>9}  {:>10}",
            p.week,
            p.expected_weight.to_string(),
            p.expected_reps.to_string(),
            actual,
            reps,
            volume
        );
    }

    if let Some(predictor) = analytics::trend(program, exercise, today, store)? {
        println!();
        println!("{}", predictor.format_trend());
    }
    println!();
    Ok(())
}
