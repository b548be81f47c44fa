pub mod chart;
pub mod dashboard;
pub mod log;

use std::path::PathBuf;

use ansi_term::Colour;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    punch::{PunchClock, PunchError, PunchState},
    store::{kv::FileKvStore, session_store::SessionStore},
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        format::{clock_duration, local_timestamp},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Punchcard", version, long_about = None)]
#[command(about = "Punch-clock time tracking with dashboards and SVG charts", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Sign in and start a new session")]
    In,
    #[command(about = "Sign out and finalize the current session")]
    Out,
    #[command(about = "Show the current punch state and elapsed time")]
    Status,
    #[command(about = "Overview of activity: calendar totals, statuses, recent entries")]
    Dashboard,
    #[command(about = "List timesheet entries")]
    Log {
        #[command(flatten)]
        command: log::LogCommand,
    },
    #[command(about = "Render dashboard charts as SVG files")]
    Chart {
        #[arg(long, help = "Directory the SVG files are written into")]
        out: PathBuf,
    },
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let store = SessionStore::new(FileKvStore::new(app_dir.join("data"))?);

    match args.commands {
        Commands::In => process_punch_in(store),
        Commands::Out => process_punch_out(store),
        Commands::Status => process_status(store),
        Commands::Dashboard => dashboard::process_dashboard_command(&store),
        Commands::Log { command } => log::process_log_command(&store, command),
        Commands::Chart { out } => chart::process_chart_command(&store, &out),
    }
}

fn restore_clock(store: SessionStore<FileKvStore>) -> Result<PunchClock<FileKvStore>> {
    PunchClock::restore(store, Box::new(DefaultClock))
}

fn process_punch_in(store: SessionStore<FileKvStore>) -> Result<()> {
    let mut clock = restore_clock(store)?;
    match clock.punch_in() {
        Ok(start) => {
            println!("Signed in at {}", local_timestamp(start));
            Ok(())
        }
        Err(e) => explain_rejection(e),
    }
}

fn process_punch_out(store: SessionStore<FileKvStore>) -> Result<()> {
    let mut clock = restore_clock(store)?;
    match clock.punch_out() {
        Ok(session) => {
            let end = session.end.unwrap_or(session.start);
            println!(
                "Time logged from {} to {} ({})",
                local_timestamp(session.start),
                local_timestamp(end),
                clock_duration(end - session.start)
            );
            Ok(())
        }
        Err(e) => explain_rejection(e),
    }
}

fn process_status(store: SessionStore<FileKvStore>) -> Result<()> {
    let clock = restore_clock(store)?;
    match clock.state() {
        PunchState::Active(start) => {
            let elapsed = clock.elapsed()?;
            println!(
                "{} since {}, elapsed {}",
                Colour::Green.paint("Signed in"),
                local_timestamp(start),
                clock_duration(elapsed)
            );
        }
        PunchState::Idle => println!("Not signed in"),
    }
    Ok(())
}

/// Rejected transitions are explained to the user instead of failing the
/// process; anything else propagates.
fn explain_rejection(e: anyhow::Error) -> Result<()> {
    match e.downcast_ref::<PunchError>() {
        Some(rejection) => {
            println!("{}", Colour::Red.paint(rejection.to_string()));
            Ok(())
        }
        None => Err(e),
    }
}
