//! Habit Reminder CLI

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use habit_reminder_lib::commands;
use habit_reminder_lib::domain::{Habit, TimeOfDay};
use habit_reminder_lib::AppState;

const APP_NAME: &str = "HabitReminder";

#[derive(Parser)]
#[command(name = "habit-reminder", version, about = "Daily habits, synced by passcode")]
struct Cli {
    /// Directory holding the local list, sync config and logs
    #[arg(long, env = "HABIT_REMINDER_DIR", default_value = ".habit-reminder")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Set the remote store URL
    Config { url: String },
    /// Start an empty list under a fresh passcode, dropping unsaved habits
    New,
    /// Add a habit (time: morning, afternoon or evening)
    Add { description: String, time: String },
    /// Replace a habit's description and time; marks it not completed
    Edit {
        id: i64,
        description: String,
        time: String,
    },
    Delete { id: i64 },
    /// Flip a habit between done and not done
    Toggle { id: i64 },
    /// Print the list
    List {
        /// Morning first, then afternoon, then evening
        #[arg(long)]
        by_time: bool,
    },
    /// Print the list grouped by time of day
    Session,
    /// Store the list remotely and print its passcode
    Save,
    /// Load the list stored under a passcode
    Open { passcode: String },
    /// Delete the opened list remotely and locally
    DeleteList,
    /// Print the passcode of the current list
    Passcode,
    /// Print the end of the log file
    Logs {
        #[arg(long, default_value_t = 20)]
        lines: usize,
    },
}

fn print_habit(habit: &Habit) {
    let mark = if habit.completed { "x" } else { " " };
    println!(
        "[{}] {}  {:<9}  {}",
        mark,
        habit.id,
        habit.time.label(),
        habit.description
    );
}

fn print_habits(habits: &[Habit]) {
    if habits.is_empty() {
        println!("No habits yet.");
    }
    for habit in habits {
        print_habit(habit);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let log_dir = cli.data_dir.join("logs");
    if let Command::Logs { lines } = cli.command {
        let lines = rolling_logger::tail(&log_dir, APP_NAME, lines).map_err(|e| e.to_string())?;
        for line in lines {
            println!("{}", line);
        }
        return Ok(());
    }

    let state = AppState::init(&cli.data_dir).map_err(|e| e.to_string())?;

    match cli.command {
        Command::Config { url } => {
            let config = commands::configure_sync(&cli.data_dir, &url)?;
            println!("Habit store set to {}", config.api_url);
        }
        Command::New => {
            let passcode = commands::new_list(&state)?;
            println!("Started a new list. Passcode: {}", passcode);
        }
        Command::Add { description, time } => {
            let habit = commands::submit_habit(&state, &description, &time, None)?;
            print_habit(&habit);
        }
        Command::Edit {
            id,
            description,
            time,
        } => {
            let habit = commands::submit_habit(&state, &description, &time, Some(id))?;
            print_habit(&habit);
        }
        Command::Delete { id } => {
            let habit = commands::delete_habit(&state, id)?;
            println!("Deleted \"{}\"", habit.description);
        }
        Command::Toggle { id } => {
            let habit = commands::toggle_habit(&state, id)?;
            print_habit(&habit);
        }
        Command::List { by_time } => {
            let habits = if by_time {
                commands::list_sorted_habits(&state)?
            } else {
                commands::list_habits(&state)?
            };
            print_habits(&habits);
        }
        Command::Session => {
            let view = commands::session_view(&state)?;
            for time in TimeOfDay::ALL {
                println!("{}", time.label());
                let habits = view.group(time);
                if habits.is_empty() {
                    println!("  -");
                }
                for habit in habits {
                    print!("  ");
                    print_habit(habit);
                }
            }
        }
        Command::Save => {
            let passcode = commands::save_habits(&state).await?;
            println!("Habits saved successfully! Passcode: {}", passcode);
        }
        Command::Open { passcode } => {
            let habits = commands::open_list(&state, &passcode).await?;
            print_habits(&habits);
        }
        Command::DeleteList => {
            commands::delete_list(&state).await?;
            println!("List deleted.");
        }
        Command::Passcode => {
            println!("{}", commands::current_passcode(&state)?);
        }
        Command::Logs { .. } => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let logging = match rolling_logger::init_logger(cli.data_dir.join("logs"), APP_NAME) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("{}", e);
            false
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The logger already echoes errors to stderr
            if !logging || rolling_logger::error(&format!("Command failed: {}", e)).is_err() {
                eprintln!("Error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
