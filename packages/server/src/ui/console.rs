//! Operator console on stdin.
//!
//! Lines are read with rustyline on a dedicated thread and executed one at a
//! time by [`AdminUseCase`]. End of input (Ctrl+D) and Ctrl+C at the prompt stop
//! the server the same way the `stop` command does.

use std::sync::Arc;

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{domain::AdminCommand, usecase::AdminUseCase};

const PROMPT: &str = "Room21> ";

/// One event from the readline thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Line(String),
    /// Ctrl+D, Ctrl+C or a terminal error.
    Closed,
}

/// Start the readline thread and the task executing its commands.
pub fn spawn_console(admin: Arc<AdminUseCase>) -> JoinHandle<()> {
    let (input_tx, input_rx) = mpsc::unbounded_channel();

    // Spawn a blocking thread for rustyline (synchronous readline)
    std::thread::spawn(move || read_lines(input_tx));

    tokio::spawn(run_console(admin, input_rx))
}

fn read_lines(input_tx: mpsc::UnboundedSender<ConsoleInput>) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            tracing::error!("Failed to initialize console: {}", e);
            return;
        }
    };

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim().to_string();
                if !line.is_empty() {
                    rl.add_history_entry(line.as_str()).ok();
                }
                if input_tx.send(ConsoleInput::Line(line)).is_err() {
                    // Channel closed, exit thread
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                let _ = input_tx.send(ConsoleInput::Closed);
                break;
            }
            Err(err) => {
                tracing::error!("Console error: {}", err);
                let _ = input_tx.send(ConsoleInput::Closed);
                break;
            }
        }
    }
}

/// Execute console input until the server stops.
pub async fn run_console(
    admin: Arc<AdminUseCase>,
    mut input_rx: mpsc::UnboundedReceiver<ConsoleInput>,
) {
    while let Some(input) = input_rx.recv().await {
        if admin.is_shutting_down() {
            break;
        }

        let command = match input {
            ConsoleInput::Line(line) => match line.parse::<AdminCommand>() {
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            },
            ConsoleInput::Closed => {
                println!("\nShutting down server...");
                AdminCommand::Stop
            }
        };

        let stopping = command == AdminCommand::Stop;
        match admin.execute(command).await {
            Ok(report) if report.is_empty() => {}
            Ok(report) => println!("{}", report),
            Err(e) => println!("{}", e),
        }

        if stopping {
            break;
        }
    }
}
