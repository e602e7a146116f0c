//! Room21 chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin room21-server
//! cargo run --bin room21-server -- --host 127.0.0.1 --port 3000 --data-dir data
//! ```

use std::path::PathBuf;

use clap::Parser;
use room21_server::{bootstrap, config::HubConfig, domain::AdminCommand, ui::console};
use room21_shared::logger::setup_logger;
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(name = "room21-server")]
#[command(about = "Room21 real-time chat server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Directory for the ban list, the chat log and saved log snapshots
    #[arg(long, env = "ROOM21_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Room name shown in the welcome message
    #[arg(long, default_value = "Room21")]
    room_name: String,

    /// Take the client address from the X-Forwarded-For header
    #[arg(long, env = "TRUST_FORWARDED_FOR")]
    trust_forwarded_for: bool,

    /// Disable the interactive admin console
    #[arg(long)]
    no_console: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(format!("{}:{}", args.host, args.port)).await?;
    let server_label = listener.local_addr()?.to_string();

    let config = HubConfig {
        room_name: args.room_name,
        trust_forwarded_for: args.trust_forwarded_for,
        ..HubConfig::default()
    };
    let hub = bootstrap::assemble(config, args.data_dir, server_label).await;

    // Ctrl+C goes through the same graceful stop as the console command
    let admin = hub.admin.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() && !admin.is_shutting_down() {
            tracing::info!("Ctrl+C received");
            if let Ok(report) = admin.execute(AdminCommand::Stop).await {
                tracing::info!("{}", report);
            }
        }
    });

    if args.no_console {
        tracing::info!("Admin console disabled");
    } else {
        println!("{}", AdminCommand::HELP);
        let _console = console::spawn_console(hub.admin.clone());
    }

    hub.server.serve(listener).await?;
    Ok(())
}
