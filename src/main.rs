use std::io::Write;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

use tickftpd::core_cli::Cli;
use tickftpd::{Config, FtpServer};

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_filter = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    // Load configuration from the TOML file, or fall back to defaults
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    // CLI overrides
    if let Some(port) = args.port {
        config.server.listen_port = port;
    }
    if let Some(root) = args.root {
        config.server.root_dir = root;
    }

    let mut server = FtpServer::bind(config)?;

    // The standalone binary has no frame loop of its own, so a short
    // sleep between ticks stands in for the host application's cadence.
    loop {
        server.tick()?;
        thread::sleep(Duration::from_millis(10));
    }
}
