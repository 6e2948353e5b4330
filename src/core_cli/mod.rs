use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "tickftpd", about = "A tick-driven FTP server written in Rust.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Listen port, overriding the configuration file
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory to serve, overriding the configuration file
    #[arg(short, long)]
    pub root: Option<String>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}
