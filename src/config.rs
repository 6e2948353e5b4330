use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LISTEN_PORT, DEFAULT_XFER_BUF_CAPACITY};

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub listen_port: u16,
    pub root_dir: String,
    pub pasv_address: Option<String>, // Overrides the address advertised in 227 replies
    pub greeting: Option<String>,
    pub transfer_buffer_size: Option<usize>, // Optional to allow default value
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            root_dir: String::from("."),
            pasv_address: None,
            greeting: None,
            transfer_buffer_size: Some(DEFAULT_XFER_BUF_CAPACITY),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))?;

        // Set defaults if not specified
        if config.server.transfer_buffer_size.is_none() {
            config.server.transfer_buffer_size = Some(DEFAULT_XFER_BUF_CAPACITY);
        }

        Ok(config)
    }

    pub fn transfer_buffer_size(&self) -> usize {
        self.server
            .transfer_buffer_size
            .unwrap_or(DEFAULT_XFER_BUF_CAPACITY)
    }
}
