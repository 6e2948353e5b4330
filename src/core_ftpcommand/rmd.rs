use std::fs;

use log::{info, warn};

use crate::core_ftpcommand::utils::resolve_path;
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the RMD (Remove Directory) FTP command.
pub fn handle_rmd_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    let virt = match resolve_path(session, arg) {
        Some(p) => p,
        None => return Ok(()),
    };
    match fs::remove_dir(session.real_path(&virt)) {
        Ok(()) => {
            info!("Removed directory {}", virt);
            session.reply(250, "RMD command successful.");
        }
        Err(e) => {
            warn!("RMD {} failed: {}", virt, e);
            session.reply(550, &e.to_string());
        }
    }
    Ok(())
}
