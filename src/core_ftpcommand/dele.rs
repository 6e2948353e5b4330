use std::fs;

use log::{info, warn};

use crate::core_ftpcommand::utils::resolve_path;
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the DELE (Delete File) FTP command.
pub fn handle_dele_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    let virt = match resolve_path(session, arg) {
        Some(p) => p,
        None => return Ok(()),
    };
    match fs::remove_file(session.real_path(&virt)) {
        Ok(()) => {
            info!("Deleted {}", virt);
            session.reply(250, "DELE command successful.");
        }
        Err(e) => {
            warn!("DELE {} failed: {}", virt, e);
            session.reply(550, &e.to_string());
        }
    }
    Ok(())
}
