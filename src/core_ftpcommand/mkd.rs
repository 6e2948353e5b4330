use std::fs;

use log::{info, warn};

use crate::core_ftpcommand::utils::resolve_path;
use crate::core_path::codec::encode_path;
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the MKD (Make Directory) FTP command.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - The directory to create.
///
/// # Returns
///
/// Result<(), FtpError> indicating the success or failure of the operation.
pub fn handle_mkd_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    let virt = match resolve_path(session, arg) {
        Some(p) => p,
        None => return Ok(()),
    };
    match fs::create_dir(session.real_path(&virt)) {
        Ok(()) => {
            info!("Created directory {}", virt);
            let encoded = encode_path(&virt, true);
            session.reply_raw(&format!("257 \"{}\" created.\r\n", encoded));
        }
        Err(e) => {
            warn!("MKD {} failed: {}", virt, e);
            session.reply(550, &e.to_string());
        }
    }
    Ok(())
}
