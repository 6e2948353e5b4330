use log::debug;

use crate::core_ftpcommand::utils::resolve_path;
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the CWD (Change Working Directory) FTP command.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - The target directory, absolute or relative to the current one.
///
/// # Returns
///
/// Result<(), FtpError> indicating the success or failure of the operation.
pub fn handle_cwd_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    let virt = match resolve_path(session, arg) {
        Some(p) => p,
        None => return Ok(()),
    };
    if session.real_path(&virt).is_dir() {
        debug!("CWD {} -> {}", session.current_dir, virt);
        session.current_dir = virt;
        session.reply(250, "CWD command successful.");
    } else {
        session.reply(550, "No such directory.");
    }
    Ok(())
}
