use std::fs;

use crate::core_ftpcommand::utils::resolve_path;
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the SIZE FTP command, reporting a file's length in bytes.
pub fn handle_size_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    let virt = match resolve_path(session, arg) {
        Some(p) => p,
        None => return Ok(()),
    };
    match fs::metadata(session.real_path(&virt)) {
        Ok(md) if md.is_file() => {
            session.reply(213, &md.len().to_string());
        }
        _ => {
            session.reply(550, "No such file.");
        }
    }
    Ok(())
}
