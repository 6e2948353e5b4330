use std::fs;

use log::{info, warn};

use crate::core_ftpcommand::utils::resolve_path;
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the RNTO (Rename To) FTP command.
///
/// Requires a pending RNFR. The pending source is consumed whether the
/// rename succeeds or fails.
pub fn handle_rnto_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    let from = match session.rename_from.take() {
        Some(f) => f,
        None => {
            session.reply(503, "RNFR required first.");
            return Ok(());
        }
    };
    let to = match resolve_path(session, arg) {
        Some(p) => p,
        None => return Ok(()),
    };
    match fs::rename(session.real_path(&from), session.real_path(&to)) {
        Ok(()) => {
            info!("Renamed {} -> {}", from, to);
            session.reply(250, "RNTO command successful.");
        }
        Err(e) => {
            warn!("RNTO {} -> {} failed: {}", from, to, e);
            session.reply(550, &e.to_string());
        }
    }
    Ok(())
}
