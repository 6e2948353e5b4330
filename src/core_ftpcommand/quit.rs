use log::info;

use crate::error::FtpError;
use crate::session::{Session, SessionState};
use crate::Config;

/// Handles the QUIT FTP command.
///
/// Any in-flight transfer is torn down first; the session closes once the
/// 221 has been flushed.
pub fn handle_quit_command(
    session: &mut Session,
    _config: &Config,
    _arg: &str,
) -> Result<(), FtpError> {
    if session.state != SessionState::AwaitingCommand {
        session.enter_idle(true, true);
    }
    info!("Client quit");
    session.reply(221, "Disconnecting.");
    session.should_close = true;
    Ok(())
}
