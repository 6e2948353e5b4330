use log::info;

use crate::error::FtpError;
use crate::session::{Session, SessionState};
use crate::Config;

/// Handles the ABOR FTP command.
///
/// Mid-transfer the 425 for the torn-down transfer precedes the 225 for
/// the ABOR itself; with nothing in flight only the 225 is sent.
pub fn handle_abor_command(
    session: &mut Session,
    _config: &Config,
    _arg: &str,
) -> Result<(), FtpError> {
    if session.state == SessionState::AwaitingCommand {
        session.reply(225, "No transfer to abort.");
        return Ok(());
    }
    info!("Transfer aborted by client");
    session.reply(425, "Transfer aborted.");
    session.enter_idle(true, true);
    session.reply(225, "ABOR command successful.");
    Ok(())
}
