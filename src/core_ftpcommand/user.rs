use log::info;

use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the USER FTP command.
///
/// No authentication is enforced; any user is accepted immediately.
pub fn handle_user_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    info!("USER {:?} accepted", arg);
    session.reply(230, "OK");
    Ok(())
}
