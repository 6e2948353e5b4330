use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the PASS FTP command. Any password is accepted.
pub fn handle_pass_command(
    session: &mut Session,
    _config: &Config,
    _arg: &str,
) -> Result<(), FtpError> {
    session.reply(230, "OK");
    Ok(())
}
