use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the MODE FTP command. Only stream mode is supported.
pub fn handle_mode_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    if arg.eq_ignore_ascii_case("S") {
        session.reply(200, "MODE command successful.");
    } else {
        session.reply(504, "Only stream mode is supported.");
    }
    Ok(())
}
