use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the STRU FTP command. Only file structure is supported.
pub fn handle_stru_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    if arg.eq_ignore_ascii_case("F") {
        session.reply(200, "STRU command successful.");
    } else {
        session.reply(504, "Only file structure is supported.");
    }
    Ok(())
}
