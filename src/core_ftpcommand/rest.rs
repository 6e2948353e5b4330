use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the REST FTP command.
///
/// The offset applies to the next RETR or STOR only.
pub fn handle_rest_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    match arg.parse::<u64>() {
        Ok(offset) => {
            session.restart_offset = offset;
            session.reply(
                350,
                &format!("Restarting at {}. Send STOR or RETR.", offset),
            );
        }
        Err(_) => {
            session.reply(501, "Bad restart offset.");
        }
    }
    Ok(())
}
