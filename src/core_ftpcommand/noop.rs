use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

pub fn handle_noop_command(
    session: &mut Session,
    _config: &Config,
    _arg: &str,
) -> Result<(), FtpError> {
    session.reply(200, "NOOP command successful.");
    Ok(())
}
