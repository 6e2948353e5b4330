use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the SYST (System) FTP command.
///
/// This function sends a response to the client indicating the system type
/// of the server.
pub fn handle_syst_command(
    session: &mut Session,
    _config: &Config,
    _arg: &str,
) -> Result<(), FtpError> {
    session.reply(215, "UNIX Type: L8");
    Ok(())
}
