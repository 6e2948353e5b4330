use log::debug;

use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the TYPE FTP command.
///
/// All transfers are performed verbatim, so only the binary representations
/// are accepted: `I` and `L 8`. ASCII mode is refused rather than silently
/// mangling data.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - The representation type requested by the client.
///
/// # Returns
///
/// Result<(), FtpError> indicating the success or failure of the operation.
pub fn handle_type_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    let upper = arg.to_ascii_uppercase();
    match upper.as_str() {
        "I" | "L 8" | "L8" => {
            session.flags.binary = true;
            debug!("TYPE set to binary");
            session.reply(200, "TYPE command successful.");
        }
        _ => {
            session.reply(504, "Only binary mode is supported.");
        }
    }
    Ok(())
}
