use crate::core_ftpcommand::ftpcommand::COMMAND_NAMES;
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the HELP FTP command by listing the recognized verbs.
pub fn handle_help_command(
    session: &mut Session,
    _config: &Config,
    _arg: &str,
) -> Result<(), FtpError> {
    session.reply_open(214, "The following commands are recognized:");
    for chunk in COMMAND_NAMES.chunks(8) {
        session.reply_raw(&format!(" {}\r\n", chunk.join(" ")));
    }
    session.reply(214, "End");
    Ok(())
}
