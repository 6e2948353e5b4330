use crate::core_ftpcommand::utils::resolve_path;
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the RNFR (Rename From) FTP command.
///
/// Remembers the source path; the rename happens on the following RNTO.
pub fn handle_rnfr_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    let virt = match resolve_path(session, arg) {
        Some(p) => p,
        None => return Ok(()),
    };
    if session.real_path(&virt).exists() {
        session.rename_from = Some(virt);
        session.reply(350, "Ready for RNTO.");
    } else {
        session.reply(550, "No such file or directory.");
    }
    Ok(())
}
