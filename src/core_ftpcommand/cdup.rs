use crate::core_path::split_parent;
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the CDUP FTP command. CDUP from the root stays at the root.
pub fn handle_cdup_command(
    session: &mut Session,
    _config: &Config,
    _arg: &str,
) -> Result<(), FtpError> {
    let (parent, _) = split_parent(&session.current_dir);
    session.current_dir = parent.to_string();
    session.reply(250, "CDUP command successful.");
    Ok(())
}
