use crate::core_path::codec::encode_path;
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the PWD (Print Working Directory) FTP command.
///
/// The directory is quoted per RFC 959, doubling any embedded quotes.
pub fn handle_pwd_command(
    session: &mut Session,
    _config: &Config,
    _arg: &str,
) -> Result<(), FtpError> {
    let encoded = encode_path(&session.current_dir, true);
    session.reply_raw(&format!("257 \"{}\"\r\n", encoded));
    Ok(())
}
