use crate::core_path::build_path;
use crate::session::Session;

/// Resolves a client path argument against the current directory, sending
/// the rejection response itself when the argument is invalid.
pub fn resolve_path(session: &mut Session, arg: &str) -> Option<String> {
    match build_path(&session.current_dir, arg) {
        Ok(path) => Some(path),
        Err(e) => {
            session.reply_raw(&e.to_ftp_response());
            None
        }
    }
}

/// Transfer commands need a PASV or PORT grant first; without one they
/// are a 503, before any file is touched.
pub fn require_data_grant(session: &mut Session) -> bool {
    if session.flags.passive_ready || session.flags.active_ready {
        true
    } else {
        session.reply(503, "Use PASV or PORT first.");
        false
    }
}
