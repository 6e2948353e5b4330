use std::fs;

use chrono::{DateTime, NaiveDateTime, Utc};
use filetime::FileTime;
use log::warn;

use crate::core_ftpcommand::utils::resolve_path;
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the MDTM FTP command.
///
/// The plain form `MDTM path` reports a file's modification time as a UTC
/// `YYYYMMDDHHMMSS` stamp. The two-argument form `MDTM YYYYMMDDHHMMSS path`
/// sets the modification time instead.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - Either a path, or a timestamp followed by a path.
///
/// # Returns
///
/// Result<(), FtpError> indicating the success or failure of the operation.
pub fn handle_mdtm_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    if let Some((stamp, path)) = split_set_form(arg) {
        return set_mtime(session, stamp, path);
    }

    let virt = match resolve_path(session, arg) {
        Some(p) => p,
        None => return Ok(()),
    };
    match fs::metadata(session.real_path(&virt)) {
        Ok(md) if md.is_file() => match md.modified() {
            Ok(mtime) => {
                let stamp = DateTime::<Utc>::from(mtime).format("%Y%m%d%H%M%S");
                session.reply(213, &stamp.to_string());
            }
            Err(e) => session.reply(550, &e.to_string()),
        },
        _ => {
            session.reply(550, "No such file.");
        }
    }
    Ok(())
}

// The set form is detected by a leading 14-digit token; a path that happens
// to start with digits would need at least one non-digit in the first word.
fn split_set_form(arg: &str) -> Option<(&str, &str)> {
    let (first, rest) = arg.split_once(' ')?;
    if first.len() == 14 && first.bytes().all(|b| b.is_ascii_digit()) {
        Some((first, rest.trim()))
    } else {
        None
    }
}

fn set_mtime(session: &mut Session, stamp: &str, path: &str) -> Result<(), FtpError> {
    let parsed = match NaiveDateTime::parse_from_str(stamp, "%Y%m%d%H%M%S") {
        Ok(t) => t,
        Err(_) => {
            session.reply(501, "Bad timestamp.");
            return Ok(());
        }
    };
    let virt = match resolve_path(session, path) {
        Some(p) => p,
        None => return Ok(()),
    };
    let ft = FileTime::from_unix_time(parsed.and_utc().timestamp(), 0);
    match filetime::set_file_mtime(session.real_path(&virt), ft) {
        Ok(()) => session.reply(213, "Modification time set."),
        Err(e) => {
            warn!("MDTM set on {} failed: {}", virt, e);
            session.reply(550, &e.to_string());
        }
    }
    Ok(())
}
