use std::fs;

use crate::core_ftpcommand::utils::resolve_path;
use crate::core_listing::ListingMode;
use crate::core_transfer::{self, ListTransfer, Transfer};
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the MLST FTP command.
///
/// A single machine-readable fact line for one path, sent over the control
/// connection inside a 213 block.
pub fn handle_mlst_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    let virt = if arg.is_empty() {
        session.current_dir.clone()
    } else {
        match resolve_path(session, arg) {
            Some(p) => p,
            None => return Ok(()),
        }
    };

    if let Err(e) = fs::metadata(session.real_path(&virt)) {
        session.reply(550, &e.to_string());
        return Ok(());
    }

    session.xfer_buf.clear();
    session.reply_open(213, "Status follows:");
    core_transfer::begin(
        session,
        Transfer::List(ListTransfer::new_single(ListingMode::Mlst, virt)),
    );
    Ok(())
}
