use crate::core_ftpcommand::list::begin_listing;
use crate::core_listing::ListingMode;
use crate::error::FtpError;
use crate::helpers::{format_free_space, get_free_space};
use crate::session::{Session, SessionState};
use crate::Config;

/// Handles the STAT FTP command.
///
/// With no argument, reports server status over the control connection;
/// with a path, produces a listing over the control connection. STAT is
/// accepted mid-transfer, in which case the status form answers even when
/// a path was given.
pub fn handle_stat_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    if arg.is_empty() || session.state != SessionState::AwaitingCommand {
        reply_status(session);
        return Ok(());
    }

    begin_listing(session, arg, ListingMode::Stat)
}

fn reply_status(session: &mut Session) {
    session.reply_open(211, "Server status:");
    session.reply_raw(&format!(
        " Logged in from {}\r\n",
        session
            .control
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| String::from("unknown")),
    ));
    session.reply_raw(&format!(" Working directory: {}\r\n", session.current_dir));
    session.reply_raw(&format!(
        " TYPE: {}\r\n",
        if session.flags.binary { "Image" } else { "ASCII" }
    ));
    if session.state != SessionState::AwaitingCommand {
        session.reply_raw(" Transfer in progress.\r\n");
    }
    if let Some(free) = get_free_space(&session.real_path("/")) {
        session.reply_raw(&format!(" Free space: {}\r\n", format_free_space(free)));
    }
    session.reply(211, "End of status");
}
