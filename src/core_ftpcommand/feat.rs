use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the FEAT FTP command.
///
/// Advertises the optional features this server implements. The MLST fact
/// line reflects the per-session fact selection, with a `*` marking each
/// fact currently enabled via OPTS MLST.
pub fn handle_feat_command(
    session: &mut Session,
    _config: &Config,
    _arg: &str,
) -> Result<(), FtpError> {
    let facts = session.mlst_facts;
    let star = |on: bool| if on { "*" } else { "" };
    let mlst = format!(
        " MLST Type{};Size{};Modify{};Perm{};UNIX.mode{};",
        star(facts.kind),
        star(facts.size),
        star(facts.modify),
        star(facts.perm),
        star(facts.unix_mode),
    );

    session.reply_open(211, "Features:");
    session.reply_raw(" MDTM\r\n");
    session.reply_raw(&format!("{}\r\n", mlst));
    session.reply_raw(" PASV\r\n");
    session.reply_raw(" REST STREAM\r\n");
    session.reply_raw(" SIZE\r\n");
    session.reply_raw(" TVFS\r\n");
    session.reply_raw(" UTF8\r\n");
    session.reply(211, "End");
    Ok(())
}
