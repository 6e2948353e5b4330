use log::{debug, info};

use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_ftpcommand::*;
use crate::core_network::{pasv, port};
use crate::core_path::codec::{decode_line, encode_path};
use crate::error::FtpError;
use crate::session::{Session, SessionState};
use crate::Config;

/// Dispatches one complete command line.
///
/// The raw line (terminator already stripped) is NUL-decoded first, then
/// split into the leading verb and the remaining argument. Unknown verbs
/// get a 502 echoing the encoded line; known verbs arriving while a
/// transfer is in flight are a 503 unless the verb is ABOR, STAT or QUIT.
pub fn dispatch(session: &mut Session, config: &Config, raw: &[u8]) -> Result<(), FtpError> {
    let mut bytes = raw.to_vec();
    decode_line(&mut bytes);
    let line = String::from_utf8_lossy(&bytes).into_owned();

    session.last_command_at = chrono::Local::now();

    let trimmed = line.trim_start();
    let (verb, arg) = match trimmed.split_once(|c: char| c.is_ascii_whitespace()) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (trimmed, ""),
    };
    debug!("<- {}", trimmed);

    let cmd = match FtpCommand::from_str(verb) {
        Some(cmd) => cmd,
        None => {
            info!("Unknown command: {:?}", verb);
            session.reply(
                502,
                &format!("Invalid command \"{}\"", encode_path(trimmed, false)),
            );
            return Ok(());
        }
    };

    if session.state != SessionState::AwaitingCommand && !cmd.allowed_during_transfer() {
        session.reply(503, "Bad sequence of commands.");
        return Ok(());
    }

    use FtpCommand::*;
    match cmd {
        USER => user::handle_user_command(session, config, arg),
        PASS => pass::handle_pass_command(session, config, arg),
        SYST => syst::handle_syst_command(session, config, arg),
        FEAT => feat::handle_feat_command(session, config, arg),
        HELP => help::handle_help_command(session, config, arg),
        NOOP => noop::handle_noop_command(session, config, arg),
        MODE => mode::handle_mode_command(session, config, arg),
        STRU => stru::handle_stru_command(session, config, arg),
        TYPE => type_::handle_type_command(session, config, arg),
        OPTS => opts::handle_opts_command(session, config, arg),
        PASV => pasv::handle_pasv_command(session, config, arg),
        PORT => port::handle_port_command(session, config, arg),
        PWD => pwd::handle_pwd_command(session, config, arg),
        CWD => cwd::handle_cwd_command(session, config, arg),
        CDUP => cdup::handle_cdup_command(session, config, arg),
        MKD => mkd::handle_mkd_command(session, config, arg),
        RMD => rmd::handle_rmd_command(session, config, arg),
        DELE => dele::handle_dele_command(session, config, arg),
        RNFR => rnfr::handle_rnfr_command(session, config, arg),
        RNTO => rnto::handle_rnto_command(session, config, arg),
        SIZE => size::handle_size_command(session, config, arg),
        MDTM => mdtm::handle_mdtm_command(session, config, arg),
        REST => rest::handle_rest_command(session, config, arg),
        LIST => list::handle_list_command(session, config, arg),
        NLST => list::handle_nlst_command(session, config, arg),
        MLSD => list::handle_mlsd_command(session, config, arg),
        MLST => mlst::handle_mlst_command(session, config, arg),
        STAT => stat::handle_stat_command(session, config, arg),
        RETR => retr::handle_retr_command(session, config, arg),
        STOR => stor::handle_stor_command(session, config, arg),
        APPE => stor::handle_appe_command(session, config, arg),
        STOU => stor::handle_stou_command(session, config, arg),
        ABOR => abor::handle_abor_command(session, config, arg),
        QUIT => quit::handle_quit_command(session, config, arg),
    }
}
