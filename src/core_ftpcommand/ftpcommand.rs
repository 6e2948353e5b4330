/// The recognized command verbs.
#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    SYST,
    FEAT,
    HELP,
    NOOP,
    MODE,
    STRU,
    TYPE,
    OPTS,
    PASV,
    PORT,
    PWD,
    CWD,
    CDUP,
    MKD,
    RMD,
    DELE,
    RNFR,
    RNTO,
    SIZE,
    MDTM,
    REST,
    LIST,
    NLST,
    MLSD,
    MLST,
    STAT,
    RETR,
    STOR,
    APPE,
    STOU,
    ABOR,
    QUIT,
}

impl FtpCommand {
    /// Case-insensitive lookup, including the RFC 775 X-aliases.
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "SYST" => Some(FtpCommand::SYST),
            "FEAT" => Some(FtpCommand::FEAT),
            "HELP" => Some(FtpCommand::HELP),
            "NOOP" => Some(FtpCommand::NOOP),
            "MODE" => Some(FtpCommand::MODE),
            "STRU" => Some(FtpCommand::STRU),
            "TYPE" => Some(FtpCommand::TYPE),
            "OPTS" => Some(FtpCommand::OPTS),
            "PASV" => Some(FtpCommand::PASV),
            "PORT" => Some(FtpCommand::PORT),
            "PWD" | "XPWD" => Some(FtpCommand::PWD),
            "CWD" | "XCWD" => Some(FtpCommand::CWD),
            "CDUP" | "XCUP" => Some(FtpCommand::CDUP),
            "MKD" | "XMKD" => Some(FtpCommand::MKD),
            "RMD" | "XRMD" => Some(FtpCommand::RMD),
            "DELE" => Some(FtpCommand::DELE),
            "RNFR" => Some(FtpCommand::RNFR),
            "RNTO" => Some(FtpCommand::RNTO),
            "SIZE" => Some(FtpCommand::SIZE),
            "MDTM" => Some(FtpCommand::MDTM),
            "REST" => Some(FtpCommand::REST),
            "LIST" => Some(FtpCommand::LIST),
            "NLST" => Some(FtpCommand::NLST),
            "MLSD" => Some(FtpCommand::MLSD),
            "MLST" => Some(FtpCommand::MLST),
            "STAT" => Some(FtpCommand::STAT),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "APPE" => Some(FtpCommand::APPE),
            "STOU" => Some(FtpCommand::STOU),
            "ABOR" => Some(FtpCommand::ABOR),
            "QUIT" => Some(FtpCommand::QUIT),
            _ => None,
        }
    }

    /// True for the verbs a session still answers while a transfer is in
    /// flight.
    pub fn allowed_during_transfer(self) -> bool {
        matches!(self, FtpCommand::ABOR | FtpCommand::STAT | FtpCommand::QUIT)
    }
}

/// Every recognized verb, for HELP output.
pub const COMMAND_NAMES: &[&str] = &[
    "ABOR", "APPE", "CDUP", "CWD", "DELE", "FEAT", "HELP", "LIST", "MDTM", "MKD", "MLSD", "MLST",
    "MODE", "NLST", "NOOP", "OPTS", "PASS", "PASV", "PORT", "PWD", "QUIT", "REST", "RETR", "RMD",
    "RNFR", "RNTO", "SIZE", "STAT", "STOR", "STOU", "STRU", "SYST", "TYPE", "USER",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(FtpCommand::from_str("retr"), Some(FtpCommand::RETR));
        assert_eq!(FtpCommand::from_str("ReTr"), Some(FtpCommand::RETR));
    }

    #[test]
    fn aliases_map_to_their_commands() {
        assert_eq!(FtpCommand::from_str("XCWD"), Some(FtpCommand::CWD));
        assert_eq!(FtpCommand::from_str("XCUP"), Some(FtpCommand::CDUP));
        assert_eq!(FtpCommand::from_str("XMKD"), Some(FtpCommand::MKD));
        assert_eq!(FtpCommand::from_str("XPWD"), Some(FtpCommand::PWD));
        assert_eq!(FtpCommand::from_str("XRMD"), Some(FtpCommand::RMD));
    }

    #[test]
    fn unknown_verbs_do_not_resolve() {
        assert_eq!(FtpCommand::from_str("EPSV"), None);
        assert_eq!(FtpCommand::from_str(""), None);
    }

    #[test]
    fn only_three_verbs_survive_a_transfer() {
        assert!(FtpCommand::ABOR.allowed_during_transfer());
        assert!(FtpCommand::STAT.allowed_during_transfer());
        assert!(FtpCommand::QUIT.allowed_during_transfer());
        assert!(!FtpCommand::RETR.allowed_during_transfer());
        assert!(!FtpCommand::NOOP.allowed_during_transfer());
    }
}
