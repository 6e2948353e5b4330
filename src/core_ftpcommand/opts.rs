use crate::core_listing::MlstFacts;
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the OPTS FTP command.
///
/// Supports `OPTS MLST fact;fact;...` to select which facts MLST/MLSD emit,
/// and `OPTS UTF8 ON` as a no-op acknowledgement.
pub fn handle_opts_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    let (name, rest) = match arg.split_once(' ') {
        Some((n, r)) => (n, r.trim()),
        None => (arg, ""),
    };

    if name.eq_ignore_ascii_case("MLST") {
        let facts = parse_fact_list(rest);
        session.mlst_facts = facts;
        session.reply(200, &format!("MLST OPTS {}", fact_summary(&facts)));
    } else if name.eq_ignore_ascii_case("UTF8") {
        session.reply(200, "UTF8 mode is always on.");
    } else {
        session.reply(501, "Option not understood.");
    }
    Ok(())
}

fn parse_fact_list(list: &str) -> MlstFacts {
    let mut facts = MlstFacts {
        kind: false,
        size: false,
        modify: false,
        perm: false,
        unix_mode: false,
    };
    for fact in list.split(';').filter(|f| !f.is_empty()) {
        if fact.eq_ignore_ascii_case("Type") {
            facts.kind = true;
        } else if fact.eq_ignore_ascii_case("Size") {
            facts.size = true;
        } else if fact.eq_ignore_ascii_case("Modify") {
            facts.modify = true;
        } else if fact.eq_ignore_ascii_case("Perm") {
            facts.perm = true;
        } else if fact.eq_ignore_ascii_case("UNIX.mode") {
            facts.unix_mode = true;
        }
    }
    facts
}

fn fact_summary(facts: &MlstFacts) -> String {
    let mut out = String::new();
    if facts.kind {
        out.push_str("Type;");
    }
    if facts.size {
        out.push_str("Size;");
    }
    if facts.modify {
        out.push_str("Modify;");
    }
    if facts.perm {
        out.push_str("Perm;");
    }
    if facts.unix_mode {
        out.push_str("UNIX.mode;");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_list_is_case_insensitive() {
        let facts = parse_fact_list("type;SIZE;unix.MODE;");
        assert!(facts.kind);
        assert!(facts.size);
        assert!(facts.unix_mode);
        assert!(!facts.modify);
        assert!(!facts.perm);
    }

    #[test]
    fn unknown_facts_are_ignored() {
        let facts = parse_fact_list("Charset;Type;");
        assert!(facts.kind);
        assert!(!facts.size);
        assert_eq!(fact_summary(&facts), "Type;");
    }
}
