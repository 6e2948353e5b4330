//! Directory entry formatting for LIST, NLST, MLSD, MLST and STAT.

use std::fs::Metadata;

use chrono::{DateTime, Duration, Local, Utc};

use crate::core_path::codec::encode_path;

/// Which formatting a listing transfer applies to each entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    List,
    Nlst,
    Mlsd,
    Mlst,
    Stat,
}

impl ListingMode {
    /// MLST and STAT listings travel on the control connection.
    pub fn over_control(self) -> bool {
        matches!(self, ListingMode::Mlst | ListingMode::Stat)
    }

    /// Response code closing a clean listing: 213 for the control-channel
    /// modes, 226 for the data-connection ones.
    pub fn final_code(self) -> u16 {
        if self.over_control() {
            213
        } else {
            226
        }
    }
}

/// The enabled MLST facts, toggled by `OPTS MLST`.
#[derive(Debug, Clone, Copy)]
pub struct MlstFacts {
    pub kind: bool,
    pub size: bool,
    pub modify: bool,
    pub perm: bool,
    pub unix_mode: bool,
}

impl Default for MlstFacts {
    fn default() -> Self {
        Self {
            kind: true,
            size: true,
            modify: true,
            perm: true,
            unix_mode: true,
        }
    }
}

#[cfg(unix)]
fn mode_bits(md: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    md.mode()
}

#[cfg(not(unix))]
fn mode_bits(md: &Metadata) -> u32 {
    if md.permissions().readonly() {
        0o555
    } else {
        0o755
    }
}

/// Renders one filesystem entry in the requested listing mode.
///
/// `path` is the entry's absolute virtual path (what NLST and MLST emit),
/// `name` its bare name (what LIST and MLSD emit). `is_cdir` tags the
/// directory being listed in its own right (`Type=cdir`).
pub fn format_entry(
    mode: ListingMode,
    facts: &MlstFacts,
    path: &str,
    name: &str,
    md: &Metadata,
    now: DateTime<Local>,
    is_cdir: bool,
) -> String {
    match mode {
        ListingMode::Nlst => format!("{}\r\n", encode_path(path, false)),
        ListingMode::List | ListingMode::Stat => unix_line(name, md, now),
        ListingMode::Mlsd => fact_line(facts, name, md, is_cdir, false),
        ListingMode::Mlst => fact_line(facts, path, md, is_cdir, true),
    }
}

/// Classic `ls -l` style line: permissions, link count placeholder,
/// owner/group placeholders, size, date, name.
fn unix_line(name: &str, md: &Metadata, now: DateTime<Local>) -> String {
    let mtime: DateTime<Local> = md
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| now);

    // Recent entries show the clock time, older ones the year.
    let six_months = Duration::days(180);
    let date = if now.signed_duration_since(mtime).abs() < six_months {
        mtime.format("%b %e %H:%M").to_string()
    } else {
        mtime.format("%b %e  %Y").to_string()
    };

    format!(
        "{} {:>3} {:<8} {:<8} {:>13} {} {}\r\n",
        perm_string(md),
        1,
        "ftp",
        "ftp",
        md.len(),
        date,
        encode_path(name, false)
    )
}

fn perm_string(md: &Metadata) -> String {
    let mode = mode_bits(md);
    let mut out = String::with_capacity(10);
    out.push(if md.is_dir() { 'd' } else { '-' });
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

/// RFC 3659 fact string. MLST lines carry a leading space.
fn fact_line(facts: &MlstFacts, name: &str, md: &Metadata, is_cdir: bool, mlst: bool) -> String {
    let mut out = String::new();
    if mlst {
        out.push(' ');
    }
    if facts.kind {
        let kind = if is_cdir {
            "cdir"
        } else if md.is_dir() {
            "dir"
        } else {
            "file"
        };
        out.push_str(&format!("Type={};", kind));
    }
    if facts.size {
        out.push_str(&format!("Size={};", md.len()));
    }
    if facts.modify {
        if let Ok(modified) = md.modified() {
            let stamp: DateTime<Utc> = modified.into();
            out.push_str(&format!("Modify={};", stamp.format("%Y%m%d%H%M%S")));
        }
    }
    if facts.perm {
        out.push_str(&format!("Perm={};", perm_fact(md)));
    }
    if facts.unix_mode {
        out.push_str(&format!("UNIX.mode=0{:o};", mode_bits(md) & 0o777));
    }
    out.push(' ');
    out.push_str(&encode_path(name, false));
    out.push_str("\r\n");
    out
}

/// Computes the `Perm=` fact from the owner permission bits, emitted in
/// the fixed order `acdeflmprw`.
fn perm_fact(md: &Metadata) -> String {
    let mode = mode_bits(md);
    let readable = mode & 0o400 != 0;
    let writable = mode & 0o200 != 0;
    let executable = mode & 0o100 != 0;
    let dir = md.is_dir();

    let mut out = String::new();
    if !dir && writable {
        out.push('a');
    }
    if dir && writable {
        out.push('c');
    }
    if writable {
        out.push('d');
    }
    if dir && executable {
        out.push('e');
    }
    if writable {
        out.push('f');
    }
    if dir && readable {
        out.push('l');
    }
    if dir && writable {
        out.push('m');
        out.push('p');
    }
    if !dir && readable {
        out.push('r');
    }
    if !dir && writable {
        out.push('w');
    }
    out
}
