//! FTP line-format path escaping.
//!
//! A path may legally contain a newline, but responses are newline
//! terminated. RFC 959 reserves NUL for exactly this: newlines travelling
//! inside a response line are sent as NUL and restored by the peer.
//! Double-quoted paths (PWD/MKD/MLST) additionally double embedded quotes.

/// Escapes a path for transmission inside a command or response line.
pub fn encode_path(input: &str, quoted: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\n' => out.push('\0'),
            '"' if quoted => {
                out.push('"');
                out.push('"');
            }
            c => out.push(c),
        }
    }
    out
}

/// Restores newlines in an inbound command line, in place.
///
/// Applied to the raw line before any other parsing, since NUL cannot
/// otherwise occur inside a command.
pub fn decode_line(line: &mut [u8]) {
    for byte in line.iter_mut() {
        if *byte == 0 {
            *byte = b'\n';
        }
    }
}
