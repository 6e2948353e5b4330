use std::io;
use std::mem;
use std::net::{Ipv4Addr, SocketAddrV4, TcpStream};
use std::os::unix::io::{AsRawFd, FromRawFd};

use log::{info, warn};

use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the PORT (Active Mode) FTP command.
///
/// Parses the six comma-separated decimal octets (four address, two port,
/// big-endian split) and stores the target. The outbound connect happens
/// when a transfer actually starts. A malformed argument is a 501 and
/// leaves the session's flags untouched.
pub fn handle_port_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    let addr = match parse_port_argument(arg) {
        Some(addr) => addr,
        None => {
            warn!("Malformed PORT argument: {:?}", arg);
            session.reply(501, "Syntax error in parameters or arguments.");
            return Ok(());
        }
    };

    // A new grant replaces any previous one.
    session.data = None;
    session.pasv_listener = None;
    session.pasv_addr = None;
    session.flags.passive_ready = false;

    info!("PORT target set to {}", addr);
    session.peer_addr = Some(addr);
    session.flags.active_ready = true;
    session.reply(200, "Command okay.");
    Ok(())
}

/// Parses `h1,h2,h3,h4,p1,p2` into a socket address. Any token that is
/// not a decimal octet fails the whole argument.
pub fn parse_port_argument(arg: &str) -> Option<SocketAddrV4> {
    let parts: Vec<&str> = arg.trim().split(',').collect();
    if parts.len() != 6 {
        return None;
    }
    let octets: Vec<u8> = parts
        .iter()
        .map(|p| p.parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    let ip = Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]);
    let port = (octets[4] as u16) << 8 | octets[5] as u16;
    Some(SocketAddrV4::new(ip, port))
}

/// Starts a non-blocking connect to the client-given address.
///
/// Returns the socket with the connect possibly still in progress;
/// completion is detected when the event loop reports it writable and
/// [`connect_result`] reads SO_ERROR.
pub fn start_connect(addr: SocketAddrV4) -> io::Result<TcpStream> {
    unsafe {
        let fd = libc::socket(libc::AF_INET, libc::SOCK_STREAM, 0);
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        let stream = TcpStream::from_raw_fd(fd);
        stream.set_nonblocking(true)?;

        let mut sin: libc::sockaddr_in = mem::zeroed();
        sin.sin_family = libc::AF_INET as libc::sa_family_t;
        sin.sin_port = addr.port().to_be();
        sin.sin_addr.s_addr = u32::from(*addr.ip()).to_be();

        let rc = libc::connect(
            fd,
            &sin as *const libc::sockaddr_in as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
        );
        if rc < 0 {
            let err = io::Error::last_os_error();
            // EINPROGRESS is the normal non-blocking outcome.
            if err.raw_os_error() != Some(libc::EINPROGRESS) {
                return Err(err);
            }
        }
        Ok(stream)
    }
}

/// Resolves an in-progress connect once the socket polls writable,
/// distinguishing success from a deferred failure.
pub fn connect_result(stream: &TcpStream) -> io::Result<()> {
    let mut err: libc::c_int = 0;
    let mut len = mem::size_of::<libc::c_int>() as libc::socklen_t;
    let rc = unsafe {
        libc::getsockopt(
            stream.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_ERROR,
            &mut err as *mut libc::c_int as *mut libc::c_void,
            &mut len,
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    if err != 0 {
        return Err(io::Error::from_raw_os_error(err));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_argument_parses() {
        let addr = parse_port_argument("127,0,0,1,4,210").unwrap();
        assert_eq!(*addr.ip(), Ipv4Addr::LOCALHOST);
        assert_eq!(addr.port(), 4 * 256 + 210);
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        assert!(parse_port_argument("").is_none());
        assert!(parse_port_argument("127,0,0,1,4").is_none());
        assert!(parse_port_argument("127,0,0,1,4,210,9").is_none());
        assert!(parse_port_argument("127,0,0,1,4,bogus").is_none());
        assert!(parse_port_argument("256,0,0,1,4,210").is_none());
        assert!(parse_port_argument("127,0,0,1,-4,210").is_none());
    }

    #[test]
    fn connect_to_a_loopback_listener_completes() {
        use std::net::TcpListener;
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = match listener.local_addr().unwrap() {
            std::net::SocketAddr::V4(a) => a,
            _ => unreachable!(),
        };
        let stream = start_connect(addr).unwrap();
        let _peer = listener.accept().unwrap();
        // Loopback connects settle immediately once accepted.
        connect_result(&stream).unwrap();
    }
}
