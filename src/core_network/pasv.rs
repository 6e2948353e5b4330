use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream};

use log::{debug, info, warn};

use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the PASV FTP command.
///
/// Binds a fresh listener on an ephemeral port on the same address the
/// control connection arrived on (or the configured override), stores the
/// bound address and advertises it in the 227 reply. The event loop
/// accepts the client's connection later, when the listener polls
/// readable.
pub fn handle_pasv_command(
    session: &mut Session,
    config: &Config,
    _arg: &str,
) -> Result<(), FtpError> {
    // A new grant replaces any previous one.
    session.data = None;
    session.pasv_listener = None;
    session.pasv_addr = None;
    session.flags.active_ready = false;
    session.peer_addr = None;

    let ip = pasv_ip(session, config);
    let (listener, addr) = match setup_pasv_listener(ip) {
        Ok(pair) => pair,
        Err(e) => {
            warn!("Failed to bind passive listener: {}", e);
            session.reply(425, &format!("Can't open data connection: {}", e));
            return Ok(());
        }
    };

    debug!("PASV listener bound on {}", addr);
    session.pasv_listener = Some(listener);
    session.pasv_addr = Some(addr);
    session.flags.passive_ready = true;
    session.reply_raw(&format_pasv_response(addr));
    Ok(())
}

/// The address to advertise: the config override when present, otherwise
/// the control connection's own local address.
fn pasv_ip(session: &Session, config: &Config) -> Ipv4Addr {
    if let Some(override_addr) = &config.server.pasv_address {
        if let Ok(ip) = override_addr.parse::<Ipv4Addr>() {
            return ip;
        }
        warn!("Ignoring unparsable pasv_address {:?}", override_addr);
    }
    match session.control.local_addr() {
        Ok(SocketAddr::V4(addr)) => *addr.ip(),
        _ => Ipv4Addr::LOCALHOST,
    }
}

/// Sets up a passive mode listener on an ephemeral port.
pub fn setup_pasv_listener(ip: Ipv4Addr) -> io::Result<(TcpListener, SocketAddrV4)> {
    let listener = TcpListener::bind(SocketAddrV4::new(ip, 0))?;
    listener.set_nonblocking(true)?;
    let addr = match listener.local_addr()? {
        SocketAddr::V4(addr) => addr,
        SocketAddr::V6(_) => {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "passive listener bound to an IPv6 address",
            ))
        }
    };
    Ok((listener, addr))
}

/// Encodes the 227 reply: four address octets plus the port split
/// big-endian, commas replacing dots.
pub fn format_pasv_response(addr: SocketAddrV4) -> String {
    let [a, b, c, d] = addr.ip().octets();
    format!(
        "227 Entering Passive Mode ({},{},{},{},{},{}).\r\n",
        a,
        b,
        c,
        d,
        addr.port() / 256,
        addr.port() % 256
    )
}

/// Non-blocking accept on the passive listener. `None` means no client
/// has connected yet; try again next tick.
pub fn accept_pasv_connection(listener: &TcpListener) -> io::Result<Option<TcpStream>> {
    match listener.accept() {
        Ok((stream, peer)) => {
            stream.set_nonblocking(true)?;
            info!("Accepted data connection from {}", peer);
            Ok(Some(stream))
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(e) => Err(e),
    }
}
