//! Zero-timeout readiness multiplexing over `poll(2)`, plus the two
//! out-of-band primitives the telnet-urgent path needs.

use std::io;
use std::os::unix::io::RawFd;

pub use libc::{POLLERR, POLLHUP, POLLIN, POLLOUT, POLLPRI};

// The libc crate does not define SIOCATMARK for Linux targets; the value
// comes from <asm-generic/sockios.h>.
#[cfg(target_os = "linux")]
const SIOCATMARK: libc::c_ulong = 0x8905;
#[cfg(not(target_os = "linux"))]
const SIOCATMARK: libc::c_ulong = libc::SIOCATMARK as libc::c_ulong;

/// A reusable set of poll descriptors. One set is built per tick: the
/// listening socket plus, per session, the control socket and whichever
/// data-path socket the session's state cares about.
#[derive(Debug, Default)]
pub struct PollSet {
    fds: Vec<libc::pollfd>,
}

impl PollSet {
    pub fn new() -> Self {
        Self { fds: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.fds.clear();
    }

    /// Registers a descriptor and returns its index for `revents`.
    pub fn push(&mut self, fd: RawFd, events: i16) -> usize {
        self.fds.push(libc::pollfd {
            fd,
            events,
            revents: 0,
        });
        self.fds.len() - 1
    }

    /// Polls every registered descriptor. A zero timeout makes this a pure
    /// readiness probe that never blocks the caller.
    pub fn poll(&mut self, timeout_ms: i32) -> io::Result<usize> {
        if self.fds.is_empty() {
            return Ok(0);
        }
        let rc = unsafe {
            libc::poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as libc::nfds_t,
                timeout_ms,
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(0);
            }
            return Err(err);
        }
        Ok(rc as usize)
    }

    pub fn revents(&self, idx: usize) -> i16 {
        self.fds[idx].revents
    }
}

/// True when the stream's read pointer sits at the urgent mark.
pub fn at_mark(fd: RawFd) -> io::Result<bool> {
    let mut val: libc::c_int = 0;
    let rc = unsafe { libc::ioctl(fd, SIOCATMARK as _, &mut val) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(val != 0)
}

/// Pulls the pending out-of-band byte, if any.
pub fn recv_oob(fd: RawFd) -> io::Result<Option<u8>> {
    let mut byte = 0u8;
    let rc = unsafe {
        libc::recv(
            fd,
            &mut byte as *mut u8 as *mut libc::c_void,
            1,
            libc::MSG_OOB,
        )
    };
    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::EINVAL) {
            return Ok(None);
        }
        return Err(err);
    }
    if rc == 0 {
        return Ok(None);
    }
    Ok(Some(byte))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{TcpListener, TcpStream};
    use std::os::unix::io::AsRawFd;

    #[test]
    fn at_mark_is_false_without_urgent_data() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        assert!(!at_mark(accepted.as_raw_fd()).unwrap());
        drop(client);
    }

    #[test]
    fn empty_set_polls_zero() {
        let mut set = PollSet::new();
        assert_eq!(set.poll(0).unwrap(), 0);
    }

    #[test]
    fn listener_is_not_readable_without_a_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let mut set = PollSet::new();
        let idx = set.push(listener.as_raw_fd(), POLLIN);
        set.poll(0).unwrap();
        assert_eq!(set.revents(idx) & POLLIN, 0);
    }
}
