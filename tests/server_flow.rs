//! End-to-end exercises over a loopback control connection. A background
//! thread stands in for the host application's frame loop, calling
//! `tick()` at a steady cadence while the test plays the client.

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;
use tickftpd::{Config, FtpServer};

struct TestServer {
    addr: SocketAddr,
    root: TempDir,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TestServer {
    fn start() -> Self {
        let root = TempDir::new().unwrap();
        let mut config = Config::default();
        config.server.listen_port = 0;
        config.server.root_dir = root.path().to_string_lossy().into_owned();

        let mut server = FtpServer::bind(config).unwrap();
        let addr = server.local_addr().unwrap();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                server.tick().unwrap();
                thread::sleep(Duration::from_millis(1));
            }
        });

        Self {
            addr,
            root,
            stop,
            handle: Some(handle),
        }
    }

    fn root_path(&self) -> &std::path::Path {
        self.root.path()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

struct Client {
    reader: BufReader<TcpStream>,
}

impl Client {
    fn connect(server: &TestServer) -> Self {
        let stream = TcpStream::connect(server.addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut client = Self {
            reader: BufReader::new(stream),
        };
        client.expect("220 ");
        client
    }

    fn send(&mut self, line: &str) {
        self.reader
            .get_mut()
            .write_all(format!("{}\r\n", line).as_bytes())
            .unwrap();
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        assert!(!line.is_empty(), "control connection closed unexpectedly");
        line
    }

    /// Reads lines until one starts with `prefix` (code plus space),
    /// skipping the payload of multi-line replies along the way.
    fn expect(&mut self, prefix: &str) -> String {
        loop {
            let line = self.read_line();
            if line.starts_with(prefix) {
                return line;
            }
        }
    }

    fn cmd(&mut self, line: &str, prefix: &str) -> String {
        self.send(line);
        self.expect(prefix)
    }

    /// Negotiates PASV and connects to the advertised address.
    fn pasv_data(&mut self) -> TcpStream {
        let line = self.cmd("PASV", "227 ");
        let start = line.find('(').unwrap() + 1;
        let end = line.find(')').unwrap();
        let nums: Vec<u16> = line[start..end]
            .split(',')
            .map(|p| p.parse().unwrap())
            .collect();
        let ip = Ipv4Addr::new(
            nums[0] as u8,
            nums[1] as u8,
            nums[2] as u8,
            nums[3] as u8,
        );
        let port = nums[4] * 256 + nums[5];
        let stream = TcpStream::connect(SocketAddrV4::new(ip, port)).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream
    }
}

#[test]
fn greeting_and_open_login() {
    let server = TestServer::start();
    let mut client = Client::connect(&server);
    client.cmd("USER backup", "230 ");
    client.cmd("PASS whatever", "230 ");
    client.cmd("SYST", "215 ");
}

#[test]
fn directory_navigation_round_trip() {
    let server = TestServer::start();
    let mut client = Client::connect(&server);

    let reply = client.cmd("PWD", "257 ");
    assert!(reply.contains("\"/\""), "got {:?}", reply);

    client.cmd("MKD saves", "257 ");
    assert!(server.root_path().join("saves").is_dir());

    client.cmd("CWD saves", "250 ");
    let reply = client.cmd("PWD", "257 ");
    assert!(reply.contains("\"/saves\""), "got {:?}", reply);

    client.cmd("CDUP", "250 ");
    let reply = client.cmd("PWD", "257 ");
    assert!(reply.contains("\"/\""), "got {:?}", reply);
}

#[test]
fn traversal_arguments_are_rejected() {
    let server = TestServer::start();
    let mut client = Client::connect(&server);
    client.cmd("CWD ../outside", "553 ");
    client.cmd("DELE a//b", "553 ");
}

#[test]
fn list_of_empty_directory_is_empty() {
    let server = TestServer::start();
    let mut client = Client::connect(&server);

    let mut data = client.pasv_data();
    client.cmd("LIST", "150 ");
    let mut listing = String::new();
    data.read_to_string(&mut listing).unwrap();
    client.expect("226 ");
    assert!(listing.is_empty(), "got {:?}", listing);
}

#[test]
fn malformed_port_leaves_no_grant() {
    let server = TestServer::start();
    let mut client = Client::connect(&server);
    client.cmd("PORT 1,2,3", "501 ");
    // No grant was stored, so a transfer command is out of sequence.
    client.cmd("LIST", "503 ");
}

#[test]
fn stor_then_retr_round_trip() {
    let server = TestServer::start();
    let mut client = Client::connect(&server);

    let mut data = client.pasv_data();
    client.cmd("STOR memcard.bin", "150 ");
    data.write_all(b"abcdefgh").unwrap();
    drop(data);
    client.expect("226 ");
    assert_eq!(
        fs::read(server.root_path().join("memcard.bin")).unwrap(),
        b"abcdefgh"
    );

    let mut data = client.pasv_data();
    client.cmd("RETR memcard.bin", "150 ");
    let mut body = Vec::new();
    data.read_to_end(&mut body).unwrap();
    client.expect("226 ");
    assert_eq!(body, b"abcdefgh");
}

#[test]
fn rest_offsets_apply_to_stor_and_retr() {
    let server = TestServer::start();
    fs::write(server.root_path().join("slot.bin"), b"abcdefgh").unwrap();
    let mut client = Client::connect(&server);

    client.cmd("REST 4", "350 ");
    let mut data = client.pasv_data();
    client.cmd("STOR slot.bin", "150 ");
    data.write_all(b"XYZ").unwrap();
    drop(data);
    client.expect("226 ");
    assert_eq!(
        fs::read(server.root_path().join("slot.bin")).unwrap(),
        b"abcdXYZh"
    );

    client.cmd("REST 4", "350 ");
    let mut data = client.pasv_data();
    client.cmd("RETR slot.bin", "150 ");
    let mut body = Vec::new();
    data.read_to_end(&mut body).unwrap();
    client.expect("226 ");
    assert_eq!(body, b"XYZh");
}

#[test]
fn appe_extends_an_existing_file() {
    let server = TestServer::start();
    fs::write(server.root_path().join("log.txt"), b"one").unwrap();
    let mut client = Client::connect(&server);

    let mut data = client.pasv_data();
    client.cmd("APPE log.txt", "150 ");
    data.write_all(b"two").unwrap();
    drop(data);
    client.expect("226 ");
    assert_eq!(
        fs::read(server.root_path().join("log.txt")).unwrap(),
        b"onetwo"
    );
}

#[test]
fn rename_requires_rnfr_first() {
    let server = TestServer::start();
    fs::write(server.root_path().join("old.bin"), b"x").unwrap();
    let mut client = Client::connect(&server);

    client.cmd("RNTO new.bin", "503 ");

    client.cmd("RNFR old.bin", "350 ");
    client.cmd("RNTO new.bin", "250 ");
    assert!(!server.root_path().join("old.bin").exists());
    assert!(server.root_path().join("new.bin").exists());

    // The pending source was consumed by the rename.
    client.cmd("RNTO again.bin", "503 ");
}

#[test]
fn mlsd_reports_entry_types_and_sizes() {
    let server = TestServer::start();
    fs::write(server.root_path().join("save.dat"), b"0123456789").unwrap();
    fs::create_dir(server.root_path().join("slots")).unwrap();
    let mut client = Client::connect(&server);

    let mut data = client.pasv_data();
    client.cmd("MLSD", "150 ");
    let mut listing = String::new();
    data.read_to_string(&mut listing).unwrap();
    client.expect("226 ");

    let file_line = listing
        .lines()
        .find(|l| l.ends_with("save.dat"))
        .expect("file entry missing");
    assert!(file_line.contains("Type=file;"), "got {:?}", file_line);
    assert!(file_line.contains("Size=10;"), "got {:?}", file_line);

    let dir_line = listing
        .lines()
        .find(|l| l.ends_with("slots"))
        .expect("dir entry missing");
    assert!(dir_line.contains("Type=dir;"), "got {:?}", dir_line);
}

#[test]
fn mlst_answers_over_the_control_connection() {
    let server = TestServer::start();
    fs::write(server.root_path().join("save.dat"), b"abc").unwrap();
    let mut client = Client::connect(&server);

    // No PASV/PORT grant; the reply still arrives in full.
    client.send("MLST save.dat");
    let opener = client.read_line();
    assert!(opener.starts_with("213-"), "got {:?}", opener);
    let fact = client.read_line();
    assert!(fact.contains("Type=file;"), "got {:?}", fact);
    assert!(fact.contains("Size=3;"), "got {:?}", fact);
    assert!(fact.ends_with("/save.dat\r\n"), "got {:?}", fact);
    client.expect("213 ");
}

#[test]
fn stat_of_an_empty_directory_lists_nothing() {
    let server = TestServer::start();
    fs::create_dir(server.root_path().join("slots")).unwrap();
    let mut client = Client::connect(&server);

    client.send("STAT slots");
    let opener = client.read_line();
    assert!(opener.starts_with("213-"), "got {:?}", opener);
    let closer = client.read_line();
    assert!(closer.starts_with("213 "), "got {:?}", closer);
}

#[test]
fn stat_without_argument_reports_server_status() {
    let server = TestServer::start();
    let mut client = Client::connect(&server);

    client.send("STAT");
    let opener = client.read_line();
    assert!(opener.starts_with("211-"), "got {:?}", opener);
    let body = client.expect("211 ");
    assert!(body.starts_with("211 "), "got {:?}", body);
}

#[test]
fn quit_closes_the_session() {
    let server = TestServer::start();
    let mut client = Client::connect(&server);
    client.cmd("QUIT", "221 ");
    let mut rest = String::new();
    // The server closes once the farewell is flushed.
    client.reader.read_to_string(&mut rest).unwrap();
    assert!(rest.is_empty());
}

#[test]
fn size_and_mdtm_report_file_facts() {
    let server = TestServer::start();
    fs::write(server.root_path().join("save.dat"), b"0123").unwrap();
    let mut client = Client::connect(&server);

    let reply = client.cmd("SIZE save.dat", "213 ");
    assert_eq!(reply.trim_end(), "213 4");

    client.cmd("MDTM 20200102030405 save.dat", "213 ");
    let reply = client.cmd("MDTM save.dat", "213 ");
    assert_eq!(reply.trim_end(), "213 20200102030405");
}

#[test]
fn abor_recovers_a_stuck_handshake() {
    let server = TestServer::start();
    let mut client = Client::connect(&server);

    // Negotiate PASV but never connect the data socket; the session is
    // left waiting in the handshake state.
    client.cmd("PASV", "227 ");
    client.cmd("STOR stuck.bin", "150 ");

    client.send("ABOR");
    client.expect("425 ");
    client.expect("225 ");

    // Back to normal command processing.
    client.cmd("NOOP", "200 ");
    client.cmd("MKD after", "257 ");
}

#[test]
fn urgent_abort_resynchronizes_the_command_stream() {
    use std::os::unix::io::AsRawFd;

    let server = TestServer::start();
    let mut client = Client::connect(&server);
    client.cmd("NOOP", "200 ");

    // Telnet abort: IAC IP in band, then IAC DM with the Data Mark byte
    // flagged urgent.
    let stream = client.reader.get_mut();
    stream.write_all(&[0xFF, 0xF4]).unwrap();
    let dm = [0xFFu8, 0xF2];
    let rc = unsafe {
        libc::send(
            stream.as_raw_fd(),
            dm.as_ptr() as *const libc::c_void,
            dm.len(),
            libc::MSG_OOB,
        )
    };
    assert_eq!(rc, 2);

    client.cmd("ABOR", "225 ");
    client.cmd("NOOP", "200 ");
}

#[test]
fn stat_mid_transfer_reports_full_status() {
    let server = TestServer::start();
    let mut client = Client::connect(&server);

    client.cmd("PASV", "227 ");
    client.cmd("STOR stuck.bin", "150 ");

    client.send("STAT");
    let opener = client.read_line();
    assert!(opener.starts_with("211-"), "got {:?}", opener);
    let mut saw_transfer_line = false;
    loop {
        let line = client.read_line();
        if line.starts_with("211 ") {
            break;
        }
        if line.contains("Transfer in progress") {
            saw_transfer_line = true;
        }
    }
    assert!(saw_transfer_line);

    client.send("ABOR");
    client.expect("225 ");
}

#[test]
fn control_channel_stat_preserves_a_pasv_grant() {
    let server = TestServer::start();
    fs::write(server.root_path().join("save.dat"), b"abc").unwrap();
    let mut client = Client::connect(&server);

    let mut data = client.pasv_data();
    client.send("STAT save.dat");
    let opener = client.read_line();
    assert!(opener.starts_with("213-"), "got {:?}", opener);
    client.expect("213 ");

    // The grant was not consumed; the listing still runs over it.
    client.cmd("LIST", "150 ");
    let mut listing = String::new();
    data.read_to_string(&mut listing).unwrap();
    client.expect("226 ");
    assert!(listing.contains("save.dat"), "got {:?}", listing);
}

#[test]
fn commands_mid_transfer_are_rejected() {
    let server = TestServer::start();
    let mut client = Client::connect(&server);

    client.cmd("PASV", "227 ");
    client.cmd("STOR stuck.bin", "150 ");
    client.cmd("PWD", "503 ");
    client.send("ABOR");
    client.expect("225 ");
}

#[test]
fn dele_and_rmd_remove_entries() {
    let server = TestServer::start();
    fs::write(server.root_path().join("gone.bin"), b"x").unwrap();
    fs::create_dir(server.root_path().join("empty")).unwrap();
    let mut client = Client::connect(&server);

    client.cmd("DELE gone.bin", "250 ");
    assert!(!server.root_path().join("gone.bin").exists());

    client.cmd("RMD empty", "250 ");
    assert!(!server.root_path().join("empty").exists());

    client.cmd("DELE gone.bin", "550 ");
}

#[test]
fn stou_picks_an_unused_name() {
    let server = TestServer::start();
    fs::write(server.root_path().join("save.dat"), b"x").unwrap();
    let mut client = Client::connect(&server);

    let mut data = client.pasv_data();
    let reply = client.cmd("STOU save.dat", "150 ");
    assert!(reply.contains("save.dat.1"), "got {:?}", reply);
    data.write_all(b"new").unwrap();
    drop(data);
    client.expect("226 ");
    assert_eq!(
        fs::read(server.root_path().join("save.dat.1")).unwrap(),
        b"new"
    );
}

#[test]
fn type_mode_stru_accept_only_stream_binary() {
    let server = TestServer::start();
    let mut client = Client::connect(&server);

    client.cmd("TYPE I", "200 ");
    client.cmd("TYPE A", "504 ");
    client.cmd("MODE S", "200 ");
    client.cmd("MODE B", "504 ");
    client.cmd("STRU F", "200 ");
    client.cmd("STRU R", "504 ");
}

#[test]
fn sessions_are_independent() {
    let server = TestServer::start();
    let mut first = Client::connect(&server);
    let mut second = Client::connect(&server);

    first.cmd("MKD a", "257 ");
    first.cmd("CWD a", "250 ");
    let reply = second.cmd("PWD", "257 ");
    assert!(reply.contains("\"/\""), "got {:?}", reply);
}
