use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use crate::transport::connection::Connection;

/// Returns a connected pair of loopback sockets: (accepted side, connecting side).
pub fn socket_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let client = TcpStream::connect(addr).expect("connect loopback");
    let (server, _) = listener.accept().expect("accept loopback");
    (server, client)
}

/// A server-side connection handle plus the raw peer socket driving it.
pub fn connection_pair() -> (Connection, TcpStream) {
    let (server, client) = socket_pair();
    (Connection::from_stream(server), client)
}

/// Polls `condition` until it holds or two seconds pass.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
