use std::io::{BufRead, Write};
use std::thread;

use tracing::{debug, info, warn};

use crate::transport::connection::Connection;
use crate::transport::message::Message;
use crate::utils::error::Result;

/// Console-side chat participant.
///
/// One thread prints everything the server relays; the caller's thread
/// reads lines and sends them until input ends or the user types `quit`.
#[derive(Debug)]
pub struct ChatClient {
    connection: Connection,
}

impl ChatClient {
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let connection = Connection::connect(host, port)?;
        info!("client connected to {host}:{port}");
        Ok(Self { connection })
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Relays `input` to the server and server messages to `output` until
    /// the session ends. The connection is closed on return.
    pub fn run<R, W>(self, input: R, output: W) -> Result<()>
    where
        R: BufRead,
        W: Write + Send + 'static,
    {
        let receiver = {
            let connection = self.connection.clone();
            thread::Builder::new()
                .name("client-listener".into())
                .spawn(move || print_incoming(connection, output))?
        };

        let sent = self.send_lines(input);
        debug!("client disconnected");
        self.connection.disconnect();
        if receiver.join().is_err() {
            warn!("client listener panicked");
        }
        sent
    }

    fn send_lines<R: BufRead>(&self, input: R) -> Result<()> {
        for line in input.lines() {
            if !self.connection.is_connected() {
                break;
            }
            let message = Message::with_body(line?.trim())?;
            if message.is_quit() {
                break;
            }
            if !message.is_empty() {
                self.connection.send(&message);
            }
        }
        Ok(())
    }
}

fn print_incoming<W: Write>(connection: Connection, mut output: W) {
    debug!("listening for messages from the server");
    for message in connection.receive() {
        let id = message.id().map_or_else(|| "-".to_string(), |id| id.to_string());
        if let Err(e) = writeln!(output, "{id} {}", message.body()).and_then(|_| output.flush()) {
            warn!(error = %e, "cannot write incoming message");
            break;
        }
    }
    connection.disconnect();
}
