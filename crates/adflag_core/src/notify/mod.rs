//! Player update notifications.
//!
//! After each persisted break the publisher sends one `COMMFLAG_UPDATE`
//! command through an [`UpdateChannel`]. The backend acknowledges with
//! `"OK"`; anything else is treated by the caller as a best-effort failure.

use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;

use thiserror::Error;

/// Errors from the notification channel.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Could not reach the backend.
    #[error("Failed to connect to backend at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Connection established but the exchange failed.
    #[error("Backend exchange failed: {0}")]
    Io(#[from] io::Error),
}

/// Result type for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Command channel to the backend.
///
/// `send` delivers one command and returns the backend's acknowledgment
/// string verbatim (whitespace trimmed).
pub trait UpdateChannel {
    fn send(&mut self, message: &str) -> NotifyResult<String>;
}

/// Build the skip-list update command for a run.
pub fn flag_update_message(run_key: &str, skip_list: &str) -> String {
    format!("COMMFLAG_UPDATE {} {}", run_key, skip_list)
}

/// TCP implementation: one newline-terminated command per connection,
/// one-line reply.
#[derive(Debug, Clone)]
pub struct TcpChannel {
    addr: String,
}

impl TcpChannel {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl UpdateChannel for TcpChannel {
    fn send(&mut self, message: &str) -> NotifyResult<String> {
        let mut stream = TcpStream::connect(&self.addr).map_err(|e| NotifyError::Connect {
            addr: self.addr.clone(),
            source: e,
        })?;

        stream.write_all(message.as_bytes())?;
        stream.write_all(b"\n")?;
        stream.flush()?;

        let mut reply = String::new();
        BufReader::new(&stream).read_line(&mut reply)?;

        Ok(reply.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    /// One-shot backend stub: accepts a single connection, records the
    /// command, replies with `reply`.
    fn spawn_backend(reply: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut line = String::new();
            BufReader::new(&stream).read_line(&mut line).unwrap();
            let mut stream = stream;
            stream.write_all(reply.as_bytes()).unwrap();
            stream.write_all(b"\n").unwrap();
            line.trim().to_string()
        });

        (addr, handle)
    }

    #[test]
    fn message_format() {
        assert_eq!(
            flag_update_message("1021_2024-05-01T20:00:00", "1200:4,1500:5"),
            "COMMFLAG_UPDATE 1021_2024-05-01T20:00:00 1200:4,1500:5"
        );
    }

    #[test]
    fn sends_command_and_reads_ack() {
        let (addr, handle) = spawn_backend("OK");

        let mut channel = TcpChannel::new(addr);
        let ack = channel.send("COMMFLAG_UPDATE key list").unwrap();

        assert_eq!(ack, "OK");
        assert_eq!(handle.join().unwrap(), "COMMFLAG_UPDATE key list");
    }

    #[test]
    fn returns_non_ok_ack_verbatim() {
        let (addr, _handle) = spawn_backend("ERROR busy");

        let mut channel = TcpChannel::new(addr);
        let ack = channel.send("COMMFLAG_UPDATE key list").unwrap();

        assert_eq!(ack, "ERROR busy");
    }

    #[test]
    fn connect_failure_is_reported() {
        // Port 1 is essentially never listening.
        let mut channel = TcpChannel::new("127.0.0.1:1");
        let result = channel.send("COMMFLAG_UPDATE key list");
        assert!(matches!(result, Err(NotifyError::Connect { .. })));
    }
}
