use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::debug;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::net::message::Request;
use crate::utils::constants::REQUEST_TIMEOUT_MILLIS;
use crate::utils::types::Address;

/// Sentinel outcome for any socket, I/O, timeout or parse failure
/// while talking to a peer. Callers read it as evidence the peer is
/// dead; retry policy lives with the caller, never in the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unreachable;

impl fmt::Display for Unreachable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer unreachable")
    }
}

impl Error for Unreachable {}

/// Sends one request line to `addr` and reads one response line over
/// a fresh TCP connection, dropped after the exchange.
pub async fn send_request(addr: &Address, request: &Request) -> Result<String, Unreachable> {
    let deadline = Duration::from_millis(REQUEST_TIMEOUT_MILLIS);
    match timeout(deadline, roundtrip(addr, request)).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => {
            debug!("request {:?} to {} failed: {}", request, addr, e);
            Err(Unreachable)
        }
        Err(_) => {
            debug!("request {:?} to {} timed out", request, addr);
            Err(Unreachable)
        }
    }
}

async fn roundtrip(addr: &Address, request: &Request) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr.socket_addr()).await?;
    stream.write_all(request.encode().as_bytes()).await?;
    stream.write_all(b"\n").await?;

    let mut response = String::new();
    let read = BufReader::new(stream).read_line(&mut response).await?;
    if read == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before the response line",
        ));
    }
    Ok(response.trim_end().to_string())
}

/// `send_request` for commands whose response is an address; a
/// response that does not parse as one counts as unreachable.
pub async fn request_address(addr: &Address, request: &Request) -> Result<Address, Unreachable> {
    let response = send_request(addr, request).await?;
    Address::from_str(&response).map_err(|_| Unreachable)
}
