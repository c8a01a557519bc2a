use log::{debug, info};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::StreamExt;

use crate::net::message::{Request, ACK, ALIVE_TOKEN};
use crate::node::state::Node;

/// Accept loop. Every connection is answered by a fresh task so a
/// slow lookup never blocks the acceptor; dropping the listener on
/// stop is what unblocks the pending accept.
pub async fn serve(node: Node, listener: TcpListener) {
    let mut stop_rx = node.subscribe_stop();
    let mut incoming = TcpListenerStream::new(listener);
    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            accepted = incoming.next() => match accepted {
                Some(Ok(socket)) => {
                    let node = node.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(node, socket).await {
                            debug!("connection handler failed: {}", e);
                        }
                    });
                }
                Some(Err(e)) => debug!("accept failed: {}", e),
                None => break,
            }
        }
    }
    info!("request handler stopped");
}

/// One request line in, one response line out, connection closed.
async fn handle_connection(node: Node, mut socket: TcpStream) -> std::io::Result<()> {
    let (reader, mut writer) = socket.split();
    let mut lines = BufReader::new(reader).lines();
    if let Some(line) = lines.next_line().await? {
        let response = dispatch(&node, Request::parse(&line)).await;
        writer.write_all(response.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    Ok(())
}

/// The command table of the wire protocol.
pub async fn dispatch(node: &Node, request: Request) -> String {
    match request {
        Request::YourSuccessor => node.successor_address().to_string(),
        Request::YourPredecessor => node.predecessor_address().to_string(),
        Request::FindSuccessor(id) => node.find_successor(id).await.to_string(),
        Request::FindPredecessor(id) => node.find_predecessor(id).await.to_string(),
        Request::ChangeSuccessor(address) => {
            node.set_successor(&address);
            ACK.to_string()
        }
        Request::ChangePredecessor(address) => {
            node.set_predecessor(&address);
            ACK.to_string()
        }
        Request::UpdateIthFinger(index, address) => {
            node.update_ith_finger(index, address).await;
            ACK.to_string()
        }
        Request::TransferKeys(first, second) => node.transfer_keys(first, second),
        Request::Notify(address) => {
            node.notify_candidate(address).await;
            ACK.to_string()
        }
        Request::Alive => ALIVE_TOKEN.to_string(),
        Request::Unknown(line) => {
            debug!("unknown request: {:?}", line);
            ACK.to_string()
        }
    }
}
