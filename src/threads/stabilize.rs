use std::time::Duration;

use log::{debug, warn};
use tokio::time::sleep;

use crate::net::client::{request_address, send_request};
use crate::net::message::Request;
use crate::node::state::Node;
use crate::utils::constants::MAINTENANCE_SLEEP_MILLIS;
use crate::utils::crypto::{belongs, node_key};

/// Successor and predecessor repair. Each iteration asks the current
/// successor for its predecessor: an unreachable successor is dropped
/// in favor of the next backup, a predecessor sitting between us and
/// the successor is adopted into both head slots, and the round ends
/// with a Notify so the successor learns about us in turn.
pub async fn run(node: Node) {
    while node.is_active() {
        sleep(Duration::from_millis(MAINTENANCE_SLEEP_MILLIS)).await;

        let successor = node.successor_address();
        match request_address(&successor, &Request::YourPredecessor).await {
            Err(_) => {
                let next = node.adopt_next_successor();
                warn!("successor {} unreachable, falling back to {}", successor, next);
            }
            Ok(predecessor) => {
                let predecessor_key = node_key(&predecessor);
                let successor_key = node_key(&successor);
                if belongs(node.key(), false, successor_key, false, predecessor_key) {
                    debug!("tightening successor to {}", predecessor);
                    node.set_successor(&predecessor);
                }
            }
        }

        let successor = node.successor_address();
        if send_request(&successor, &Request::Notify(node.address().clone())).await.is_err() {
            debug!("could not notify {}", successor);
        }
    }
}
