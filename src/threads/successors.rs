use std::time::Duration;

use log::debug;
use rand::Rng;
use tokio::time::sleep;

use crate::net::client::request_address;
use crate::net::message::Request;
use crate::node::state::Node;
use crate::utils::constants::{MAINTENANCE_SLEEP_MILLIS, SUCCESSOR_LIST_DEPTH};

/// Fills the backup list once at startup by walking hops forward from
/// the successor; entries past an unreachable hop keep their sentinel.
pub async fn init_successor_list(node: &Node) {
    let mut current = node.successor_address();
    for i in 0..SUCCESSOR_LIST_DEPTH - 1 {
        match request_address(&current, &Request::YourSuccessor).await {
            Ok(next) => {
                node.set_successor_entry(i + 1, &next);
                current = next;
            }
            Err(_) => break,
        }
    }
}

/// Backup successor repair. Each iteration re-derives one random
/// entry from its predecessor in the list; a dead entry closes the
/// list up, except for the head, which the stabilize loop owns.
pub async fn run(node: Node) {
    while node.is_active() {
        sleep(Duration::from_millis(MAINTENANCE_SLEEP_MILLIS)).await;

        let index = rand::thread_rng().gen_range(0..SUCCESSOR_LIST_DEPTH);
        let target = node.successor_entry(index);
        match request_address(&target, &Request::YourSuccessor).await {
            Ok(next) => node.set_successor_entry(index + 1, &next),
            Err(_) if index != 0 => {
                debug!("successor list entry {} unreachable, closing up", index);
                node.shift_successors(index);
            }
            Err(_) => {}
        }
    }
}
