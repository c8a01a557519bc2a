use std::time::Duration;

use log::debug;
use rand::Rng;
use tokio::time::sleep;

use crate::node::state::Node;
use crate::utils::constants::{M, MAINTENANCE_SLEEP_MILLIS};
use crate::utils::crypto::finger_start;

/// Finger table repair. Each iteration resolves the current owner of
/// one uniformly random finger start; entry 0 is excluded, the
/// stabilize loop owns it.
pub async fn run(node: Node) {
    while node.is_active() {
        sleep(Duration::from_millis(MAINTENANCE_SLEEP_MILLIS)).await;

        let index = rand::thread_rng().gen_range(1..M as usize);
        let start = finger_start(node.key(), index as u32);
        let address = node.find_successor(start).await;
        debug!("finger {} (start {}) now points at {}", index, start, address);
        node.set_finger(index, &address);
    }
}
