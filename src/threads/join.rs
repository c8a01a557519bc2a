use log::{info, warn};

use crate::net::client::{request_address, send_request, Unreachable};
use crate::net::message::Request;
use crate::node::state::Node;
use crate::utils::constants::{KEYSPACE, M};
use crate::utils::crypto::{belongs, finger_start, node_key};
use crate::utils::types::{Address, Key};

/// Steps a joining node runs against its helper before its own
/// request handler goes live: resolve the successor, prefill the
/// fingers with it, adopt its predecessor, announce ourselves to it.
pub async fn join_ring(node: &Node, helper: &Address) -> Result<(), Unreachable> {
    info!("joining ring via {}", helper);
    let successor = request_address(helper, &Request::FindSuccessor(node.key())).await?;
    node.prefill_fingers(&successor);

    let predecessor = request_address(&successor, &Request::YourPredecessor).await?;
    node.set_predecessor(&predecessor);

    send_request(&successor, &Request::Notify(node.address().clone())).await?;
    info!("successor is {}, predecessor is {}", successor, predecessor);
    Ok(())
}

/// Replaces the placeholder fingers one interval at a time, skipping
/// the remote lookup whenever the previous finger already covers the
/// next interval.
pub async fn refine_fingers(node: &Node, helper: &Address) {
    for i in 1..M as usize {
        let last_start = finger_start(node.key(), (i - 1) as u32);
        let this_start = finger_start(node.key(), i as u32);
        let previous = node.finger_address(i - 1);
        if !belongs(last_start, true, this_start, false, node_key(&previous)) {
            node.set_finger(i, &previous);
        } else {
            match request_address(helper, &Request::FindSuccessor(this_start)).await {
                Ok(address) => node.set_finger(i, &address),
                Err(_) => warn!("helper could not resolve finger {}, keeping placeholder", i),
            }
        }
    }
}

/// Visits every ring arc whose i-th finger may now be this node and
/// plants the update there; receivers propagate it backwards along
/// their predecessor chains.
pub async fn announce(node: &Node) {
    for i in 0..M as usize {
        let step: Key = 1 << i;
        let required = (node.key() + KEYSPACE - step) & (KEYSPACE - 1);
        let predecessor = node.find_predecessor(required).await;
        let successor = match request_address(&predecessor, &Request::YourSuccessor).await {
            Ok(address) => address,
            Err(_) => continue,
        };
        // the successor of the required position takes the update
        // instead whenever this node sits at ring distance >= 2^i
        // from it, i.e. outside [successor, successor + 2^i)
        let successor_key = node_key(&successor);
        let in_reach = belongs(successor_key, true, finger_start(successor_key, i as u32), false, node.key());
        let target = if !in_reach { successor } else { predecessor };
        if target != *node.address()
            && send_request(&target, &Request::UpdateIthFinger(i, node.address().clone())).await.is_err()
        {
            warn!("could not announce finger {} to {}", i, target);
        }
    }
}

/// Claims the key range `(predecessor, self]` from the successor.
pub async fn migrate_keys(node: &Node) {
    let successor = node.successor_address();
    if successor == *node.address() {
        return;
    }
    let predecessor_key = node_key(&node.predecessor_address());
    match send_request(&successor, &Request::TransferKeys(node.key(), predecessor_key)).await {
        Ok(response) => {
            let mut count = 0;
            for filename in response.split(':').filter(|f| !f.is_empty()) {
                node.insert_file(filename);
                count += 1;
            }
            info!("took over {} files from {}", count, successor);
        }
        Err(_) => warn!("successor unreachable during key handoff"),
    }
}
