use std::env;
use std::process::exit;
use std::str::FromStr;

use chord_ring::net::client::request_address;
use chord_ring::net::message::Request;
use chord_ring::utils::crypto::node_key;
use chord_ring::utils::types::Address;

/// Probes a running cluster over the wire protocol and checks that
/// successor and predecessor pointers form a single consistent cycle.
#[tokio::main]
async fn main() {
    let addresses: Vec<Address> = env::args()
        .skip(1)
        .map(|raw| Address::from_str(&raw).unwrap_or_else(|_| panic!("invalid address: {}", raw)))
        .collect();
    if addresses.is_empty() {
        eprintln!("usage: validate_ring <host/ip:port> ...");
        exit(1);
    }

    let mut nodes = addresses;
    nodes.sort_by_key(node_key);

    let mut is_valid = true;
    for (i, node) in nodes.iter().enumerate() {
        let expected_successor = &nodes[(i + 1) % nodes.len()];
        let expected_predecessor = &nodes[(i + nodes.len() - 1) % nodes.len()];

        match request_address(node, &Request::YourSuccessor).await {
            Ok(successor) if successor == *expected_successor => {}
            Ok(successor) => {
                eprintln!("node {} has successor {}, expected {}", node, successor, expected_successor);
                is_valid = false;
            }
            Err(_) => {
                eprintln!("node {} is unreachable", node);
                is_valid = false;
                continue;
            }
        }

        match request_address(node, &Request::YourPredecessor).await {
            Ok(predecessor) if predecessor == *expected_predecessor => {}
            Ok(predecessor) => {
                eprintln!("node {} has predecessor {}, expected {}", node, predecessor, expected_predecessor);
                is_valid = false;
            }
            Err(_) => {
                eprintln!("node {} is unreachable", node);
                is_valid = false;
            }
        }
    }

    if is_valid {
        eprintln!("Looks good!");
    } else {
        eprintln!("Cluster is invalid!");
        exit(1);
    }
}
