use tokio::io::{stdin, AsyncBufReadExt, BufReader};

use crate::node::state::Node;
use crate::utils::crypto::{hash, node_key};

/// Operator shell on stdin. Runs until `stop` or EOF; `stop` also
/// winds the node down.
pub async fn run(node: Node) {
    let mut lines = BufReader::new(stdin()).lines();
    print_help();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };
        let line = line.trim();
        let (command, argument) = match line.split_once(' ') {
            Some((command, argument)) => (command, Some(argument.trim())),
            None => (line, None),
        };
        match (command, argument) {
            ("address", None) => println!("{} (key {})", node.address(), node.key()),
            ("neighbors", None) => {
                println!("predecessor: {}", node.predecessor_address());
                println!("successor:   {}", node.successor_address());
            }
            ("files", None) => {
                for filename in node.files() {
                    println!("{} (key {})", filename, hash(filename.as_bytes()));
                }
            }
            ("successors", None) => {
                for (i, address) in node.successor_entries().iter().enumerate() {
                    println!("[{}] {}", i, address);
                }
            }
            ("fingers", None) => {
                for (i, finger) in node.finger_entries().iter().enumerate() {
                    println!(
                        "[{}] start {:>2} -> {} (key {})",
                        i,
                        finger.start,
                        finger.address,
                        node_key(&finger.address)
                    );
                }
            }
            ("lookup", Some(filename)) if !filename.is_empty() => {
                let key = hash(filename.as_bytes());
                let responsible = node.find_successor(key).await;
                println!("{} (key {}) is stored on {}", filename, key, responsible);
            }
            ("stop", None) => {
                node.stop();
                break;
            }
            ("help", None) | ("", None) => print_help(),
            _ => println!("unknown command, try 'help'"),
        }
    }
}

fn print_help() {
    println!("commands: address | neighbors | files | successors | fingers | lookup <file> | stop");
}
