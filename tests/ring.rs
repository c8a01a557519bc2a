use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::sleep;

use chord_ring::kv;
use chord_ring::net::client::{request_address, send_request};
use chord_ring::net::message::{Request, ACK, ALIVE_TOKEN};
use chord_ring::node::state::Node;
use chord_ring::threads::{fix_fingers, join, listener, stabilize, successors};
use chord_ring::utils::constants::KEYSPACE;
use chord_ring::utils::crypto::{belongs, hash, node_key};
use chord_ring::utils::types::{Address, Key};

/// Spawns real nodes on ephemeral localhost ports. Ports are redrawn
/// until every node lands on a distinct ring key, since the reference
/// keyspace of 32 positions collides easily.
struct TestRing {
    nodes: Vec<Node>,
    used_keys: HashSet<Key>,
}

impl TestRing {
    fn new() -> TestRing {
        TestRing {
            nodes: Vec::new(),
            used_keys: HashSet::new(),
        }
    }

    async fn bind_distinct(&mut self) -> (Address, TcpListener) {
        loop {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let port = listener.local_addr().unwrap().port();
            let ip: IpAddr = "127.0.0.1".parse().unwrap();
            let address = Address::new("localhost", ip, port);
            if self.used_keys.insert(node_key(&address)) {
                return (address, listener);
            }
        }
    }

    async fn bootstrap(&mut self) -> Node {
        let (address, tcp_listener) = self.bind_distinct().await;
        let node = Node::new(address);
        tokio::spawn(listener::serve(node.clone(), tcp_listener));
        self.start_maintenance(&node).await;
        self.nodes.push(node.clone());
        node
    }

    async fn join(&mut self, helper: &Node) -> Node {
        let (address, tcp_listener) = self.bind_distinct().await;
        let node = Node::new(address);
        join::join_ring(&node, helper.address()).await.unwrap();
        tokio::spawn(listener::serve(node.clone(), tcp_listener));
        join::refine_fingers(&node, helper.address()).await;
        join::announce(&node).await;
        join::migrate_keys(&node).await;
        self.start_maintenance(&node).await;
        self.nodes.push(node.clone());
        node
    }

    async fn start_maintenance(&self, node: &Node) {
        successors::init_successor_list(node).await;
        tokio::spawn(stabilize::run(node.clone()));
        tokio::spawn(fix_fingers::run(node.clone()));
        tokio::spawn(successors::run(node.clone()));
    }

    fn stop_all(&self) {
        for node in &self.nodes {
            node.stop();
        }
    }
}

/// First live key at or past `id`, walking clockwise.
fn responsible_key(keys: &[Key], id: Key) -> Key {
    keys.iter()
        .copied()
        .filter(|key| *key >= id)
        .min()
        .unwrap_or_else(|| keys.iter().copied().min().unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn wire_protocol_answers_every_command() {
    // handler only, no maintenance loops, so answers are deterministic
    let tcp_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = tcp_listener.local_addr().unwrap().port();
    let ip: IpAddr = "127.0.0.1".parse().unwrap();
    let address = Address::new("localhost", ip, port);
    let node = Node::new(address.clone());
    tokio::spawn(listener::serve(node.clone(), tcp_listener));

    assert_eq!(send_request(&address, &Request::Alive).await.unwrap(), ALIVE_TOKEN);
    assert_eq!(
        request_address(&address, &Request::YourSuccessor).await.unwrap(),
        address
    );
    assert_eq!(
        request_address(&address, &Request::YourPredecessor).await.unwrap(),
        address
    );
    assert_eq!(
        request_address(&address, &Request::FindSuccessor(7)).await.unwrap(),
        address
    );

    let other = Address::new("localhost", ip, port.wrapping_add(1));
    assert_eq!(
        send_request(&address, &Request::ChangePredecessor(other.clone())).await.unwrap(),
        ACK
    );
    assert_eq!(node.predecessor_address(), other);
    assert_eq!(
        send_request(&address, &Request::ChangeSuccessor(other.clone())).await.unwrap(),
        ACK
    );
    assert_eq!(node.successor_address(), other);
    assert_eq!(node.successor_entry(0), other);

    // an empty transfer is an empty response line, not an error
    let key = node.key();
    assert_eq!(
        send_request(&address, &Request::TransferKeys(key, key)).await.unwrap(),
        ""
    );

    // unknown commands get a benign ack
    assert_eq!(
        send_request(&address, &Request::Unknown("Bogus:1:2".to_string())).await.unwrap(),
        ACK
    );

    node.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_node_ring_owns_every_id() {
    let mut ring = TestRing::new();
    let node = ring.bootstrap().await;
    node.seed_data(kv::synthesize_files(8));

    for id in 0..KEYSPACE {
        assert_eq!(node.find_successor(id).await, *node.address());
    }
    assert_eq!(node.predecessor_address(), *node.address());
    for finger in node.finger_entries() {
        assert_eq!(finger.address, *node.address());
    }
    assert_eq!(node.files().len(), 8);

    ring.stop_all();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_node_ring_routes_every_id_consistently() {
    let mut ring = TestRing::new();
    let a = ring.bootstrap().await;
    let b = ring.join(&a).await;
    sleep(Duration::from_millis(1500)).await;

    assert_eq!(a.successor_address(), *b.address());
    assert_eq!(b.successor_address(), *a.address());
    assert_eq!(a.predecessor_address(), *b.address());
    assert_eq!(b.predecessor_address(), *a.address());
    // the successor list head tracks the successor pointer
    assert_eq!(a.successor_entry(0), *b.address());
    assert_eq!(b.successor_entry(0), *a.address());

    let a_key = node_key(a.address());
    let b_key = node_key(b.address());
    for id in 0..KEYSPACE {
        let from_a = a.find_successor(id).await;
        let from_b = b.find_successor(id).await;
        assert_eq!(from_a, from_b, "nodes disagree on owner of id {}", id);

        let expected = if belongs(a_key, false, b_key, true, id) {
            b.address()
        } else {
            a.address()
        };
        assert_eq!(from_a, *expected, "wrong owner for id {}", id);
    }

    ring.stop_all();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn join_moves_exactly_the_claimed_arc() {
    let mut ring = TestRing::new();
    let a = ring.bootstrap().await;
    let filenames: Vec<String> = (0..24).map(|i| format!("file-{}.txt", i)).collect();
    for filename in &filenames {
        a.insert_file(filename);
    }

    let b = ring.join(&a).await;

    let a_key = node_key(a.address());
    let b_key = node_key(b.address());
    let a_files: HashSet<String> = a.files().into_iter().collect();
    let b_files: HashSet<String> = b.files().into_iter().collect();

    for filename in &filenames {
        let key = hash(filename.as_bytes());
        if belongs(a_key, false, b_key, true, key) {
            assert!(b_files.contains(filename), "{} should have moved to the joiner", filename);
            assert!(!a_files.contains(filename));
        } else {
            assert!(a_files.contains(filename), "{} should have stayed", filename);
            assert!(!b_files.contains(filename));
        }
    }

    ring.stop_all();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_node_is_routed_around() {
    let mut ring = TestRing::new();
    let a = ring.bootstrap().await;
    let b = ring.join(&a).await;
    sleep(Duration::from_millis(300)).await;
    let c = ring.join(&b).await;
    sleep(Duration::from_millis(300)).await;
    let d = ring.join(&c).await;
    sleep(Duration::from_millis(2500)).await;

    // kill one node that is not the bootstrap helper of the others
    d.stop();
    sleep(Duration::from_millis(3000)).await;

    let survivors = [a.clone(), b.clone(), c.clone()];
    let mut ordered: Vec<&Node> = survivors.iter().collect();
    ordered.sort_by_key(|node| node.key());
    let keys: Vec<Key> = ordered.iter().map(|node| node.key()).collect();
    let count = ordered.len();

    for (i, node) in ordered.iter().enumerate() {
        // the successor chain forms a single cycle over the survivors
        let expected_successor = ordered[(i + 1) % count].address();
        assert_eq!(node.successor_address(), *expected_successor, "broken cycle at {}", node.address());
        // the list head never drifts from the successor pointer
        assert_eq!(node.successor_entry(0), *expected_successor);
        // backups walk further around the cycle
        for (j, entry) in node.successor_entries().iter().enumerate().skip(1) {
            let expected = ordered[(i + j + 1) % count].address();
            assert_eq!(*entry, *expected, "stale backup {} on {}", j, node.address());
        }
        // every finger points at the live node responsible for its start
        for finger in node.finger_entries() {
            let expected = responsible_key(&keys, finger.start);
            assert_eq!(
                node_key(&finger.address),
                expected,
                "finger with start {} on {} points at the wrong node",
                finger.start,
                node.address()
            );
        }
        // the failed node's predecessor pointer was repaired too
        let expected_predecessor = ordered[(i + count - 1) % count].address();
        assert_eq!(node.predecessor_address(), *expected_predecessor);
    }

    ring.stop_all();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lookups_agree_from_every_node() {
    let mut ring = TestRing::new();
    let a = ring.bootstrap().await;
    let b = ring.join(&a).await;
    sleep(Duration::from_millis(300)).await;
    let c = ring.join(&a).await;
    sleep(Duration::from_millis(2000)).await;

    let keys: Vec<Key> = [&a, &b, &c].iter().map(|node| node.key()).collect();
    for id in 0..KEYSPACE {
        let expected = responsible_key(&keys, id);
        for node in [&a, &b, &c] {
            let owner = node.find_successor(id).await;
            assert_eq!(
                node_key(&owner),
                expected,
                "node {} resolved id {} to {}",
                node.address(),
                id,
                owner
            );
        }
    }

    ring.stop_all();
}
