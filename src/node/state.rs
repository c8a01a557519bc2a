use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::debug;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::net::client::{request_address, send_request};
use crate::net::message::Request;
use crate::node::finger_entry::FingerEntry;
use crate::node::finger_table::FingerTable;
use crate::node::successor_list::SuccessorList;
use crate::utils::constants::{LOOKUP_RETRY_SLEEP_MILLIS, M};
use crate::utils::crypto::{belongs, hash, node_key};
use crate::utils::types::{Address, DataStore, Key};

/// The mutable routing record of a node. Every write goes through the
/// single mutex wrapping this struct; readers tolerate a stale
/// snapshot and re-verify over the wire before committing changes.
#[derive(Debug)]
pub struct RoutingState {
    pub predecessor: Address,
    pub fingers: FingerTable,
    pub successors: SuccessorList,
    pub data: DataStore,
}

/// Cheap-to-clone handle on a running node, shared by the request
/// handler and the three maintenance loops.
#[derive(Clone)]
pub struct Node {
    address: Address,
    key: Key,
    state: Arc<Mutex<RoutingState>>,
    active: Arc<AtomicBool>,
    stop_tx: Arc<watch::Sender<bool>>,
}

impl Node {
    /// Creates a node whose routing state points at itself, the shape
    /// a bootstrap node keeps until peers show up.
    pub fn new(address: Address) -> Node {
        let key = node_key(&address);
        let state = RoutingState {
            predecessor: address.clone(),
            fingers: FingerTable::new(key, &address),
            successors: SuccessorList::new(&address, &address),
            data: DataStore::new(),
        };
        let (stop_tx, _) = watch::channel(false);
        Node {
            address,
            key,
            state: Arc::new(Mutex::new(state)),
            active: Arc::new(AtomicBool::new(true)),
            stop_tx: Arc::new(stop_tx),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Signals the loops and the listener to wind down; each exits at
    /// its next iteration boundary.
    pub fn stop(&self) {
        self.active.store(false, Ordering::Release);
        let _ = self.stop_tx.send(true);
    }

    pub fn subscribe_stop(&self) -> watch::Receiver<bool> {
        self.stop_tx.subscribe()
    }

    // snapshot accessors

    pub fn successor_address(&self) -> Address {
        self.state.lock().unwrap().fingers.successor().clone()
    }

    pub fn predecessor_address(&self) -> Address {
        self.state.lock().unwrap().predecessor.clone()
    }

    pub fn finger_address(&self, index: usize) -> Address {
        self.state.lock().unwrap().fingers.fingers[index].address.clone()
    }

    pub fn finger_entries(&self) -> Vec<FingerEntry> {
        self.state.lock().unwrap().fingers.fingers.clone()
    }

    pub fn successor_entries(&self) -> Vec<Address> {
        self.state.lock().unwrap().successors.successors.clone()
    }

    pub fn successor_entry(&self, index: usize) -> Address {
        self.state.lock().unwrap().successors.successors[index].clone()
    }

    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.state.lock().unwrap().data.keys().cloned().collect();
        files.sort();
        files
    }

    // pointer setters

    /// Assigns the successor pointer, keeping the successor list head
    /// aligned with `fingers[0]`.
    pub fn set_successor(&self, address: &Address) {
        let mut state = self.state.lock().unwrap();
        state.fingers.set_finger(0, address);
        state.successors.set_head(address);
    }

    pub fn set_predecessor(&self, address: &Address) {
        self.state.lock().unwrap().predecessor = address.clone();
    }

    pub fn set_finger(&self, index: usize, address: &Address) {
        let mut state = self.state.lock().unwrap();
        state.fingers.set_finger(index, address);
        if index == 0 {
            state.successors.set_head(address);
        }
    }

    /// Placeholder fill used while joining: every finger and the list
    /// head point at the successor until the table is refined.
    pub fn prefill_fingers(&self, address: &Address) {
        let mut state = self.state.lock().unwrap();
        state.fingers.set_all_fingers(address);
        state.successors.set_head(address);
    }

    pub fn set_successor_entry(&self, index: usize, address: &Address) {
        self.state.lock().unwrap().successors.successors[index] = address.clone();
    }

    pub fn shift_successors(&self, index: usize) {
        self.state.lock().unwrap().successors.shift(index);
    }

    /// Drops the failed head off the successor list and adopts the
    /// next backup as the new successor.
    pub fn adopt_next_successor(&self) -> Address {
        let mut state = self.state.lock().unwrap();
        let next = state.successors.next_successor();
        state.fingers.set_finger(0, &next);
        next
    }

    // stored data

    pub fn seed_data(&self, data: DataStore) {
        self.state.lock().unwrap().data = data;
    }

    pub fn insert_file(&self, filename: &str) {
        let key = hash(filename.as_bytes());
        self.state.lock().unwrap().data.insert(filename.to_string(), key);
    }

    /// Splits off every stored filename whose key falls in the arc
    /// `(second, first]` and returns them colon-joined; the caller is
    /// the new owner of that arc.
    pub fn transfer_keys(&self, first: Key, second: Key) -> String {
        let mut state = self.state.lock().unwrap();
        let moved: Vec<String> = state
            .data
            .iter()
            .filter(|(_, key)| belongs(second, false, first, true, **key))
            .map(|(filename, _)| filename.clone())
            .collect();
        for filename in &moved {
            state.data.remove(filename);
        }
        moved.join(":")
    }

    // lookups

    /// First node whose key is >= `id` on the ring. Loops until a
    /// live predecessor answers; liveness holds while at least one
    /// responsive node covers the arc.
    pub async fn find_successor(&self, id: Key) -> Address {
        loop {
            let predecessor = self.find_predecessor(id).await;
            if predecessor == self.address {
                return self.successor_address();
            }
            match request_address(&predecessor, &Request::YourSuccessor).await {
                Ok(successor) => return successor,
                Err(_) => {
                    if !self.is_active() {
                        return self.address.clone();
                    }
                    sleep(Duration::from_millis(LOOKUP_RETRY_SLEEP_MILLIS)).await;
                }
            }
        }
    }

    /// Node whose half-open arc `(key, successor]` covers `id`.
    /// Forwarding reroutes around dead fingers by retargeting at the
    /// closest preceding finger of the failed node's own key.
    pub async fn find_predecessor(&self, id: Key) -> Address {
        loop {
            let successor_key = node_key(&self.successor_address());
            if belongs(self.key, false, successor_key, true, id) {
                return self.address.clone();
            }
            let mut target = self.closest_preceding_finger(id);
            if target == self.address {
                return self.address.clone();
            }
            loop {
                match request_address(&target, &Request::FindPredecessor(id)).await {
                    Ok(predecessor) => return predecessor,
                    Err(_) => {
                        if !self.is_active() {
                            return self.address.clone();
                        }
                        let detour = self.closest_preceding_finger(node_key(&target));
                        if detour == target || detour == self.address {
                            sleep(Duration::from_millis(LOOKUP_RETRY_SLEEP_MILLIS)).await;
                            break;
                        }
                        target = detour;
                    }
                }
            }
        }
    }

    /// Last finger whose key lies strictly inside the open arc from
    /// this node to `id`; the node itself when none qualifies.
    pub fn closest_preceding_finger(&self, id: Key) -> Address {
        let state = self.state.lock().unwrap();
        for finger in state.fingers.fingers.iter().rev() {
            let finger_key = node_key(&finger.address);
            if belongs(self.key, false, id, false, finger_key) {
                return finger.address.clone();
            }
        }
        self.address.clone()
    }

    // updates driven by peers

    /// Considers `candidate` as the new predecessor. A predecessor
    /// that fails its liveness probe is replaced unconditionally,
    /// which is what lets the ring close again after a failure.
    pub async fn notify_candidate(&self, candidate: Address) {
        let current = self.predecessor_address();
        let alive = send_request(&current, &Request::Alive).await.is_ok();
        let candidate_key = node_key(&candidate);

        let mut state = self.state.lock().unwrap();
        let predecessor_key = node_key(&state.predecessor);
        if !alive || belongs(predecessor_key, false, self.key, false, candidate_key) {
            debug!("adopting {} as predecessor", candidate);
            state.predecessor = candidate;
        }
    }

    /// Inductive step of the join advertisement: adopt `candidate` as
    /// the i-th finger when it tightens the entry, then pass the word
    /// on to the predecessor; otherwise the propagation stops here.
    pub async fn update_ith_finger(&self, index: usize, candidate: Address) {
        if index >= M as usize {
            return;
        }
        let candidate_key = node_key(&candidate);
        let forward_to = {
            let mut state = self.state.lock().unwrap();
            let finger_key = node_key(&state.fingers.fingers[index].address);
            if belongs(self.key, false, finger_key, false, candidate_key) {
                state.fingers.set_finger(index, &candidate);
                if index == 0 {
                    state.successors.set_head(&candidate);
                }
                Some(state.predecessor.clone())
            } else {
                None
            }
        };
        if let Some(predecessor) = forward_to {
            if send_request(&predecessor, &Request::UpdateIthFinger(index, candidate)).await.is_err() {
                debug!("could not forward finger update to {}", predecessor);
            }
        }
    }
}
