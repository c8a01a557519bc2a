use crate::node::finger_entry::FingerEntry;
use crate::utils::constants::M;
use crate::utils::crypto::finger_start;
use crate::utils::types::{Address, Key};

/// The M ring shortcuts of a node; entry 0 is the immediate successor.
#[derive(Debug, Clone)]
pub struct FingerTable {
    pub fingers: Vec<FingerEntry>,
}

impl FingerTable {
    pub fn new(key: Key, address: &Address) -> FingerTable {
        let mut fingers = Vec::with_capacity(M as usize);
        for i in 0..M {
            fingers.push(FingerEntry::new(finger_start(key, i), address));
        }
        FingerTable { fingers }
    }

    pub fn successor(&self) -> &Address {
        &self.fingers[0].address
    }

    pub fn set_finger(&mut self, index: usize, address: &Address) {
        self.fingers[index].address = address.clone();
    }

    pub fn set_all_fingers(&mut self, address: &Address) {
        for finger in &mut self.fingers {
            finger.address = address.clone();
        }
    }
}
