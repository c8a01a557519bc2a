use std::fmt;
use std::fmt::Debug;

use serde::Serialize;

use crate::utils::types::{Address, Key};

/// An entry in the FingerTable
#[derive(Clone, Serialize)]
pub struct FingerEntry {
    pub start: Key,
    pub address: Address,
}

impl Debug for FingerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("")
            .field("start", &self.start)
            .field("address", &self.address)
            .finish()
    }
}

impl FingerEntry {
    pub fn new(start: Key, address: &Address) -> Self {
        FingerEntry {
            start,
            address: address.clone(),
        }
    }
}
