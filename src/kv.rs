use rand::distributions::Alphanumeric;
use rand::Rng;
use rayon::prelude::*;

use crate::utils::crypto::hash;
use crate::utils::types::DataStore;

/// Synthesizes the data set a bootstrap node starts out with: random
/// filenames, hashed in parallel onto the ring. Names stay free of
/// the protocol's `:` separator by construction.
pub fn synthesize_files(count: usize) -> DataStore {
    let names: Vec<String> = (0..count).map(|_| random_filename()).collect();
    names
        .into_par_iter()
        .map(|name| {
            let key = hash(name.as_bytes());
            (name, key)
        })
        .collect()
}

fn random_filename() -> String {
    let stem: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("{}.txt", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::KEYSPACE;

    #[test]
    fn synthetic_files_carry_their_own_ring_keys() {
        let data = synthesize_files(32);
        assert_eq!(data.len(), 32);
        for (name, key) in data {
            assert!(name.ends_with(".txt"));
            assert!(!name.contains(':'));
            assert!(key < KEYSPACE);
            assert_eq!(key, hash(name.as_bytes()));
        }
    }
}
