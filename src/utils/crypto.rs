use sha1::{Digest, Sha1};

use crate::utils::constants::{KEYSPACE, M};
use crate::utils::types::{Address, Key};

/// Folds the SHA-1 digest of `bytes` into an M bit ring position.
///
/// The 160 digest bits are consumed MSB-first in groups of M bits and
/// XOR-combined; a trailing partial group (when 160 is not a multiple
/// of M) is zero-padded on the right. Pure function of M, so every
/// node derives the same key for the same input.
pub fn hash(bytes: &[u8]) -> Key {
    let digest = Sha1::digest(bytes);
    let mut folded: Key = 0;
    let mut group: Key = 0;
    let mut group_bits: u32 = 0;
    for &byte in digest.iter() {
        for bit in (0..8).rev() {
            group = (group << 1) | ((byte >> bit) & 1) as Key;
            group_bits += 1;
            if group_bits == M {
                folded ^= group;
                group = 0;
                group_bits = 0;
            }
        }
    }
    if group_bits > 0 {
        folded ^= group << (M - group_bits);
    }
    folded & (KEYSPACE - 1)
}

/// Ring position of a node, derived from its canonical address text.
pub fn node_key(address: &Address) -> Key {
    hash(address.to_string().as_bytes())
}

/// Start of the i-th finger interval of `key`: `(key + 2^i) mod KEYSPACE`.
pub fn finger_start(key: Key, i: u32) -> Key {
    let step: Key = 1 << i;
    (key + step) & (KEYSPACE - 1)
}

/// Membership of `id` in the ring arc from `left` to `right`.
///
/// The one predicate behind every ordering decision in the system:
/// - left < right: plain interval containment with the stated
///   inclusivity on each end
/// - left == right: every id when either end is inclusive, otherwise
///   the full arc minus the single point `left`
/// - left > right: the arc wraps past zero; `id` belongs iff it does
///   not lie in the complementary arc with both inclusivities flipped
pub fn belongs(left: Key, left_incl: bool, right: Key, right_incl: bool, id: Key) -> bool {
    if left < right {
        (left < id || (left_incl && id == left)) && (id < right || (right_incl && id == right))
    } else if left == right {
        left_incl || right_incl || id != left
    } else {
        !belongs(right, !right_incl, left, !left_incl, id)
    }
}
