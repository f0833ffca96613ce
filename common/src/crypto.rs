//! Common cryptography helper functions for the bridge

use crate::hash::Hash;
use blake2::{
    digest::consts::{U28, U32},
    Blake2b, Digest,
};

/// Get a Blake2b-224 hash of a key (or a tagged script)
pub fn keyhash_224(key: &[u8]) -> Hash<28> {
    let mut hasher = Blake2b::<U28>::new();
    hasher.update(key);
    Hash::new(hasher.finalize().into())
}

/// Get a Blake2b-224 hash of `data` prefixed with a single `tag` byte
pub fn keyhash_224_tagged(tag: u8, data: &[u8]) -> Hash<28> {
    let mut hasher = Blake2b::<U28>::new();
    hasher.update([tag]);
    hasher.update(data);
    Hash::new(hasher.finalize().into())
}

/// Get a Blake2b-256 hash of some data
pub fn hash_256(data: &[u8]) -> Hash<32> {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    Hash::new(hasher.finalize().into())
}
