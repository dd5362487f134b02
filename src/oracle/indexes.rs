// Pseudorandom index assignment
//
// Indexes come from Keccak-256 over (seed address, nonce, attempt). Mixing in
// the ledger nonce keeps two registrations from the same block of calls apart.

use crate::identity::Address;
use sha3::{Digest, Keccak256};

fn draw(seed: &Address, nonce: u64, attempt: u64, domain: u16) -> u8 {
    let mut hasher = Keccak256::new();
    hasher.update(seed.as_bytes());
    hasher.update(nonce.to_be_bytes());
    hasher.update(attempt.to_be_bytes());
    let digest = hasher.finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(head) % domain.max(1) as u64) as u8
}

/// One index in `0..domain`
pub fn random_index(seed: &Address, nonce: u64, domain: u16) -> u8 {
    draw(seed, nonce, 0, domain)
}

/// `count` distinct indexes in `0..domain`. `count` must not exceed `domain`.
pub fn generate_indexes(seed: &Address, nonce: u64, count: usize, domain: u16) -> Vec<u8> {
    let count = count.min(domain as usize);
    let mut indexes = Vec::with_capacity(count);
    let mut attempt = 0u64;

    while indexes.len() < count {
        let index = draw(seed, nonce, attempt, domain);
        if !indexes.contains(&index) {
            indexes.push(index);
        }
        attempt += 1;
    }

    indexes
}
