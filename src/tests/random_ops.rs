//! Randomized insert/remove/get sequences checked against a
//! `std::collections::HashMap` oracle.
//!
//! Uses a small hand-rolled xorshift generator instead of a crate: the seed
//! is fixed, so a failure here is always reproducible without needing to
//! print or persist a seed.

use std::collections::HashMap;

use crate::HamtMap;

struct Xorshift64(u64);

impl Xorshift64 {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn next_below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }
}

#[test]
fn random_ops_agree_with_hashmap_oracle() {
    let mut rng = Xorshift64(0x9E37_79B9_7F4A_7C15);
    let mut oracle: HashMap<u16, u32> = HashMap::new();
    let mut map: HamtMap<u16, u32> = HamtMap::new();

    for step in 0_u32..20_000 {
        let key = rng.next_below(500) as u16;
        match rng.next_below(3) {
            0 => {
                let value = rng.next_u64() as u32;
                let expected = oracle.insert(key, value);
                let actual = map.insert(key, value);
                assert_eq!(actual, expected, "insert mismatch at step {step}, key {key}");
            }
            1 => {
                let expected = oracle.remove(&key);
                let actual = map.remove(&key);
                assert_eq!(actual, expected, "remove mismatch at step {step}, key {key}");
            }
            _ => {
                let expected = oracle.get(&key);
                let actual = map.get(&key);
                assert_eq!(actual, expected, "get mismatch at step {step}, key {key}");
            }
        }
        assert_eq!(map.len(), oracle.len(), "length mismatch at step {step}");
    }

    for (k, v) in &oracle {
        assert_eq!(map.get(k), Some(v), "final state missing key {k}");
    }
    assert_eq!(map.len(), oracle.len());
}

/// Random sequence of pure inserts/removes on a clone taken mid-sequence
/// must never perturb the original's contents — exercises the
/// exclusive-ownership fast path and the path-copy fallback against the
/// same oracle in one run.
#[test]
fn random_ops_respect_snapshots() {
    let mut rng = Xorshift64(0xD1B5_4A32_D192_ED03);
    let mut oracle: HashMap<u16, u32> = HashMap::new();
    let mut map: HamtMap<u16, u32> = HamtMap::new();

    for _ in 0_u32..2_000 {
        let key = rng.next_below(200) as u16;
        let value = rng.next_u64() as u32;
        oracle.insert(key, value);
        map.insert(key, value);
    }

    let oracle_snapshot = oracle.clone();
    let map_snapshot = map.clone();

    for _ in 0_u32..2_000 {
        let key = rng.next_below(200) as u16;
        if rng.next_below(2) == 0 {
            let value = rng.next_u64() as u32;
            oracle.insert(key, value);
            map.insert(key, value);
        } else {
            oracle.remove(&key);
            map.remove(&key);
        }
    }

    for (k, v) in &oracle_snapshot {
        assert_eq!(map_snapshot.get(k), Some(v));
    }
    assert_eq!(map_snapshot.len(), oracle_snapshot.len());

    for (k, v) in &oracle {
        assert_eq!(map.get(k), Some(v));
    }
    assert_eq!(map.len(), oracle.len());
}
