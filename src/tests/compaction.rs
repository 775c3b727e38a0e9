//! Contents (not structure) must be order-independent, and deletion must
//! compact back down rather than leaving empty scaffolding behind.

use crate::HamtMap;

/// Insertion order must not affect the resulting contents.
#[test]
fn insert_order_abc_cba_bca_same_contents() {
    let orders: [&[(i32, i32)]; 3] = [
        &[(1, 10), (2, 20), (3, 30)],
        &[(3, 30), (2, 20), (1, 10)],
        &[(2, 20), (3, 30), (1, 10)],
    ];

    let maps: Vec<HamtMap<i32, i32>> = orders
        .iter()
        .map(|pairs| {
            let mut m = HamtMap::new();
            for &(k, v) in *pairs {
                m.insert(k, v);
            }
            m
        })
        .collect();

    assert_eq!(maps[0], maps[1]);
    assert_eq!(maps[1], maps[2]);
    assert_eq!(maps[0].len(), maps[1].len());
}

/// Larger set, three orderings, same resulting map.
#[test]
fn insert_order_100_entries_same_contents() {
    let entries: Vec<(u64, u64)> = (0..100).map(|i| (i, i * 7)).collect();

    let mut forward = HamtMap::new();
    for &(k, v) in &entries {
        forward.insert(k, v);
    }

    let mut backward = HamtMap::new();
    for &(k, v) in entries.iter().rev() {
        backward.insert(k, v);
    }

    let mut interleaved = HamtMap::new();
    for &(k, v) in entries.iter().step_by(2) {
        interleaved.insert(k, v);
    }
    for &(k, v) in entries.iter().skip(1).step_by(2) {
        interleaved.insert(k, v);
    }

    assert_eq!(forward, backward);
    assert_eq!(forward, interleaved);
    assert_eq!(forward.len(), 100);
}

/// After overwrite, contents match a map built with the final value only.
#[test]
fn overwrite_converges_to_same_contents() {
    let mut map_a = HamtMap::new();
    map_a.insert(1, 10);
    map_a.insert(2, 20);
    map_a.insert(1, 11); // overwrite

    let mut map_b = HamtMap::new();
    map_b.insert(2, 20);
    map_b.insert(1, 11);

    assert_eq!(map_a, map_b);
}

/// After delete, contents match a map that never had the deleted key.
#[test]
fn delete_converges_to_same_contents() {
    let mut map_a = HamtMap::new();
    map_a.insert(1, 10);
    map_a.insert(2, 20);
    map_a.insert(3, 30);
    map_a.remove(&2);

    let mut map_b = HamtMap::new();
    map_b.insert(3, 30);
    map_b.insert(1, 10);

    assert_eq!(map_a, map_b);
}

/// Build up then tear down entirely via every deletion order; the map must
/// end up empty and equal to a fresh one regardless of removal order.
#[test]
fn full_teardown_any_removal_order_reaches_empty() {
    let keys: Vec<u64> = (0..64).collect();

    for start in [0usize, 7, 31, 63] {
        let mut map = HamtMap::new();
        for &k in &keys {
            map.insert(k, k * 2);
        }

        let mut order = keys.clone();
        order.rotate_left(start);
        for k in order {
            assert!(map.remove(&k).is_some());
        }

        assert!(map.is_empty());
        assert_eq!(map, HamtMap::new());
    }
}

/// A node that still has other occupants after a child collapses to a
/// single residue must inline that residue, not force-empty itself.
#[test]
fn partial_removal_keeps_siblings_intact() {
    let mut map = HamtMap::new();
    for i in 0_u64..40 {
        map.insert(i, i);
    }
    // Remove most of one batch, leaving scattered survivors across several
    // subtrees — exercises both the inline and node-to-inline collapse
    // paths without ever touching every sibling of an affected node.
    for i in (0_u64..40).step_by(3) {
        map.remove(&i);
    }

    for i in 0_u64..40 {
        if i % 3 == 0 {
            assert_eq!(map.get(&i), None, "key {i} should have been removed");
        } else {
            assert_eq!(map.get(&i), Some(&i), "key {i} should still be present");
        }
    }
}
