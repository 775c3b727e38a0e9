use crate::HamtMap;

#[test]
fn default_is_empty() {
    let map: HamtMap<i32, i32> = HamtMap::default();
    assert!(map.is_empty());
}

#[test]
fn debug_format() {
    let map: HamtMap<i32, i32> = HamtMap::new();
    let dbg = format!("{map:?}");
    assert!(dbg.contains("HamtMap"));
    assert!(dbg.contains("len"));
}

#[test]
fn from_iterator() {
    let map: HamtMap<i32, i32> = vec![(1, 10), (2, 20), (3, 30)].into_iter().collect();
    assert_eq!(map.len(), 3);
    assert_eq!(map.get(&1), Some(&10));
}

#[test]
fn extend_trait() {
    let mut map = HamtMap::new();
    map.insert(1, 10);
    map.extend(vec![(2, 20), (3, 30)]);
    assert_eq!(map.len(), 3);
}

#[test]
fn index_existing() {
    let mut map = HamtMap::new();
    map.insert("key", 42);
    assert_eq!(map[&"key"], 42);
}

#[test]
#[should_panic(expected = "key not found")]
fn index_missing_panics() {
    let map: HamtMap<i32, i32> = HamtMap::new();
    let _ = map[&999];
}

#[test]
fn equality_ignores_insertion_order() {
    let a: HamtMap<i32, i32> = [(1, 1), (2, 2), (3, 3)].into_iter().collect();
    let b: HamtMap<i32, i32> = [(3, 3), (1, 1), (2, 2)].into_iter().collect();
    assert_eq!(a, b);
}

#[test]
fn equality_is_sensitive_to_values() {
    let a: HamtMap<i32, i32> = [(1, 1)].into_iter().collect();
    let b: HamtMap<i32, i32> = [(1, 2)].into_iter().collect();
    assert_ne!(a, b);
}

#[test]
fn equality_is_sensitive_to_missing_keys() {
    let a: HamtMap<i32, i32> = [(1, 1), (2, 2)].into_iter().collect();
    let b: HamtMap<i32, i32> = [(1, 1)].into_iter().collect();
    assert_ne!(a, b);
}

#[test]
fn into_iter_over_reference_matches_iter() {
    let map: HamtMap<i32, i32> = [(1, 10), (2, 20)].into_iter().collect();
    let via_trait: Vec<_> = (&map).into_iter().collect();
    let via_method: Vec<_> = map.iter().collect();
    assert_eq!(via_trait, via_method);
}
