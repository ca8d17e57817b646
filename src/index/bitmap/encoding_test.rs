use super::*;

#[test]
fn set_get_clear_round_trip() {
    let mut b = BitSet::new();
    b.set(0);
    b.set(63);
    b.set(64);
    b.set(1000);
    assert!(b.get(0) && b.get(63) && b.get(64) && b.get(1000));
    assert!(!b.get(1));
    b.clear(64);
    assert!(!b.get(64));
    assert_eq!(b.cardinality(), 3);
}

#[test]
fn ones_lists_positions_ascending() {
    let mut b = BitSet::new();
    for p in [5u64, 2, 130, 64] {
        b.set(p);
    }
    assert_eq!(b.ones(), vec![2, 5, 64, 130]);
}

#[test]
fn or_with_unions_bits() {
    let mut a = BitSet::new();
    a.set(1);
    a.set(200);
    let mut b = BitSet::new();
    b.set(2);
    b.set(200);
    let u = a.or_with(&b);
    assert_eq!(u.ones(), vec![1, 2, 200]);
}
