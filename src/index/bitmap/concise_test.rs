use super::*;
use crate::index::bitmap::encoding::BitSet;

#[test]
fn round_trips_sparse_bitmap() {
    let len = 1000u64;
    let mut bits = BitSet::new();
    for p in [0u64, 1, 2, 500, 501, 999] {
        bits.set(p);
    }
    let words = encode(&bits, len);
    let back = decode(&words, len);
    assert_eq!(back.ones(), bits.ones());
}

#[test]
fn one_bit_exception_does_not_split_the_fill_run() {
    let len = 310u64; // 10 chunks of 31 bits, all set except one stray bit
    let mut bits = BitSet::new();
    for p in 0..len {
        bits.set(p);
    }
    bits.clear(170); // lands inside chunk 5
    let words = encode(&bits, len);
    let back = decode(&words, len);
    assert_eq!(back.ones(), bits.ones());
    assert!(words.len() <= 2, "expected the run to stay in one or two fill words, got {}", words.len());
}

#[test]
fn round_trips_pseudo_random_bitmap() {
    let len = 5000u64;
    let mut bits = BitSet::new();
    let mut state = 98765u64;
    for p in 0..len {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        if (state >> 61) % 3 == 0 {
            bits.set(p);
        }
    }
    let words = encode(&bits, len);
    let back = decode(&words, len);
    assert_eq!(back.ones(), bits.ones());
}
