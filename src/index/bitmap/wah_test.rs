use super::*;
use crate::index::bitmap::encoding::BitSet;

fn bits_from(positions: &[u64], len: u64) -> BitSet {
    let mut b = BitSet::new();
    for &p in positions {
        if p < len {
            b.set(p);
        }
    }
    b
}

#[test]
fn round_trips_sparse_bitmap() {
    let len = 1000u64;
    let positions = [0u64, 1, 2, 500, 501, 999];
    let bits = bits_from(&positions, len);
    let words = encode(&bits, len);
    let back = decode(&words, len);
    assert_eq!(back.ones(), bits.ones());
}

#[test]
fn round_trips_all_zero_and_all_one_runs() {
    let len = 310u64; // 10 chunks of 31 bits
    let mut bits = BitSet::new();
    for p in 93..217 {
        bits.set(p);
    }
    let words = encode(&bits, len);
    let back = decode(&words, len);
    assert_eq!(back.ones(), bits.ones());
    // the long uniform run should have collapsed into few fill words
    assert!(words.len() < 10);
}

#[test]
fn round_trips_pseudo_random_bitmap() {
    let len = 5000u64;
    let mut bits = BitSet::new();
    let mut state = 12345u64;
    for p in 0..len {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        if (state >> 60) & 1 == 1 {
            bits.set(p);
        }
    }
    let words = encode(&bits, len);
    let back = decode(&words, len);
    assert_eq!(back.ones(), bits.ones());
}
