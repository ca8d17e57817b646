//! Roaring encoding (spec §4.3): wraps `croaring::Bitmap` directly, the same
//! crate the teacher's own `CRoaring` wrapper (`src/croaring.rs`) uses,
//! addressing row positions rather than hashed keys so no CRC layer is
//! needed here.

use super::encoding::BitSet;
use croaring::Bitmap;

pub fn encode(bits: &BitSet) -> Bitmap {
    let mut bm = Bitmap::create();
    for pos in bits.ones() {
        bm.add(pos as u32);
    }
    bm
}

pub fn decode(bm: &Bitmap) -> BitSet {
    let mut bits = BitSet::new();
    for pos in bm.to_vec() {
        bits.set(pos as u64);
    }
    bits
}

#[cfg(test)]
mod roaring_test;
