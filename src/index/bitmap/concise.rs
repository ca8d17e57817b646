//! CONCISE encoding (spec §4.3): literal words identical to WAH's, but fill
//! words carry a one-bit-fill exception with an explicit position, letting a
//! single non-uniform chunk terminate a run instead of breaking it into a
//! separate literal word.

use super::encoding::BitSet;

const CHUNK_BITS: u64 = 31;
const ALL_ONES_31: u64 = (1u64 << CHUNK_BITS) - 1;
const NO_FLIP: u32 = 31;

fn extract_chunk(bits: &BitSet, start: u64) -> u64 {
    let mut v = 0u64;
    for k in 0..CHUNK_BITS {
        if bits.get(start + k) {
            v |= 1 << k;
        }
    }
    v
}

pub fn encode(bits: &BitSet, len: u64) -> Vec<u32> {
    let n_chunks = (len + CHUNK_BITS - 1) / CHUNK_BITS;
    let mut words = Vec::new();
    let mut i = 0u64;
    while i < n_chunks {
        let chunk = extract_chunk(bits, i * CHUNK_BITS);
        if chunk == 0 || chunk == ALL_ONES_31 {
            let fill_val = if chunk == 0 { 0u64 } else { ALL_ONES_31 };
            let fill_bit = if chunk == 0 { 0u32 } else { 1u32 };
            let mut run = 1u64;
            let mut j = i + 1;
            let mut flip_field = NO_FLIP;
            while j < n_chunks {
                let c2 = extract_chunk(bits, j * CHUNK_BITS);
                if c2 == fill_val {
                    run += 1;
                    j += 1;
                    continue;
                }
                let diff = c2 ^ fill_val;
                if diff.count_ones() == 1 {
                    flip_field = diff.trailing_zeros();
                    run += 1;
                    j += 1;
                }
                break;
            }
            let word = 0x8000_0000u32 | (fill_bit << 30) | (flip_field << 25) | (run as u32 & 0x01FF_FFFF);
            words.push(word);
            i = j;
        } else {
            words.push(chunk as u32 & 0x7FFF_FFFF);
            i += 1;
        }
    }
    words
}

pub fn decode(words: &[u32], len: u64) -> BitSet {
    let mut bits = BitSet::new();
    let mut pos = 0u64;
    for &word in words {
        if word & 0x8000_0000 != 0 {
            let fill_val = (word >> 30) & 1;
            let flip_field = (word >> 25) & 0x1F;
            let run = (word & 0x01FF_FFFF) as u64;
            for r in 0..run {
                let mut chunk_val = if fill_val == 1 { ALL_ONES_31 } else { 0 };
                if r == run - 1 && flip_field != NO_FLIP {
                    chunk_val ^= 1 << flip_field;
                }
                for k in 0..CHUNK_BITS {
                    if pos + k < len && (chunk_val >> k) & 1 == 1 {
                        bits.set(pos + k);
                    }
                }
                pos += CHUNK_BITS;
            }
        } else {
            let chunk = (word & 0x7FFF_FFFF) as u64;
            for k in 0..CHUNK_BITS {
                if pos + k < len && (chunk >> k) & 1 == 1 {
                    bits.set(pos + k);
                }
            }
            pos += CHUNK_BITS;
        }
    }
    bits
}

#[cfg(test)]
mod concise_test;
