//! The encoder's single-slot match-position table.
//!
//! Every four input bytes are hashed onto a bucket holding the single most
//! recent absolute stream position observed with that hash; a new write
//! silently clobbers whatever was there before (spec §3, §9). There is no
//! chaining and no probing — trading compression ratio for a trivially
//! cheap, allocation-free lookup.

/// Multiplicative hash constant from spec §3.
const HASH_MULTIPLIER: u32 = 0x1e35a7bd;

#[derive(Debug)]
pub(crate) struct HashTable {
    slots: Vec<u32>,
    /// `32 - log2(slots.len())`; the right shift applied after the multiply.
    shift: u32,
}

impl HashTable {
    /// `size` must be a power of two, at least 4.
    pub(crate) fn new(size: usize) -> Self {
        assert!(
            size.is_power_of_two() && size >= 4,
            "hash table size must be a power of two >= 4"
        );
        HashTable {
            slots: vec![0u32; size],
            shift: 32 - size.trailing_zeros(),
        }
    }

    /// Hashes the little-endian 32-bit word formed by 4 input bytes onto a
    /// bucket index.
    #[inline]
    fn bucket(&self, word: u32) -> usize {
        (word.wrapping_mul(HASH_MULTIPLIER) >> self.shift) as usize
    }

    /// Reads the position recorded for `word`'s bucket. `0` means "no
    /// recorded position" (position 0 is unreachable once a stream header
    /// has been written).
    #[inline]
    pub(crate) fn get(&self, word: u32) -> u32 {
        self.slots[self.bucket(word)]
    }

    /// Records `pos` as the most recent position for `word`'s bucket,
    /// overwriting whatever was there.
    #[inline]
    pub(crate) fn put(&mut self, word: u32, pos: u32) {
        let idx = self.bucket(word);
        self.slots[idx] = pos;
    }

    pub(crate) fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = 0);
    }
}

/// Reads the 4 bytes at `data[pos..pos + 4]` as a little-endian `u32`, the
/// hash input for the match-search loop (spec §4.3 step 1).
#[inline]
pub(crate) fn read_word(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

/// Picks the default hash table size for a given window size: `window_size
/// / 64`, clamped to a power of two no smaller than 4 (spec §6).
pub(crate) fn default_size(window_size: usize) -> usize {
    (window_size / 64).next_power_of_two().max(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_returns_zero() {
        let ht = HashTable::new(1024);
        assert_eq!(ht.get(0x1234_5678), 0);
    }

    #[test]
    fn put_then_get_roundtrips() {
        let mut ht = HashTable::new(1024);
        ht.put(0x1234_5678, 42);
        assert_eq!(ht.get(0x1234_5678), 42);
    }

    #[test]
    fn collisions_overwrite() {
        let mut ht = HashTable::new(4);
        // With only 4 buckets, collisions are the common case; the last
        // write for a given bucket must win.
        let mut last_in_bucket = vec![None; 4];
        for word in 0u32..64 {
            let b = ht.bucket(word);
            ht.put(word, word + 1);
            last_in_bucket[b] = Some(word + 1);
        }
        for (b, expect) in last_in_bucket.iter().enumerate() {
            if let Some(v) = expect {
                // bucket() is deterministic, so re-derive which word maps here
                assert_eq!(ht.slots[b], *v);
            }
        }
    }

    #[test]
    fn default_size_is_power_of_two_and_floored() {
        assert_eq!(default_size(1024), 16);
        assert_eq!(default_size(64), 4);
        assert_eq!(default_size(4), 4);
    }
}
