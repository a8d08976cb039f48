//! Hash-keyed field dispatch for typed object decoding.
//!
//! A [`FieldTable`] maps object keys to field indices through an
//! open-addressed, power-of-two slot array. At build time three hash
//! strategies are probed cheapest-first for a collision-free placement; a
//! collision-free table resolves a key with a single hash, one slot load,
//! and a full-hash compare, no string comparison. When no strategy places
//! the fields cleanly the table falls back to linear probing with full key
//! verification.

/// How key bytes are folded into a hash.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum HashStrategy {
    /// Six low bits of each byte packed into a `u64`. Injective for ASCII
    /// keys of at most ten bytes, so it needs the shortest verification.
    Packed,
    /// Shift-accumulate, two operations per byte.
    Shift,
    /// Classic multiply-by-31 accumulation.
    Polynomial,
}

const PACKED_MAX_LEN: usize = 10;

impl HashStrategy {
    fn hash(self, key: &[u8]) -> u64 {
        match self {
            HashStrategy::Packed => {
                let mut hash: u64 = 0;
                for &byte in key {
                    hash = (hash << 6) | u64::from(byte & 0x3F);
                }
                hash
            }
            HashStrategy::Shift => {
                let mut hash: u64 = 0;
                for &byte in key {
                    hash = (hash << 1).wrapping_add(u64::from(byte));
                }
                hash
            }
            HashStrategy::Polynomial => {
                let mut hash: u64 = 0;
                for &byte in key {
                    hash = hash.wrapping_mul(31).wrapping_add(u64::from(byte));
                }
                hash
            }
        }
    }

    fn applicable(self, names: &[&str]) -> bool {
        match self {
            HashStrategy::Packed => names
                .iter()
                .all(|name| name.len() <= PACKED_MAX_LEN && name.is_ascii()),
            _ => true,
        }
    }
}

/// A key-to-field-index lookup table, built once per type and shared.
pub struct FieldTable {
    names: &'static [&'static str],
    strategy: HashStrategy,
    mask: u64,
    /// Linear probing in use; every hit must be verified against the name.
    probed: bool,
    /// Slot values are field index plus one, zero marks an empty slot.
    slots: Box<[u16]>,
    /// Full hash of each occupied slot's field name; a masked collision on
    /// an unknown key is rejected by comparing against this.
    hashes: Box<[u64]>,
}

impl FieldTable {
    /// Builds the dispatch table for a field list.
    ///
    /// Field order is significant: the returned indices refer to positions
    /// in `names`. A single-field table skips hashing entirely.
    pub fn build(names: &'static [&'static str]) -> FieldTable {
        debug_assert!(names.len() < u16::MAX as usize);
        if names.len() <= 1 {
            return FieldTable {
                names,
                strategy: HashStrategy::Polynomial,
                mask: 0,
                probed: false,
                slots: Box::new([]),
                hashes: Box::new([]),
            };
        }

        let base_size = (names.len() * 2).next_power_of_two();
        for strategy in [
            HashStrategy::Packed,
            HashStrategy::Shift,
            HashStrategy::Polynomial,
        ] {
            if !strategy.applicable(names) {
                continue;
            }
            let mut size = base_size;
            // Growing the table buys distinct low hash bits at most twice
            // before the fallback is a better deal.
            for _ in 0..3 {
                if let Some((slots, hashes)) = try_place(names, strategy, size) {
                    return FieldTable {
                        names,
                        strategy,
                        mask: (size - 1) as u64,
                        probed: false,
                        slots,
                        hashes,
                    };
                }
                size *= 2;
            }
        }

        let size = base_size;
        let mut slots = vec![0u16; size].into_boxed_slice();
        let mut hashes = vec![0u64; size].into_boxed_slice();
        for (index, name) in names.iter().enumerate() {
            let hash = HashStrategy::Polynomial.hash(name.as_bytes());
            let mut slot = (hash & (size - 1) as u64) as usize;
            while slots[slot] != 0 {
                slot = (slot + 1) & (size - 1);
            }
            slots[slot] = index as u16 + 1;
            hashes[slot] = hash;
        }
        FieldTable {
            names,
            strategy: HashStrategy::Polynomial,
            mask: (size - 1) as u64,
            probed: true,
            slots,
            hashes,
        }
    }

    /// Resolves a key to its field index.
    ///
    /// A collision-free table trusts a full-hash match unless `strict` asks
    /// for a literal comparison of the stored name. Probed tables always
    /// compare.
    pub fn resolve(&self, key: &[u8], strict: bool) -> Option<usize> {
        if self.names.len() <= 1 {
            let name = self.names.first()?;
            if name.as_bytes() == key {
                return Some(0);
            }
            return None;
        }

        let hash = self.strategy.hash(key);
        let mut slot = (hash & self.mask) as usize;
        loop {
            let entry = self.slots[slot];
            if entry == 0 {
                return None;
            }
            let index = usize::from(entry - 1);
            if self.probed || strict {
                if self.names[index].as_bytes() == key {
                    return Some(index);
                }
                if !self.probed {
                    return None;
                }
                slot = (slot + 1) & self.mask as usize;
                continue;
            }
            if self.hashes[slot] != hash {
                return None;
            }
            // Packed folds bytes into fixed positions, so a key of another
            // length can reproduce a short name's hash without matching it.
            if self.strategy == HashStrategy::Packed && key.len() != self.names[index].len() {
                return None;
            }
            return Some(index);
        }
    }
}

fn try_place(
    names: &[&str],
    strategy: HashStrategy,
    size: usize,
) -> Option<(Box<[u16]>, Box<[u64]>)> {
    let mask = (size - 1) as u64;
    let mut slots = vec![0u16; size].into_boxed_slice();
    let mut hashes = vec![0u64; size].into_boxed_slice();
    for (index, name) in names.iter().enumerate() {
        let hash = strategy.hash(name.as_bytes());
        let slot = (hash & mask) as usize;
        if slots[slot] != 0 {
            return None;
        }
        slots[slot] = index as u16 + 1;
        hashes[slot] = hash;
    }
    Some((slots, hashes))
}

#[cfg(test)]
mod tests {
    use super::*;

    static SMALL: &[&str] = &["id", "name", "count"];
    static MIXED: &[&str] = &[
        "identifier",
        "display_name",
        "created_at_timestamp",
        "tags",
        "payload",
        "version",
    ];

    #[test]
    fn resolves_every_field_to_its_index() {
        for names in [SMALL, MIXED] {
            let table = FieldTable::build(names);
            for (index, name) in names.iter().enumerate() {
                assert_eq!(table.resolve(name.as_bytes(), false), Some(index));
                assert_eq!(table.resolve(name.as_bytes(), true), Some(index));
            }
        }
    }

    #[test]
    fn single_field_compares_directly() {
        static ONE: &[&str] = &["only"];
        let table = FieldTable::build(ONE);
        assert_eq!(table.resolve(b"only", false), Some(0));
        assert_eq!(table.resolve(b"other", false), None);
    }

    #[test]
    fn short_names_use_packed_strategy() {
        let table = FieldTable::build(SMALL);
        assert_eq!(table.strategy, HashStrategy::Packed);
        assert!(!table.probed);
    }

    #[test]
    fn strict_mode_rejects_aliasing_keys() {
        let table = FieldTable::build(SMALL);
        // Same packed hash as "id" but a different literal.
        let aliased = [b'i' ^ 0x40, b'd'];
        assert!(table.resolve(b"id", true).is_some());
        assert_eq!(table.resolve(&aliased, true), None);
    }

    #[test]
    fn unknown_keys_with_masked_collisions_are_rejected() {
        let table = FieldTable::build(SMALL);
        // "t" lands on an occupied slot but its full hash differs.
        assert_eq!(table.resolve(b"t", false), None);
        // "@id" reproduces the full packed hash of "id" at another length.
        assert_eq!(table.resolve(b"@id", false), None);
        assert_eq!(table.resolve(b"zzz", false), None);
    }

    #[test]
    fn over_length_keys_never_alias_packed_names() {
        let table = FieldTable::build(SMALL);
        assert_eq!(table.resolve(b"padding-padding-id", false), None);
    }

    #[test]
    fn probed_fallback_still_resolves() {
        // "aZ!" and "b9_" share full shift and polynomial hashes, "ab" and
        // "!b" share the full packed hash, so every collision-free attempt
        // fails and the table must fall back to probing.
        static CLASH: &[&str] = &["aZ!", "b9_", "ab", "!b"];
        let table = FieldTable::build(CLASH);
        assert!(table.probed);
        for (index, name) in CLASH.iter().enumerate() {
            assert_eq!(table.resolve(name.as_bytes(), false), Some(index));
        }
        assert_eq!(table.resolve(b"zz", false), None);
    }
}
