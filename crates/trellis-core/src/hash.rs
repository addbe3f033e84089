use core::hash::Hash;
use std::hash::Hasher;

#[cfg(feature = "std-hash")]
pub mod default {
    pub use std::collections::hash_map::DefaultHasher;

    #[inline]
    pub fn new() -> DefaultHasher {
        DefaultHasher::new()
    }
}

#[cfg(not(feature = "std-hash"))]
pub mod default {
    pub use ahash::AHasher as DefaultHasher;

    #[inline]
    pub fn new() -> DefaultHasher {
        DefaultHasher::default()
    }
}

/// Hashes a sequence item by item, so callers can hash a key path that is
/// split across two slices without first joining it.
pub fn hash_seq<'a, T, I>(items: I) -> u64
where
    T: Hash + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut h = default::new();
    let mut len = 0usize;
    for item in items {
        item.hash(&mut h);
        len += 1;
    }
    h.write_usize(len);
    h.finish()
}
