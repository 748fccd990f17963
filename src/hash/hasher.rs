use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Hash function used to route keys through the directory. Must be
/// deterministic for the lifetime of a table.
pub trait KeyHasher<K> {
    fn hash_key(&self, key: &K) -> u64;
}

/// SipHash over the key's `Hash` impl. `DefaultHasher::new()` uses fixed
/// keys, so equal keys always hash identically.
#[derive(Debug)]
pub struct SipKeyHasher<K> {
    _marker: PhantomData<fn(&K)>,
}

impl<K> SipKeyHasher<K> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<K> Default for SipKeyHasher<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for SipKeyHasher<K> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<K: Hash> KeyHasher<K> for SipKeyHasher<K> {
    fn hash_key(&self, key: &K) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }
}

/// Uses the integer key itself as its hash. Page ids handed out sequentially
/// spread evenly over the low bits, and routing stays easy to reason about.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityHasher;

macro_rules! identity_hash {
    ($($ty:ty),*) => {
        $(
            impl KeyHasher<$ty> for IdentityHasher {
                fn hash_key(&self, key: &$ty) -> u64 {
                    *key as u64
                }
            }
        )*
    };
}

identity_hash!(u8, u16, u32, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sip_hasher_is_deterministic() {
        let a = SipKeyHasher::<u32>::new();
        let b = SipKeyHasher::<u32>::default();
        for key in 0..100u32 {
            assert_eq!(a.hash_key(&key), b.hash_key(&key));
        }
        assert_ne!(a.hash_key(&1), a.hash_key(&2));
    }

    #[test]
    fn identity_hasher_returns_key() {
        assert_eq!(IdentityHasher.hash_key(&7u32), 7);
        assert_eq!(IdentityHasher.hash_key(&0b1010usize), 0b1010);
        assert_eq!(IdentityHasher.hash_key(&u64::MAX), u64::MAX);
    }
}
