const INITIAL_CAPACITY: usize = 16;

/// Bounded set of key/value pairs sharing the low `local_depth` hash bits.
#[derive(Debug, Clone)]
pub struct Bucket<K, V> {
    local_depth: u32,
    max_size: usize,
    array: Vec<(K, V)>,
}

impl<K: Eq + Clone, V: Clone> Bucket<K, V> {
    pub fn new(max_size: usize, local_depth: u32) -> Self {
        Self {
            local_depth,
            max_size,
            array: Vec::with_capacity(max_size.min(INITIAL_CAPACITY)),
        }
    }

    pub fn find(&self, key: &K) -> Option<V> {
        self.array
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.array.iter().any(|(k, _)| k == key)
    }

    pub fn remove(&mut self, key: &K) -> bool {
        match self.array.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                self.array.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    /// Removes `key` only when `pred` accepts its current value.
    pub fn remove_if<F>(&mut self, key: &K, pred: F) -> bool
    where
        F: FnOnce(&V) -> bool,
    {
        match self.array.iter().position(|(k, _)| k == key) {
            Some(pos) if pred(&self.array[pos].1) => {
                self.array.swap_remove(pos);
                true
            }
            _ => false,
        }
    }

    /// Overwrites an existing key or appends a new pair if there is room.
    /// Returns false only when the key is absent and the bucket is full.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if let Some((_, v)) = self.array.iter_mut().find(|(k, _)| *k == key) {
            *v = value;
            return true;
        }
        if self.is_full() {
            return false;
        }
        self.array.push((key, value));
        true
    }

    pub fn is_full(&self) -> bool {
        self.array.len() >= self.max_size
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn local_depth(&self) -> u32 {
        self.local_depth
    }

    pub fn entries(&self) -> Vec<(K, V)> {
        self.array.clone()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &(K, V)> {
        self.array.iter()
    }

    pub(crate) fn set_local_depth(&mut self, depth: u32) {
        self.local_depth = depth;
    }

    /// Moves every pair matching `pred` into a new vector.
    pub(crate) fn drain_where<F>(&mut self, mut pred: F) -> Vec<(K, V)>
    where
        F: FnMut(&K) -> bool,
    {
        let (moved, stay): (Vec<_>, Vec<_>) =
            self.array.drain(..).partition(|(k, _)| pred(k));
        self.array = stay;
        moved
    }
}
