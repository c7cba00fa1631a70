//! Transactional state overlay.
//!
//! Every account entry point and every nested call runs inside its own
//! overlay frame. Reads see committed state plus all open frames; a frame
//! that succeeds is merged into its parent, a frame that fails is dropped
//! along with every write it buffered.

use std::collections::BTreeMap;

/// Write buffer for one call frame.
///
/// Uses `BTreeMap` for deterministic iteration order.
#[derive(Debug, Clone, Default)]
pub struct StateOverlay {
    writes: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl StateOverlay {
    pub fn new() -> Self {
        Self {
            writes: BTreeMap::new(),
        }
    }

    /// Set a key-value pair, replacing any earlier write.
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, value);
    }

    /// Look up a key in this frame only. `None` means the caller must check
    /// the layer below.
    pub fn get(&self, key: &[u8]) -> Option<&Vec<u8>> {
        self.writes.get(key)
    }

    /// Fold a successful child frame into this one. Child writes win.
    pub fn merge(&mut self, child: StateOverlay) {
        self.writes.extend(child.writes);
    }

    /// Consume the overlay and return all buffered writes in key order.
    pub fn drain(self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.writes
    }

    /// Returns the number of keys written in this overlay.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_set_get() {
        let mut overlay = StateOverlay::new();
        assert_eq!(overlay.get(b"k"), None);

        overlay.set(b"k".to_vec(), b"v".to_vec());
        assert_eq!(overlay.get(b"k"), Some(&b"v".to_vec()));

        overlay.set(b"k".to_vec(), b"w".to_vec());
        assert_eq!(overlay.get(b"k"), Some(&b"w".to_vec()));
        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn test_merge_child_wins() {
        let mut parent = StateOverlay::new();
        parent.set(b"a".to_vec(), b"1".to_vec());
        parent.set(b"b".to_vec(), b"2".to_vec());

        let mut child = StateOverlay::new();
        child.set(b"a".to_vec(), b"10".to_vec());
        child.set(b"c".to_vec(), b"3".to_vec());

        parent.merge(child);
        assert_eq!(parent.get(b"a"), Some(&b"10".to_vec()));
        assert_eq!(parent.get(b"b"), Some(&b"2".to_vec()));
        assert_eq!(parent.get(b"c"), Some(&b"3".to_vec()));
        assert_eq!(parent.len(), 3);
    }

    #[test]
    fn test_drain_order() {
        let mut overlay = StateOverlay::new();
        overlay.set(b"c".to_vec(), b"3".to_vec());
        overlay.set(b"a".to_vec(), b"1".to_vec());
        overlay.set(b"b".to_vec(), b"2".to_vec());

        let writes = overlay.drain();
        let keys: Vec<&Vec<u8>> = writes.keys().collect();
        assert_eq!(keys, vec![b"a", b"b", b"c"]);
        assert_eq!(writes[&b"b".to_vec()], b"2".to_vec());
    }
}
