use std::collections::HashMap;
use std::hash::Hash;

/// A binary min-heap over `(time, insertion sequence, key)`, paired with
/// a key→index map so remove-by-key is O(log n). Shared by
/// [`super::FirstToFire`] and [`super::CombinedNextReaction`], both of
/// which maintain a priority queue by firing time.
///
/// Ties in `time` break by insertion order.
#[derive(Debug, Clone, Default)]
pub(super) struct IndexedMinHeap<K> {
    nodes: Vec<(f64, u64, K)>,
    position: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone> IndexedMinHeap<K> {
    fn less(a: &(f64, u64, K), b: &(f64, u64, K)) -> bool {
        (a.0, a.1) < (b.0, b.1)
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.nodes.swap(i, j);
        self.position.insert(self.nodes[i].2.clone(), i);
        self.position.insert(self.nodes[j].2.clone(), j);
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if Self::less(&self.nodes[i], &self.nodes[parent]) {
                self.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let (left, right) = (2 * i + 1, 2 * i + 2);
            let mut smallest = i;
            if left < self.nodes.len() && Self::less(&self.nodes[left], &self.nodes[smallest]) {
                smallest = left;
            }
            if right < self.nodes.len() && Self::less(&self.nodes[right], &self.nodes[smallest]) {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.swap(i, smallest);
            i = smallest;
        }
    }

    pub(super) fn push(&mut self, time: f64, seq: u64, key: K) {
        let i = self.nodes.len();
        self.nodes.push((time, seq, key.clone()));
        self.position.insert(key, i);
        self.sift_up(i);
    }

    fn remove_at(&mut self, i: usize) -> (f64, u64, K) {
        let last = self.nodes.len() - 1;
        self.swap(i, last);
        let removed = self.nodes.pop().expect("nodes nonempty");
        self.position.remove(&removed.2);
        if i < self.nodes.len() {
            self.sift_down(i);
            self.sift_up(i);
        }
        removed
    }

    pub(super) fn remove(&mut self, key: &K) -> Option<(f64, u64, K)> {
        let i = *self.position.get(key)?;
        Some(self.remove_at(i))
    }

    pub(super) fn peek_min(&self) -> Option<&(f64, u64, K)> {
        self.nodes.first()
    }

    pub(super) fn clear(&mut self) {
        self.nodes.clear();
        self.position.clear();
    }

    #[cfg(test)]
    pub(super) fn nodes(&self) -> &[(f64, u64, K)] {
        &self.nodes
    }
}
