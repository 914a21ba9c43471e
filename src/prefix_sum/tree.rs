use super::{PrefixSum, Slot};

/// A complete binary tree of partial sums, stored flat.
///
/// `tree[0]` is the root (the grand total). Leaves occupy the last
/// `capacity` slots; each internal node holds the sum of its two
/// children. `set` and `push` are O(log n): touch one leaf, then walk to
/// the root fixing up sums along the way. `total()` is O(1) — it's just
/// the root. `find` descends from the root in O(log n), always choosing
/// the subtree whose cumulative weight brackets the target.
///
/// Capacity doubles when the tree is full; growth relocates the leaf
/// range into the larger layout and recomputes every internal sum.
#[derive(Debug, Clone)]
pub struct BinaryTreePrefixSum {
    tree: Vec<f64>,
    capacity: usize,
    len: usize,
}

impl Default for BinaryTreePrefixSum {
    fn default() -> Self {
        Self {
            tree: Vec::new(),
            capacity: 0,
            len: 0,
        }
    }
}

impl BinaryTreePrefixSum {
    fn leaf_index(&self, slot: Slot) -> usize {
        self.capacity - 1 + slot
    }

    fn is_leaf(&self, index: usize) -> bool {
        index >= self.capacity - 1
    }

    /// Propagates a leaf update up to the root.
    fn bubble(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            let left = 2 * parent + 1;
            let right = 2 * parent + 2;
            self.tree[parent] = self.tree[left] + self.tree.get(right).copied().unwrap_or(0.0);
            index = parent;
        }
    }

    /// Doubles capacity, preserving leaf weights, and recomputes all
    /// internal sums from scratch.
    fn grow(&mut self) {
        let old_capacity = self.capacity.max(1);
        let new_capacity = old_capacity * 2;
        let old_leaves: Vec<f64> = if self.tree.is_empty() {
            Vec::new()
        } else {
            self.tree[self.capacity - 1..].to_vec()
        };
        self.tree = vec![0.0; 2 * new_capacity - 1];
        self.capacity = new_capacity;
        for (slot, &w) in old_leaves.iter().enumerate() {
            let index = self.leaf_index(slot);
            self.tree[index] = w;
        }
        self.rebuild_internal();
    }

    /// Recomputes every internal node bottom-up from current leaf values.
    fn rebuild_internal(&mut self) {
        if self.capacity == 0 {
            return;
        }
        for index in (0..self.capacity - 1).rev() {
            let left = 2 * index + 1;
            let right = 2 * index + 2;
            self.tree[index] = self.tree[left] + self.tree.get(right).copied().unwrap_or(0.0);
        }
    }
}

impl PrefixSum for BinaryTreePrefixSum {
    fn push(&mut self, w: f64) -> Slot {
        if self.capacity == 0 {
            self.capacity = 1;
            self.tree = vec![0.0; 1];
        } else if self.len == self.capacity {
            self.grow();
        }
        let slot = self.len;
        self.len += 1;
        let index = self.leaf_index(slot);
        self.tree[index] = w;
        self.bubble(index);
        slot
    }

    fn set(&mut self, slot: Slot, w: f64) {
        let index = self.leaf_index(slot);
        self.tree[index] = w;
        self.bubble(index);
    }

    fn get(&self, slot: Slot) -> f64 {
        self.tree[self.leaf_index(slot)]
    }

    fn total(&mut self) -> f64 {
        self.tree.first().copied().unwrap_or(0.0)
    }

    fn find(&mut self, v: f64) -> (Slot, f64) {
        debug_assert!(v >= 0.0 && v < self.total(), "find precondition violated");
        let mut remaining = v;
        let mut index = 0;
        while !self.is_leaf(index) {
            let left = 2 * index + 1;
            let right = 2 * index + 2;
            let left_sum = self.tree[left];
            if left_sum > remaining {
                index = left;
            } else {
                remaining -= left_sum;
                index = right;
            }
        }
        let slot = index - (self.capacity - 1);
        let residual = self.tree[index] - remaining;
        (slot, residual)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.tree.clear();
        self.capacity = 0;
        self.len = 0;
    }
}

impl BinaryTreePrefixSum {
    /// Batched leaf update. Writes every `(slot, w)` pair directly, then
    /// fixes up internal sums level by level from the leaves to the
    /// root, recomputing each ancestor once no matter how many of its
    /// descendants were touched. Sibling leaves (or sibling subtrees)
    /// updated in the same batch share the coalesced recomputation of
    /// their common ancestors instead of each re-bubbling independently.
    pub fn set_multiple(&mut self, updates: &[(Slot, f64)]) {
        if updates.is_empty() {
            return;
        }
        let mut level: std::collections::BTreeSet<usize> = std::collections::BTreeSet::new();
        for &(slot, w) in updates {
            let index = self.leaf_index(slot);
            self.tree[index] = w;
            level.insert(index);
        }
        while !level.is_empty() && *level.iter().next().unwrap() > 0 {
            let mut parents = std::collections::BTreeSet::new();
            for index in level {
                if index == 0 {
                    continue;
                }
                let parent = (index - 1) / 2;
                let left = 2 * parent + 1;
                let right = 2 * parent + 2;
                self.tree[parent] = self.tree[left] + self.tree.get(right).copied().unwrap_or(0.0);
                parents.insert(parent);
            }
            level = parents;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_past_initial_capacity() {
        let mut sums = BinaryTreePrefixSum::default();
        for i in 0..37 {
            sums.push(i as f64 + 1.0);
        }
        let expected: f64 = (1..=37).sum::<i32>() as f64;
        assert_eq!(sums.total(), expected);
        for i in 0..37 {
            assert_eq!(sums.get(i), i as f64 + 1.0);
        }
    }

    #[test]
    fn set_after_grow_updates_total() {
        let mut sums = BinaryTreePrefixSum::default();
        for _ in 0..10 {
            sums.push(1.0);
        }
        sums.set(3, 5.0);
        assert_eq!(sums.total(), 10.0 - 1.0 + 5.0);
    }

    #[test]
    fn batched_set_multiple_sibling_updates_agree_with_individual() {
        let mut a = BinaryTreePrefixSum::default();
        let mut b = BinaryTreePrefixSum::default();
        for _ in 0..8 {
            a.push(1.0);
            b.push(1.0);
        }
        let updates = [(1, 4.0), (2, 0.0), (6, 9.0)];
        a.set_multiple(&updates);
        for (slot, w) in updates {
            b.set(slot, w);
        }
        assert_eq!(a.total(), b.total());
        for slot in 0..8 {
            assert_eq!(a.get(slot), b.get(slot), "slot {slot} diverged");
        }
    }

    #[test]
    fn set_multiple_on_empty_batch_is_a_no_op() {
        let mut sums = BinaryTreePrefixSum::default();
        for _ in 0..4 {
            sums.push(2.0);
        }
        let before = sums.total();
        sums.set_multiple(&[]);
        assert_eq!(sums.total(), before);
    }
}
