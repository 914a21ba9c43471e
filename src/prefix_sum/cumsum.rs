use super::{PrefixSum, Slot};

/// Two flat arrays — weights and a lazily-recomputed cumulative sum —
/// with a dirty flag. Mutations just touch the weight array; `total()`
/// and `find()` trigger an O(n) recompute only if something changed
/// since the last one.
///
/// Faster than [`super::BinaryTreePrefixSum`] for small `n`: no pointer
/// chasing, and the recompute is a single linear pass that the
/// autovectorizer handles well.
#[derive(Debug, Clone, Default)]
pub struct CumulativeSumPrefixSum {
    weights: Vec<f64>,
    cumulative: Vec<f64>,
    dirty: bool,
}

impl CumulativeSumPrefixSum {
    fn recompute(&mut self) {
        if !self.dirty {
            return;
        }
        self.cumulative.clear();
        self.cumulative.reserve(self.weights.len());
        let mut running = 0.0;
        for &w in &self.weights {
            running += w;
            self.cumulative.push(running);
        }
        self.dirty = false;
    }
}

impl PrefixSum for CumulativeSumPrefixSum {
    fn push(&mut self, w: f64) -> Slot {
        self.weights.push(w);
        self.dirty = true;
        self.weights.len() - 1
    }

    fn set(&mut self, slot: Slot, w: f64) {
        self.weights[slot] = w;
        self.dirty = true;
    }

    fn get(&self, slot: Slot) -> f64 {
        self.weights[slot]
    }

    fn total(&mut self) -> f64 {
        self.recompute();
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    fn find(&mut self, v: f64) -> (Slot, f64) {
        self.recompute();
        debug_assert!(
            v >= 0.0 && v < self.total(),
            "find precondition violated"
        );
        // binary search for the first cumulative value strictly greater than v
        let slot = self.cumulative.partition_point(|&c| c <= v);
        let before = if slot == 0 { 0.0 } else { self.cumulative[slot - 1] };
        let residual = self.weights[slot] - (v - before);
        (slot, residual)
    }

    fn len(&self) -> usize {
        self.weights.len()
    }

    fn clear(&mut self) {
        self.weights.clear();
        self.cumulative.clear();
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recompute_is_lazy_across_multiple_sets() {
        let mut sums = CumulativeSumPrefixSum::default();
        for _ in 0..5 {
            sums.push(1.0);
        }
        sums.set(0, 2.0);
        sums.set(1, 3.0);
        sums.set(2, 0.0);
        assert_eq!(sums.total(), 2.0 + 3.0 + 0.0 + 1.0 + 1.0);
    }

    #[test]
    fn find_after_zeroing_a_slot_skips_it() {
        let mut sums = CumulativeSumPrefixSum::default();
        sums.push(1.0);
        sums.push(1.0);
        sums.push(1.0);
        sums.set(1, 0.0);
        let (slot, _) = sums.find(1.0);
        assert_eq!(slot, 2);
    }
}
