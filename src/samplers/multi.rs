use super::{CombinedNextReaction, DirectCall, FirstReaction, FirstToFire, GsmpSampler};
use crate::distribution::Distribution;
use crate::error::{GsmpError, GsmpResult};
use crate::keyed::{Keep, KeyedPrefixSum, SlotPolicy};
use crate::prefix_sum::{BinaryTreePrefixSum, PrefixSum};
use crate::rng::RngCore;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

/// One child of a [`MultiSampler`]: the concrete sampler set is closed,
/// so this is a tagged enum rather than `dyn GsmpSampler`.
#[derive(Debug, Clone)]
pub enum Child<K: Eq + Hash + Clone + Debug> {
    FirstToFire(FirstToFire<K>),
    FirstReaction(FirstReaction<K>),
    CombinedNextReaction(CombinedNextReaction<K>),
    Direct(DirectCall<K, BinaryTreePrefixSum, Keep<K>>),
}

macro_rules! dispatch {
    ($self:ident, $method:ident ( $($arg:expr),* )) => {
        match $self {
            Child::FirstToFire(s) => s.$method($($arg),*),
            Child::FirstReaction(s) => s.$method($($arg),*),
            Child::CombinedNextReaction(s) => s.$method($($arg),*),
            Child::Direct(s) => s.$method($($arg),*),
        }
    };
}

impl<K: Eq + Hash + Clone + Debug> GsmpSampler<K> for Child<K> {
    fn enable(
        &mut self,
        key: K,
        distribution: Box<dyn Distribution>,
        te: f64,
        when: f64,
        rng: &mut dyn RngCore,
    ) -> GsmpResult<()> {
        dispatch!(self, enable(key, distribution, te, when, rng))
    }

    fn disable(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        dispatch!(self, disable(key, when))
    }

    fn fire(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        dispatch!(self, fire(key, when))
    }

    fn next(&mut self, now: f64, rng: &mut dyn RngCore) -> Option<(f64, K)> {
        dispatch!(self, next(now, rng))
    }

    fn reset(&mut self) {
        dispatch!(self, reset())
    }

    fn length(&self) -> usize {
        dispatch!(self, length())
    }

    fn keys(&self) -> Vec<K> {
        dispatch!(self, keys())
    }

    fn isenabled(&self, key: &K) -> bool {
        dispatch!(self, isenabled(key))
    }
}

/// Routes each clock to one of several child samplers by a classifier
/// function of `(key, distribution)`, memoizing the routing per key so
/// it stays stable across that key's later disable/fire/re-enable
/// cycles even though a new distribution may arrive at re-enable.
///
/// `next` polls every child and returns the earliest firing; ties between
/// children break by `G`'s `Ord` (a stand-in for "child registration
/// order" since `BTreeMap` iterates in key order).
pub struct MultiSampler<K: Eq + Hash + Clone + Debug, G: Ord + Clone + Debug> {
    children: BTreeMap<G, Child<K>>,
    routing: HashMap<K, G>,
    classify: Rc<dyn Fn(&K, &dyn Distribution) -> G>,
}

impl<K: Eq + Hash + Clone + Debug, G: Ord + Clone + Debug> Clone for MultiSampler<K, G> {
    fn clone(&self) -> Self {
        Self {
            children: self.children.clone(),
            routing: self.routing.clone(),
            classify: Rc::clone(&self.classify),
        }
    }
}

impl<K: Eq + Hash + Clone + Debug, G: Ord + Clone + Debug> Debug for MultiSampler<K, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiSampler")
            .field("children", &self.children)
            .field("routing", &self.routing)
            .finish()
    }
}

impl<K: Eq + Hash + Clone + Debug, G: Ord + Clone + Debug> MultiSampler<K, G> {
    pub fn new(classify: impl Fn(&K, &dyn Distribution) -> G + 'static) -> Self {
        Self {
            children: BTreeMap::new(),
            routing: HashMap::new(),
            classify: Rc::new(classify),
        }
    }

    /// Registers a child under `group`. Must happen before any key is
    /// classified into that group; an unregistered group is a
    /// precondition violation at `enable` time, not silently dropped.
    pub fn register_child(&mut self, group: G, child: Child<K>) {
        self.children.insert(group, child);
    }

    fn route(&mut self, key: &K, distribution: &dyn Distribution) -> G {
        if let Some(group) = self.routing.get(key) {
            group.clone()
        } else {
            let group = (self.classify)(key, distribution);
            self.routing.insert(key.clone(), group.clone());
            group
        }
    }
}

impl<K: Eq + Hash + Clone + Debug, G: Ord + Clone + Debug> GsmpSampler<K> for MultiSampler<K, G> {
    fn enable(
        &mut self,
        key: K,
        distribution: Box<dyn Distribution>,
        te: f64,
        when: f64,
        rng: &mut dyn RngCore,
    ) -> GsmpResult<()> {
        let group = self.route(&key, distribution.as_ref());
        let child = self.children.get_mut(&group).ok_or_else(|| {
            GsmpError::precondition(format!(
                "key {key:?} classified into unregistered group {group:?}"
            ))
        })?;
        child.enable(key, distribution, te, when, rng)
    }

    fn disable(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        if let Some(group) = self.routing.get(key) {
            if let Some(child) = self.children.get_mut(group) {
                return child.disable(key, when);
            }
        }
        Ok(())
    }

    fn fire(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        let group = self
            .routing
            .get(key)
            .ok_or_else(|| GsmpError::precondition(format!("fire of unrouted key {key:?}")))?;
        let child = self
            .children
            .get_mut(group)
            .ok_or_else(|| GsmpError::precondition(format!("fire of unrouted key {key:?}")))?;
        child.fire(key, when)
    }

    fn next(&mut self, now: f64, rng: &mut dyn RngCore) -> Option<(f64, K)> {
        self.children
            .values_mut()
            .filter_map(|child| child.next(now, rng))
            .min_by(|a, b| a.0.partial_cmp(&b.0).expect("firing times are never NaN"))
    }

    fn reset(&mut self) {
        for child in self.children.values_mut() {
            child.reset();
        }
        self.routing.clear();
    }

    fn length(&self) -> usize {
        self.children.values().map(GsmpSampler::length).sum()
    }

    fn keys(&self) -> Vec<K> {
        self.children.values().flat_map(GsmpSampler::keys).collect()
    }

    fn isenabled(&self, key: &K) -> bool {
        self.routing
            .get(key)
            .and_then(|group| self.children.get(group))
            .is_some_and(|child| child.isenabled(key))
    }
}

/// The "multiple-direct" specialization: every child is a
/// [`DirectCall`], and a top-level [`KeyedPrefixSum`] over per-child rate
/// totals lets the whole thing behave as a single Direct Method — one
/// exponential draw for the inter-event time, one uniform draw to pick
/// the child by its share of the grand total, then the child's own
/// prefix-sum picks the specific key. No per-child redraw of the time.
pub struct MultipleDirect<K, P, S, G>
where
    K: Eq + Hash + Clone + Debug,
    P: PrefixSum,
    S: SlotPolicy<K> + Default,
    G: Eq + Hash + Clone + Debug,
{
    children: HashMap<G, DirectCall<K, P, S>>,
    totals: KeyedPrefixSum<G, BinaryTreePrefixSum, Keep<G>>,
    routing: HashMap<K, G>,
    classify: Rc<dyn Fn(&K, &dyn Distribution) -> G>,
}

impl<K, P, S, G> MultipleDirect<K, P, S, G>
where
    K: Eq + Hash + Clone + Debug,
    P: PrefixSum,
    S: SlotPolicy<K> + Default,
    G: Eq + Hash + Clone + Debug,
{
    pub fn new(classify: impl Fn(&K, &dyn Distribution) -> G + 'static) -> Self {
        Self {
            children: HashMap::new(),
            totals: KeyedPrefixSum::new(),
            routing: HashMap::new(),
            classify: Rc::new(classify),
        }
    }

    pub fn register_child(&mut self, group: G) {
        self.children.entry(group).or_insert_with(DirectCall::new);
    }

    fn sync_total(&mut self, group: &G) {
        let total = self
            .children
            .get_mut(group)
            .map(DirectCall::total_rate)
            .unwrap_or(0.0);
        self.totals.set(group, total);
    }

    fn route(&mut self, key: &K, distribution: &dyn Distribution) -> G {
        if let Some(group) = self.routing.get(key) {
            group.clone()
        } else {
            let group = (self.classify)(key, distribution);
            self.routing.insert(key.clone(), group.clone());
            group
        }
    }
}

impl<K, P, S, G> GsmpSampler<K> for MultipleDirect<K, P, S, G>
where
    K: Eq + Hash + Clone + Debug,
    P: PrefixSum,
    S: SlotPolicy<K> + Default,
    G: Eq + Hash + Clone + Debug,
{
    fn enable(
        &mut self,
        key: K,
        distribution: Box<dyn Distribution>,
        te: f64,
        when: f64,
        rng: &mut dyn RngCore,
    ) -> GsmpResult<()> {
        let group = self.route(&key, distribution.as_ref());
        let child = self.children.get_mut(&group).ok_or_else(|| {
            GsmpError::precondition(format!(
                "key {key:?} classified into unregistered group {group:?}"
            ))
        })?;
        child.enable(key, distribution, te, when, rng)?;
        self.sync_total(&group);
        Ok(())
    }

    fn disable(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        if let Some(group) = self.routing.get(key).cloned() {
            if let Some(child) = self.children.get_mut(&group) {
                child.disable(key, when)?;
                self.sync_total(&group);
            }
        }
        Ok(())
    }

    fn fire(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        let group = self
            .routing
            .get(key)
            .cloned()
            .ok_or_else(|| GsmpError::precondition(format!("fire of unrouted key {key:?}")))?;
        let child = self
            .children
            .get_mut(&group)
            .ok_or_else(|| GsmpError::precondition(format!("fire of unrouted key {key:?}")))?;
        child.fire(key, when)?;
        self.sync_total(&group);
        Ok(())
    }

    fn next(&mut self, now: f64, rng: &mut dyn RngCore) -> Option<(f64, K)> {
        let grand_total = self.totals.total();
        if grand_total <= 0.0 {
            return None;
        }
        let dt = rng.exponential1() / grand_total;
        let u = rng.uniform01() * grand_total;
        let (group, residual) = self.totals.choose(u);
        let child = self.children.get_mut(&group)?;
        let within = child.total_rate() - residual;
        let (key, _) = child.select(within.max(0.0));
        Some((now + dt, key))
    }

    fn reset(&mut self) {
        for child in self.children.values_mut() {
            child.reset();
        }
        self.totals.clear();
        self.routing.clear();
    }

    fn length(&self) -> usize {
        self.children.values().map(GsmpSampler::length).sum()
    }

    fn keys(&self) -> Vec<K> {
        self.children.values().flat_map(GsmpSampler::keys).collect()
    }

    fn isenabled(&self, key: &K) -> bool {
        self.routing
            .get(key)
            .and_then(|group| self.children.get(group))
            .is_some_and(|child| child.isenabled(key))
    }
}
