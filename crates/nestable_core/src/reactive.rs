//! Reactive signals
//!
//! Fine-grained reactivity without a virtual DOM:
//!
//! - **Signals** hold values and notify their subscribers on write
//! - **Derived** values are recomputed whenever a value they read changes
//! - **Effects** re-run whenever a value they read changes
//!
//! Dependencies are tracked automatically: every `get` made while a derived
//! value or an effect is computing is recorded as a source of that node.
//!
//! Derived values are recomputed eagerly inside `set`, in creation order.
//! A derived value can only read nodes that existed when it was created, so
//! creation order is a valid topological order and no node observes a
//! half-updated graph. Effects run once all derived values have settled.

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use slotmap::{new_key_type, Key, KeyData, SlotMap};
use smallvec::SmallVec;

use crate::context_state::{DirtyFlag, SharedReactiveGraph};

new_key_type! {
    /// Unique identifier for a signal
    pub struct SignalId;
    /// Unique identifier for a derived value
    pub struct DerivedId;
    /// Unique identifier for an effect
    pub struct EffectId;
}

impl SignalId {
    /// Convert to a raw `u64` for storage outside the graph
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }

    /// Reconstruct from a raw `u64` produced by [`SignalId::to_raw`]
    pub fn from_raw(raw: u64) -> Self {
        KeyData::from_ffi(raw).into()
    }
}

impl DerivedId {
    /// Convert to a raw `u64` for storage outside the graph
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }

    /// Reconstruct from a raw `u64` produced by [`DerivedId::to_raw`]
    pub fn from_raw(raw: u64) -> Self {
        KeyData::from_ffi(raw).into()
    }
}

/// Typed handle to a signal stored in a [`ReactiveGraph`]
pub struct Signal<T> {
    id: SignalId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Signal<T> {
    /// Rebuild a handle from a stored id
    pub fn from_id(id: SignalId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> SignalId {
        self.id
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Signal<T> {}

impl<T> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Signal<T> {}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&self.id).finish()
    }
}

/// Typed handle to a derived value stored in a [`ReactiveGraph`]
pub struct Derived<T> {
    id: DerivedId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Derived<T> {
    /// Rebuild a handle from a stored id
    pub fn from_id(id: DerivedId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> DerivedId {
        self.id
    }
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Derived<T> {}

impl<T> PartialEq for Derived<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Derived<T> {}

impl<T> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Derived").field(&self.id).finish()
    }
}

/// Handle to an effect stored in a [`ReactiveGraph`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Effect {
    id: EffectId,
}

impl Effect {
    pub fn id(&self) -> EffectId {
        self.id
    }
}

/// A node that can be read
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Source {
    Signal(SignalId),
    Derived(DerivedId),
}

/// A node that is notified when one of its sources changes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Subscriber {
    Derived(DerivedId),
    Effect(EffectId),
}

type Sources = SmallVec<[Source; 4]>;
type Subscribers = SmallVec<[Subscriber; 4]>;
type BoxedValue = Box<dyn Any + Send>;
type ComputeFn = Box<dyn Fn(&ReactiveGraph) -> BoxedValue + Send>;
type EffectFn = Box<dyn FnMut(&ReactiveGraph) + Send>;

struct SignalNode {
    value: BoxedValue,
    subscribers: Subscribers,
}

struct DerivedNode {
    /// Creation order, used as topological order during propagation
    seq: u64,
    value: Option<BoxedValue>,
    /// Taken out while the node is computing
    compute: Option<ComputeFn>,
    sources: Sources,
    subscribers: Subscribers,
}

struct EffectNode {
    /// Taken out while the effect is running
    run: Option<EffectFn>,
    sources: Sources,
}

/// The reactive graph: owns every signal, derived value and effect
///
/// Closures passed to [`ReactiveGraph::create_derived`] and
/// [`ReactiveGraph::create_effect`] receive `&ReactiveGraph` and run while
/// the caller holds the graph. When the graph is shared behind a mutex they
/// must not lock it again.
pub struct ReactiveGraph {
    signals: SlotMap<SignalId, SignalNode>,
    deriveds: SlotMap<DerivedId, DerivedNode>,
    effects: SlotMap<EffectId, EffectNode>,
    next_seq: u64,
    /// Reads recorded by the node currently computing
    tracking: RefCell<Option<Sources>>,
}

impl Default for ReactiveGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactiveGraph {
    pub fn new() -> Self {
        Self {
            signals: SlotMap::with_key(),
            deriveds: SlotMap::with_key(),
            effects: SlotMap::with_key(),
            next_seq: 0,
            tracking: RefCell::new(None),
        }
    }

    // =========================================================================
    // Signals
    // =========================================================================

    /// Create a new signal holding `initial`
    pub fn create_signal<T: Send + 'static>(&mut self, initial: T) -> Signal<T> {
        let id = self.signals.insert(SignalNode {
            value: Box::new(initial),
            subscribers: SmallVec::new(),
        });
        Signal::from_id(id)
    }

    /// Read a signal, recording it as a dependency of the running computation
    pub fn get<T: Clone + 'static>(&self, signal: Signal<T>) -> Option<T> {
        let node = self.signals.get(signal.id)?;
        self.track(Source::Signal(signal.id));
        node.value.downcast_ref::<T>().cloned()
    }

    /// Read a signal without recording a dependency
    pub fn get_untracked<T: Clone + 'static>(&self, signal: Signal<T>) -> Option<T> {
        self.signals
            .get(signal.id)?
            .value
            .downcast_ref::<T>()
            .cloned()
    }

    /// Write a signal and propagate to everything that read it
    pub fn set<T: Send + 'static>(&mut self, signal: Signal<T>, value: T) {
        let Some(node) = self.signals.get_mut(signal.id) else {
            tracing::trace!("set on disposed signal {:?}", signal.id);
            return;
        };
        node.value = Box::new(value);
        let subscribers = node.subscribers.clone();
        self.propagate(&subscribers);
    }

    /// Write a signal only when the value differs from the current one
    ///
    /// Returns `true` if the signal was written.
    pub fn set_if_changed<T: PartialEq + Send + 'static>(
        &mut self,
        signal: Signal<T>,
        value: T,
    ) -> bool {
        let unchanged = self
            .signals
            .get(signal.id)
            .and_then(|node| node.value.downcast_ref::<T>())
            .is_some_and(|current| *current == value);
        if unchanged {
            return false;
        }
        self.set(signal, value);
        true
    }

    /// Update a signal in place using its current value
    pub fn update<T: Clone + Send + 'static, F: FnOnce(T) -> T>(
        &mut self,
        signal: Signal<T>,
        f: F,
    ) {
        if let Some(current) = self.get_untracked(signal) {
            self.set(signal, f(current));
        }
    }

    /// Check whether a signal is still alive
    pub fn contains_signal(&self, id: SignalId) -> bool {
        self.signals.contains_key(id)
    }

    /// Remove a signal. Nodes that read it keep their last value.
    pub fn dispose_signal(&mut self, id: SignalId) {
        self.signals.remove(id);
    }

    // =========================================================================
    // Derived values
    // =========================================================================

    /// Create a derived value computed from other signals or derived values
    ///
    /// The value is computed immediately and again after every change to a
    /// node it read during its last computation.
    pub fn create_derived<T, F>(&mut self, compute: F) -> Derived<T>
    where
        T: Send + 'static,
        F: Fn(&ReactiveGraph) -> T + Send + 'static,
    {
        let seq = self.next_seq;
        self.next_seq += 1;

        let id = self.deriveds.insert(DerivedNode {
            seq,
            value: None,
            compute: Some(Box::new(move |graph: &ReactiveGraph| -> BoxedValue {
                Box::new(compute(graph))
            })),
            sources: SmallVec::new(),
            subscribers: SmallVec::new(),
        });
        self.recompute_derived(id);
        Derived::from_id(id)
    }

    /// Read a derived value, recording it as a dependency of the running computation
    pub fn get_derived<T: Clone + 'static>(&self, derived: Derived<T>) -> Option<T> {
        let node = self.deriveds.get(derived.id)?;
        self.track(Source::Derived(derived.id));
        node.value.as_ref()?.downcast_ref::<T>().cloned()
    }

    /// Check whether a derived value is still alive
    pub fn contains_derived(&self, id: DerivedId) -> bool {
        self.deriveds.contains_key(id)
    }

    /// Remove a derived value and detach it from its sources
    pub fn dispose_derived(&mut self, id: DerivedId) {
        if let Some(node) = self.deriveds.remove(id) {
            self.unsubscribe(Subscriber::Derived(id), &node.sources);
        }
    }

    // =========================================================================
    // Effects
    // =========================================================================

    /// Create an effect. It runs immediately and after every change to a
    /// node it read during its last run.
    pub fn create_effect<F>(&mut self, run: F) -> Effect
    where
        F: FnMut(&ReactiveGraph) + Send + 'static,
    {
        let id = self.effects.insert(EffectNode {
            run: Some(Box::new(run)),
            sources: SmallVec::new(),
        });
        self.run_effect(id);
        Effect { id }
    }

    /// Remove an effect and detach it from its sources
    pub fn dispose_effect(&mut self, effect: Effect) {
        if let Some(node) = self.effects.remove(effect.id) {
            self.unsubscribe(Subscriber::Effect(effect.id), &node.sources);
        }
    }

    /// Number of live nodes (signals, derived values, effects)
    pub fn node_count(&self) -> usize {
        self.signals.len() + self.deriveds.len() + self.effects.len()
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn track(&self, source: Source) {
        if let Some(frame) = self.tracking.borrow_mut().as_mut() {
            if !frame.contains(&source) {
                frame.push(source);
            }
        }
    }

    /// Run `f` with a fresh tracking frame and return what it read
    fn tracked<R>(&self, f: impl FnOnce(&Self) -> R) -> (R, Sources) {
        let previous = self.tracking.replace(Some(SmallVec::new()));
        let result = f(self);
        let sources = self.tracking.replace(previous).unwrap_or_default();
        (result, sources)
    }

    fn subscribers_mut(&mut self, source: Source) -> Option<&mut Subscribers> {
        match source {
            Source::Signal(id) => self.signals.get_mut(id).map(|node| &mut node.subscribers),
            Source::Derived(id) => self.deriveds.get_mut(id).map(|node| &mut node.subscribers),
        }
    }

    fn subscribe(&mut self, subscriber: Subscriber, sources: &[Source]) {
        for source in sources {
            if let Some(subscribers) = self.subscribers_mut(*source) {
                if !subscribers.contains(&subscriber) {
                    subscribers.push(subscriber);
                }
            }
        }
    }

    fn unsubscribe(&mut self, subscriber: Subscriber, sources: &[Source]) {
        for source in sources {
            if let Some(subscribers) = self.subscribers_mut(*source) {
                subscribers.retain(|s| *s != subscriber);
            }
        }
    }

    fn recompute_derived(&mut self, id: DerivedId) {
        let Some(node) = self.deriveds.get_mut(id) else {
            return;
        };
        let Some(compute) = node.compute.take() else {
            return;
        };
        let old_sources = std::mem::take(&mut node.sources);
        self.unsubscribe(Subscriber::Derived(id), &old_sources);

        let (value, sources) = self.tracked(|graph| compute(graph));

        self.subscribe(Subscriber::Derived(id), &sources);
        if let Some(node) = self.deriveds.get_mut(id) {
            node.value = Some(value);
            node.compute = Some(compute);
            node.sources = sources;
        }
    }

    fn run_effect(&mut self, id: EffectId) {
        let Some(node) = self.effects.get_mut(id) else {
            return;
        };
        let Some(mut run) = node.run.take() else {
            return;
        };
        let old_sources = std::mem::take(&mut node.sources);
        self.unsubscribe(Subscriber::Effect(id), &old_sources);

        let ((), sources) = self.tracked(|graph| run(graph));

        self.subscribe(Subscriber::Effect(id), &sources);
        if let Some(node) = self.effects.get_mut(id) {
            node.run = Some(run);
            node.sources = sources;
        }
    }

    fn propagate(&mut self, subscribers: &[Subscriber]) {
        let mut dirty: BTreeMap<u64, DerivedId> = BTreeMap::new();
        let mut effects: Vec<EffectId> = Vec::new();
        let mut queued_effects: FxHashSet<EffectId> = FxHashSet::default();

        self.enqueue(subscribers, &mut dirty, &mut effects, &mut queued_effects);

        while let Some((_, id)) = dirty.pop_first() {
            self.recompute_derived(id);
            if let Some(node) = self.deriveds.get(id) {
                let downstream = node.subscribers.clone();
                self.enqueue(&downstream, &mut dirty, &mut effects, &mut queued_effects);
            }
        }

        for id in effects {
            self.run_effect(id);
        }
    }

    fn enqueue(
        &self,
        subscribers: &[Subscriber],
        dirty: &mut BTreeMap<u64, DerivedId>,
        effects: &mut Vec<EffectId>,
        queued_effects: &mut FxHashSet<EffectId>,
    ) {
        for subscriber in subscribers {
            match *subscriber {
                Subscriber::Derived(id) => {
                    if let Some(node) = self.deriveds.get(id) {
                        dirty.insert(node.seq, id);
                    }
                }
                Subscriber::Effect(id) => {
                    if queued_effects.insert(id) {
                        effects.push(id);
                    }
                }
            }
        }
    }
}

// =============================================================================
// Handles bound to a shared graph
// =============================================================================

/// Component state that requests a UI rebuild when written
///
/// Writing a `State` updates the underlying signal and raises the dirty
/// flag, so the next frame rebuilds the tree.
pub struct State<T> {
    signal: Signal<T>,
    reactive: SharedReactiveGraph,
    dirty_flag: DirtyFlag,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal,
            reactive: Arc::clone(&self.reactive),
            dirty_flag: Arc::clone(&self.dirty_flag),
        }
    }
}

impl<T> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("signal", &self.signal)
            .finish()
    }
}

impl<T: Clone + Send + 'static> State<T> {
    pub fn new(signal: Signal<T>, reactive: SharedReactiveGraph, dirty_flag: DirtyFlag) -> Self {
        Self {
            signal,
            reactive,
            dirty_flag,
        }
    }

    /// Current value, or `None` once the signal has been disposed
    pub fn get(&self) -> Option<T> {
        self.reactive.lock().unwrap().get_untracked(self.signal)
    }

    /// Write the value and request a rebuild
    pub fn set(&self, value: T) {
        self.reactive.lock().unwrap().set(self.signal, value);
        self.dirty_flag.store(true, Ordering::SeqCst);
    }

    /// Update the value using a function and request a rebuild
    pub fn update<F: FnOnce(T) -> T>(&self, f: F) {
        self.reactive.lock().unwrap().update(self.signal, f);
        self.dirty_flag.store(true, Ordering::SeqCst);
    }

    /// The underlying signal, for use inside derived values and effects
    pub fn signal(&self) -> Signal<T> {
        self.signal
    }
}

/// A mutable cell shared between components that never forces a rebuild
///
/// Writes notify derived values and effects that read the cell, but leave
/// the dirty flag untouched. Suited to values that change every frame,
/// such as scroll offsets.
pub struct SharedValue<T> {
    signal: Signal<T>,
    reactive: SharedReactiveGraph,
}

impl<T> Clone for SharedValue<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal,
            reactive: Arc::clone(&self.reactive),
        }
    }
}

impl<T> fmt::Debug for SharedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedValue")
            .field("signal", &self.signal)
            .finish()
    }
}

impl<T> PartialEq for SharedValue<T> {
    /// Two handles are equal when they refer to the same cell
    fn eq(&self, other: &Self) -> bool {
        self.signal == other.signal && Arc::ptr_eq(&self.reactive, &other.reactive)
    }
}

impl<T: Clone + Send + 'static> SharedValue<T> {
    pub fn new(signal: Signal<T>, reactive: SharedReactiveGraph) -> Self {
        Self { signal, reactive }
    }

    /// Current value, or `None` once the cell has been disposed
    pub fn get(&self) -> Option<T> {
        self.reactive.lock().unwrap().get_untracked(self.signal)
    }

    /// Write the value and notify readers
    pub fn set(&self, value: T) {
        self.reactive.lock().unwrap().set(self.signal, value);
    }

    /// Update the value using a function
    pub fn update<F: FnOnce(T) -> T>(&self, f: F) {
        self.reactive.lock().unwrap().update(self.signal, f);
    }

    /// The underlying signal, for use inside derived values and effects
    pub fn signal(&self) -> Signal<T> {
        self.signal
    }
}
