//! Composition context state
//!
//! `ContextState` is handed to every component while a tree is being built.
//! It gives components two things:
//!
//! - **Keyed state** that survives rebuilds: signals, shared values, derived
//!   values and plain references, each identified by a string key
//! - **Scoped context values**: a provider pushes a value for the duration of
//!   building its subtree, and any descendant can look it up by type
//!
//! ```rust
//! use nestable_core::context_state::ContextState;
//!
//! let mut ctx = ContextState::standalone();
//!
//! let count = ctx.use_state_keyed("counter", || 0i32);
//! count.set(3);
//!
//! // Same key on the next build returns the same state
//! let again = ctx.use_state_keyed("counter", || 0i32);
//! assert_eq!(again.get(), Some(3));
//!
//! let seen = ctx.provide(String::from("theme-dark"), |ctx| {
//!     ctx.use_context::<String>()
//! });
//! assert_eq!(seen.as_deref(), Some("theme-dark"));
//! assert!(ctx.use_context::<String>().is_none());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{ContextError, Result};
use crate::reactive::{Derived, DerivedId, ReactiveGraph, SharedValue, Signal, SignalId, State};

/// Shared reactive graph for thread-safe access
pub type SharedReactiveGraph = Arc<Mutex<ReactiveGraph>>;

/// Shared dirty flag for triggering UI rebuilds
pub type DirtyFlag = Arc<AtomicBool>;

/// Key for identifying a slot in the keyed state system
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateKey {
    /// Hash of the user-provided key
    key_hash: u64,
    /// Type ID of the slot value
    type_id: TypeId,
}

impl StateKey {
    /// Create a new StateKey from a hashable key and type
    pub fn new<T: 'static, K: Hash>(key: &K) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        Self {
            key_hash: hasher.finish(),
            type_id: TypeId::of::<T>(),
        }
    }

    /// Create a StateKey from a string key and type
    pub fn from_string<T: 'static>(key: &str) -> Self {
        Self::new::<T, _>(&key)
    }
}

/// Stores keyed state across rebuilds
///
/// Reactive nodes are stored by raw id; plain references are stored by value.
pub struct HookState {
    /// Keyed reactive nodes: key -> raw node ID
    nodes: HashMap<StateKey, u64>,
    /// Keyed plain values
    refs: HashMap<StateKey, Box<dyn Any + Send>>,
}

impl Default for HookState {
    fn default() -> Self {
        Self::new()
    }
}

impl HookState {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            refs: HashMap::new(),
        }
    }

    /// Get an existing node by key
    pub fn get(&self, key: &StateKey) -> Option<u64> {
        self.nodes.get(key).copied()
    }

    /// Store a node with the given key
    pub fn insert(&mut self, key: StateKey, node_id: u64) {
        self.nodes.insert(key, node_id);
    }

    /// Forget a node, returning its raw id
    pub fn remove(&mut self, key: &StateKey) -> Option<u64> {
        self.nodes.remove(key)
    }

    /// Get an existing plain value by key
    pub fn get_ref<T: Clone + 'static>(&self, key: &StateKey) -> Option<T> {
        self.refs.get(key)?.downcast_ref::<T>().cloned()
    }

    /// Store a plain value with the given key
    pub fn insert_ref<T: Send + 'static>(&mut self, key: StateKey, value: T) {
        self.refs.insert(key, Box::new(value));
    }

    /// Forget a plain value
    pub fn remove_ref(&mut self, key: &StateKey) -> bool {
        self.refs.remove(key).is_some()
    }

    /// Number of keyed slots of either kind
    pub fn len(&self) -> usize {
        self.nodes.len() + self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared hook state for the application
pub type SharedHookState = Arc<Mutex<HookState>>;

/// A value pushed by a provider
struct ProvidedValue {
    type_id: TypeId,
    value: Box<dyn Any + Send>,
}

/// Context passed to components while building a tree
///
/// Owns handles to the reactive graph, the keyed hook storage and the dirty
/// flag, plus the stack of values pushed by enclosing providers.
pub struct ContextState {
    /// Reactive graph for signal-based state management
    reactive: SharedReactiveGraph,
    /// Hook state for keyed persistence
    hooks: SharedHookState,
    /// Dirty flag for triggering UI rebuilds
    dirty_flag: DirtyFlag,
    /// Values pushed by enclosing providers, innermost last
    providers: Vec<ProvidedValue>,
}

impl ContextState {
    pub fn new(
        reactive: SharedReactiveGraph,
        hooks: SharedHookState,
        dirty_flag: DirtyFlag,
    ) -> Self {
        Self {
            reactive,
            hooks,
            dirty_flag,
            providers: Vec::new(),
        }
    }

    /// Create a context with its own graph, hook storage and dirty flag
    pub fn standalone() -> Self {
        Self::new(
            Arc::new(Mutex::new(ReactiveGraph::new())),
            Arc::new(Mutex::new(HookState::new())),
            Arc::new(AtomicBool::new(false)),
        )
    }

    // =========================================================================
    // Keyed State
    // =========================================================================

    /// Create a persistent state value that survives across rebuilds (keyed)
    ///
    /// Writing the returned `State` requests a rebuild.
    pub fn use_state_keyed<T, F>(&self, key: &str, init: F) -> State<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> T,
    {
        let signal = self.use_signal_keyed(key, init);
        State::new(
            signal,
            Arc::clone(&self.reactive),
            Arc::clone(&self.dirty_flag),
        )
    }

    /// Create a persistent shared value that survives across rebuilds (keyed)
    ///
    /// Writing the returned `SharedValue` never requests a rebuild.
    pub fn use_shared_value_keyed<T, F>(&self, key: &str, init: F) -> SharedValue<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> T,
    {
        let signal = self.use_signal_keyed(key, init);
        SharedValue::new(signal, Arc::clone(&self.reactive))
    }

    /// Create a persistent signal that survives across rebuilds (keyed)
    pub fn use_signal_keyed<T, F>(&self, key: &str, init: F) -> Signal<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> T,
    {
        let state_key = StateKey::from_string::<T>(key);
        let mut hooks = self.hooks.lock().unwrap();
        let mut graph = self.reactive.lock().unwrap();

        if let Some(raw_id) = hooks.get(&state_key) {
            let signal_id = SignalId::from_raw(raw_id);
            if graph.contains_signal(signal_id) {
                return Signal::from_id(signal_id);
            }
        }

        let signal = graph.create_signal(init());
        hooks.insert(state_key, signal.id().to_raw());
        signal
    }

    /// Create a persistent derived value that survives across rebuilds (keyed)
    ///
    /// `compute` is only used the first time the key is seen; later builds
    /// return the existing node, which keeps tracking its own dependencies.
    pub fn use_derived_keyed<T, F>(&self, key: &str, compute: F) -> Derived<T>
    where
        T: Send + 'static,
        F: Fn(&ReactiveGraph) -> T + Send + 'static,
    {
        let state_key = StateKey::from_string::<Derived<T>>(key);
        let mut hooks = self.hooks.lock().unwrap();
        let mut graph = self.reactive.lock().unwrap();

        if let Some(raw_id) = hooks.get(&state_key) {
            let derived_id = DerivedId::from_raw(raw_id);
            if graph.contains_derived(derived_id) {
                return Derived::from_id(derived_id);
            }
        }

        let derived = graph.create_derived(compute);
        hooks.insert(state_key, derived.id().to_raw());
        derived
    }

    /// Create a persistent plain value that survives across rebuilds (keyed)
    ///
    /// Returns a clone of the stored value; store handles (`Arc`s) to share
    /// one instance between builds.
    pub fn use_ref_keyed<T, F>(&self, key: &str, init: F) -> T
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> T,
    {
        let state_key = StateKey::from_string::<T>(key);
        let mut hooks = self.hooks.lock().unwrap();

        if let Some(value) = hooks.get_ref::<T>(&state_key) {
            return value;
        }

        let value = init();
        hooks.insert_ref(state_key, value.clone());
        value
    }

    /// Drop a keyed signal (also used for `State` and `SharedValue`)
    pub fn forget_signal_keyed<T: 'static>(&self, key: &str) {
        let state_key = StateKey::from_string::<T>(key);
        let mut hooks = self.hooks.lock().unwrap();
        if let Some(raw_id) = hooks.remove(&state_key) {
            self.reactive
                .lock()
                .unwrap()
                .dispose_signal(SignalId::from_raw(raw_id));
        }
    }

    /// Drop a keyed derived value
    pub fn forget_derived_keyed<T: 'static>(&self, key: &str) {
        let state_key = StateKey::from_string::<Derived<T>>(key);
        let mut hooks = self.hooks.lock().unwrap();
        if let Some(raw_id) = hooks.remove(&state_key) {
            self.reactive
                .lock()
                .unwrap()
                .dispose_derived(DerivedId::from_raw(raw_id));
        }
    }

    /// Drop a keyed plain value
    pub fn forget_ref_keyed<T: 'static>(&self, key: &str) {
        let state_key = StateKey::from_string::<T>(key);
        self.hooks.lock().unwrap().remove_ref(&state_key);
    }

    // =========================================================================
    // Scoped Context Values
    // =========================================================================

    /// Make `value` visible to everything built inside `f`
    ///
    /// The value is popped again when `f` returns, so siblings built after
    /// this call do not see it.
    pub fn provide<V, R, F>(&mut self, value: V, f: F) -> R
    where
        V: Clone + Send + 'static,
        F: FnOnce(&mut Self) -> R,
    {
        let type_id = TypeId::of::<V>();
        let depth = self.providers.len();
        self.providers.push(ProvidedValue {
            type_id,
            value: Box::new(value),
        });

        let result = f(self);

        if self.providers.len() != depth + 1
            || self.providers.last().map(|p| p.type_id) != Some(type_id)
        {
            tracing::warn!(
                "provider stack out of balance for {} (depth {}, found {})",
                std::any::type_name::<V>(),
                depth + 1,
                self.providers.len()
            );
        }
        self.providers.truncate(depth);
        result
    }

    /// Nearest value of type `V` pushed by an enclosing provider
    pub fn use_context<V: Clone + 'static>(&self) -> Option<V> {
        let type_id = TypeId::of::<V>();
        self.providers
            .iter()
            .rev()
            .find(|provided| provided.type_id == type_id)
            .and_then(|provided| provided.value.downcast_ref::<V>())
            .cloned()
    }

    /// Like [`ContextState::use_context`], but a missing provider is an error
    pub fn use_context_or_fail<V: Clone + 'static>(&self) -> Result<V> {
        self.use_context::<V>()
            .ok_or(ContextError::MissingProvider {
                context: std::any::type_name::<V>(),
            })
    }

    /// Number of providers enclosing the current build position
    pub fn provider_depth(&self) -> usize {
        self.providers.len()
    }

    // =========================================================================
    // Access to Internal Resources
    // =========================================================================

    /// Get the shared reactive graph
    pub fn reactive(&self) -> &SharedReactiveGraph {
        &self.reactive
    }

    /// Get the dirty flag
    pub fn dirty_flag(&self) -> &DirtyFlag {
        &self.dirty_flag
    }

    /// Request a UI rebuild by setting the dirty flag
    pub fn request_rebuild(&self) {
        self.dirty_flag.store(true, Ordering::SeqCst);
    }

    /// Clear the dirty flag, returning whether a rebuild was requested
    pub fn take_rebuild_request(&self) -> bool {
        self.dirty_flag.swap(false, Ordering::SeqCst)
    }
}
