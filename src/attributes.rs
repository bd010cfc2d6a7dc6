use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::address::TransportAddress;

/// Typed key into an [`Attributes`] bag.
pub struct Key<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Key {
            name,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.name).finish()
    }
}

/// Remote address of the transport carrying the call.
pub const TRANSPORT_ATTR_REMOTE_ADDR: Key<TransportAddress> = Key::new("remote-addr");

/// Per-call attribute bag populated by the RPC runtime.
#[derive(Clone, Default)]
pub struct Attributes {
    values: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl Attributes {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> AttributesBuilder {
        AttributesBuilder {
            values: HashMap::new(),
        }
    }

    /// Look up `key`; `None` when unset or stored under a different type.
    pub fn get<T: Send + Sync + 'static>(&self, key: &Key<T>) -> Option<&T> {
        self.values.get(key.name)?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

pub struct AttributesBuilder {
    values: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl AttributesBuilder {
    pub fn set<T: Send + Sync + 'static>(mut self, key: Key<T>, value: T) -> Self {
        self.values.insert(key.name, Arc::new(value));
        self
    }

    pub fn build(self) -> Attributes {
        Attributes {
            values: self.values,
        }
    }
}
