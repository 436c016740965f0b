//! Per-request data carriers.
//!
//! Two containers travel through one traversal of the handler chain:
//!
//! - [`Context`] - request-scoped environment and metadata (target URL,
//!   content type, timings). Created by the router's context factory.
//! - [`Task`] - the payload, partial results and error state. Created by the
//!   router's request adapter and finally read by its response adapter.
//!
//! Both are string-keyed maps of type-erased values. They are handed to every
//! handler by `&mut` reference, so a write made by one handler is visible to
//! every handler invoked after it and to the response adapter. Neither is ever
//! shared between requests.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

type Slot = Box<dyn Any + Send + Sync>;

/// String-keyed storage for values of arbitrary type.
///
/// Lookups are typed: asking for a key with the wrong type returns `None`
/// exactly like a missing key does.
#[derive(Default)]
pub struct Store {
    values: HashMap<String, Slot>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, returning `true` if a previous value was
    /// replaced.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) -> bool {
        self.values.insert(key.into(), Box::new(value)).is_some()
    }

    /// Returns a reference to the value under `key` if it has type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Returns a mutable reference to the value under `key` if it has type `T`.
    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key).and_then(|v| v.downcast_mut::<T>())
    }

    /// Removes and returns the value under `key` if it has type `T`.
    ///
    /// A value of a different type is left in place.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        self.get::<T>(key)?;
        self.values
            .remove(key)
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    /// Returns `true` if any value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the stored keys in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_set().entries(keys).finish()
    }
}

macro_rules! container {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Default)]
        pub struct $name(Store);

        impl $name {
            /// Creates an empty container.
            pub fn new() -> Self {
                Self::default()
            }
        }

        impl std::ops::Deref for $name {
            type Target = Store;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }
    };
}

container! {
    /// Request-scoped environment and metadata, created per request by the
    /// router's context factory.
    Context
}

container! {
    /// Request payload, partial results and error state, created per request
    /// by the router's request adapter.
    Task
}
