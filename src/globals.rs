//! The shared namespace the bootstrapper and its host meet in.
//!
//! Two kinds of slots, both keyed by well-known names:
//! - converters, written once by the bootstrapper and read by anyone
//! - host callbacks, owned by the host; the bootstrapper only looks them up
//!
//! Pass one `Arc<Globals>` to both sides instead of reaching for a process
//! global. Locks are `std` locks so lookups never suspend.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::Error;

/// `(source, lang?) -> markup`. A missing or empty tag means the default language.
pub type Converter = Arc<dyn Fn(&str, Option<&str>) -> Result<String> + Send + Sync>;

/// Zero-argument host callback.
pub type ReadyCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct Globals {
    converters: RwLock<HashMap<String, Converter>>,
    callbacks: RwLock<HashMap<String, ReadyCallback>>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a converter. Fails if `name` is already bound.
    pub fn define_converter(&self, name: &str, converter: Converter) -> Result<(), Error> {
        let mut converters = self
            .converters
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if converters.contains_key(name) {
            return Err(Error::AlreadyDefined(name.to_string()));
        }
        converters.insert(name.to_string(), converter);
        Ok(())
    }

    pub fn converter(&self, name: &str) -> Option<Converter> {
        self.converters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn has_converter(&self, name: &str) -> bool {
        self.converters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Register (or replace) a host callback.
    pub fn set_callback(&self, name: &str, callback: ReadyCallback) {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), callback);
    }

    pub fn callback(&self, name: &str) -> Option<ReadyCallback> {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Unregister a host callback. Hosts that shut down before the
    /// handshake found them call this so the bootstrapper keeps waiting.
    pub fn remove_callback(&self, name: &str) {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }
}
