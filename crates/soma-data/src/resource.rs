// Copyright 2025 the Soma authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Single-instance, keyed, strongly-typed global values.

use ahash::AHashMap;
use soma_core::WorldError;
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// Keyed singleton values readable by any system.
///
/// Lifecycle is explicit: `set` during plugin/startup registration, `read` /
/// `write` from systems. Reading a key that was never set fails fast — there
/// is no auto-initialization and no silent default.
#[derive(Default)]
pub struct ResourceStore {
    values: AHashMap<String, Rc<RefCell<dyn Any>>>,
}

impl ResourceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        log::debug!("Setting resource `{key}`.");
        self.values.insert(key, Rc::new(RefCell::new(value)));
    }

    /// Returns true if `key` has been set.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Borrows the value under `key` as a `T`.
    pub fn read<T: 'static>(&self, key: &str) -> Result<Ref<'_, T>, WorldError> {
        let cell = self.values.get(key).ok_or_else(|| WorldError::MissingResource {
            key: key.to_string(),
        })?;
        Ref::filter_map(cell.borrow(), |any| any.downcast_ref::<T>()).map_err(|_| {
            WorldError::ResourceTypeMismatch {
                key: key.to_string(),
            }
        })
    }

    /// Mutably borrows the value under `key` as a `T`.
    pub fn write<T: 'static>(&self, key: &str) -> Result<RefMut<'_, T>, WorldError> {
        let cell = self.values.get(key).ok_or_else(|| WorldError::MissingResource {
            key: key.to_string(),
        })?;
        RefMut::filter_map(cell.borrow_mut(), |any| any.downcast_mut::<T>()).map_err(|_| {
            WorldError::ResourceTypeMismatch {
                key: key.to_string(),
            }
        })
    }
}
