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

//! Tagged, type-erased component payloads.

use soma_core::TypeTag;
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// A shared handle to a component payload.
///
/// Payloads are handed out by handle, not copied: query rows and the table
/// hold the same `Rc`, so a system mutating a payload in place is observed
/// by every later reader. The world is single-threaded, which is the entire
/// safety argument for the `RefCell`.
pub type ComponentRef = Rc<RefCell<dyn Any>>;

/// A component: a type tag plus an arbitrary payload.
///
/// An entity holds at most one component per tag. Inserting a component for
/// a tag the entity already has replaces the existing payload.
#[derive(Clone)]
pub struct Component {
    tag: TypeTag,
    payload: ComponentRef,
}

impl Component {
    /// Wraps `value` as the payload of a component tagged `tag`.
    pub fn new<T: 'static>(tag: impl Into<TypeTag>, value: T) -> Self {
        Self {
            tag: tag.into(),
            payload: Rc::new(RefCell::new(value)),
        }
    }

    /// The component's type tag.
    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }

    /// A shared handle to the payload.
    pub fn payload(&self) -> ComponentRef {
        Rc::clone(&self.payload)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Borrows the payload behind `handle` as a `T`, or `None` if the payload is
/// of another type.
pub fn borrow_as<T: 'static>(handle: &ComponentRef) -> Option<Ref<'_, T>> {
    Ref::filter_map(handle.borrow(), |any| any.downcast_ref::<T>()).ok()
}

/// Mutably borrows the payload behind `handle` as a `T`, or `None` if the
/// payload is of another type.
pub fn borrow_mut_as<T: 'static>(handle: &ComponentRef) -> Option<RefMut<'_, T>> {
    RefMut::filter_map(handle.borrow_mut(), |any| any.downcast_mut::<T>()).ok()
}
