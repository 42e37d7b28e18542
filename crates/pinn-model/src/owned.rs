// Pinnacle IO - Treatment planning record codec
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Owning containers.
//!
//! A container knows the id of the entity that holds it and stamps that id
//! onto every child it receives, clearing it on the way out. Mutable access
//! to a child goes through [`ChildMut`], which re-stamps the back-reference
//! when dropped, so a child swapped in through `&mut` still points at its
//! real owner.

use std::ops::{Deref, DerefMut};

use crate::mapper::Entity;
use crate::meta::{EntityId, Extras};

/// Mutable handle to an owned child.
pub struct ChildMut<'a, T: Entity> {
    owner: EntityId,
    item: &'a mut T,
}

impl<'a, T: Entity> Deref for ChildMut<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item
    }
}

impl<'a, T: Entity> DerefMut for ChildMut<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item
    }
}

impl<'a, T: Entity> Drop for ChildMut<'a, T> {
    fn drop(&mut self) {
        self.item.meta_mut().set_parent(Some(self.owner));
    }
}

/// An ordered list of owned children.
///
/// `extras` holds unknown statements found next to the items inside the
/// container block. Copies are made by the owner through `clone_for`, so
/// the copied children point at the copied owner.
#[derive(Debug)]
pub struct OwnedList<T> {
    owner: EntityId,
    items: Vec<T>,
    pub extras: Extras,
}

impl<T: Entity> OwnedList<T> {
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            items: Vec::new(),
            extras: Extras::new(),
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn push(&mut self, mut item: T) {
        item.meta_mut().set_parent(Some(self.owner));
        self.items.push(item);
    }

    pub fn insert(&mut self, index: usize, mut item: T) {
        item.meta_mut().set_parent(Some(self.owner));
        self.items.insert(index.min(self.items.len()), item);
    }

    /// Detaches the child at `index`.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let mut item = self.items.remove(index);
        item.meta_mut().set_parent(None);
        Some(item)
    }

    pub fn remove_by_id(&mut self, id: EntityId) -> Option<T> {
        let index = self.items.iter().position(|i| i.meta().id() == id)?;
        self.remove(index)
    }

    /// Detaches every child.
    pub fn clear(&mut self) -> Vec<T> {
        let mut items = std::mem::take(&mut self.items);
        for item in &mut items {
            item.meta_mut().set_parent(None);
        }
        items
    }

    pub fn get_mut(&mut self, index: usize) -> Option<ChildMut<'_, T>> {
        let owner = self.owner;
        self.items.get_mut(index).map(|item| ChildMut { owner, item })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = ChildMut<'_, T>> {
        let owner = self.owner;
        self.items.iter_mut().map(move |item| ChildMut { owner, item })
    }

    pub fn by_id(&self, id: EntityId) -> Option<&T> {
        self.items.iter().find(|i| i.meta().id() == id)
    }

    /// Raw access for graph walks that never replace an item.
    pub(crate) fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }
}

impl<T: Entity + Clone> OwnedList<T> {
    /// Clones every item, each under a fresh id, into a list held by
    /// `owner`.
    pub(crate) fn clone_for(&self, owner: EntityId) -> Self {
        let mut copy = Self::new(owner);
        for item in &self.items {
            copy.push(item.clone());
        }
        copy.extras = self.extras.clone();
        copy
    }
}

impl<T> Deref for OwnedList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T: PartialEq> PartialEq for OwnedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items && self.extras == other.extras
    }
}

/// Zero or one owned child.
#[derive(Debug)]
pub struct OwnedSlot<T> {
    owner: EntityId,
    item: Option<T>,
}

impl<T: Entity> OwnedSlot<T> {
    pub fn new(owner: EntityId) -> Self {
        Self { owner, item: None }
    }

    /// Places `item` in the slot and returns the detached previous child.
    pub fn set(&mut self, mut item: T) -> Option<T> {
        item.meta_mut().set_parent(Some(self.owner));
        let old = self.item.replace(item);
        old.map(|mut o| {
            o.meta_mut().set_parent(None);
            o
        })
    }

    pub fn take(&mut self) -> Option<T> {
        let mut item = self.item.take()?;
        item.meta_mut().set_parent(None);
        Some(item)
    }

    pub fn get(&self) -> Option<&T> {
        self.item.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<ChildMut<'_, T>> {
        let owner = self.owner;
        self.item.as_mut().map(|item| ChildMut { owner, item })
    }

    pub fn is_some(&self) -> bool {
        self.item.is_some()
    }

    pub fn is_none(&self) -> bool {
        self.item.is_none()
    }

    pub(crate) fn item_mut(&mut self) -> Option<&mut T> {
        self.item.as_mut()
    }
}

impl<T: Entity + Clone> OwnedSlot<T> {
    pub(crate) fn clone_for(&self, owner: EntityId) -> Self {
        let mut copy = Self::new(owner);
        if let Some(item) = &self.item {
            copy.set(item.clone());
        }
        copy
    }
}

impl<T: PartialEq> PartialEq for OwnedSlot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.item == other.item
    }
}
