// Copyright 2024 FastLabs Developers
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

use std::collections::HashMap;

/// The capacity of the logger cache of a [`BridgeAppender`](super::BridgeAppender).
pub const DEFAULT_CAPACITY: usize = 32;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    age: u32,
}

/// A bounded map from logger names to values that evicts the least recently used entry.
///
/// Every lookup hit and every insert stamps the entry with the next value of an age counter.
/// When the counter wraps, all entries get fresh distinct ages in their current order.
#[derive(Debug)]
pub struct LruCache<V> {
    capacity: usize,
    next_age: u32,
    entries: HashMap<String, Entry<V>>,
}

impl<V: Clone> LruCache<V> {
    /// Create an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_age: 0,
            entries: HashMap::with_capacity(capacity + 1),
        }
    }

    /// The value cached for `key`, marking it as most recently used.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let age = self.tick();
        let entry = self.entries.get_mut(key)?;
        entry.age = age;
        Some(entry.value.clone())
    }

    /// Cache `value` for `key` and return the keys evicted to stay within capacity.
    pub fn insert(&mut self, key: &str, value: V) -> Vec<String> {
        let age = self.tick();
        self.entries.insert(key.to_string(), Entry { value, age });

        let mut evicted = vec![];
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.age)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    evicted.push(oldest);
                }
                None => break,
            }
        }
        evicted
    }

    /// Whether `key` is cached, without touching it.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn tick(&mut self) -> u32 {
        if self.next_age == u32::MAX {
            self.resync();
        }
        let age = self.next_age;
        self.next_age += 1;
        age
    }

    // Renumber entries from zero, keeping their relative order.
    fn resync(&mut self) {
        let mut ages = self
            .entries
            .values_mut()
            .map(|entry| &mut entry.age)
            .collect::<Vec<_>>();
        ages.sort_by_key(|age| **age);
        let mut next = 0;
        for age in ages {
            *age = next;
            next += 1;
        }
        self.next_age = next;
    }

    #[cfg(test)]
    fn with_next_age(mut self, next_age: u32) -> Self {
        self.next_age = next_age;
        self
    }
}
