// File: src/table.rs
//
// Open-addressed hash table keyed by interned strings.
// Linear probing with tombstones; used for globals, instance fields,
// class methods, and the string intern table itself. Keys compare by
// reference (interning makes that content equality), so each entry
// caches its hash and the table never touches the heap.

use crate::object::ObjRef;
use crate::value::Value;

const INITIAL_CAPACITY: usize = 8;

/// One table slot. Empty slots have `key: None, value: Nil`; tombstones
/// left by deletion have `key: None, value: Bool(true)` so probe chains
/// stay intact.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    key: Option<ObjRef>,
    hash: u32,
    value: Value,
}

const EMPTY: Entry = Entry { key: None, hash: 0, value: Value::Nil };

#[derive(Debug, Clone, Default)]
pub struct Table {
    entries: Vec<Entry>,
    /// Live entries plus tombstones; drives the load-factor check.
    count: usize,
}

impl Table {
    pub fn new() -> Self {
        Self { entries: Vec::new(), count: 0 }
    }

    /// Look up a value by key. `hash` must be the key string's hash.
    pub fn get(&self, key: ObjRef, hash: u32) -> Option<Value> {
        if self.count == 0 {
            return None;
        }
        let entry = &self.entries[self.find_index(key, hash)];
        entry.key.map(|_| entry.value)
    }

    /// Insert or update. Returns true when the key was not present.
    pub fn set(&mut self, key: ObjRef, hash: u32, value: Value) -> bool {
        if (self.count + 1) * 4 > self.entries.len() * 3 {
            self.grow();
        }
        let index = self.find_index(key, hash);
        let entry = &mut self.entries[index];
        let is_new = entry.key.is_none();
        // A reused tombstone is already included in the count
        if is_new && entry.value == Value::Nil {
            self.count += 1;
        }
        *entry = Entry { key: Some(key), hash, value };
        is_new
    }

    /// Delete a key, leaving a tombstone. Returns true when it was present.
    pub fn delete(&mut self, key: ObjRef, hash: u32) -> bool {
        if self.count == 0 {
            return false;
        }
        let index = self.find_index(key, hash);
        let entry = &mut self.entries[index];
        if entry.key.is_none() {
            return false;
        }
        *entry = Entry { key: None, hash: 0, value: Value::Bool(true) };
        true
    }

    /// Copy every live entry from `other` into this table.
    pub fn add_all(&mut self, other: &Table) {
        for entry in &other.entries {
            if let Some(key) = entry.key {
                self.set(key, entry.hash, entry.value);
            }
        }
    }

    /// Iterate over live key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (ObjRef, Value)> + '_ {
        self.entries.iter().filter_map(|entry| entry.key.map(|key| (key, entry.value)))
    }

    /// Find an interned string by content hash. `matches` decides whether a
    /// candidate key has the wanted bytes; tombstones are probed past.
    pub fn find_string(&self, hash: u32, matches: impl Fn(ObjRef) -> bool) -> Option<ObjRef> {
        if self.count == 0 {
            return None;
        }
        let mask = self.entries.len() - 1;
        let mut index = hash as usize & mask;
        loop {
            let entry = &self.entries[index];
            match entry.key {
                None => {
                    if entry.value == Value::Nil {
                        return None;
                    }
                }
                Some(key) => {
                    if entry.hash == hash && matches(key) {
                        return Some(key);
                    }
                }
            }
            index = (index + 1) & mask;
        }
    }

    /// Tombstone every entry whose key fails the predicate. The GC uses
    /// this to drop intern-table entries for strings about to be swept.
    pub fn remove_unmarked(&mut self, is_marked: impl Fn(ObjRef) -> bool) {
        for entry in &mut self.entries {
            if let Some(key) = entry.key {
                if !is_marked(key) {
                    *entry = Entry { key: None, hash: 0, value: Value::Bool(true) };
                }
            }
        }
    }

    /// Probe for the slot a key lives in, or the slot it should be
    /// inserted into: the first tombstone seen, else the trailing empty.
    fn find_index(&self, key: ObjRef, hash: u32) -> usize {
        let mask = self.entries.len() - 1;
        let mut index = hash as usize & mask;
        let mut tombstone = None;
        loop {
            let entry = &self.entries[index];
            match entry.key {
                None => {
                    if entry.value == Value::Nil {
                        return tombstone.unwrap_or(index);
                    }
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                Some(existing) => {
                    if existing == key {
                        return index;
                    }
                }
            }
            index = (index + 1) & mask;
        }
    }

    fn grow(&mut self) {
        let capacity = if self.entries.is_empty() { INITIAL_CAPACITY } else { self.entries.len() * 2 };
        let old = std::mem::replace(&mut self.entries, vec![EMPTY; capacity]);
        // Tombstones are not carried over, so recount live entries
        self.count = 0;
        for entry in old {
            if let Some(key) = entry.key {
                self.set_fresh(key, entry.hash, entry.value);
            }
        }
    }

    /// Insert into a table known to have room and no duplicate of `key`.
    fn set_fresh(&mut self, key: ObjRef, hash: u32, value: Value) {
        let index = self.find_index(key, hash);
        self.entries[index] = Entry { key: Some(key), hash, value };
        self.count += 1;
    }
}

/// FNV-1a over the string's bytes.
pub fn hash_str(s: &str) -> u32 {
    let mut hash: u32 = 2166136261;
    for byte in s.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(16777619);
    }
    hash
}
