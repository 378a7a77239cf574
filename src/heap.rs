// File: src/heap.rs
//
// Object heap for the Quill runtime.
// A slot arena with a free list stands in for an intrusive object list:
// every live object occupies one slot, carries its mark bit there, and is
// destroyed only by the sweep phase. The string intern table lives here
// too, holding weak keys the collector prunes before sweeping.

use std::mem;

use crate::object::{
    Obj, ObjClass, ObjClosure, ObjFunction, ObjInstance, ObjString, ObjUpvalue, UpvalueState,
};
use crate::table::{hash_str, Table};
use crate::value::Value;

pub use crate::object::ObjRef;

/// First collection threshold; afterwards the threshold tracks the live
/// size (doubled after each cycle).
const FIRST_GC: usize = 1024 * 1024;

#[derive(Debug)]
struct Slot {
    obj: Obj,
    marked: bool,
}

#[derive(Debug)]
pub struct Heap {
    slots: Vec<Option<Slot>>,
    free: Vec<u32>,
    /// Weak map from string content to its canonical object.
    strings: Table,
    /// Gray worklist for the tracing phase.
    gray: Vec<ObjRef>,
    bytes_allocated: usize,
    next_gc: usize,
}

impl Heap {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            strings: Table::new(),
            gray: Vec::new(),
            bytes_allocated: 0,
            next_gc: FIRST_GC,
        }
    }

    /// Place an object in the arena and return its reference.
    pub fn alloc(&mut self, obj: Obj) -> ObjRef {
        self.bytes_allocated += obj_size(&obj);
        let slot = Slot { obj, marked: false };
        match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(slot);
                ObjRef(index)
            }
            None => {
                self.slots.push(Some(slot));
                ObjRef((self.slots.len() - 1) as u32)
            }
        }
    }

    /// Return the canonical string object for `s`, creating it on first use.
    pub fn intern(&mut self, s: &str) -> ObjRef {
        let hash = hash_str(s);
        if let Some(existing) = self.find_interned(s, hash) {
            return existing;
        }
        let string = self.alloc(Obj::Str(ObjString { chars: s.into(), hash }));
        self.strings.set(string, hash, Value::Nil);
        string
    }

    /// Look up an already-interned string without creating it.
    pub fn find_interned(&self, s: &str, hash: u32) -> Option<ObjRef> {
        let slots = &self.slots;
        self.strings.find_string(hash, |candidate| {
            matches!(
                &slots[candidate.0 as usize],
                Some(Slot { obj: Obj::Str(string), .. }) if &*string.chars == s
            )
        })
    }

    // --- Accessors -------------------------------------------------------

    pub fn get(&self, object: ObjRef) -> &Obj {
        &self.slot(object).obj
    }

    pub fn str_value(&self, object: ObjRef) -> &str {
        match self.get(object) {
            Obj::Str(s) => &s.chars,
            _ => unreachable!("reference is not a string"),
        }
    }

    pub fn str_hash(&self, object: ObjRef) -> u32 {
        match self.get(object) {
            Obj::Str(s) => s.hash,
            _ => unreachable!("reference is not a string"),
        }
    }

    pub fn as_function(&self, object: ObjRef) -> &ObjFunction {
        match self.get(object) {
            Obj::Function(f) => f,
            _ => unreachable!("reference is not a function"),
        }
    }

    pub fn as_closure(&self, object: ObjRef) -> &ObjClosure {
        match self.get(object) {
            Obj::Closure(c) => c,
            _ => unreachable!("reference is not a closure"),
        }
    }

    pub fn as_closure_mut(&mut self, object: ObjRef) -> &mut ObjClosure {
        match &mut self.slot_mut(object).obj {
            Obj::Closure(c) => c,
            _ => unreachable!("reference is not a closure"),
        }
    }

    pub fn as_upvalue(&self, object: ObjRef) -> &ObjUpvalue {
        match self.get(object) {
            Obj::Upvalue(u) => u,
            _ => unreachable!("reference is not an upvalue"),
        }
    }

    pub fn as_upvalue_mut(&mut self, object: ObjRef) -> &mut ObjUpvalue {
        match &mut self.slot_mut(object).obj {
            Obj::Upvalue(u) => u,
            _ => unreachable!("reference is not an upvalue"),
        }
    }

    pub fn as_class(&self, object: ObjRef) -> &ObjClass {
        match self.get(object) {
            Obj::Class(c) => c,
            _ => unreachable!("reference is not a class"),
        }
    }

    pub fn as_class_mut(&mut self, object: ObjRef) -> &mut ObjClass {
        match &mut self.slot_mut(object).obj {
            Obj::Class(c) => c,
            _ => unreachable!("reference is not a class"),
        }
    }

    pub fn as_instance(&self, object: ObjRef) -> &ObjInstance {
        match self.get(object) {
            Obj::Instance(i) => i,
            _ => unreachable!("reference is not an instance"),
        }
    }

    pub fn as_instance_mut(&mut self, object: ObjRef) -> &mut ObjInstance {
        match &mut self.slot_mut(object).obj {
            Obj::Instance(i) => i,
            _ => unreachable!("reference is not an instance"),
        }
    }

    pub fn is_string(&self, object: ObjRef) -> bool {
        matches!(self.get(object), Obj::Str(_))
    }

    pub fn is_instance(&self, object: ObjRef) -> bool {
        matches!(self.get(object), Obj::Instance(_))
    }

    pub fn is_class(&self, object: ObjRef) -> bool {
        matches!(self.get(object), Obj::Class(_))
    }

    // --- Collection ------------------------------------------------------

    pub fn should_collect(&self) -> bool {
        self.bytes_allocated > self.next_gc
    }

    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated
    }

    pub fn next_gc(&self) -> usize {
        self.next_gc
    }

    /// Number of live objects in the arena.
    pub fn object_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Mark a value's object, if it has one, and queue it for tracing.
    pub fn mark_value(&mut self, value: Value) {
        if let Value::Obj(object) = value {
            self.mark_object(object);
        }
    }

    pub fn mark_object(&mut self, object: ObjRef) {
        let slot = self.slot_mut(object);
        if slot.marked {
            return;
        }
        slot.marked = true;
        self.gray.push(object);
    }

    /// Drain the gray worklist, marking everything reachable from it.
    pub fn trace_references(&mut self) {
        while let Some(object) = self.gray.pop() {
            self.blacken(object);
        }
    }

    fn blacken(&mut self, object: ObjRef) {
        let mut children: Vec<Value> = Vec::new();
        match self.get(object) {
            Obj::Str(_) | Obj::Native(_) => {}
            Obj::Upvalue(upvalue) => {
                if let UpvalueState::Closed(value) = upvalue.state {
                    children.push(value);
                }
            }
            Obj::Function(function) => {
                if let Some(name) = function.name {
                    children.push(Value::Obj(name));
                }
                children.extend(function.chunk.constants.iter().copied());
            }
            Obj::Closure(closure) => {
                children.push(Value::Obj(closure.function));
                children.extend(closure.upvalues.iter().map(|&u| Value::Obj(u)));
            }
            Obj::Class(class) => {
                children.push(Value::Obj(class.name));
                for (key, value) in class.methods.iter() {
                    children.push(Value::Obj(key));
                    children.push(value);
                }
            }
            Obj::Instance(instance) => {
                children.push(Value::Obj(instance.class));
                for (key, value) in instance.fields.iter() {
                    children.push(Value::Obj(key));
                    children.push(value);
                }
            }
            Obj::BoundMethod(bound) => {
                children.push(bound.receiver);
                children.push(Value::Obj(bound.method));
            }
        }
        for child in children {
            self.mark_value(child);
        }
    }

    /// Drop intern-table entries whose strings did not survive marking.
    /// This is the collector's only weak reference and must run between
    /// tracing and sweeping.
    pub fn remove_unmarked_strings(&mut self) {
        let slots = &self.slots;
        self.strings.remove_unmarked(|key| {
            slots[key.0 as usize].as_ref().map_or(false, |slot| slot.marked)
        });
    }

    /// Free every unmarked object, clear surviving marks, and rearm the
    /// collection threshold. Returns the number of bytes reclaimed.
    pub fn sweep(&mut self) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            match slot {
                Some(live) if live.marked => live.marked = false,
                Some(dead) => {
                    freed += obj_size(&dead.obj);
                    *slot = None;
                    self.free.push(index as u32);
                }
                None => {}
            }
        }
        self.bytes_allocated -= freed;
        self.next_gc = self.bytes_allocated * 2;
        freed
    }

    fn slot(&self, object: ObjRef) -> &Slot {
        match &self.slots[object.0 as usize] {
            Some(slot) => slot,
            None => unreachable!("use of freed object"),
        }
    }

    fn slot_mut(&mut self, object: ObjRef) -> &mut Slot {
        match &mut self.slots[object.0 as usize] {
            Some(slot) => slot,
            None => unreachable!("use of freed object"),
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

/// Rough per-object footprint used for the collection trigger. Chunks and
/// payload vectors are counted at allocation time; later table growth is
/// deliberately ignored, the trigger only needs to track the trend.
fn obj_size(obj: &Obj) -> usize {
    mem::size_of::<Slot>()
        + match obj {
            Obj::Str(s) => s.chars.len(),
            Obj::Function(f) => {
                f.chunk.code.len()
                    + f.chunk.lines.len() * mem::size_of::<usize>()
                    + f.chunk.constants.len() * mem::size_of::<Value>()
            }
            Obj::Closure(c) => c.upvalues.len() * mem::size_of::<ObjRef>(),
            Obj::Native(_) | Obj::Upvalue(_) | Obj::Class(_) | Obj::Instance(_)
            | Obj::BoundMethod(_) => 0,
        }
}
