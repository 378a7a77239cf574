// File: src/object.rs
//
// Heap object variants for the Quill runtime.
// Every object lives in the VM's heap arena and is addressed by `ObjRef`;
// objects refer to each other only through such references, never by
// owning one another directly.

use std::rc::Rc;

use crate::bytecode::Chunk;
use crate::table::Table;
use crate::value::Value;

/// A reference into the heap arena. Copyable and comparable by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(pub(crate) u32);

/// Native functions receive their argument window and return a value.
pub type NativeFn = fn(&[Value]) -> Value;

/// The heap object sum type. The arena stores one of these per slot,
/// together with the GC mark bit.
#[derive(Debug)]
pub enum Obj {
    Str(ObjString),
    Function(ObjFunction),
    Native(ObjNative),
    Closure(ObjClosure),
    Upvalue(ObjUpvalue),
    Class(ObjClass),
    Instance(ObjInstance),
    BoundMethod(ObjBoundMethod),
}

/// An interned string: no two live strings share content, so equality is
/// reference equality. The FNV-1a hash is computed once at creation.
#[derive(Debug)]
pub struct ObjString {
    pub chars: Box<str>,
    pub hash: u32,
}

/// A compiled function. Immutable once the compiler hands it over; call
/// frames share the chunk through the `Rc`.
#[derive(Debug)]
pub struct ObjFunction {
    pub arity: usize,
    pub upvalue_count: usize,
    pub chunk: Rc<Chunk>,
    /// Interned name, or `None` for the top-level script.
    pub name: Option<ObjRef>,
}

#[derive(Debug)]
pub struct ObjNative {
    pub function: NativeFn,
}

/// A function bundled with the upvalues it captured, in capture order.
#[derive(Debug)]
pub struct ObjClosure {
    pub function: ObjRef,
    pub upvalues: Vec<ObjRef>,
}

/// Indirection for a captured variable. While the owning stack slot is
/// live the upvalue is `Open` and reads through the value stack; closing
/// moves the value into the upvalue itself.
#[derive(Debug)]
pub struct ObjUpvalue {
    pub state: UpvalueState,
}

#[derive(Debug, Clone, Copy)]
pub enum UpvalueState {
    /// Index of the captured slot in the VM value stack.
    Open(usize),
    Closed(Value),
}

#[derive(Debug)]
pub struct ObjClass {
    pub name: ObjRef,
    /// Method name -> closure.
    pub methods: Table,
}

#[derive(Debug)]
pub struct ObjInstance {
    pub class: ObjRef,
    /// Field name -> value.
    pub fields: Table,
}

/// A method closure paired with the receiver it was accessed on.
#[derive(Debug)]
pub struct ObjBoundMethod {
    pub receiver: Value,
    pub method: ObjRef,
}
