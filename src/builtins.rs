// File: src/builtins.rs
//
// Native functions exposed to Quill programs.
// Natives run synchronously, receive their argument window, and must
// return a value; they have no error channel and never re-enter the VM.

use chrono::Utc;

use crate::value::Value;
use crate::vm::Vm;

/// Register every builtin as a global on a fresh VM.
pub fn install(vm: &mut Vm) {
    vm.define_native("clock", clock);
}

/// Wall-clock time in seconds, as a floating-point number.
fn clock(_args: &[Value]) -> Value {
    Value::Number(Utc::now().timestamp_millis() as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_returns_a_positive_number() {
        match clock(&[]) {
            Value::Number(n) => assert!(n > 0.0),
            other => panic!("clock returned {:?}", other),
        }
    }
}
