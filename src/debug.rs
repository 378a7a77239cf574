// File: src/debug.rs
//
// Disassembler and debug switches for the Quill VM.
// The disassembler renders chunks into readable text; the VM routes it to
// stderr for tracing, and tests inspect the returned string directly.
// Debug behavior is toggled by environment variables read once.

use std::env;
use std::fmt::Write;

use once_cell::sync::Lazy;

use crate::bytecode::{Chunk, OpCode};
use crate::heap::Heap;
use crate::value;

/// Trace the stack and each instruction before dispatch.
pub static TRACE_EXECUTION: Lazy<bool> = Lazy::new(|| env::var("QUILL_TRACE").is_ok());

/// Disassemble every function after a successful compile.
pub static PRINT_CODE: Lazy<bool> = Lazy::new(|| env::var("QUILL_PRINT_CODE").is_ok());

/// Collect on every allocation point instead of waiting for the threshold.
pub static STRESS_GC: Lazy<bool> = Lazy::new(|| env::var("QUILL_STRESS_GC").is_ok());

/// Log a summary line for each collection cycle.
pub static LOG_GC: Lazy<bool> = Lazy::new(|| env::var("QUILL_LOG_GC").is_ok());

/// Render a whole chunk with a header.
pub fn disassemble_chunk(heap: &Heap, chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", name);
    let mut offset = 0;
    while offset < chunk.code.len() {
        offset = disassemble_instruction(heap, chunk, offset, &mut out);
    }
    out
}

/// Render one instruction, returning the offset of the next one.
pub fn disassemble_instruction(
    heap: &Heap,
    chunk: &Chunk,
    offset: usize,
    out: &mut String,
) -> usize {
    let _ = write!(out, "{:04} ", offset);
    if offset > 0 && chunk.lines[offset] == chunk.lines[offset - 1] {
        let _ = write!(out, "   | ");
    } else {
        let _ = write!(out, "{:4} ", chunk.lines[offset]);
    }

    let byte = chunk.code[offset];
    let op = match OpCode::try_from(byte) {
        Ok(op) => op,
        Err(_) => {
            let _ = writeln!(out, "Unknown opcode {}", byte);
            return offset + 1;
        }
    };

    match op {
        OpCode::Constant
        | OpCode::GetGlobal
        | OpCode::DefineGlobal
        | OpCode::SetGlobal
        | OpCode::GetProperty
        | OpCode::SetProperty
        | OpCode::GetSuper
        | OpCode::Class
        | OpCode::Method => constant_instruction(heap, chunk, op, offset, out),

        OpCode::GetLocal
        | OpCode::SetLocal
        | OpCode::GetUpvalue
        | OpCode::SetUpvalue
        | OpCode::Call => byte_instruction(chunk, op, offset, out),

        OpCode::Jump | OpCode::JumpIfFalse => jump_instruction(chunk, op, 1, offset, out),
        OpCode::Loop => jump_instruction(chunk, op, -1, offset, out),

        OpCode::Invoke | OpCode::SuperInvoke => invoke_instruction(heap, chunk, op, offset, out),

        OpCode::Closure => closure_instruction(heap, chunk, offset, out),

        _ => {
            let _ = writeln!(out, "{}", op.name());
            offset + 1
        }
    }
}

fn constant_instruction(
    heap: &Heap,
    chunk: &Chunk,
    op: OpCode,
    offset: usize,
    out: &mut String,
) -> usize {
    let constant = chunk.code[offset + 1];
    let rendered = value::format_value(heap, chunk.constants[constant as usize]);
    let _ = writeln!(out, "{:<16} {:4} '{}'", op.name(), constant, rendered);
    offset + 2
}

fn byte_instruction(chunk: &Chunk, op: OpCode, offset: usize, out: &mut String) -> usize {
    let slot = chunk.code[offset + 1];
    let _ = writeln!(out, "{:<16} {:4}", op.name(), slot);
    offset + 2
}

fn jump_instruction(
    chunk: &Chunk,
    op: OpCode,
    sign: isize,
    offset: usize,
    out: &mut String,
) -> usize {
    let jump = ((chunk.code[offset + 1] as usize) << 8) | chunk.code[offset + 2] as usize;
    let target = (offset as isize + 3) + sign * jump as isize;
    let _ = writeln!(out, "{:<16} {:4} -> {}", op.name(), offset, target);
    offset + 3
}

fn invoke_instruction(
    heap: &Heap,
    chunk: &Chunk,
    op: OpCode,
    offset: usize,
    out: &mut String,
) -> usize {
    let constant = chunk.code[offset + 1];
    let argc = chunk.code[offset + 2];
    let rendered = value::format_value(heap, chunk.constants[constant as usize]);
    let _ = writeln!(out, "{:<16} ({} args) {:4} '{}'", op.name(), argc, constant, rendered);
    offset + 3
}

fn closure_instruction(heap: &Heap, chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let mut offset = offset + 1;
    let constant = chunk.code[offset];
    offset += 1;
    let function_value = chunk.constants[constant as usize];
    let rendered = value::format_value(heap, function_value);
    let _ = writeln!(out, "{:<16} {:4} {}", OpCode::Closure.name(), constant, rendered);

    // The capture descriptors follow the operand inline
    let upvalue_count = match function_value {
        crate::value::Value::Obj(object) => heap.as_function(object).upvalue_count,
        _ => 0,
    };
    for _ in 0..upvalue_count {
        let is_local = chunk.code[offset];
        let index = chunk.code[offset + 1];
        let _ = writeln!(
            out,
            "{:04}      |                     {} {}",
            offset,
            if is_local != 0 { "local" } else { "upvalue" },
            index
        );
        offset += 2;
    }
    offset
}
