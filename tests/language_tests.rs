// Integration tests for the Quill interpreter
//
// These tests run complete Quill programs through the VM and inspect the
// resulting globals. Covered areas:
// - Expressions, precedence, and equality semantics
// - Control flow and logical operators
// - Functions, closures, and upvalue lifetimes
// - Classes, inheritance, initializers, and bound methods
// - String interning

use quill::value::Value;
use quill::vm::Vm;

fn run(source: &str) -> Vm {
    let mut vm = Vm::new();
    vm.interpret(source).expect("program should run cleanly");
    vm
}

fn number(vm: &Vm, name: &str) -> f64 {
    match vm.get_global(name) {
        Some(Value::Number(n)) => n,
        other => panic!("expected number in '{}', got {:?}", name, other),
    }
}

fn boolean(vm: &Vm, name: &str) -> bool {
    match vm.get_global(name) {
        Some(Value::Bool(b)) => b,
        other => panic!("expected bool in '{}', got {:?}", name, other),
    }
}

fn text(vm: &Vm, name: &str) -> String {
    let value = vm.get_global(name).expect("global should be defined");
    vm.stringify(value)
}

// --- Expressions ---------------------------------------------------------

#[test]
fn arithmetic_precedence() {
    let vm = run("var r = (1 + 2) * 3 - 4; var p = 1 + 2 * 3; var q = 10 / 4;");
    assert_eq!(number(&vm, "r"), 5.0);
    assert_eq!(number(&vm, "p"), 7.0);
    assert_eq!(number(&vm, "q"), 2.5);
}

#[test]
fn unary_operators() {
    let vm = run("var neg = -(2 * 3); var not_nil = !nil; var not_zero = !0;");
    assert_eq!(number(&vm, "neg"), -6.0);
    assert!(boolean(&vm, "not_nil"));
    // Zero is truthy, so its negation is false
    assert!(!boolean(&vm, "not_zero"));
}

#[test]
fn comparison_and_equality() {
    let vm = run(
        "var lt = 1 < 2; var ge = 1 >= 2; var eq = 1 == 1; \
         var mixed = 1 == \"1\"; var ne = 1 != 2;",
    );
    assert!(boolean(&vm, "lt"));
    assert!(!boolean(&vm, "ge"));
    assert!(boolean(&vm, "eq"));
    assert!(!boolean(&vm, "mixed"));
    assert!(boolean(&vm, "ne"));
}

#[test]
fn nan_is_not_equal_to_itself() {
    let vm = run("var n = 0 / 0; var eq = n == n;");
    assert!(!boolean(&vm, "eq"));
}

#[test]
fn string_concatenation() {
    let vm = run("var s = \"con\" + \"cat\" + \"enate\";");
    assert_eq!(text(&vm, "s"), "concatenate");
}

#[test]
fn equal_strings_are_the_same_object() {
    let vm = run("var a = \"hi\"; var b = \"h\" + \"i\"; var same = a == b;");
    assert!(boolean(&vm, "same"));
    // Interning makes equality reference identity
    assert_eq!(vm.get_global("a"), vm.get_global("b"));
}

#[test]
fn assignment_is_an_expression() {
    let vm = run("var a = 1; var b = a = 5;");
    assert_eq!(number(&vm, "a"), 5.0);
    assert_eq!(number(&vm, "b"), 5.0);
}

// --- Control flow --------------------------------------------------------

#[test]
fn if_else_branches() {
    let vm = run(
        "var a = nil; var b = nil;\n\
         if (1 < 2) a = \"then\"; else a = \"else\";\n\
         if (1 > 2) b = \"then\"; else b = \"else\";",
    );
    assert_eq!(text(&vm, "a"), "then");
    assert_eq!(text(&vm, "b"), "else");
}

#[test]
fn while_loop_sums() {
    let vm = run("var sum = 0; var i = 0; while (i < 5) { sum = sum + i; i = i + 1; }");
    assert_eq!(number(&vm, "sum"), 10.0);
}

#[test]
fn for_loop_with_all_clauses() {
    let vm = run("var sum = 0; for (var i = 0; i < 5; i = i + 1) { sum = sum + i; }");
    assert_eq!(number(&vm, "sum"), 10.0);
}

#[test]
fn for_loop_without_increment() {
    let vm = run("var n = 0; for (; n < 3;) { n = n + 1; }");
    assert_eq!(number(&vm, "n"), 3.0);
}

#[test]
fn logical_operators_short_circuit_to_operand_values() {
    let vm = run(
        "var a = false and 1; var b = true and 2; var c = nil or \"x\"; var d = 1 or 2;",
    );
    assert_eq!(vm.get_global("a"), Some(Value::Bool(false)));
    assert_eq!(number(&vm, "b"), 2.0);
    assert_eq!(text(&vm, "c"), "x");
    assert_eq!(number(&vm, "d"), 1.0);
}

#[test]
fn and_does_not_evaluate_rhs_when_lhs_is_falsey() {
    let vm = run(
        "var evaluated = false;\n\
         fun touch() { evaluated = true; return true; }\n\
         var r = false and touch();",
    );
    assert!(!boolean(&vm, "evaluated"));
    assert!(!boolean(&vm, "r"));
}

// --- Scoping -------------------------------------------------------------

#[test]
fn block_scopes_shadow_and_restore() {
    let vm = run(
        "var a = \"outer\"; var seen = nil;\n\
         { var a = \"inner\"; seen = a; }\n\
         var after = a;",
    );
    assert_eq!(text(&vm, "seen"), "inner");
    assert_eq!(text(&vm, "after"), "outer");
}

#[test]
fn globals_can_be_redefined() {
    let vm = run("var a = 1; var a = 2;");
    assert_eq!(number(&vm, "a"), 2.0);
}

// --- Functions and closures ----------------------------------------------

#[test]
fn function_calls_and_returns() {
    let vm = run("fun add(a, b) { return a + b; } var r = add(2, 3);");
    assert_eq!(number(&vm, "r"), 5.0);
}

#[test]
fn function_without_return_yields_nil() {
    let vm = run("fun noop() {} var r = noop();");
    assert_eq!(vm.get_global("r"), Some(Value::Nil));
}

#[test]
fn recursion() {
    let vm = run("fun fib(n) { if (n < 2) return n; return fib(n - 2) + fib(n - 1); } \
                  var f = fib(10);");
    assert_eq!(number(&vm, "f"), 55.0);
}

#[test]
fn counter_closure_keeps_private_state() {
    let vm = run(
        "fun makeCounter() {\n\
           var n = 0;\n\
           fun c() { n = n + 1; return n; }\n\
           return c;\n\
         }\n\
         var c = makeCounter();\n\
         var r1 = c(); var r2 = c(); var r3 = c();\n\
         var other = makeCounter();\n\
         var fresh = other();",
    );
    assert_eq!(number(&vm, "r1"), 1.0);
    assert_eq!(number(&vm, "r2"), 2.0);
    assert_eq!(number(&vm, "r3"), 3.0);
    // A second counter closes over its own variable
    assert_eq!(number(&vm, "fresh"), 1.0);
}

#[test]
fn sibling_closures_share_one_upvalue() {
    let vm = run(
        "var set = nil; var get = nil;\n\
         fun make() {\n\
           var a = \"initial\";\n\
           fun setter() { a = \"updated\"; }\n\
           fun getter() { return a; }\n\
           set = setter; get = getter;\n\
         }\n\
         make();\n\
         var before = get();\n\
         set();\n\
         var after = get();",
    );
    assert_eq!(text(&vm, "before"), "initial");
    assert_eq!(text(&vm, "after"), "updated");
}

#[test]
fn upvalues_close_when_scope_ends_inside_a_function() {
    let vm = run(
        "var hold = nil;\n\
         fun outer() {\n\
           {\n\
             var local = \"kept\";\n\
             fun inner() { return local; }\n\
             hold = inner;\n\
           }\n\
           return hold();\n\
         }\n\
         var r = outer();",
    );
    assert_eq!(text(&vm, "r"), "kept");
}

#[test]
fn functions_are_first_class_values() {
    let vm = run(
        "fun twice(f, x) { return f(f(x)); }\n\
         fun inc(n) { return n + 1; }\n\
         var r = twice(inc, 5);",
    );
    assert_eq!(number(&vm, "r"), 7.0);
}

#[test]
fn function_printing_formats() {
    let vm = run("fun named() {}");
    let f = vm.get_global("named").expect("function defined");
    assert_eq!(vm.stringify(f), "<fn named>");
}

// --- Classes -------------------------------------------------------------

#[test]
fn class_fields_and_methods() {
    let vm = run(
        "class Box { put(v) { this.item = v; } take() { return this.item; } }\n\
         var box = Box();\n\
         box.put(42);\n\
         var direct = box.item;\n\
         var via = box.take();",
    );
    assert_eq!(number(&vm, "direct"), 42.0);
    assert_eq!(number(&vm, "via"), 42.0);
}

#[test]
fn initializer_and_this() {
    let vm = run("class P { init(x) { this.x = x; } } var v = P(7).x;");
    assert_eq!(number(&vm, "v"), 7.0);
}

#[test]
fn initializer_returns_the_instance() {
    let vm = run(
        "class P { init(x) { this.x = x; } }\n\
         var p = P(1);\n\
         var q = p.init(9);\n\
         var x = q.x;",
    );
    let q = vm.get_global("q").expect("q defined");
    assert_eq!(vm.stringify(q), "P instance");
    assert_eq!(vm.get_global("q"), vm.get_global("p"));
    assert_eq!(number(&vm, "x"), 9.0);
}

#[test]
fn inheritance_and_super() {
    let vm = run(
        "var log = \"\";\n\
         class A { greet() { log = log + \"A\"; } }\n\
         class B < A { greet() { super.greet(); log = log + \"B\"; } }\n\
         B().greet();",
    );
    assert_eq!(text(&vm, "log"), "AB");
}

#[test]
fn subclass_inherits_and_overrides() {
    let vm = run(
        "class Base { name() { return \"base\"; } other() { return \"other\"; } }\n\
         class Derived < Base { name() { return \"derived\"; } }\n\
         var d = Derived();\n\
         var n = d.name();\n\
         var o = d.other();",
    );
    assert_eq!(text(&vm, "n"), "derived");
    assert_eq!(text(&vm, "o"), "other");
}

#[test]
fn super_binds_the_declaring_class_not_the_receiver() {
    let vm = run(
        "class A { m() { return \"A\"; } }\n\
         class B < A { m() { return \"B\"; } up() { return super.m(); } }\n\
         class C < B { m() { return \"C\"; } }\n\
         var r = C().up();",
    );
    // `super` in B::up resolves against A even on a C receiver
    assert_eq!(text(&vm, "r"), "A");
}

#[test]
fn methods_bind_their_receiver() {
    let vm = run(
        "class Speaker { say() { return this.word; } }\n\
         var s = Speaker();\n\
         s.word = \"yes\";\n\
         var m = s.say;\n\
         var r = m();",
    );
    assert_eq!(text(&vm, "r"), "yes");
}

#[test]
fn fields_shadow_methods() {
    let vm = run(
        "fun shadow() { return \"field\"; }\n\
         class C { m() { return \"method\"; } }\n\
         var c = C();\n\
         var before = c.m();\n\
         c.m = shadow;\n\
         var after = c.m();",
    );
    assert_eq!(text(&vm, "before"), "method");
    assert_eq!(text(&vm, "after"), "field");
}

#[test]
fn instance_printing_format() {
    let vm = run("class Widget {} var w = Widget();");
    let w = vm.get_global("w").expect("instance defined");
    assert_eq!(vm.stringify(w), "Widget instance");
    let class = vm.get_global("Widget").expect("class defined");
    assert_eq!(vm.stringify(class), "Widget");
}

// --- Builtins ------------------------------------------------------------

#[test]
fn clock_returns_positive_seconds() {
    let vm = run("var t = clock();");
    assert!(number(&vm, "t") > 0.0);
}
