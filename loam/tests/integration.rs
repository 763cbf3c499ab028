//! End-to-end tests: source text through the full pipeline

use loam::interp::{ErrorKind, Interpreter, RuntimeError};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// `print` sink that can be read back after the interpreter drops it
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run a program, returning everything it printed
fn run(source: &str) -> Result<String, RuntimeError> {
    let tokens = loam::lexer::tokenize(source).expect("lexes");
    let program = loam::parser::parse(tokens).expect("parses");
    let resolutions = loam::resolver::resolve(&program).expect("resolves");

    let buf = SharedBuf::default();
    let mut interp = Interpreter::with_output(Box::new(buf.clone()));
    interp.add_resolutions(resolutions);
    interp.interpret(&program)?;

    let bytes = buf.0.borrow().clone();
    Ok(String::from_utf8(bytes).expect("utf8 output"))
}

fn output(source: &str) -> String {
    run(source).expect("runs without error")
}

fn runtime_error(source: &str) -> RuntimeError {
    run(source).expect_err("fails at runtime")
}

fn compile_error(source: &str) -> loam::CompileError {
    let tokens = loam::lexer::tokenize(source).expect("lexes");
    let program = loam::parser::parse(tokens).expect("parses");
    loam::resolver::resolve(&program).expect_err("fails to resolve")
}

// ---- arithmetic and printing ----

#[test]
fn integral_numbers_print_without_fraction() {
    assert_eq!(output("print 1 + 1;"), "2\n");
    assert_eq!(output("print 10 / 4;"), "2.5\n");
    assert_eq!(output("print -3 * 2;"), "-6\n");
}

#[test]
fn division_by_zero_yields_infinity() {
    assert_eq!(output("print 1 / 0;"), "inf\n");
    assert_eq!(output("print -1 / 0;"), "-inf\n");
}

#[test]
fn string_concatenation() {
    assert_eq!(output(r#"print "foo" + "bar";"#), "foobar\n");
}

#[test]
fn adding_number_and_string_is_an_error() {
    let err = runtime_error(r#"print 1 + "x";"#);
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert!(err.message.contains("two numbers or two strings"));
}

#[test]
fn comparison_operators() {
    assert_eq!(output("print 1 < 2;"), "true\n");
    assert_eq!(output("print 2 <= 2;"), "true\n");
    assert_eq!(output("print 1 > 2;"), "false\n");
    assert_eq!(output("print 3 >= 4;"), "false\n");
}

#[test]
fn comparing_string_to_number_is_an_error() {
    let err = runtime_error(r#"print "a" < 1;"#);
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
}

#[test]
fn negating_a_non_number_is_an_error() {
    let err = runtime_error("print -nil;");
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
}

// ---- equality and truthiness ----

#[test]
fn equality_is_type_aware() {
    assert_eq!(output("print nil == nil;"), "true\n");
    assert_eq!(output(r#"print 1 == "1";"#), "false\n");
    assert_eq!(output("print false == nil;"), "false\n");
    assert_eq!(output("print false != nil;"), "true\n");
}

#[test]
fn only_nil_and_false_are_falsy() {
    assert_eq!(output("if (0) print \"zero\";"), "zero\n");
    assert_eq!(output(r#"if ("") print "empty";"#), "empty\n");
    assert_eq!(output("if (nil) print \"x\"; else print \"nil falsy\";"), "nil falsy\n");
    assert_eq!(output("print !false;"), "true\n");
    assert_eq!(output("print !0;"), "false\n");
}

#[test]
fn logical_operators_yield_the_deciding_operand() {
    assert_eq!(output(r#"print "left" or "right";"#), "left\n");
    assert_eq!(output(r#"print nil or "right";"#), "right\n");
    assert_eq!(output(r#"print nil and "right";"#), "nil\n");
    assert_eq!(output(r#"print "left" and "right";"#), "right\n");
}

// ---- variables and scoping ----

#[test]
fn uninitialized_variable_is_nil() {
    assert_eq!(output("var a; print a;"), "nil\n");
}

#[test]
fn blocks_shadow_and_restore() {
    let source = r#"
        var a = "outer";
        {
            var a = "inner";
            print a;
        }
        print a;
    "#;
    assert_eq!(output(source), "inner\nouter\n");
}

#[test]
fn assignment_writes_the_nearest_enclosing_binding() {
    let source = r#"
        var a = 1;
        {
            a = 2;
        }
        print a;
    "#;
    assert_eq!(output(source), "2\n");
}

#[test]
fn assignment_is_an_expression() {
    assert_eq!(output("var a = 1; print a = 5;"), "5\n");
}

#[test]
fn undefined_variable_read_is_an_error() {
    let err = runtime_error("print nope;");
    assert_eq!(err.kind, ErrorKind::UndefinedVariable);
    assert!(err.message.contains("nope"));
}

#[test]
fn undefined_variable_assignment_is_an_error() {
    let err = runtime_error("nope = 1;");
    assert_eq!(err.kind, ErrorKind::UndefinedVariable);
}

// ---- control flow ----

#[test]
fn while_loop_runs_to_completion() {
    assert_eq!(
        output("var i = 0; while (i < 3) { print i; i = i + 1; }"),
        "0\n1\n2\n"
    );
}

#[test]
fn for_loop_desugars_to_while() {
    assert_eq!(
        output("for (var i = 0; i < 3; i = i + 1) print i;"),
        "0\n1\n2\n"
    );
}

#[test]
fn for_loop_initializer_scoping() {
    // The loop variable is confined to the desugared block
    let source = r#"
        var i = "outer";
        for (var i = 0; i < 1; i = i + 1) {}
        print i;
    "#;
    assert_eq!(output(source), "outer\n");
}

#[test]
fn dangling_else_binds_to_nearest_if() {
    assert_eq!(
        output(r#"if (true) if (false) print "a"; else print "b";"#),
        "b\n"
    );
}

// ---- functions and closures ----

#[test]
fn function_call_returns_value() {
    assert_eq!(
        output("fun add(a, b) { return a + b; } print add(2, 3);"),
        "5\n"
    );
}

#[test]
fn falling_off_the_end_returns_nil() {
    assert_eq!(output("fun f() {} print f();"), "nil\n");
}

#[test]
fn return_unwinds_nested_blocks_and_loops() {
    let source = r#"
        fun find() {
            var i = 0;
            while (true) {
                if (i == 5) {
                    return i;
                }
                i = i + 1;
            }
        }
        print find();
    "#;
    assert_eq!(output(source), "5\n");
}

#[test]
fn recursion_works() {
    assert_eq!(
        output("fun fact(n) { if (n < 2) return 1; return n * fact(n - 1); } print fact(6);"),
        "720\n"
    );
}

#[test]
fn closures_capture_frames_not_values() {
    let source = r#"
        fun counter() {
            var n = 0;
            fun inc() {
                n = n + 1;
                return n;
            }
            return inc;
        }
        var c = counter();
        print c();
        print c();
        var d = counter();
        print d();
    "#;
    assert_eq!(output(source), "1\n2\n1\n");
}

#[test]
fn resolution_freezes_bindings_at_declaration() {
    // The closure keeps seeing the global even after a shadowing local
    // appears later in the block
    let source = r#"
        var a = "global";
        {
            fun show() { print a; }
            show();
            var a = "block";
            show();
        }
    "#;
    assert_eq!(output(source), "global\nglobal\n");
}

#[test]
fn globals_allow_forward_references_from_function_bodies() {
    let source = r#"
        fun greet() { print message; }
        var message = "hi";
        greet();
    "#;
    assert_eq!(output(source), "hi\n");
}

#[test]
fn functions_print_their_name() {
    assert_eq!(output("fun f() {} print f;"), "<fn f>\n");
    assert_eq!(output("print clock;"), "<native fn>\n");
}

#[test]
fn calling_a_non_callable_is_an_error() {
    let err = runtime_error(r#""not a function"();"#);
    assert_eq!(err.kind, ErrorKind::NotCallable);
}

#[test]
fn arity_mismatch_names_both_counts() {
    let err = runtime_error("fun f(a, b, c) {} f(1);");
    assert_eq!(err.kind, ErrorKind::ArityMismatch);
    assert!(err.message.contains('3'));
    assert!(err.message.contains('1'));
}

#[test]
fn arguments_evaluate_left_to_right() {
    let source = r#"
        fun three(a, b, c) {}
        var log = "";
        fun tag(x) { log = log + x; return x; }
        three(tag("a"), tag("b"), tag("c"));
        print log;
    "#;
    assert_eq!(output(source), "abc\n");
}

// ---- classes ----

#[test]
fn class_prints_its_name_and_instances_say_so() {
    assert_eq!(output("class Pie {} print Pie;"), "Pie\n");
    assert_eq!(output("class Pie {} print Pie();"), "Pie instance\n");
}

#[test]
fn fields_are_per_instance_state() {
    let source = r#"
        class Box {}
        var a = Box();
        var b = Box();
        a.v = 1;
        b.v = 2;
        print a.v;
        print b.v;
    "#;
    assert_eq!(output(source), "1\n2\n");
}

#[test]
fn initializer_receives_arguments_and_binds_this() {
    let source = r#"
        class Point {
            init(x, y) {
                this.x = x;
                this.y = y;
            }
            sum() { return this.x + this.y; }
        }
        print Point(3, 4).sum();
    "#;
    assert_eq!(output(source), "7\n");
}

#[test]
fn constructing_without_init_takes_no_arguments() {
    let err = runtime_error("class C {} C(1);");
    assert_eq!(err.kind, ErrorKind::ArityMismatch);
}

#[test]
fn initializer_early_return_still_yields_the_instance() {
    let source = r#"
        class Guard {
            init(ok) {
                this.ok = ok;
                if (!ok) return;
                this.checked = true;
            }
        }
        print Guard(false).ok;
        print Guard(true).checked;
    "#;
    assert_eq!(output(source), "false\ntrue\n");
}

#[test]
fn bound_methods_remember_their_receiver() {
    let source = r#"
        class Greeter {
            init(name) { this.name = name; }
            greet() { print "hi, " + this.name; }
        }
        var g = Greeter("ada").greet;
        g();
    "#;
    assert_eq!(output(source), "hi, ada\n");
}

#[test]
fn methods_dispatch_on_the_instance_class() {
    let source = r#"
        class A { who() { print "A"; } }
        class B { who() { print "B"; } }
        var a = A();
        var b = B();
        a.who();
        b.who();
    "#;
    assert_eq!(output(source), "A\nB\n");
}

#[test]
fn fields_shadow_methods() {
    let source = r#"
        class C {
            m() { print "method"; }
        }
        var c = C();
        fun replacement() { print "field"; }
        c.m = replacement;
        c.m();
    "#;
    assert_eq!(output(source), "field\n");
}

#[test]
fn property_access_on_non_instance_is_an_error() {
    let err = runtime_error("var x = 3; print x.len;");
    assert_eq!(err.kind, ErrorKind::NotAnInstance);
}

#[test]
fn setting_property_on_non_instance_is_an_error() {
    let err = runtime_error("var x = 3; x.len = 1;");
    assert_eq!(err.kind, ErrorKind::NotAnInstance);
}

#[test]
fn reading_a_missing_property_is_an_error() {
    let err = runtime_error("class C {} print C().gone;");
    assert_eq!(err.kind, ErrorKind::UndefinedProperty);
    assert!(err.message.contains("gone"));
}

// ---- inheritance ----

#[test]
fn subclass_inherits_methods() {
    let source = r#"
        class Animal { speak() { print "..."; } }
        class Dog < Animal {}
        Dog().speak();
    "#;
    assert_eq!(output(source), "...\n");
}

#[test]
fn subclass_overrides_methods() {
    let source = r#"
        class Animal { speak() { print "..."; } }
        class Dog < Animal { speak() { print "woof"; } }
        Dog().speak();
    "#;
    assert_eq!(output(source), "woof\n");
}

#[test]
fn super_calls_the_overridden_method() {
    let source = r#"
        class A {
            greet() { print "A"; }
        }
        class B < A {
            greet() {
                super.greet();
                print "B";
            }
        }
        B().greet();
    "#;
    assert_eq!(output(source), "A\nB\n");
}

#[test]
fn super_resolves_above_the_defining_class_not_the_receiver() {
    // Classic three-level check: A < B < C, B's method calls super
    let source = r#"
        class A {
            method() { print "A"; }
        }
        class B < A {
            method() { print "B"; }
            test() { super.method(); }
        }
        class C < B {}
        C().test();
    "#;
    assert_eq!(output(source), "A\n");
}

#[test]
fn super_method_runs_with_the_subclass_receiver() {
    let source = r#"
        class A {
            name() { return "A"; }
            describe() { print this.name(); }
        }
        class B < A {
            name() { return "B"; }
            describe() { super.describe(); }
        }
        B().describe();
    "#;
    assert_eq!(output(source), "B\n");
}

#[test]
fn inherited_init_runs_for_subclass_construction() {
    let source = r#"
        class A {
            init(v) { this.v = v; }
        }
        class B < A {}
        print B(9).v;
    "#;
    assert_eq!(output(source), "9\n");
}

#[test]
fn superclass_must_be_a_class() {
    let err = runtime_error("var NotAClass = 123; class Sub < NotAClass {}");
    assert_eq!(err.kind, ErrorKind::InvalidSuperclass);
}

#[test]
fn missing_super_method_is_an_error() {
    let err = runtime_error(
        "class A {} class B < A { m() { super.gone(); } } B().m();",
    );
    assert_eq!(err.kind, ErrorKind::UndefinedProperty);
}

// ---- execution model ----

#[test]
fn runtime_error_stops_later_statements() {
    let source = "print 1; var f = 2; f(); print 3;";
    let tokens = loam::lexer::tokenize(source).unwrap();
    let program = loam::parser::parse(tokens).unwrap();
    let resolutions = loam::resolver::resolve(&program).unwrap();

    let buf = SharedBuf::default();
    let mut interp = Interpreter::with_output(Box::new(buf.clone()));
    interp.add_resolutions(resolutions);
    assert!(interp.interpret(&program).is_err());
    assert_eq!(String::from_utf8(buf.0.borrow().clone()).unwrap(), "1\n");
}

#[test]
fn interpreter_state_survives_across_programs() {
    // REPL usage: two programs share globals, ids continue across lines
    let buf = SharedBuf::default();
    let mut interp = Interpreter::with_output(Box::new(buf.clone()));

    let tokens = loam::lexer::tokenize("var a = 1;").unwrap();
    let (first, next_id) = loam::parser::parse_with_ids(tokens, 0).unwrap();
    interp.add_resolutions(loam::resolver::resolve(&first).unwrap());
    interp.interpret(&first).unwrap();

    let tokens = loam::lexer::tokenize("print a + 1;").unwrap();
    let (second, _) = loam::parser::parse_with_ids(tokens, next_id).unwrap();
    interp.add_resolutions(loam::resolver::resolve(&second).unwrap());
    interp.interpret(&second).unwrap();

    assert_eq!(String::from_utf8(buf.0.borrow().clone()).unwrap(), "2\n");
}

#[test]
fn clock_returns_a_number() {
    assert_eq!(output("print clock() > 0;"), "true\n");
}

// ---- resolve-time rejections ----

#[test]
fn top_level_return_is_rejected_before_execution() {
    let err = compile_error("print 1; return 2;");
    assert!(err.message().contains("top-level"));
}

#[test]
fn reading_local_in_its_own_initializer_is_rejected() {
    let err = compile_error("{ var a = a; }");
    assert!(err.message().contains("initializer"));
}

#[test]
fn this_outside_a_class_is_rejected() {
    let err = compile_error("fun f() { return this; }");
    assert!(err.message().contains("'this'"));
}

#[test]
fn super_without_a_superclass_is_rejected() {
    let err = compile_error("class C { m() { return super.m; } }");
    assert!(err.message().contains("superclass"));
}

#[test]
fn returning_a_value_from_init_is_rejected() {
    let err = compile_error("class C { init() { return 1; } }");
    assert!(err.message().contains("initializer"));
}

#[test]
fn class_inheriting_from_itself_is_rejected() {
    let err = compile_error("class C < C {}");
    assert!(err.message().contains("itself"));
}

#[test]
fn rejected_program_never_runs() {
    // resolve fails, so nothing executes and nothing prints
    let tokens = loam::lexer::tokenize("print 1; return 2;").unwrap();
    let program = loam::parser::parse(tokens).unwrap();
    assert!(loam::resolver::resolve(&program).is_err());
}
