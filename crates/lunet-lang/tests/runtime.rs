//! Runtime behavior tests.
//!
//! Tests the full stack: compile → Interpreter::execute. Printed output is
//! captured with a buffer handler; input comes from scripted lines.

use lunet_lang::{
    buffer_handler, compile, scripted_input, Chunk, ErrorCode, Interpreter, InterpreterConfig,
    LunetError, RuntimeError, RuntimeErrorKind, Value,
};
use pretty_assertions::assert_eq;

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn chunk(src: &str) -> Chunk {
    compile(src).unwrap_or_else(|errs| panic!("compile failed: {errs:#?}"))
}

fn run(src: &str) -> String {
    run_with_input(src, &[])
}

fn run_with_input(src: &str, input: &[&str]) -> String {
    let chunk = chunk(src);
    let out = buffer_handler();
    let mut interp = Interpreter::new(InterpreterConfig::default())
        .with_print_handler(out.clone())
        .with_read_handler(scripted_input(input.iter().copied()));
    interp.execute(&chunk).unwrap_or_else(|e| panic!("runtime error: {e}"));
    out.get_output()
}

fn eval(src: &str) -> Value {
    let chunk = chunk(src);
    Interpreter::new(InterpreterConfig::default())
        .with_print_handler(buffer_handler())
        .execute(&chunk)
        .unwrap_or_else(|e| panic!("runtime error: {e}"))
}

fn run_err_with(src: &str, config: InterpreterConfig, input: &[&str]) -> RuntimeError {
    let chunk = chunk(src);
    Interpreter::new(config)
        .with_print_handler(buffer_handler())
        .with_read_handler(scripted_input(input.iter().copied()))
        .execute(&chunk)
        .expect_err("expected a runtime error")
}

fn run_err(src: &str) -> RuntimeError {
    run_err_with(src, InterpreterConfig::default(), &[])
}

fn err_kind(src: &str) -> RuntimeErrorKind {
    run_err(src).kind
}

// ─── Arithmetic ──────────────────────────────────────────────────────────────

#[test]
fn integer_division_truncates() {
    assert_eq!(run("print(7 / 2, -7 / 2)"), "3\t-3\n");
}

#[test]
fn integer_arithmetic_is_exact() {
    assert_eq!(run("print(2 + 3, 2 - 5, 6 * 7)"), "5\t-3\t42\n");
    assert_eq!(run("print(9223372036854775807 + 1)"), "-9223372036854775808\n");
}

#[test]
fn mixed_arithmetic_is_float() {
    assert_eq!(run(r#"print(1 + 0.5, "2" * 3, 10 / 4.0)"#), "1.5\t6.0\t2.5\n");
}

#[test]
fn float_string_forms() {
    assert_eq!(run("print(1.0, 10 / 2.0, 3, 1e3)"), "1.0\t5.0\t3\t1000.0\n");
    assert_eq!(run("print(1.0 / 0, -1.0 / 0)"), "inf\t-inf\n");
}

#[test]
fn modulo_and_power() {
    assert_eq!(run("print(7 % 3, -7 % 3, 5.5 % 2)"), "1\t2\t1.5\n");
    assert_eq!(run("print(2 ^ 10, 2 ^ -1)"), "1024.0\t0.5\n");
}

#[test]
fn precedence() {
    assert_eq!(run("print(2 + 3 * 4, (2 + 3) * 4, -2 ^ 2)"), "14\t20\t-4.0\n");
    assert_eq!(run("print(1 + 2 .. 3)"), "33\n");
}

#[test]
fn integer_division_by_zero() {
    assert_eq!(err_kind("print(1 / 0)"), RuntimeErrorKind::Arithmetic);
    assert_eq!(err_kind("x = 5 % 0"), RuntimeErrorKind::Arithmetic);
}

#[test]
fn arithmetic_on_non_numbers() {
    assert_eq!(err_kind(r#"x = "abc" + 1"#), RuntimeErrorKind::Format);
    assert_eq!(err_kind("x = nil + 1"), RuntimeErrorKind::Type);
    assert_eq!(err_kind("x = {} * 2"), RuntimeErrorKind::Type);
}

#[test]
fn oversized_integer_literal() {
    assert_eq!(err_kind("x = 99999999999999999999"), RuntimeErrorKind::Format);
}

#[test]
fn concat_uses_string_forms() {
    assert_eq!(run(r#"print("a" .. 1 .. 2.0, "x" .. nil)"#), "a12.0\txnil\n");
}

// ─── Equality & ordering ─────────────────────────────────────────────────────

#[test]
fn equality_falls_back_to_string_forms() {
    assert_eq!(
        run(r#"print(1 == "1", 1 == 1.0, nil == "nil", true == "true", nil == nil)"#),
        "true\tfalse\tfalse\ttrue\ttrue\n",
    );
}

#[test]
fn ordering() {
    assert_eq!(run(r#"print(1 < 2, 2 <= 1.5, "a" < "b", 10 < "9")"#), "true\tfalse\ttrue\ttrue\n");
}

#[test]
fn distinct_tables_are_not_equal() {
    assert_eq!(run("a = {1} b = {1} c = a print(a == b, a == c, a ~= b)"), "false\ttrue\ttrue\n");
}

#[test]
fn table_equals_its_own_string_form() {
    assert_eq!(run(r#"t = {} s = "" .. t print(t == s, {} == s, s == t)"#), "true\tfalse\ttrue\n");
}

// ─── Logic ───────────────────────────────────────────────────────────────────

#[test]
fn logical_operators_are_strict_booleans() {
    assert_eq!(run("print(true and false, false or true, not false)"), "false\ttrue\ttrue\n");
    assert_eq!(err_kind("print(1 and true)"), RuntimeErrorKind::Type);
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(run("print(false and undefined(), true or undefined())"), "false\ttrue\n");
    assert_eq!(run("print(true or nil)"), "true\n");
}

#[test]
fn conditions_must_be_boolean() {
    assert_eq!(err_kind("if 1 then print(1) end"), RuntimeErrorKind::Type);
    assert_eq!(err_kind("while nil do end"), RuntimeErrorKind::Type);
}

// ─── Tables ──────────────────────────────────────────────────────────────────

#[test]
fn table_constructor_numbers_positional_entries() {
    assert_eq!(
        run("t = {10, 20, x = 30, 40} print(t[1], t[2], t.x, t[3], t[4])"),
        "10\t20\t30\t40\tnil\n",
    );
}

#[test]
fn positional_counter_ignores_explicit_keys() {
    assert_eq!(
        run(r#"t = {[1] = "a", "b", [5] = "c", "d"} print(t[1], t[2], t[5])"#),
        "b\td\tc\n",
    );
}

#[test]
fn nil_values_are_not_stored() {
    assert_eq!(run("t = {x = nil, 1} t.y = 2 t.y = nil print(t.x, t[1], t.y)"), "nil\t1\tnil\n");
}

#[test]
fn tables_are_shared_by_reference() {
    assert_eq!(run("a = {} b = a b.x = 5 print(a.x)"), "5\n");
}

#[test]
fn nested_index_paths() {
    assert_eq!(
        run(r#"t = {inner = {}} t.inner.v = "deep" print(t.inner.v, t["inner"]["v"])"#),
        "deep\tdeep\n",
    );
}

#[test]
fn computed_keys() {
    assert_eq!(run(r#"k = "name" t = {[k] = 1, [1 + 1] = 2} print(t.name, t[2])"#), "1\t2\n");
}

#[test]
fn indexing_nil() {
    assert_eq!(run("print(t.x, t.x.y)"), "nil\tnil\n");
    let err = run_err("t.x = 1");
    assert_eq!(err.kind, RuntimeErrorKind::Type);
    assert_eq!(err.message, "cannot index nil (`t`)");
}

#[test]
fn invalid_table_keys() {
    assert_eq!(err_kind("t = {} t[nil] = 1"), RuntimeErrorKind::Type);
    assert_eq!(err_kind("t = {[nil] = 1}"), RuntimeErrorKind::Type);
    assert_eq!(err_kind("n = 5 n.x = 1"), RuntimeErrorKind::Type);
}

#[test]
fn table_string_form_shows_identity() {
    assert!(run("print({})").starts_with("table: 0x"));
}

// ─── Loops ───────────────────────────────────────────────────────────────────

#[test]
fn numeric_for_ascending() {
    assert_eq!(run("for i = 1, 5 do print(i) end"), "1\n2\n3\n4\n5\n");
}

#[test]
fn numeric_for_descending() {
    assert_eq!(run("for i = 5, 1, -1 do print(i) end"), "5\n4\n3\n2\n1\n");
}

#[test]
fn numeric_for_can_run_zero_times() {
    assert_eq!(run("for i = 5, 1 do print(i) end"), "");
}

#[test]
fn numeric_for_float_step() {
    assert_eq!(run("for i = 0, 1, 0.5 do print(i) end"), "0\n0.5\n1.0\n");
}

#[test]
fn numeric_for_follows_assignments_to_control_variable() {
    assert_eq!(run("for i = 1, 6 do print(i) i = i + 2 end"), "1\n4\n");
    assert_eq!(run("for i = 1, 3 do print(i) i = 10 end"), "1\n");
}

#[test]
fn numeric_for_body_shares_one_frame() {
    let src = "
        for i = 1, 3 do
            if i > 1 then print(acc) end
            local acc = i
        end
        print(acc)
    ";
    assert_eq!(run(src), "1\n2\nnil\n");
}

#[test]
fn numeric_for_stops_at_integer_limit() {
    assert_eq!(
        run("for i = 9223372036854775806, 9223372036854775807 do print(i) end"),
        "9223372036854775806\n9223372036854775807\n",
    );
}

#[test]
fn numeric_for_rejects_bad_bounds() {
    assert_eq!(err_kind("for i = 1, 2, 0 do end"), RuntimeErrorKind::Arithmetic);
    assert_eq!(err_kind(r#"for i = "a", 2 do end"#), RuntimeErrorKind::Type);
}

#[test]
fn break_ends_only_the_innermost_loop() {
    let src = "
        i = 0
        while i < 3 do
            i = i + 1
            j = 0
            while true do
                j = j + 1
                if j == 2 then break end
            end
            print(i, j)
        end
    ";
    assert_eq!(run(src), "1\t2\n2\t2\n3\t2\n");
}

#[test]
fn repeat_condition_sees_body_locals() {
    assert_eq!(run("n = 0 repeat local m = n n = n + 1 until m >= 2 print(n)"), "3\n");
}

#[test]
fn break_inside_do_leaves_the_enclosing_loop() {
    let src = "
        for i = 1, 3 do
            do
                if i == 2 then break end
            end
            print(i)
        end
    ";
    assert_eq!(run(src), "1\n");
}

#[test]
fn do_block_scopes_locals() {
    assert_eq!(run("x = 1 do local x = 2 print(x) end print(x)"), "2\n1\n");
}

// ─── Functions ───────────────────────────────────────────────────────────────

#[test]
fn return_value_is_plain_value() {
    assert_eq!(run("function f() return 1 end print(f() + 1)"), "2\n");
}

#[test]
fn return_from_inside_loops() {
    let src = "
        function find(limit)
            for i = 1, limit do
                if i * i > 10 then return i end
            end
            return -1
        end
        print(find(10), find(3))
    ";
    assert_eq!(run(src), "4\t-1\n");
}

#[test]
fn function_without_return_yields_nil() {
    assert_eq!(run("function f() x = 1 end print(f())"), "nil\n");
}

#[test]
fn parameters_bind_positionally() {
    assert_eq!(run("function f(a, b) print(a, b) end f(1) f(1, 2, 3)"), "1\tnil\n1\t2\n");
}

#[test]
fn multiple_results_spread_into_calls() {
    let src = "
        function two() return 1, 2 end
        function add(a, b) return a + b end
        print(add(two()))
        print(two())
        x = (two())
        print(x, #two())
    ";
    assert_eq!(run(src), "3\n1\t2\n1\t2\n");
}

#[test]
fn length_requires_a_list() {
    assert_eq!(err_kind("t = {1, 2} print(#t)"), RuntimeErrorKind::Type);
}

#[test]
fn recursion() {
    let src = "
        function fib(n)
            if n < 2 then return n end
            return fib(n - 1) + fib(n - 2)
        end
        print(fib(15))
    ";
    assert_eq!(run(src), "610\n");
}

#[test]
fn recursion_limit() {
    let err = run_err_with(
        "function f(n) return f(n + 1) end f(1)",
        InterpreterConfig::new().with_max_call_depth(50),
        &[],
    );
    assert_eq!(err.kind, RuntimeErrorKind::Recursion);
}

#[test]
fn undefined_function_is_a_name_error() {
    let err = run_err("x = 1\ng(1)");
    assert_eq!(err.kind, RuntimeErrorKind::Name);
    assert_eq!((err.line, err.column), (2, 1));
}

#[test]
fn functions_exist_once_defined() {
    assert_eq!(err_kind("f() function f() end"), RuntimeErrorKind::Name);
    assert_eq!(run("function f() return 1 end function f() return 2 end print(f())"), "2\n");
}

#[test]
fn locals_shadow_globals() {
    let src = r#"
        x = "global"
        function f()
            local x = "local"
            print(x)
        end
        f()
        print(x)
    "#;
    assert_eq!(run(src), "local\nglobal\n");
}

#[test]
fn callee_cannot_see_caller_locals() {
    let src = "
        function inner() return y end
        function outer() local y = 5 return inner() end
        print(outer())
    ";
    assert_eq!(run(src), "nil\n");
}

#[test]
fn parameters_are_visible_inside_loops() {
    let src = "
        function count(n)
            local total = 0
            while n > 0 do
                total = total + n
                n = n - 1
            end
            return total
        end
        print(count(4), n)
    ";
    assert_eq!(run(src), "10\tnil\n");
}

// ─── Builtins ────────────────────────────────────────────────────────────────

#[test]
fn print_joins_with_tabs() {
    assert_eq!(run(r#"print() print("a", nil, true)"#), "\na\tnil\ttrue\n");
}

#[test]
fn read_lines_and_numbers() {
    let src = r#"
        a = io.read("*n")
        b = io.read("n")
        c = io.read()
        d = io.read()
        print(a + 1, b, c, d)
    "#;
    assert_eq!(run_with_input(src, &["42", "3.5", "hello"]), "43\t3.5\thello\tnil\n");
}

#[test]
fn read_statement_discards_the_line() {
    assert_eq!(run_with_input("io.read() print(io.read())", &["skip", "keep"]), "keep\n");
}

#[test]
fn read_non_numeric_line() {
    let err = run_err_with(r#"x = io.read("*number")"#, InterpreterConfig::default(), &["abc"]);
    assert_eq!(err.kind, RuntimeErrorKind::Format);
}

// ─── Programs ────────────────────────────────────────────────────────────────

#[test]
fn top_level_return_is_the_result() {
    assert_eq!(eval("return 1 + 1"), Value::Integer(2));
    assert!(matches!(eval(r#"x = 5 return x, "a""#), Value::List(v) if v.len() == 2));
    assert!(eval("x = 1").is_nil());
}

#[test]
fn each_execution_starts_fresh() {
    let mut interp = Interpreter::new(InterpreterConfig::default()).with_print_handler(buffer_handler());
    interp.execute(&chunk("x = 1 function f() end")).unwrap();
    assert_eq!(interp.scope().global("x"), Some(&Value::Integer(1)));
    assert!(interp.execute(&chunk("return x")).unwrap().is_nil());
    assert!(interp.scope().function("f").is_none());
}

#[test]
fn errors_report_position() {
    let err = run_err("x = 1\ny = nil + 1");
    assert_eq!(err.kind, RuntimeErrorKind::Type);
    assert_eq!(err.line, 2);
    assert!(err.to_string().starts_with("[TypeError] 2:"));
}

#[test]
fn syntax_errors_prevent_execution() {
    let errs = compile("print(1)\nbreak").unwrap_err();
    assert_eq!(errs[0].code, ErrorCode::P003);
    assert!(matches!(lunet_lang::run("x = "), Err(LunetError::Syntax(_))));
}
