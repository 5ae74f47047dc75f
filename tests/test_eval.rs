//! Language semantics of the interpreter, observed through captured output.

use tryit::runner::api::run_source;
use tryit::runner::ds::value::{JsNumberType, JsValue};
use tryit::runner::plugin::registry::BuiltInRegistry;
use tryit::runner::plugin::types::EvalContext;
use tryit::sandbox::{ExecutionEngine, ExecutionResult};

fn output(code: &str) -> String {
    match ExecutionEngine::default().run(code) {
        ExecutionResult::Success { message, .. } => message,
        ExecutionResult::Failure { message } => panic!("{:?} failed with: {}", code, message),
    }
}

fn failure(code: &str) -> String {
    match ExecutionEngine::default().run(code) {
        ExecutionResult::Failure { message } => message,
        ExecutionResult::Success { message, .. } => panic!("{:?} succeeded with: {}", code, message),
    }
}

fn completion_value(code: &str) -> JsValue {
    let mut ctx = EvalContext::with_registry(BuiltInRegistry::with_core());
    run_source(code, &mut ctx).unwrap()
}

#[test]
fn test_completion_value() {
    assert_eq!(completion_value("1 + 2;"), JsValue::Number(JsNumberType::Integer(3)));
    assert_eq!(completion_value("'a' + 'b'"), JsValue::String("ab".to_string()));
    assert_eq!(completion_value("var x = 1;"), JsValue::Undefined);
}

#[test]
fn test_globals_persist_in_a_context() {
    let mut ctx = EvalContext::with_registry(BuiltInRegistry::with_core());
    run_source("var total = 40; let extra = 2;", &mut ctx).unwrap();
    assert_eq!(ctx.get_binding("total"), Some(JsValue::from_i64(40)));
    assert_eq!(run_source("total + extra", &mut ctx).unwrap(), JsValue::from_i64(42));
}

#[test]
fn test_arithmetic_and_number_printing() {
    assert_eq!(output("console.log(7 % 3, 2 ** 10, 5 / 2)"), "1 1024 2.5");
    assert_eq!(output("console.log(0.1 + 0.2)"), "0.30000000000000004");
    assert_eq!(output("console.log(1 / 0, -1 / 0, 0 / 0)"), "Infinity -Infinity NaN");
    assert_eq!(output("console.log(1e21, 123e-7)"), "1e+21 0.0000123");
    assert_eq!(output("console.log(-7 >> 1, 5 & 3, 5 | 3, 5 ^ 3, ~5)"), "-4 1 7 6 -6");
}

#[test]
fn test_coercion() {
    assert_eq!(output("console.log('5' + 3, '5' * 2, '5' - 2)"), "53 10 3");
    assert_eq!(output("console.log(null == undefined, '1' == 1, '1' === 1, NaN === NaN)"), "true true false false");
    assert_eq!(output("console.log(!!'', !!'0', !!0, !![])"), "false true false true");
}

#[test]
fn test_typeof() {
    assert_eq!(
        output("console.log(typeof 1, typeof 'a', typeof null, typeof undefined, typeof {}, typeof [], typeof function(){})"),
        "number string object undefined object object function"
    );
    assert_eq!(output("console.log(typeof notDeclared)"), "undefined");
}

#[test]
fn test_let_and_const_scoping() {
    assert_eq!(output("let a = 1; { let a = 2; console.log(a); } console.log(a);"), "2\n1");
    assert_eq!(failure("console.log(b); let b = 1;"), "Cannot access 'b' before initialization");
    assert_eq!(output("console.log(v); var v = 3;"), "undefined");
}

#[test]
fn test_closures() {
    let code = r#"
        function makeCounter() {
            let count = 0;
            return function () {
                count++;
                return count;
            };
        }
        const next = makeCounter();
        next();
        next();
        console.log(next());
    "#;
    assert_eq!(output(code), "3");
}

#[test]
fn test_loop_closures_capture_each_iteration() {
    let code = r#"
        const fns = [];
        for (let i = 0; i < 3; i++) {
            fns.push(() => i);
        }
        console.log(fns.map(f => f()).join(','));
    "#;
    assert_eq!(output(code), "0,1,2");
}

#[test]
fn test_function_hoisting() {
    assert_eq!(output("console.log(square(4)); function square(n) { return n * n; }"), "16");
}

#[test]
fn test_default_and_rest_parameters() {
    let code = r#"
        function greet(name = 'World', ...rest) {
            return 'Hello, ' + name + '! ' + rest.length;
        }
        console.log(greet());
        console.log(greet('Ann', 1, 2));
    "#;
    assert_eq!(output(code), "Hello, World! 0\nHello, Ann! 2");
}

#[test]
fn test_arrow_this_is_lexical() {
    let code = r#"
        const counter = {
            count: 10,
            increment() {
                const add = () => { this.count += 1; };
                add();
                return this.count;
            }
        };
        console.log(counter.increment());
    "#;
    assert_eq!(output(code), "11");
}

#[test]
fn test_destructuring() {
    let code = r#"
        const { name, age = 30, ...others } = { name: 'Ann', city: 'Oslo', zip: 1 };
        const [first, , third = 'c', ...tail] = ['a', 'b', undefined, 'd', 'e'];
        console.log(name, age, Object.keys(others).join('+'));
        console.log(first, third, tail.length);
        let x = 1, y = 2;
        [x, y] = [y, x];
        console.log(x, y);
    "#;
    assert_eq!(output(code), "Ann 30 city+zip\na c 2\n2 1");
}

#[test]
fn test_spread() {
    let code = r#"
        const nums = [1, 2, 3];
        console.log(Math.max(...nums), [...nums, 4].length);
        const merged = { ...{ a: 1 }, b: 2 };
        console.log(merged.a + merged.b);
    "#;
    assert_eq!(output(code), "3 4\n3");
}

#[test]
fn test_template_literals() {
    assert_eq!(output("const n = 'x'; console.log(`hi ${n}, ${1 + 1}!`)"), "hi x, 2!");
}

#[test]
fn test_control_flow() {
    let code = r#"
        let out = [];
        for (let i = 0; i < 10; i++) {
            if (i % 2 === 0) continue;
            if (i > 7) break;
            out.push(i);
        }
        let n = 0;
        while (n < 3) n++;
        do { n += 10; } while (n < 20);
        console.log(out.join(','), n);
    "#;
    assert_eq!(output(code), "1,3,5,7 23");
}

#[test]
fn test_switch_fallthrough() {
    let code = r#"
        function kind(x) {
            switch (x) {
                case 1:
                case 2:
                    return 'small';
                case 3:
                    return 'three';
                default:
                    return 'other';
            }
        }
        console.log(kind(2), kind(3), kind(9));
    "#;
    assert_eq!(output(code), "small three other");
}

#[test]
fn test_for_in_and_for_of() {
    let code = r#"
        const keys = [];
        for (const k in { a: 1, b: 2 }) keys.push(k);
        let sum = 0;
        for (const v of [1, 2, 3]) sum += v;
        let letters = '';
        for (const ch of 'abc') letters = ch + letters;
        console.log(keys.join(''), sum, letters);
    "#;
    assert_eq!(output(code), "ab 6 cba");
}

#[test]
fn test_try_catch_finally() {
    let code = r#"
        function risky() {
            try {
                null.x;
            } catch (e) {
                console.log(e instanceof TypeError, e.name);
                return 'caught';
            } finally {
                console.log('finally');
            }
        }
        console.log(risky());
    "#;
    assert_eq!(output(code), "true TypeError\nfinally\ncaught");
}

#[test]
fn test_catch_user_error() {
    let code = r#"
        try {
            throw new Error('custom');
        } catch (err) {
            console.log(err.message, err instanceof Error);
        }
    "#;
    assert_eq!(output(code), "custom true");
}

#[test]
fn test_optional_chaining_and_nullish() {
    let code = r#"
        const user = { profile: null, tags: ['a'] };
        console.log(user.profile?.name, user.tags?.[0], user.missing?.());
        console.log(user.profile ?? 'none', 0 ?? 1, 0 || 1);
    "#;
    assert_eq!(output(code), "undefined a undefined\nnone 0 1");
}

#[test]
fn test_logical_assignment() {
    assert_eq!(output("let a = null; a ??= 5; let b = 1; b &&= 7; let c = 0; c ||= 9; console.log(a, b, c);"), "5 7 9");
}

#[test]
fn test_new_with_function_constructor() {
    let code = r#"
        function Point(x, y) {
            this.x = x;
            this.y = y;
        }
        Point.prototype.sum = function () { return this.x + this.y; };
        const p = new Point(2, 3);
        console.log(p.sum(), p instanceof Point);
    "#;
    assert_eq!(output(code), "5 true");
}

#[test]
fn test_in_and_delete() {
    assert_eq!(output("const o = { a: 1 }; delete o.a; console.log('a' in o, 'toString' in o);"), "false true");
}

#[test]
fn test_calling_a_non_function() {
    assert_eq!(failure("const o = {}; o.run();"), "o.run is not a function");
}

#[test]
fn test_recursion() {
    let code = r#"
        function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
        console.log(fib(15));
    "#;
    assert_eq!(output(code), "610");
}

#[test]
fn test_top_level_return_is_rejected() {
    assert_eq!(failure("return 1;"), "Illegal return statement");
}

#[test]
fn test_early_errors_stop_the_whole_snippet() {
    // Nothing is printed: the error is found before the first statement runs.
    assert_eq!(failure("console.log(1); let a = 1; let a = 2;"), "Identifier 'a' has already been declared");
    assert_eq!(failure("console.log(1); let a; var a;"), "Identifier 'a' has already been declared");
    assert_eq!(failure("if (false) return; console.log(1)"), "Illegal return statement");
    assert_eq!(failure("console.log(1); if (false) break;"), "Illegal break statement");
    assert_eq!(
        failure("function f() { continue; } console.log(1)"),
        "Illegal continue statement: no surrounding iteration statement"
    );
}
