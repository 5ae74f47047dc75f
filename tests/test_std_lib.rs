//! Tests for the built-in library: Math, String, Number, Array, Object, JSON
//! and the error constructors.

use tryit::runner::ds::value::{JsNumberType, JsValue};
use tryit::runner::plugin::registry::{BuiltInRegistry, RegistryError};
use tryit::runner::plugin::types::EvalContext;
use tryit::sandbox::{ExecutionEngine, ExecutionResult, SandboxConfig};

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

// ============================================================================
// Registry
// ============================================================================

mod registry_tests {
    use super::*;

    fn call(object: &str, method: &str, args: Vec<JsValue>) -> JsValue {
        let registry = BuiltInRegistry::with_core();
        let func = registry.get_method(object, method).unwrap();
        let mut ctx = EvalContext::with_registry(registry);
        func(&mut ctx, JsValue::Undefined, args).unwrap()
    }

    #[test]
    fn test_core_objects_are_registered() {
        let registry = BuiltInRegistry::with_core();
        for name in ["console", "Math", "JSON", "Object", "Array", "String", "Number", "Boolean", "Promise", "Error", "TypeError"] {
            assert!(registry.has_object(name), "{} should be registered", name);
        }
        assert!(registry.get_function("setTimeout").is_some());
        assert!(registry.get_function("parseInt").is_some());
        assert!(registry.has_method("Math", "floor"));
        assert!(!registry.has_method("Math", "noSuchThing"));
    }

    #[test]
    fn test_math_abs_directly() {
        assert_eq!(
            call("Math", "abs", vec![JsValue::from_i64(-5)]),
            JsValue::Number(JsNumberType::Integer(5))
        );
    }

    #[test]
    fn test_unknown_lookups_are_errors() {
        let registry = BuiltInRegistry::with_core();
        assert!(matches!(registry.get_method("Math", "nope"), Err(RegistryError::UnknownMethod(..))));
        assert!(matches!(registry.get_method("Nope", "x"), Err(RegistryError::UnknownObject(..))));
    }

    #[test]
    fn test_math_max_of_nothing() {
        assert_eq!(call("Math", "max", vec![]), JsValue::Number(JsNumberType::NegativeInfinity));
    }
}

// ============================================================================
// Math
// ============================================================================

#[test]
fn test_math_functions() {
    assert_eq!(
        output("console.log(Math.floor(4.7), Math.ceil(4.2), Math.round(2.5), Math.round(-2.5), Math.trunc(-4.7))"),
        "4 5 3 -2 -4"
    );
    assert_eq!(output("console.log(Math.max(1, 5, 3), Math.min(1, 5, 3), Math.pow(2, 8), Math.sqrt(16))"), "5 1 256 4");
    assert_eq!(output("console.log(Math.abs(-3), Math.sign(-3), Math.PI > 3.14)"), "3 -1 true");
}

#[test]
fn test_math_random_range() {
    assert_eq!(
        output("let ok = true; for (let i = 0; i < 100; i++) { const r = Math.random(); if (r < 0 || r >= 1) ok = false; } console.log(ok);"),
        "true"
    );
}

// ============================================================================
// String
// ============================================================================

#[test]
fn test_string_case_and_search() {
    assert_eq!(
        output("const s = 'Hello World'; console.log(s.toUpperCase(), s.toLowerCase(), s.length)"),
        "HELLO WORLD hello world 11"
    );
    assert_eq!(
        output("const s = 'banana'; console.log(s.indexOf('an'), s.lastIndexOf('an'), s.includes('nan'), s.startsWith('ba'), s.endsWith('na'))"),
        "1 3 true true true"
    );
}

#[test]
fn test_string_slicing() {
    assert_eq!(
        output("const s = 'JavaScript'; console.log(s.slice(0, 4), s.slice(-6), s.substring(4), s.charAt(1), s.at(-1))"),
        "Java Script Script a t"
    );
}

#[test]
fn test_string_split_join_replace() {
    assert_eq!(output("console.log('a-b-c'.split('-').join('+'))"), "a+b+c");
    assert_eq!(output("console.log('abc'.split('').length)"), "3");
    assert_eq!(output("console.log('x.y.z'.replace('.', '/'), 'x.y.z'.replaceAll('.', '/'))"), "x/y.z x/y/z");
}

#[test]
fn test_string_padding_and_trim() {
    assert_eq!(output("console.log('5'.padStart(3, '0'), 'ab'.padEnd(4, '.') + '|', '  hi  '.trim() + '|')"), "005 ab..| hi|");
    assert_eq!(output("console.log('ab'.repeat(3))"), "ababab");
    assert_eq!(failure("'ab'.repeat(-1)"), "Invalid count value: -1");
    assert_eq!(failure("'ab'.padStart(1e12, '-')"), "Invalid string length");
}

#[test]
fn test_string_reverse_idiom() {
    assert_eq!(output("console.log('hello'.split('').reverse().join(''))"), "olleh");
}

// ============================================================================
// Number and globals
// ============================================================================

#[test]
fn test_number_formatting() {
    assert_eq!(output("console.log((3.14159).toFixed(2), (255).toString(16), (255).toString(2), (1.005).toFixed(0))"), "3.14 ff 11111111 1");
    assert_eq!(failure("(1).toString(1)"), "toString() radix must be between 2 and 36");
}

#[test]
fn test_number_predicates() {
    assert_eq!(
        output("console.log(Number.isInteger(5), Number.isInteger(5.5), Number.isNaN('x'), isNaN('x'), Number.isFinite(1 / 0))"),
        "true false false true false"
    );
}

#[test]
fn test_parsing_numbers() {
    assert_eq!(output("console.log(parseInt('42px'), parseInt('ff', 16), parseFloat('3.5e2abc'), Number('12'), Number(''), Number('x'))"), "42 255 350 12 0 NaN");
}

// ============================================================================
// Array
// ============================================================================

#[test]
fn test_array_mutators() {
    let code = r#"
        const a = [1, 2, 3];
        a.push(4, 5);
        const last = a.pop();
        const first = a.shift();
        a.unshift(0);
        console.log(a.join(','), last, first, a.length);
        const removed = a.splice(1, 2, 'x');
        console.log(a.join(','), removed.join(','));
    "#;
    assert_eq!(output(code), "0,2,3,4 5 1 4\n0,x,4 2,3");
}

#[test]
fn test_array_higher_order() {
    let code = r#"
        const nums = [1, 2, 3, 4];
        console.log(nums.map(n => n * 2).join(','));
        console.log(nums.filter(n => n % 2 === 0).join(','));
        console.log(nums.reduce((acc, n) => acc + n, 0), nums.reduce((acc, n) => acc * n));
        console.log(nums.find(n => n > 2), nums.findIndex(n => n > 2), nums.some(n => n > 3), nums.every(n => n > 0));
    "#;
    assert_eq!(output(code), "2,4,6,8\n2,4\n10 24\n3 2 true true");
}

#[test]
fn test_array_sort() {
    assert_eq!(output("console.log([10, 9, 1, 2].sort().join(','))"), "1,10,2,9");
    assert_eq!(output("console.log([10, 9, 1, 2].sort((a, b) => a - b).join(','))"), "1,2,9,10");
    assert_eq!(
        output("const people = [{n: 'b', a: 1}, {n: 'a', a: 1}, {n: 'c', a: 0}]; console.log(people.sort((x, y) => x.a - y.a).map(p => p.n).join(''))"),
        "cba"
    );
}

#[test]
fn test_array_rotation() {
    let code = r#"
        function rotate(nums, k) {
            k = k % nums.length;
            return [...nums.slice(-k), ...nums.slice(0, nums.length - k)];
        }
        console.log(rotate([1, 2, 3, 4, 5, 6, 7], 3));
    "#;
    assert_eq!(output(code), "[\n  5,\n  6,\n  7,\n  1,\n  2,\n  3,\n  4\n]");
}

#[test]
fn test_array_misc() {
    assert_eq!(
        output("console.log([1, [2, [3]]].flat(Infinity).join(','), [1, 2, 3].includes(2), [1, 2, 3].indexOf(5), Array.isArray([]), [0, 0].fill(7).join(''))"),
        "1,2,3 true -1 true 77"
    );
    assert_eq!(output("console.log(Array.from('abc').join('-'), Array.of(1, 2).length, new Array(3).length)"), "a-b-c 2 3");
    assert_eq!(output("console.log([1, 2, 3].reverse().concat([0]).join(''))"), "3210");
}

#[test]
fn test_array_errors() {
    assert_eq!(failure("[].reduce((a, b) => a + b)"), "Reduce of empty array with no initial value");
    assert_eq!(failure("new Array(-1)"), "Invalid array length");
}

#[test]
fn test_huge_arrays_are_refused() {
    assert_eq!(failure("new Array(4000000000)"), "Invalid array length");
    assert_eq!(failure("const a = []; a[4e9] = 1"), "Invalid array length");
    assert_eq!(failure("const a = [1, 2]; a.length = 4e9"), "Invalid array length");
    assert_eq!(failure("Array.from({ length: 4e9 })"), "Invalid array length");
    assert_eq!(
        output("const a = []; a[4] = 'x'; const b = new Array(5); b.length = 2; console.log(a.length, b.length)"),
        "5 2"
    );
    assert_eq!(
        output("try { new Array(4000000000) } catch (e) { console.log(e instanceof RangeError, e.message) }"),
        "true Invalid array length"
    );
}

// ============================================================================
// Object
// ============================================================================

#[test]
fn test_object_helpers() {
    let code = r#"
        const o = { a: 1, b: 2 };
        console.log(Object.keys(o).join(','), Object.values(o).join(','));
        console.log(Object.entries(o).map(([k, v]) => k + '=' + v).join('&'));
        const copy = Object.assign({}, o, { c: 3 });
        console.log(Object.keys(copy).length, o.hasOwnProperty('a'), o.hasOwnProperty('c'));
        console.log(Object.fromEntries([['x', 1]]).x);
    "#;
    assert_eq!(output(code), "a,b 1,2\na=1&b=2\n3 true false\n1");
}

#[test]
fn test_object_freeze() {
    let code = r#"
        const frozen = Object.freeze({ a: 1 });
        frozen.a = 2;
        frozen.b = 3;
        console.log(frozen.a, frozen.b, Object.isFrozen(frozen));
    "#;
    assert_eq!(output(code), "1 undefined true");
}

#[test]
fn test_object_create() {
    assert_eq!(output("const base = { hi() { return 'hi'; } }; const o = Object.create(base); console.log(o.hi())"), "hi");
}

// ============================================================================
// JSON
// ============================================================================

#[test]
fn test_json_stringify() {
    assert_eq!(output("console.log(JSON.stringify({ a: 1, b: [1, 'x'], c: null, d: undefined }))"), "{\"a\":1,\"b\":[1,\"x\"],\"c\":null}");
    assert_eq!(output("console.log(JSON.stringify('q\"'), JSON.stringify(undefined))"), "\"q\\\"\" undefined");
}

#[test]
fn test_json_parse() {
    assert_eq!(output("const v = JSON.parse('{\"a\": [1, 2], \"b\": {\"c\": true}}'); console.log(v.a[1], v.b.c)"), "2 true");
    assert!(failure("JSON.parse('{bad')").starts_with("Unexpected token"));
}

// ============================================================================
// Date
// ============================================================================

/// Runs with the clock pinned to 2024-01-20T00:00:00Z.
fn output_on_jan_20(code: &str) -> String {
    let config = SandboxConfig::default().with_start_time_ms(1_705_708_800_000.0);
    match ExecutionEngine::new(config).run(code) {
        ExecutionResult::Success { message, .. } => message,
        ExecutionResult::Failure { message } => panic!("{:?} failed with: {}", code, message),
    }
}

#[test]
fn test_date_fields() {
    let code = r#"
        const d = new Date('2024-01-20');
        console.log(d.getFullYear(), d.getMonth(), d.getDate(), d.getDay(), d.getHours());
        console.log(new Date(2024, 0, 15, 9, 30).toISOString());
        console.log(new Date(0).toISOString(), new Date(86400000).getUTCDate());
        console.log(new Date('2024-01-20T10:30:00Z').toString());
    "#;
    assert_eq!(
        output(code),
        "2024 0 20 6 0
2024-01-15T09:30:00.000Z
1970-01-01T00:00:00.000Z 2
Sat Jan 20 2024 10:30:00 GMT+0000 (Coordinated Universal Time)"
    );
}

#[test]
fn test_date_arithmetic_uses_time_value() {
    let code = r#"
        const oneDay = 24 * 60 * 60 * 1000;
        console.log((new Date('2024-01-15') - new Date('2024-01-01')) / oneDay);
        console.log(new Date('2024-01-02') > new Date('2024-01-01'), +new Date(5), new Date(7).valueOf());
        console.log(new Date('nonsense').getTime(), String(new Date('nonsense')));
    "#;
    assert_eq!(output(code), "14
true 5 7
NaN Invalid Date");
}

#[test]
fn test_date_locale_strings() {
    let code = r#"
        const d = new Date('2024-01-20T15:04:05Z');
        console.log(d.toLocaleDateString('en-US', { year: 'numeric', month: 'long', day: 'numeric' }));
        console.log(d.toLocaleDateString());
        console.log(d.toLocaleDateString('en-US', { weekday: 'long', month: 'short', day: 'numeric' }));
        console.log(d.toLocaleTimeString(), '|', d.toLocaleString());
    "#;
    assert_eq!(
        output(code),
        "January 20, 2024
1/20/2024
Saturday, Jan 20
3:04:05 PM | 1/20/2024, 3:04:05 PM"
    );
}

#[test]
fn test_date_setters_carry_over() {
    let code = r#"
        const d = new Date('2024-01-31');
        d.setMonth(1);
        console.log(d.toISOString());
        d.setFullYear(2025, 11, 31);
        d.setHours(23, 59, 59);
        console.log(d.toISOString(), d.setDate(32) === d.getTime(), d.getMonth());
    "#;
    assert_eq!(
        output(code),
        "2024-03-02T00:00:00.000Z
2025-12-31T23:59:59.000Z true 0"
    );
}

#[test]
fn test_date_now_follows_the_timer_clock() {
    let code = r#"
        console.log(Date.now(), new Date().toISOString());
        setTimeout(() => console.log(Date.now() - 1705708800000), 1500);
        console.log(typeof Date(), Date.parse('2024-01-20T00:00:01Z'));
    "#;
    assert_eq!(
        output_on_jan_20(code),
        "1705708800000 2024-01-20T00:00:00.000Z
string 1705708801000
1500"
    );
}

#[test]
fn test_dates_serialize_as_iso_strings() {
    assert_eq!(
        output("console.log(JSON.stringify({ at: new Date(0), bad: new Date(NaN) }))"),
        "{\"at\":\"1970-01-01T00:00:00.000Z\",\"bad\":null}"
    );
    assert_eq!(failure("new Date('x').toISOString()"), "Invalid time value");
    assert_eq!(failure("Date.prototype.getDay.call({})"), "this is not a Date object.");
}

// ============================================================================
// Errors, Boolean and Function
// ============================================================================

#[test]
fn test_error_objects() {
    let code = r#"
        const e = new TypeError('wrong type');
        console.log(e.name, e.message, e instanceof TypeError, e instanceof Error, e.toString());
        console.log(Error('no new').message);
    "#;
    assert_eq!(output(code), "TypeError wrong type true true TypeError: wrong type\nno new");
}

#[test]
fn test_boolean() {
    assert_eq!(output("console.log(Boolean(''), Boolean('x'), true.toString())"), "false true true");
}

#[test]
fn test_function_call_apply_bind() {
    let code = r#"
        function greet(greeting, mark) { return greeting + ', ' + this.name + mark; }
        const ann = { name: 'Ann' };
        console.log(greet.call(ann, 'Hi', '!'));
        console.log(greet.apply(ann, ['Hello', '?']));
        const bound = greet.bind(ann, 'Hey');
        console.log(bound('.'), bound.name);
    "#;
    assert_eq!(output(code), "Hi, Ann!\nHello, Ann?\nHey, Ann. bound greet");
}

#[test]
fn test_function_constructor_is_disabled() {
    assert_eq!(failure("new Function('return 1')"), "Code generation from strings disallowed for this context");
}
