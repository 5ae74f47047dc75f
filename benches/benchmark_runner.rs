/// Benchmark runner for snippet execution.
///
/// Times the bare interpreter against a full sandboxed run (worker thread,
/// console capture and result formatting) for the same snippets.

extern crate tryit;

use std::time::{Duration, Instant};

use tryit::parser::JsParser;
use tryit::runner::api::run_source;
use tryit::runner::ds::value::JsValue;
use tryit::runner::plugin::registry::BuiltInRegistry;
use tryit::runner::plugin::types::EvalContext;
use tryit::sandbox::ExecutionEngine;

fn fresh_context() -> EvalContext {
    EvalContext::with_registry(BuiltInRegistry::with_core())
}

/// Time `iterations` interpreter runs, each in a fresh context.
fn run_benchmark(name: &str, code: &str, iterations: u32) -> Duration {
    if let Err(e) = JsParser::parse_to_ast_from_str(code) {
        panic!("Failed to parse benchmark {}: {}", name, e.message);
    }

    let start = Instant::now();
    for _ in 0..iterations {
        let mut ctx = fresh_context();
        let _ = run_source(code, &mut ctx);
    }
    start.elapsed()
}

/// Time `iterations` sandboxed runs through the execution engine.
fn run_benchmark_sandboxed(code: &str, iterations: u32) -> Duration {
    let engine = ExecutionEngine::default();
    let start = Instant::now();
    for _ in 0..iterations {
        let _ = engine.run(code);
    }
    start.elapsed()
}

fn run_and_get_var(code: &str, var_name: &str) -> JsValue {
    let mut ctx = fresh_context();
    let _ = run_source(code, &mut ctx);
    ctx.get_binding(var_name).unwrap_or(JsValue::Undefined)
}

// ============================================================================
// Benchmark definitions
// ============================================================================

const BENCH_FIBONACCI: &str = r#"
function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
var result = fib(15);
"#;

const BENCH_LOOP_SUM: &str = r#"
let sum = 0;
for (let i = 0; i < 10000; i++) {
    sum += i;
}
"#;

const BENCH_ARRAY_PIPELINE: &str = r#"
const nums = Array.from({ length: 500 }, (_, i) => i);
var total = nums.filter(n => n % 3 === 0).map(n => n * 2).reduce((a, n) => a + n, 0);
"#;

const BENCH_OBJECTS: &str = r#"
const people = [];
for (let i = 0; i < 200; i++) {
    people.push({ name: 'p' + i, age: i % 90 });
}
var adults = people.filter(p => p.age >= 18).length;
"#;

const BENCH_STRINGS: &str = r#"
let words = [];
for (let i = 0; i < 300; i++) {
    words.push(`item-${i}`.toUpperCase());
}
var joined = words.join(',').split(',').length;
"#;

const BENCH_CONSOLE: &str = r#"
for (let i = 0; i < 200; i++) {
    console.log('line', i, { i });
}
"#;

const BENCH_PROMISES: &str = r#"
var settled = 0;
for (let i = 0; i < 100; i++) {
    Promise.resolve(i).then(v => v + 1).then(() => { settled++; });
}
"#;

const BENCH_TIMERS: &str = r#"
var fired = 0;
for (let i = 0; i < 100; i++) {
    setTimeout(() => { fired++; }, i % 10);
}
"#;

const BENCH_PRIME_SIEVE: &str = r#"
var count = 0;
for (var n = 2; n < 100; n = n + 1) {
    var isPrime = true;
    for (var i = 2; i * i <= n; i = i + 1) {
        if (n % i === 0) {
            isPrime = false;
            break;
        }
    }
    if (isPrime) {
        count = count + 1;
    }
}
"#;

fn main() {
    println!("=======================================================");
    println!("  Try It Snippet Runner - Performance Benchmarks");
    println!("  Interpreter vs Sandboxed Engine");
    println!("=======================================================\n");

    let benchmarks: Vec<(&str, &str, u32)> = vec![
        ("Fibonacci (n=15)", BENCH_FIBONACCI, 20),
        ("Loop Sum (10K iterations)", BENCH_LOOP_SUM, 20),
        ("Array Pipeline (500)", BENCH_ARRAY_PIPELINE, 50),
        ("Objects (200)", BENCH_OBJECTS, 50),
        ("Strings (300)", BENCH_STRINGS, 50),
        ("Console Output (200)", BENCH_CONSOLE, 50),
        ("Promise Chains (100)", BENCH_PROMISES, 50),
        ("Timers (100)", BENCH_TIMERS, 50),
        ("Prime Sieve (<100)", BENCH_PRIME_SIEVE, 50),
    ];

    println!("{:<30} {:>14} {:>14} {:>10}", "Benchmark", "Interpreter", "Sandboxed", "Overhead");
    println!("{}", "-".repeat(70));

    let mut total_interp = Duration::ZERO;
    let mut total_sandboxed = Duration::ZERO;

    for (name, code, iterations) in &benchmarks {
        let interp_dur = run_benchmark(name, code, *iterations);
        let sandboxed_dur = run_benchmark_sandboxed(code, *iterations);
        total_interp += interp_dur;
        total_sandboxed += sandboxed_dur;

        let overhead = sandboxed_dur.as_secs_f64() / interp_dur.as_secs_f64();
        println!(
            "{:<30} {:>12.2?} {:>12.2?} {:>9.2}x",
            name, interp_dur, sandboxed_dur, overhead
        );
    }

    println!("{}", "-".repeat(70));
    let total_overhead = total_sandboxed.as_secs_f64() / total_interp.as_secs_f64();
    println!(
        "{:<30} {:>12.2?} {:>12.2?} {:>9.2}x",
        "TOTAL", total_interp, total_sandboxed, total_overhead
    );

    println!("\n=======================================================");
    println!("  Correctness Verification");
    println!("=======================================================\n");

    let verifications: Vec<(&str, &str, &str, i64)> = vec![
        ("Fibonacci", BENCH_FIBONACCI, "result", 610),
        ("Array Pipeline", BENCH_ARRAY_PIPELINE, "total", 83166),
        ("Objects", BENCH_OBJECTS, "adults", 146),
        ("Strings", BENCH_STRINGS, "joined", 300),
        ("Promise Chains", BENCH_PROMISES, "settled", 100),
        ("Timers", BENCH_TIMERS, "fired", 100),
        ("Prime Count", BENCH_PRIME_SIEVE, "count", 25),
    ];

    println!("{:<20} {:>12} {:>12}", "Test", "Expected", "Actual");
    println!("{}", "-".repeat(46));

    for (name, code, var, expected) in verifications {
        let actual = run_and_get_var(code, var);
        let status = if actual == JsValue::from_i64(expected) { "✓" } else { "✗" };
        println!("{:<20} {:>12} {:>4} {:>7}", name, expected, status, actual);
    }
}
