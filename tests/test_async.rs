//! Promises, async functions and timers. Everything a snippet schedules runs
//! before the run reports its result.

use tryit::sandbox::{ExecutionEngine, ExecutionResult};

fn output(code: &str) -> String {
    match ExecutionEngine::default().run(code) {
        ExecutionResult::Success { message, .. } => message,
        ExecutionResult::Failure { message } => panic!("{:?} failed with: {}", code, message),
    }
}

#[test]
fn test_microtasks_run_before_timers() {
    let code = r#"
        console.log('sync');
        setTimeout(() => console.log('timeout'), 0);
        Promise.resolve().then(() => console.log('microtask'));
        queueMicrotask(() => console.log('queued'));
        console.log('sync end');
    "#;
    assert_eq!(output(code), "sync\nsync end\nmicrotask\nqueued\ntimeout");
}

#[test]
fn test_timers_fire_in_due_order() {
    let code = r#"
        setTimeout(() => console.log('late'), 200);
        setTimeout(() => console.log('early'), 10);
        setTimeout(() => console.log('early too'), 10);
        setTimeout((a, b) => console.log(a + b), 50, 1, 2);
    "#;
    assert_eq!(output(code), "early\nearly too\n3\nlate");
}

#[test]
fn test_clear_timeout() {
    let code = r#"
        const id = setTimeout(() => console.log('never'), 10);
        clearTimeout(id);
        clearTimeout(12345);
        console.log('cleared');
    "#;
    assert_eq!(output(code), "cleared");
}

#[test]
fn test_interval_repeats_until_cleared() {
    let code = r#"
        let n = 0;
        const id = setInterval(() => {
            n++;
            console.log('tick', n);
            if (n === 3) clearInterval(id);
        }, 100);
        setTimeout(() => console.log('between'), 150);
    "#;
    assert_eq!(output(code), "tick 1\nbetween\ntick 2\ntick 3");
}

#[test]
fn test_uncleared_interval_stops_at_the_timer_budget() {
    let code = r#"
        let n = 0;
        setInterval(() => { n++; }, 1);
        setTimeout(() => console.log('still ran'), 5);
    "#;
    assert_eq!(output(code), "still ran");
}

#[test]
fn test_promise_chain() {
    let code = r#"
        new Promise(resolve => resolve(1))
            .then(v => v + 1)
            .then(v => { throw new Error('at ' + v); })
            .then(() => console.log('skipped'))
            .catch(e => { console.log(e.message); return 'recovered'; })
            .finally(() => console.log('finally'))
            .then(v => console.log(v));
    "#;
    assert_eq!(output(code), "at 2\nfinally\nrecovered");
}

#[test]
fn test_executor_throw_rejects() {
    let code = r#"
        new Promise(() => { throw new TypeError('inside'); })
            .catch(e => console.log(e.name, e.message));
    "#;
    assert_eq!(output(code), "TypeError inside");
}

#[test]
fn test_promise_all_and_race() {
    let code = r#"
        const slow = new Promise(r => setTimeout(() => r('slow'), 50));
        const fast = new Promise(r => setTimeout(() => r('fast'), 5));
        Promise.all([1, Promise.resolve(2), slow]).then(values => console.log(values.join(',')));
        Promise.race([slow, fast]).then(winner => console.log(winner));
        Promise.all([]).then(values => console.log('empty', values.length));
        Promise.all([Promise.reject(new Error('first')), slow]).catch(e => console.log(e.message));
    "#;
    assert_eq!(output(code), "empty 0\nfirst\nfast\n1,2,slow");
}

#[test]
fn test_async_await() {
    let code = r#"
        async function double(x) {
            const v = await Promise.resolve(x);
            console.log('got', v);
            return v * 2;
        }
        double(5).then(v => console.log('result', v));
    "#;
    assert_eq!(output(code), "got 5\nresult 10");
}

#[test]
fn test_await_timer() {
    let code = r#"
        const sleep = ms => new Promise(resolve => setTimeout(resolve, ms));
        async function main() {
            console.log('start');
            await sleep(100);
            console.log('after sleep');
        }
        main();
    "#;
    assert_eq!(output(code), "start\nafter sleep");
}

#[test]
fn test_await_rejection_in_try() {
    let code = r#"
        async function load() {
            try {
                await Promise.reject(new Error('nope'));
            } catch (e) {
                console.log('caught', e.message);
            }
        }
        load();
    "#;
    assert_eq!(output(code), "caught nope");
}

#[test]
fn test_async_arrow() {
    let code = r#"
        const add = async (a, b) => a + b;
        add(2, 3).then(v => console.log(v));
    "#;
    assert_eq!(output(code), "5");
}

#[test]
fn test_errors_in_callbacks_do_not_fail_the_run() {
    let code = r#"
        setTimeout(() => { throw new Error('late'); }, 0);
        async function broken() { throw new Error('async'); }
        broken();
        console.log('done');
    "#;
    assert_eq!(output(code), "done");
}

#[test]
fn test_unhandled_rejection_without_output() {
    let result = ExecutionEngine::default().run("Promise.reject(new Error('ignored'));");
    assert_eq!(result.message(), "Code executed successfully (no output)");
}

#[test]
fn test_callback_style() {
    let code = r#"
        function fetchData(callback) {
            setTimeout(() => callback({ id: 1, name: 'Item' }), 100);
        }
        fetchData(data => console.log('Received:', data.name));
        console.log('Waiting...');
    "#;
    assert_eq!(output(code), "Waiting...\nReceived: Item");
}

#[test]
fn test_async_call_returns_at_first_await() {
    let code = r#"
        async function f() {
            console.log(1);
            await null;
            console.log(3);
        }
        f();
        console.log(2);
    "#;
    assert_eq!(output(code), "1\n2\n3");
}

#[test]
fn test_concurrent_async_calls_interleave() {
    let code = r#"
        const sleep = ms => new Promise(resolve => setTimeout(resolve, ms));
        async function f(name, ms) {
            await sleep(ms);
            console.log(name);
        }
        f('slow', 100);
        f('fast', 10);
    "#;
    assert_eq!(output(code), "fast\nslow");
}

#[test]
fn test_await_inside_loops_keeps_loop_state() {
    let code = r#"
        const tick = v => new Promise(resolve => setTimeout(() => resolve(v), 5));
        async function run() {
            let total = 0;
            for (let i = 0; i < 3; i++) {
                total += await tick(i);
            }
            for (const word of ['a', 'b']) {
                console.log(word, await tick(word.toUpperCase()));
            }
            let n = 2;
            while (n > 0) {
                n = n - await tick(1);
            }
            return total + n;
        }
        run().then(v => console.log('total', v));
        console.log('started');
    "#;
    assert_eq!(output(code), "started\na A\nb B\ntotal 3");
}

#[test]
fn test_await_in_operands_evaluates_each_once() {
    let code = r#"
        let calls = 0;
        function count(v) { calls++; return v; }
        async function run() {
            const sum = count(1) + await Promise.resolve(2) + count(3);
            const list = [count('x'), await 'y', count('z')];
            const text = `${count('<')}${await '-'}${count('>')}`;
            console.log(sum, list.join(''), text, calls);
        }
        run();
    "#;
    assert_eq!(output(code), "6 xyz <-> 6");
}

#[test]
fn test_finally_runs_after_resumed_rejection() {
    let code = r#"
        async function task() {
            try {
                await new Promise((_, reject) => setTimeout(() => reject(new Error('boom')), 10));
                console.log('unreachable');
            } catch (e) {
                console.log('caught', e.message);
                await null;
                console.log('still in catch');
            } finally {
                console.log('cleanup');
            }
            return 'done';
        }
        task().then(v => console.log(v));
        console.log('waiting');
    "#;
    assert_eq!(output(code), "waiting\ncaught boom\nstill in catch\ncleanup\ndone");
}

#[test]
fn test_awaiting_another_async_function() {
    let code = r#"
        async function inner(x) {
            await null;
            return x * 10;
        }
        async function outer() {
            const a = await inner(1);
            const b = await inner(2);
            return a + b;
        }
        outer().then(v => console.log(v));
        console.log('first');
    "#;
    assert_eq!(output(code), "first\n30");
}

#[test]
fn test_rejected_async_function_after_await() {
    let code = r#"
        async function fail() {
            await null;
            throw new Error('late failure');
        }
        fail().catch(e => console.log('caught', e.message));
    "#;
    assert_eq!(output(code), "caught late failure");
}
