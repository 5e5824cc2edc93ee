use std::sync::atomic::{AtomicUsize, Ordering};

use dispatchgen_server::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[remote_fn]
fn sum(a: i64, b: i64) -> i64 {
    a + b
}

#[remote_fn(alias = "Hello", alias = "Hi")]
fn greet(name: String) -> String {
    format!("Hello, {}!", name)
}

#[remote_fn]
fn translate(p: Point, dx: i32, dy: i32) -> Point {
    Point {
        x: p.x + dx,
        y: p.y + dy,
    }
}

static FIB_CALLS: AtomicUsize = AtomicUsize::new(0);

#[remote_fn(cached, alias = "Fib")]
fn fibonacci(n: u64) -> u64 {
    FIB_CALLS.fetch_add(1, Ordering::SeqCst);
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        let next = a + b;
        a = b;
        b = next;
    }
    a
}

#[remote_fn]
fn ping() {}

#[test]
fn test_registry_binds_every_function_and_alias() {
    let table = DispatchTable::from_registry().unwrap();
    let names: Vec<String> = table.describe().into_iter().map(|d| d.name).collect();
    for expected in [
        "Fib", "Hello", "Hi", "fibonacci", "greet", "ping", "sum", "translate",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
}

#[test]
fn test_registered_function_is_callable() {
    let table = DispatchTable::from_registry().unwrap();
    assert_eq!(table.dispatch("sum", &[json!(20), json!(22)]).unwrap(), json!(42));
    assert_eq!(table.dispatch("Hi", &[json!("Bo")]).unwrap(), json!("Hello, Bo!"));
    assert_eq!(table.dispatch("ping", &[]).unwrap(), serde_json::Value::Null);

    let moved = table
        .dispatch("translate", &[json!({"x": 1, "y": 2}), json!(3), json!(-2)])
        .unwrap();
    assert_eq!(
        serde_json::from_value::<Point>(moved).unwrap(),
        Point { x: 4, y: 0 }
    );
}

#[test]
fn test_registered_descriptor_metadata() {
    let table = DispatchTable::from_registry().unwrap();
    let fib = table
        .describe()
        .into_iter()
        .find(|d| d.name == "Fib")
        .unwrap();
    assert_eq!(
        fib,
        FunctionDescriptor {
            name: "Fib".to_string(),
            target: "fibonacci".to_string(),
            arity: 1,
            cached: true,
        }
    );
}

#[test]
fn test_cached_registration_shares_cache_with_alias() {
    let table = DispatchTable::from_registry().unwrap();
    let before = FIB_CALLS.load(Ordering::SeqCst);
    assert_eq!(table.dispatch("fibonacci", &[json!(90)]).unwrap(), json!(2880067194370816120u64));
    assert_eq!(table.dispatch("Fib", &[json!(90)]).unwrap(), json!(2880067194370816120u64));
    assert_eq!(FIB_CALLS.load(Ordering::SeqCst), before + 1);
}

#[test]
fn test_wire_errors() {
    let table = DispatchTable::from_registry().unwrap();

    let missing = table.handle(Request::new("product", vec![json!(1)]));
    let err = missing.into_result().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FunctionMissing);
    assert_eq!(err.to_string(), "RPC error: Called function: \"product\" not found!");

    let wrong_arity = table.handle(Request::new("sum", vec![json!(1)]));
    assert_eq!(
        wrong_arity.into_result().unwrap_err().kind(),
        ErrorKind::SignatureMismatch
    );

    let reply = table.handle_bytes(br#"{"func_name": "greet", "args": [7]}"#);
    let response: Response = serde_json::from_slice(&reply).unwrap();
    assert_eq!(
        response.into_result().unwrap_err().kind(),
        ErrorKind::Deserialization
    );
}
