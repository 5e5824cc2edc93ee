#![cfg(feature = "macros")]

use dispatchgen::remote_fn;
use dispatchgen::server::DispatchTable;
use serde_json::json;

#[remote_fn(crate = "dispatchgen", alias = "Add")]
fn sum(a: i64, b: i64) -> i64 {
    a + b
}

#[remote_fn(crate = "dispatchgen", cached)]
fn square(n: u64) -> u64 {
    n * n
}

#[test]
fn test_facade_registers_through_its_own_path() {
    let table = DispatchTable::from_registry().unwrap();
    assert_eq!(table.dispatch("sum", &[json!(40), json!(2)]).unwrap(), json!(42));
    assert_eq!(table.dispatch("Add", &[json!(1), json!(2)]).unwrap(), json!(3));

    assert_eq!(table.dispatch("square", &[json!(9)]).unwrap(), json!(81));
    assert_eq!(table.cached_results("square"), 1);

    let add = table
        .describe()
        .into_iter()
        .find(|d| d.name == "Add")
        .unwrap();
    assert_eq!(add.target, "sum");
}
