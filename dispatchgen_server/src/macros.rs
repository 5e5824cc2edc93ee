//! Variadic registration with native `macro_rules!` repetition.
//!
//! Each macro takes the table (any place expression of type
//! [`DispatchTable`](crate::DispatchTable)) followed by function identifiers,
//! binds them in order and stops at the first failure.

/// Bind each function under its own identifier.
///
/// ```
/// use dispatchgen_server::{attach_funcs, DispatchTable};
///
/// fn sum(a: i64, b: i64) -> i64 { a + b }
/// fn neg(a: i64) -> i64 { -a }
///
/// let mut table = DispatchTable::new();
/// attach_funcs!(table, sum, neg).unwrap();
/// assert!(table.contains("sum") && table.contains("neg"));
/// ```
#[macro_export]
macro_rules! attach_funcs {
    ($table:expr, $($func:ident),+ $(,)?) => {{
        let table: &mut $crate::DispatchTable = &mut $table;
        let mut result = ::std::result::Result::Ok(());
        $(
            if result.is_ok() {
                result = table.attach(stringify!($func), $func);
            }
        )+
        result
    }};
}

#[macro_export]
macro_rules! attach_cached_funcs {
    ($table:expr, $($func:ident),+ $(,)?) => {{
        let table: &mut $crate::DispatchTable = &mut $table;
        let mut result = ::std::result::Result::Ok(());
        $(
            if result.is_ok() {
                result = table.attach_cached(stringify!($func), $func);
            }
        )+
        result
    }};
}

/// Bind one function under several public names, none of which is its own.
/// The names share one binding, so a cached function keeps a single cache.
#[macro_export]
macro_rules! multi_alias_func {
    ($table:expr, $func:ident, $($alias:expr),+ $(,)?) => {{
        let table: &mut $crate::DispatchTable = &mut $table;
        table.attach_aliased(stringify!($func), &[$($alias),+], $func, false)
    }};
}

#[macro_export]
macro_rules! multi_alias_cached_func {
    ($table:expr, $func:ident, $($alias:expr),+ $(,)?) => {{
        let table: &mut $crate::DispatchTable = &mut $table;
        table.attach_aliased(stringify!($func), &[$($alias),+], $func, true)
    }};
}

/// Bind `(function => alias)` pairs
#[macro_export]
macro_rules! alias_funcs {
    ($table:expr, $($func:ident => $alias:expr),+ $(,)?) => {{
        let table: &mut $crate::DispatchTable = &mut $table;
        let mut result = ::std::result::Result::Ok(());
        $(
            if result.is_ok() {
                result = table.attach_aliased(stringify!($func), &[$alias], $func, false);
            }
        )+
        result
    }};
}

#[cfg(test)]
mod tests {
    use crate::DispatchTable;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sum(a: i64, b: i64) -> i64 {
        a + b
    }

    fn mul(a: i64, b: i64) -> i64 {
        a * b
    }

    #[test]
    fn test_attach_funcs_binds_every_name() {
        let mut table = DispatchTable::new();
        attach_funcs!(table, sum, mul).unwrap();
        assert_eq!(table.dispatch("mul", &[json!(6), json!(7)]).unwrap(), json!(42));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_attach_stops_at_first_failure() {
        let mut table = DispatchTable::new();
        let err = attach_cached_funcs!(table, sum, sum, mul).unwrap_err();
        assert!(err.to_string().contains("sum"));
        assert!(!table.contains("mul"));
    }

    #[test]
    fn test_multi_alias_binds_aliases_only() {
        let mut table = DispatchTable::new();
        multi_alias_func!(table, sum, "Add", "Plus").unwrap();
        assert!(table.contains("Add") && table.contains("Plus"));
        assert!(!table.contains("sum"));

        multi_alias_cached_func!(table, mul, "Times").unwrap();
        assert!(table.describe().iter().any(|d| d.name == "Times" && d.cached));
    }

    #[test]
    fn test_multi_alias_reports_function_as_target() {
        let mut table = DispatchTable::new();
        multi_alias_func!(table, sum, "Add", "Plus").unwrap();
        let targets: Vec<(String, String)> = table
            .describe()
            .into_iter()
            .map(|d| (d.name, d.target))
            .collect();
        assert_eq!(
            targets,
            vec![
                ("Add".to_string(), "sum".to_string()),
                ("Plus".to_string(), "sum".to_string()),
            ]
        );
    }

    #[test]
    fn test_multi_alias_cached_keeps_one_cache() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn sq(n: u64) -> u64 {
            CALLS.fetch_add(1, Ordering::SeqCst);
            n * n
        }

        let mut table = DispatchTable::new();
        multi_alias_cached_func!(table, sq, "Square", "Sq").unwrap();
        table.dispatch("Square", &[json!(7)]).unwrap();
        table.dispatch("Sq", &[json!(7)]).unwrap();

        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(table.cached_results("Square"), 1);
        assert_eq!(table.cached_results("Sq"), 1);
    }

    #[test]
    fn test_alias_pairs() {
        let mut table = DispatchTable::new();
        alias_funcs!(table, sum => "Add", mul => "Times").unwrap();
        assert_eq!(table.dispatch("Times", &[json!(2), json!(3)]).unwrap(), json!(6));
        let times = table
            .describe()
            .into_iter()
            .find(|d| d.name == "Times")
            .unwrap();
        assert_eq!(times.target, "mul");
    }
}
