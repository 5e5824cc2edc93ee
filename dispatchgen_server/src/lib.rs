//! Dispatchgen Server - runtime dispatch of remote function calls by name
//!
//! The generated header resolves names with a compile-time chain of `if`
//! branches. This crate does the same job with an ordinary lookup table:
//! functions are bound under public names, a request names one of them, and
//! anything unbound falls through to a "not found" error.
//!
//! ```
//! use dispatchgen_server::prelude::*;
//! use serde_json::json;
//!
//! let mut table = DispatchTable::new();
//! table.attach("Sum", |a: i64, b: i64| a + b).unwrap();
//! table.alias("Add", "Sum").unwrap();
//!
//! let response = table.handle(Request::new("Add", vec![json!(1), json!(2)]));
//! assert_eq!(response.into_result().unwrap(), json!(3));
//! ```

pub use dispatchgen_types::*;

/// Re-export the attribute that registers functions for [`DispatchTable::from_registry`]
pub use dispatchgen_macros::remote_fn;

pub mod handler;
pub mod macros;
pub mod table;

pub use handler::RemoteFn;
pub use table::DispatchTable;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::{
        remote_fn, DispatchError, DispatchTable, ErrorKind, FunctionDescriptor, RemoteFn, Request,
        Response,
    };
}
