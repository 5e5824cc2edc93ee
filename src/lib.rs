//! # Dispatchgen - Variadic Server Dispatch Helpers
//!
//! Dispatchgen writes the preprocessor header an RPC server includes to register
//! any number of remote functions with a single macro invocation, and offers the
//! same name-based dispatch natively in Rust.
//!
//! ## Features
//!
//! - **server**: Runtime dispatch table with plain, cached and aliased bindings
//! - **macros**: The `#[remote_fn]` registration attribute (implies `server`)
//! - **cli**: The `dispatch_gen` binary (`cargo run --features cli -- 30`)
//! - **full**: All features enabled
//!
//! ## Usage
//!
//! ### Generating the header
//! ```no_run
//! use dispatchgen::{generate_to_path, GeneratorConfig, Variant};
//! use std::path::Path;
//!
//! let config = GeneratorConfig::for_variant(Variant::Classic).with_max_arity(30);
//! generate_to_path(&config, Path::new("include/rpc_dispatch_helper.hpp")).unwrap();
//! ```
//!
//! ### Runtime dispatch
//! ```toml
//! [dependencies]
//! dispatchgen = { version = "0.1.0", features = ["macros"] }
//! ```
//!
//! When only the facade is a dependency, point the attribute at it:
//! ```ignore
//! #[dispatchgen::remote_fn(crate = "dispatchgen", alias = "Add")]
//! fn sum(a: i64, b: i64) -> i64 {
//!     a + b
//! }
//!
//! let table = dispatchgen::server::DispatchTable::from_registry()?;
//! ```

// Core types (always available)
pub use dispatchgen_types::*;

// Header generation
pub use dispatchgen_codegen::{
    generate, generate_to_path, verify, write_artifact, Artifact, ArtifactSummary, DispatchPlan,
};

pub mod codegen {
    pub use dispatchgen_codegen::*;
}

// Server functionality
#[cfg(feature = "server")]
pub mod server {
    pub use dispatchgen_server::*;
}

#[cfg(feature = "macros")]
pub use dispatchgen_macros::remote_fn;

// Re-export commonly used items at the root
pub use serde;
pub use serde_json;
pub use thiserror;

// Convenience re-exports for server
#[cfg(feature = "server")]
pub mod prelude {
    pub use crate::server::prelude::*;
}
