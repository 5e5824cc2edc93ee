//! Shared types for the dispatchgen toolkit.
//!
//! This crate provides the configuration, error and wire types used by both the
//! macro ladder generator (`dispatchgen_codegen`) and the runtime dispatch table
//! (`dispatchgen_server`).

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub use inventory;
pub use serde_json;

/// Where the generated header lands when the caller does not say otherwise
pub const DEFAULT_OUTPUT_PATH: &str = "include/rpc_dispatch_helper.hpp";

/// Prefix shared by every generated macro name except `EXPAND`
pub const DEFAULT_PREFIX: &str = "RPC_";

/// Largest accepted maximum arity. The arity counter alone takes `N + 2`
/// named parameters, far past what any preprocessor is tested with.
pub const MAX_ARITY_LIMIT: usize = 4096;

/// One generation of the dispatch helper header.
///
/// Generations share the ladder/selector machinery and differ only in what the
/// dispatch branch does and which optional sections are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Single-argument ladder only, `this->dispatch_func` branches
    Legacy,
    /// Adds the alias ladder, include guards and the header-function helper
    #[default]
    Classic,
    /// Branches call `dispatch_func<Serial>` and the default dispatch defines the whole routine
    Templated,
    /// Callback-style dispatch over `rpc_obj`, pair ladder advances both arguments
    Callback,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Legacy,
        Variant::Classic,
        Variant::Templated,
        Variant::Callback,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Variant::Legacy => "legacy",
            Variant::Classic => "classic",
            Variant::Templated => "templated",
            Variant::Callback => "callback",
        }
    }

    /// Maximum arity used when the caller does not supply one
    pub fn default_max_arity(self) -> usize {
        match self {
            Variant::Legacy | Variant::Classic => 20,
            Variant::Templated | Variant::Callback => 50,
        }
    }

    /// Pair policy of the dual-argument ladder, `None` when the generation has no such ladder
    pub fn default_pair_policy(self) -> Option<PairPolicy> {
        match self {
            Variant::Legacy => None,
            Variant::Classic | Variant::Templated => Some(PairPolicy::HoldFirst),
            Variant::Callback => Some(PairPolicy::AdvanceBoth),
        }
    }

    pub fn has_pair_ladder(self) -> bool {
        self.default_pair_policy().is_some()
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How each level of the dual-argument ladder recurses after consuming `(X, Y)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairPolicy {
    /// Keep `X` and recurse one level down: every alias is paired with the same function
    HoldFirst,
    /// Drop both and recurse two levels down: arguments are `(function, alias)` pairs
    AdvanceBoth,
}

impl PairPolicy {
    /// Number of ladder levels one expansion step descends
    pub fn step(self) -> usize {
        match self {
            PairPolicy::HoldFirst => 1,
            PairPolicy::AdvanceBoth => 2,
        }
    }
}

/// Inputs of one generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub max_arity: usize,
    pub variant: Variant,
    /// Overrides the variant's pair policy; ignored by variants without a pair ladder
    #[serde(default)]
    pub pair_policy: Option<PairPolicy>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl GeneratorConfig {
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            max_arity: variant.default_max_arity(),
            variant,
            pair_policy: None,
            prefix: default_prefix(),
        }
    }

    pub fn with_max_arity(mut self, max_arity: usize) -> Self {
        self.max_arity = max_arity;
        self
    }

    pub fn with_pair_policy(mut self, policy: PairPolicy) -> Self {
        self.pair_policy = Some(policy);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Reject settings no header can be generated from
    pub fn validate(&self) -> Result<(), GenerateError> {
        check_max_arity(self.max_arity)
    }

    /// Pair policy actually used for generation
    pub fn effective_pair_policy(&self) -> Option<PairPolicy> {
        self.variant
            .default_pair_policy()
            .map(|default| self.pair_policy.unwrap_or(default))
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::for_variant(Variant::default())
    }
}

/// Parse a user supplied maximum arity
pub fn parse_max_arity(raw: &str) -> Result<usize, GenerateError> {
    let max_arity = raw
        .trim()
        .parse::<usize>()
        .map_err(|e| GenerateError::InvalidArity(format!("{:?} is not a non-negative integer ({})", raw, e)))?;
    check_max_arity(max_arity)?;
    Ok(max_arity)
}

fn check_max_arity(max_arity: usize) -> Result<(), GenerateError> {
    if max_arity > MAX_ARITY_LIMIT {
        return Err(GenerateError::InvalidArity(format!(
            "{} is above the supported limit of {}",
            max_arity, MAX_ARITY_LIMIT
        )));
    }
    Ok(())
}

/// Error types for header generation
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Invalid max arity: {0}")]
    InvalidArity(String),
    #[error("Invalid macro prefix: {0}")]
    InvalidPrefix(String),
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Generated header is malformed: {0}")]
    Structure(String),
    #[error("Macro invocation needs arity {requested} but the header supports at most {max_arity}")]
    ArityExceeded { requested: usize, max_arity: usize },
    #[error("{macro_name} is not generated by the {variant} variant")]
    UnsupportedMacro { macro_name: String, variant: Variant },
}

/// Category of a dispatch failure as sent on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FunctionMissing,
    FunctionBind,
    SignatureMismatch,
    Serialization,
    Deserialization,
    ServerReceive,
}

/// Error types for runtime dispatch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{0}")]
    FunctionMissing(String),
    #[error("{0}")]
    FunctionBind(String),
    #[error("{0}")]
    SignatureMismatch(String),
    #[error("{0}")]
    Serialization(String),
    #[error("{0}")]
    Deserialization(String),
    #[error("{0}")]
    ServerReceive(String),
}

impl DispatchError {
    pub fn function_missing(func_name: &str) -> Self {
        Self::FunctionMissing(format!(
            "RPC error: Called function: \"{}\" not found!",
            func_name
        ))
    }

    pub fn function_bind(func_name: &str, reason: &str) -> Self {
        Self::FunctionBind(format!(
            "RPC error: server could not bind function: {}() ({})",
            func_name, reason
        ))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::FunctionMissing(_) => ErrorKind::FunctionMissing,
            DispatchError::FunctionBind(_) => ErrorKind::FunctionBind,
            DispatchError::SignatureMismatch(_) => ErrorKind::SignatureMismatch,
            DispatchError::Serialization(_) => ErrorKind::Serialization,
            DispatchError::Deserialization(_) => ErrorKind::Deserialization,
            DispatchError::ServerReceive(_) => ErrorKind::ServerReceive,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DispatchError::FunctionMissing(m)
            | DispatchError::FunctionBind(m)
            | DispatchError::SignatureMismatch(m)
            | DispatchError::Serialization(m)
            | DispatchError::Deserialization(m)
            | DispatchError::ServerReceive(m) => m,
        }
    }

    /// Rebuild an error received on the wire
    pub fn from_parts(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::FunctionMissing => DispatchError::FunctionMissing(message),
            ErrorKind::FunctionBind => DispatchError::FunctionBind(message),
            ErrorKind::SignatureMismatch => DispatchError::SignatureMismatch(message),
            ErrorKind::Serialization => DispatchError::Serialization(message),
            ErrorKind::Deserialization => DispatchError::Deserialization(message),
            ErrorKind::ServerReceive => DispatchError::ServerReceive(message),
        }
    }
}

/// A call by name with positional JSON arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub func_name: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Request {
    pub fn new(func_name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            func_name: func_name.into(),
            args,
        }
    }
}

/// Outcome of a dispatched request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    FuncResult {
        func_name: String,
        result: Value,
    },
    FuncError {
        func_name: String,
        kind: ErrorKind,
        message: String,
    },
}

impl Response {
    pub fn error(func_name: impl Into<String>, err: &DispatchError) -> Self {
        Response::FuncError {
            func_name: func_name.into(),
            kind: err.kind(),
            message: err.message().to_string(),
        }
    }

    pub fn into_result(self) -> Result<Value, DispatchError> {
        match self {
            Response::FuncResult { result, .. } => Ok(result),
            Response::FuncError { kind, message, .. } => Err(DispatchError::from_parts(kind, message)),
        }
    }
}

/// Public view of one bound name in a dispatch table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Name callers use
    pub name: String,
    /// Name of the function that actually runs (differs for aliases)
    pub target: String,
    pub arity: usize,
    pub cached: bool,
}

/// Type-erased handler produced by `#[remote_fn]`
pub type RawHandler = fn(&[Value]) -> Result<Value, DispatchError>;

/// Inventory entry submitted by `#[remote_fn]`
pub struct RemoteFnEntry {
    pub function_name: &'static str,
    pub aliases: &'static [&'static str],
    pub cached: bool,
    pub arity: usize,
    pub handler: RawHandler,
}

inventory::collect!(RemoteFnEntry);

/// All registered remote functions, sorted by name so binding order is stable
pub fn registered_remote_fns() -> Vec<&'static RemoteFnEntry> {
    let mut entries: Vec<&'static RemoteFnEntry> = inventory::iter::<RemoteFnEntry>
        .into_iter()
        .collect();
    entries.sort_by_key(|entry| entry.function_name);
    entries
}

/// Reject calls whose argument count does not match the bound signature
pub fn check_arity(func_name: &str, args: &[Value], expected: usize) -> Result<(), DispatchError> {
    if args.len() == expected {
        return Ok(());
    }
    Err(DispatchError::SignatureMismatch(format!(
        "RPC error: {}() expects {} argument(s), received {}",
        func_name,
        expected,
        args.len()
    )))
}

/// Decode the positional argument at `index`
pub fn decode_arg<T: DeserializeOwned>(
    func_name: &str,
    args: &[Value],
    index: usize,
) -> Result<T, DispatchError> {
    let value = args.get(index).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| {
        DispatchError::Deserialization(format!(
            "RPC error: argument {} of {}() could not be decoded: {}",
            index, func_name, e
        ))
    })
}

/// Encode a handler's return value
pub fn encode_result<T: Serialize>(func_name: &str, result: &T) -> Result<Value, DispatchError> {
    serde_json::to_value(result).map_err(|e| {
        DispatchError::Serialization(format!(
            "RPC error: result of {}() could not be encoded: {}",
            func_name, e
        ))
    })
}
