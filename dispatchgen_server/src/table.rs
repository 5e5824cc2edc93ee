//! Name-to-handler dispatch table.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use dispatchgen_types::{
    registered_remote_fns, DispatchError, FunctionDescriptor, RawHandler, Request, Response,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::handler::RemoteFn;

type Handler = Box<dyn Fn(&str, &[Value]) -> Result<Value, DispatchError> + Send + Sync>;

/// One bound function, shared by its aliases
struct Binding {
    target: String,
    arity: usize,
    handler: Handler,
    /// Results keyed by the serialized argument list, present for cached bindings
    cache: Option<Mutex<HashMap<String, Value>>>,
}

impl Binding {
    fn invoke(&self, args: &[Value]) -> Result<Value, DispatchError> {
        let Some(cache) = &self.cache else {
            return (self.handler)(&self.target, args);
        };

        let key = serde_json::to_string(args).map_err(|e| {
            DispatchError::Serialization(format!(
                "RPC error: arguments of {}() could not be hashed: {}",
                self.target, e
            ))
        })?;

        if let Some(hit) = cache.lock().unwrap_or_else(PoisonError::into_inner).get(&key) {
            debug!("Cache hit for {}({})", self.target, key);
            return Ok(hit.clone());
        }

        // Run the handler unlocked; a concurrent miss at worst computes twice
        let result = (self.handler)(&self.target, args)?;
        cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, result.clone());
        Ok(result)
    }
}

/// Runtime dispatch by name.
///
/// Every public name maps to exactly one binding. Names are unique, so the
/// "first attachment wins" rule of a branch chain becomes a bind-time error.
#[derive(Default)]
pub struct DispatchTable {
    bindings: HashMap<String, Arc<Binding>>,
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.bindings.keys().collect();
        names.sort();
        f.debug_struct("DispatchTable").field("names", &names).finish()
    }
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every `#[remote_fn]` linked into the program
    pub fn from_registry() -> Result<Self, DispatchError> {
        let mut table = Self::new();
        for entry in registered_remote_fns() {
            table.attach_raw(entry.function_name, entry.arity, entry.cached, entry.handler)?;
            for alias in entry.aliases {
                table.alias(alias, entry.function_name)?;
            }
        }
        debug!("Bound {} names from the registry", table.len());
        Ok(table)
    }

    pub fn attach<F, Args>(&mut self, name: &str, func: F) -> Result<(), DispatchError>
    where
        F: RemoteFn<Args>,
        Args: 'static,
    {
        self.bind_typed(name, func, false)
    }

    /// Like [`attach`](Self::attach), remembering each result per argument list
    pub fn attach_cached<F, Args>(&mut self, name: &str, func: F) -> Result<(), DispatchError>
    where
        F: RemoteFn<Args>,
        Args: 'static,
    {
        self.bind_typed(name, func, true)
    }

    /// Bind an already type-erased handler
    pub fn attach_raw(
        &mut self,
        name: &str,
        arity: usize,
        cached: bool,
        handler: RawHandler,
    ) -> Result<(), DispatchError> {
        self.bind(
            name,
            Binding {
                target: name.to_string(),
                arity,
                handler: Box::new(move |_: &str, args: &[Value]| handler(args)),
                cache: cached.then(Default::default),
            },
        )
    }

    /// Bind `func` only under `aliases`, all sharing one binding (and cache)
    /// whose reported target is `target`. Stops at the first name that fails.
    pub fn attach_aliased<F, Args>(
        &mut self,
        target: &str,
        aliases: &[&str],
        func: F,
        cached: bool,
    ) -> Result<(), DispatchError>
    where
        F: RemoteFn<Args>,
        Args: 'static,
    {
        let binding = Arc::new(Self::typed_binding(target, func, cached));
        for alias in aliases {
            self.insert(alias, Arc::clone(&binding))?;
        }
        Ok(())
    }

    /// Make `target` reachable under `alias` as well; the two names share one cache
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<(), DispatchError> {
        let binding = self.bindings.get(target).cloned().ok_or_else(|| {
            DispatchError::function_bind(alias, &format!("alias target {}() is not bound", target))
        })?;
        self.insert(alias, binding)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Drop every cached result
    pub fn clear_cache(&self) {
        for binding in self.bindings.values() {
            if let Some(cache) = &binding.cache {
                cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
            }
        }
    }

    /// Number of cached results reachable through `name`
    pub fn cached_results(&self, name: &str) -> usize {
        self.bindings
            .get(name)
            .and_then(|binding| binding.cache.as_ref())
            .map_or(0, |cache| cache.lock().unwrap_or_else(PoisonError::into_inner).len())
    }

    /// Run the function bound to `func_name`; unknown names fall through to a
    /// `FunctionMissing` error.
    pub fn dispatch(&self, func_name: &str, args: &[Value]) -> Result<Value, DispatchError> {
        match self.bindings.get(func_name) {
            Some(binding) => binding.invoke(args),
            None => {
                warn!("No function bound to {}", func_name);
                Err(DispatchError::function_missing(func_name))
            }
        }
    }

    pub fn handle(&self, request: Request) -> Response {
        match self.dispatch(&request.func_name, &request.args) {
            Ok(result) => Response::FuncResult {
                func_name: request.func_name,
                result,
            },
            Err(err) => Response::error(request.func_name, &err),
        }
    }

    /// Decode a JSON request, dispatch it and encode the response
    pub fn handle_bytes(&self, bytes: &[u8]) -> Vec<u8> {
        let response = match serde_json::from_slice::<Request>(bytes) {
            Ok(request) => self.handle(request),
            Err(e) => {
                warn!("Received an invalid request object: {}", e);
                let err = DispatchError::ServerReceive(format!(
                    "RPC error: received an invalid request object: {}",
                    e
                ));
                Response::error("", &err)
            }
        };

        serde_json::to_vec(&response).unwrap_or_else(|e| {
            let func_name = match &response {
                Response::FuncResult { func_name, .. } | Response::FuncError { func_name, .. } => {
                    func_name.as_str()
                }
            };
            let err = DispatchError::Serialization(format!(
                "RPC error: response of {}() could not be encoded: {}",
                func_name, e
            ));
            serde_json::to_vec(&Response::error(func_name, &err)).unwrap_or_default()
        })
    }

    /// Every bound name, sorted
    pub fn describe(&self) -> Vec<FunctionDescriptor> {
        let mut descriptors: Vec<FunctionDescriptor> = self
            .bindings
            .iter()
            .map(|(name, binding)| FunctionDescriptor {
                name: name.clone(),
                target: binding.target.clone(),
                arity: binding.arity,
                cached: binding.cache.is_some(),
            })
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    fn bind_typed<F, Args>(&mut self, name: &str, func: F, cached: bool) -> Result<(), DispatchError>
    where
        F: RemoteFn<Args>,
        Args: 'static,
    {
        self.bind(name, Self::typed_binding(name, func, cached))
    }

    fn typed_binding<F, Args>(target: &str, func: F, cached: bool) -> Binding
    where
        F: RemoteFn<Args>,
        Args: 'static,
    {
        Binding {
            target: target.to_string(),
            arity: F::ARITY,
            handler: Box::new(move |func_name: &str, args: &[Value]| func.call(func_name, args)),
            cache: cached.then(Default::default),
        }
    }

    fn bind(&mut self, name: &str, binding: Binding) -> Result<(), DispatchError> {
        self.insert(name, Arc::new(binding))
    }

    fn insert(&mut self, name: &str, binding: Arc<Binding>) -> Result<(), DispatchError> {
        if name.trim().is_empty() {
            warn!("Refusing to bind an empty function name");
            return Err(DispatchError::function_bind(name, "function name is empty"));
        }
        if self.bindings.contains_key(name) {
            warn!("Refusing to bind {} twice", name);
            return Err(DispatchError::function_bind(name, "function name already exists"));
        }
        debug!("Bound {} -> {}()", name, binding.target);
        self.bindings.insert(name.to_string(), binding);
        Ok(())
    }
}
