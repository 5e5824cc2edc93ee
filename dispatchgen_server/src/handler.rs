//! Typed functions as JSON handlers.
//!
//! [`RemoteFn`] is implemented for every `Fn` of up to twelve arguments whose
//! parameters deserialize and whose return value serializes. The `Args` type
//! parameter is the argument tuple, which keeps the impls for different
//! arities from overlapping.

use dispatchgen_types::{check_arity, decode_arg, encode_result, DispatchError};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub trait RemoteFn<Args>: Send + Sync + 'static {
    /// Number of positional arguments
    const ARITY: usize;

    /// Decode `args`, run the function and encode its result
    fn call(&self, func_name: &str, args: &[Value]) -> Result<Value, DispatchError>;
}

macro_rules! count_args {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count_args!($($tail)*) };
}

macro_rules! impl_remote_fn {
    ($($idx:tt: $arg:ident),*) => {
        impl<Func, Ret, $($arg,)*> RemoteFn<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Ret + Send + Sync + 'static,
            Ret: Serialize,
            $($arg: DeserializeOwned,)*
        {
            const ARITY: usize = count_args!($($arg)*);

            #[allow(non_snake_case)]
            fn call(&self, func_name: &str, args: &[Value]) -> Result<Value, DispatchError> {
                check_arity(func_name, args, Self::ARITY)?;
                $(
                    let $arg: $arg = decode_arg(func_name, args, $idx)?;
                )*
                encode_result(func_name, &(self)($($arg),*))
            }
        }
    };
}

/// Implements [`RemoteFn`] for the bound arguments, then moves the next
/// argument from the pending list into the bound list and recurses.
macro_rules! remote_fn_ladder {
    ([$($idx:tt: $arg:ident),*]) => {
        impl_remote_fn!($($idx: $arg),*);
    };
    ([$($idx:tt: $arg:ident),*] $next_idx:tt: $next:ident $(, $rest_idx:tt: $rest:ident)*) => {
        impl_remote_fn!($($idx: $arg),*);
        remote_fn_ladder!([$($idx: $arg,)* $next_idx: $next] $($rest_idx: $rest),*);
    };
}

remote_fn_ladder!([] 0: A0, 1: A1, 2: A2, 3: A3, 4: A4, 5: A5, 6: A6, 7: A7, 8: A8, 9: A9, 10: A10, 11: A11);
