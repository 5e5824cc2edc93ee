extern crate proc_macro;
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, parse_quote, FnArg, ItemFn, LitStr, Path, Type};

/// Options accepted by `#[remote_fn(...)]`
#[derive(Default)]
struct RemoteFnOptions {
    cached: bool,
    aliases: Vec<LitStr>,
    /// Path the generated code reaches the shared types through
    krate: Option<Path>,
}

/// Registers a free function for `DispatchTable::from_registry`.
///
/// * `#[remote_fn]` binds the function under its own name
/// * `#[remote_fn(cached)]` caches results per argument list
/// * `#[remote_fn(alias = "Name")]` also binds it as `Name`; may be repeated
/// * `#[remote_fn(crate = "dispatchgen")]` resolves the support code through
///   the facade crate instead of `dispatchgen_types`
///
/// Parameters are decoded positionally from the request's JSON arguments and
/// the return value is encoded with `serde_json`, so every parameter type must
/// implement `DeserializeOwned` and the return type `Serialize`.
#[proc_macro_attribute]
pub fn remote_fn(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut options = RemoteFnOptions::default();
    let option_parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("cached") {
            options.cached = true;
            Ok(())
        } else if meta.path.is_ident("alias") {
            let alias: LitStr = meta.value()?.parse()?;
            if alias.value().trim().is_empty() {
                return Err(syn::Error::new(alias.span(), "remote_fn alias must not be empty"));
            }
            options.aliases.push(alias);
            Ok(())
        } else if meta.path.is_ident("crate") {
            let path: LitStr = meta.value()?.parse()?;
            options.krate = Some(path.parse()?);
            Ok(())
        } else {
            Err(meta.error(
                "unsupported remote_fn option, expected `cached`, `alias = \"...\"` or `crate = \"...\"`",
            ))
        }
    });
    parse_macro_input!(attr with option_parser);

    let input_fn = parse_macro_input!(item as ItemFn);
    expand_remote_fn(options, input_fn)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_remote_fn(options: RemoteFnOptions, input_fn: ItemFn) -> syn::Result<proc_macro2::TokenStream> {
    let sig = &input_fn.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "remote_fn dispatch is synchronous; async functions are not supported",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "remote_fn cannot register generic functions",
        ));
    }

    let mut arg_types: Vec<&Type> = Vec::new();
    for input in &sig.inputs {
        match input {
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "remote_fn must be placed on a free function, not a method",
                ));
            }
            FnArg::Typed(pat_type) => {
                if let Type::Reference(reference) = &*pat_type.ty {
                    return Err(syn::Error::new_spanned(
                        reference,
                        "remote_fn parameters are decoded into owned values; take the type by value",
                    ));
                }
                arg_types.push(&pat_type.ty);
            }
        }
    }

    let function_ident = &sig.ident;
    let function_name = function_ident.to_string();
    let krate: Path = options
        .krate
        .unwrap_or_else(|| parse_quote!(::dispatchgen_types));
    let handler_ident = format_ident!("__dispatchgen_handler_{}", function_ident);
    let arity = arg_types.len();
    let decoded = arg_types.iter().enumerate().map(|(index, ty)| {
        quote! { #krate::decode_arg::<#ty>(#function_name, args, #index)? }
    });
    let cached = options.cached;
    let aliases = &options.aliases;

    Ok(quote! {
        #input_fn

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #handler_ident(
            args: &[#krate::serde_json::Value],
        ) -> ::std::result::Result<#krate::serde_json::Value, #krate::DispatchError> {
            #krate::check_arity(#function_name, args, #arity)?;
            let result = #function_ident(#(#decoded),*);
            #krate::encode_result(#function_name, &result)
        }

        #krate::inventory::submit! {
            #krate::RemoteFnEntry {
                function_name: #function_name,
                aliases: &[#(#aliases),*],
                cached: #cached,
                arity: #arity,
                handler: #handler_ident,
            }
        }
    })
}
