//! User-facing registration macros built on top of the selectors.

use dispatchgen_types::PairPolicy;

use crate::model::{ArtifactBuilder, MacroDef, MacroId, MacroRole};
use crate::names::{MacroNames, EXPAND};
use crate::profile::{VariantProfile, CLIENT_GUARD, SERVER_GUARD};
use crate::selector::DispatchTables;

/// Alias macros, present when the generation has a pair ladder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasMacros {
    pub policy: PairPolicy,
    pub alias_func: MacroId,
    pub alias_cached_func: MacroId,
    /// `MULTI_ALIAS_FUNC` under `HoldFirst`, `ALIAS_FUNCS` under `AdvanceBoth`
    pub many: MacroId,
    pub many_cached: MacroId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainMacros {
    pub attach_func: MacroId,
    pub attach_funcs: MacroId,
    pub attach_cached_func: MacroId,
    pub attach_cached_funcs: MacroId,
    pub alias: Option<AliasMacros>,
    pub default_dispatch: MacroId,
}

/// Server builds declare an `extern` function pointer, client builds define a null one
pub fn emit_header_func(builder: &mut ArtifactBuilder, names: &MacroNames) {
    let params = ["RETURN", "FUNCNAME", "..."];
    builder.directive(SERVER_GUARD);
    builder.emit(
        MacroDef::new(names.header_func(), MacroRole::HeaderFunc)
            .params(params)
            .body("extern RETURN (*FUNCNAME)(__VA_ARGS__)"),
    );
    builder.directive(CLIENT_GUARD);
    builder.emit(
        MacroDef::new(names.header_func(), MacroRole::HeaderFunc)
            .params(params)
            .body("RETURN (*FUNCNAME)(__VA_ARGS__) = nullptr"),
    );
    builder.directive("#endif");
}

pub fn assemble(
    builder: &mut ArtifactBuilder,
    names: &MacroNames,
    profile: &VariantProfile,
    expand: MacroId,
    tables: &DispatchTables,
    pair_policy: Option<PairPolicy>,
) -> DomainMacros {
    let doc = |text: &'static str| if profile.documented { Some(text) } else { None };

    let attach_func = emit_branch(
        builder,
        names.attach_func(false),
        &["FUNCNAME"],
        profile.branch("#FUNCNAME", "FUNCNAME", false),
        doc("Attaches function (provided by FUNCNAME) to the server dispatch function"),
    );
    let attach_funcs = emit_repeat(
        builder,
        names.attach_funcs(false),
        &["FUNCNAME", "..."],
        [expand, tables.single.id, attach_func],
        "FUNCNAME, __VA_ARGS__",
        doc("Attaches multiple functions to the server dispatch function"),
    );
    builder.blank();

    let attach_cached_func = emit_branch(
        builder,
        names.attach_func(true),
        &["FUNCNAME"],
        profile.branch("#FUNCNAME", "FUNCNAME", true),
        doc("Attaches function (provided by FUNCNAME) to the server dispatch function with server-side caching"),
    );
    let attach_cached_funcs = emit_repeat(
        builder,
        names.attach_funcs(true),
        &["FUNCNAME", "..."],
        [expand, tables.single.id, attach_cached_func],
        "FUNCNAME, __VA_ARGS__",
        doc("Attaches multiple functions to the server dispatch function with server-side caching"),
    );
    builder.blank();

    let alias = match (pair_policy, &tables.pair) {
        (Some(policy), Some(pair_selector)) => {
            let mut emit_alias = |cached: bool| {
                let (single_doc, many_doc, many_name) = match (policy, cached) {
                    (PairPolicy::HoldFirst, false) => (
                        "Attaches function (provided by FUNCNAME) to the server dispatch function with a different function name (provided by FUNC_ALIAS)",
                        "Attaches function (provided by FUNCNAME) to the server dispatch function with multiple different function names",
                        names.multi_alias_func(false),
                    ),
                    (PairPolicy::HoldFirst, true) => (
                        "Attaches function (provided by FUNCNAME) to the server dispatch function with a different function name (provided by FUNC_ALIAS) and server-side caching",
                        "Attaches function (provided by FUNCNAME) to the server dispatch function with multiple different function names and server-side caching",
                        names.multi_alias_func(true),
                    ),
                    (PairPolicy::AdvanceBoth, false) => (
                        "Attaches function (provided by FUNCNAME) to the server dispatch function with a different function name (provided by FUNC_ALIAS)",
                        "Attaches each (function, alias) pair to the server dispatch function",
                        names.alias_funcs(false),
                    ),
                    (PairPolicy::AdvanceBoth, true) => (
                        "Attaches function (provided by FUNCNAME) to the server dispatch function with a different function name (provided by FUNC_ALIAS) and server-side caching",
                        "Attaches each (function, alias) pair to the server dispatch function with server-side caching",
                        names.alias_funcs(true),
                    ),
                };
                let single = emit_branch(
                    builder,
                    names.alias_func(cached),
                    &["FUNCNAME", "FUNC_ALIAS"],
                    profile.branch("#FUNC_ALIAS", "FUNCNAME", cached),
                    doc(single_doc),
                );
                let many = emit_repeat(
                    builder,
                    many_name,
                    &["FUNCNAME", "FUNC_ALIAS", "..."],
                    [expand, pair_selector.id, single],
                    "FUNCNAME, FUNC_ALIAS, __VA_ARGS__",
                    doc(many_doc),
                );
                builder.blank();
                (single, many)
            };
            let (alias_func, many) = emit_alias(false);
            let (alias_cached_func, many_cached) = emit_alias(true);
            Some(AliasMacros {
                policy,
                alias_func,
                alias_cached_func,
                many,
                many_cached,
            })
        }
        _ => None,
    };

    let chain = format!("{}(FUNCNAME, __VA_ARGS__)", names.attach_funcs(false));
    let default_dispatch = builder.emit(
        MacroDef::new(names.default_dispatch(), MacroRole::Domain)
            .params(["FUNCNAME", "..."])
            .body(format!("{}({})", EXPAND, profile.default_dispatch(&chain)))
            .refs([expand, attach_funcs])
            .doc(doc("Implements the @ref rpc::server::dispatch_impl function for you and attaches the listed functions")),
    );

    DomainMacros {
        attach_func,
        attach_funcs,
        attach_cached_func,
        attach_cached_funcs,
        alias,
        default_dispatch,
    }
}

/// A macro expanding to a single conditional branch
fn emit_branch(
    builder: &mut ArtifactBuilder,
    name: String,
    params: &[&str],
    branch: String,
    doc: Option<&str>,
) -> MacroId {
    builder.emit(
        MacroDef::new(name, MacroRole::Domain)
            .params(params.iter().copied())
            .body(branch)
            .doc(doc),
    )
}

/// A macro applying a branch macro to every argument through a selector;
/// `refs` is `[expand, selector, action]`.
fn emit_repeat(
    builder: &mut ArtifactBuilder,
    name: String,
    params: &[&str],
    refs: [MacroId; 3],
    forwarded: &str,
    doc: Option<&str>,
) -> MacroId {
    let [_, selector, action] = refs;
    let body = format!(
        "{}({}({}, {}))",
        EXPAND,
        builder.arena().get(selector).name,
        builder.arena().get(action).name,
        forwarded
    );
    builder.emit(
        MacroDef::new(name, MacroRole::Domain)
            .params(params.iter().copied())
            .body(body)
            .refs(refs)
            .doc(doc),
    )
}
