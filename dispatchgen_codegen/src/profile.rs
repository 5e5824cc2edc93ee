//! Per-generation text of the dispatch branches.
//!
//! Every variant shares the ladder and selector machinery; a profile only
//! supplies the snippets that go inside a branch and around the default
//! dispatch routine.

use dispatchgen_types::Variant;

/// Guard around the ladder/selector block in guarded generations
pub const LADDER_GUARD: &str =
    "#if !defined(RPC_HPP_DOXYGEN_GEN) && (defined(RPC_HPP_SERVER_IMPL) || defined(RPC_HPP_MODULE_IMPL))";
/// Guard around the domain macros in guarded generations
pub const SERVER_GUARD: &str = "#if defined(RPC_HPP_SERVER_IMPL) || defined(RPC_HPP_MODULE_IMPL)";
pub const CLIENT_GUARD: &str = "#elif defined(RPC_HPP_CLIENT_IMPL)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantProfile {
    pub variant: Variant,
    /// Dispatch expression, `{func}` is replaced by the function token
    call: &'static str,
    /// Same as `call` with server-side caching
    cached_call: &'static str,
    /// Statement binding `func_name` at the top of the default dispatch
    func_name_decl: &'static str,
    /// Unconditional statement closing the default dispatch
    fallback: &'static str,
    /// Function definition wrapped around the default dispatch, if any
    routine: Option<&'static str>,
    pub guarded: bool,
    pub documented: bool,
}

const LEGACY: VariantProfile = VariantProfile {
    variant: Variant::Legacy,
    call: "this->dispatch_func({func}, serial_obj)",
    cached_call: "this->dispatch_cached_func({func}, serial_obj)",
    func_name_decl: "const auto func_name = rpc::pack_adapter<Serial>::get_func_name(serial_obj);",
    fallback: r#"throw std::runtime_error("RPC error: Called function: \"" + func_name + "\" not found!");"#,
    routine: None,
    guarded: false,
    documented: false,
};

const CLASSIC: VariantProfile = VariantProfile {
    variant: Variant::Classic,
    call: "this->dispatch_func({func}, serial_obj)",
    cached_call: "this->dispatch_cached_func({func}, serial_obj)",
    func_name_decl: "const auto func_name = rpc::pack_adapter<adapter_t>::get_func_name(serial_obj);",
    fallback: r#"throw std::runtime_error("RPC error: Called function: \"" + func_name + "\" not found!");"#,
    routine: None,
    guarded: true,
    documented: true,
};

const TEMPLATED: VariantProfile = VariantProfile {
    variant: Variant::Templated,
    call: "dispatch_func<Serial>({func}, serial_obj)",
    cached_call: "dispatch_func<Serial>({func}, serial_obj, true)",
    func_name_decl: "const auto func_name = serial_adapter<Serial>::extract_func_name(serial_obj);",
    fallback: r#"serial_adapter<Serial>::set_err_mesg(serial_obj, "RPC error: Called function: \"" + func_name + "\" not found!");"#,
    routine: Some("template<typename Serial> void rpc::server::dispatch(typename Serial::doc_type& serial_obj)"),
    guarded: false,
    documented: false,
};

const CALLBACK: VariantProfile = VariantProfile {
    variant: Variant::Callback,
    call: "this->dispatch_callback({func}, rpc_obj)",
    cached_call: "this->dispatch_callback({func}, rpc_obj, true)",
    func_name_decl: "const auto func_name = rpc_obj.get_func_name();",
    // Parenthesized so the preprocessor does not split the initializer at its comma
    fallback: r#"rpc_obj = (object_t{ detail::func_error{ func_name, function_missing_error{ "RPC error: Called function: \"" + func_name + "\" not found!" } } });"#,
    routine: None,
    guarded: false,
    documented: false,
};

impl VariantProfile {
    pub fn of(variant: Variant) -> &'static VariantProfile {
        match variant {
            Variant::Legacy => &LEGACY,
            Variant::Classic => &CLASSIC,
            Variant::Templated => &TEMPLATED,
            Variant::Callback => &CALLBACK,
        }
    }

    pub fn dispatch_expr(&self, func: &str, cached: bool) -> String {
        let template = if cached { self.cached_call } else { self.call };
        template.replace("{func}", func)
    }

    /// `if (func_name == <matched>) { return <dispatch>; }`
    pub fn branch(&self, matched: &str, func: &str, cached: bool) -> String {
        format!(
            "if (func_name == {}) {{ return {}; }}",
            matched,
            self.dispatch_expr(func, cached)
        )
    }

    pub fn fallback(&self) -> &'static str {
        self.fallback
    }

    /// Full default dispatch text around an already expanded branch chain
    pub fn default_dispatch(&self, chain: &str) -> String {
        let statements = if chain.is_empty() {
            format!("{} {}", self.func_name_decl, self.fallback)
        } else {
            format!("{} {} {}", self.func_name_decl, chain, self.fallback)
        };
        match self.routine {
            Some(signature) => format!("{} {{ {} }}", signature, statements),
            None => statements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_branch_is_a_parameterization() {
        let profile = VariantProfile::of(Variant::Templated);
        assert_eq!(
            profile.branch("#FUNCNAME", "FUNCNAME", false),
            "if (func_name == #FUNCNAME) { return dispatch_func<Serial>(FUNCNAME, serial_obj); }"
        );
        assert_eq!(
            profile.branch("#FUNCNAME", "FUNCNAME", true),
            "if (func_name == #FUNCNAME) { return dispatch_func<Serial>(FUNCNAME, serial_obj, true); }"
        );
    }

    #[test]
    fn test_default_dispatch_ends_with_fallback() {
        for variant in Variant::ALL {
            let profile = VariantProfile::of(variant);
            let text = profile.default_dispatch("CHAIN");
            let fallback_at = text.rfind(profile.fallback()).unwrap();
            assert!(fallback_at > text.find("CHAIN").unwrap(), "{}", variant);
        }
    }

    #[test]
    fn test_templated_wraps_routine() {
        let text = VariantProfile::of(Variant::Templated).default_dispatch("CHAIN");
        assert!(text.starts_with("template<typename Serial> void rpc::server::dispatch("));
        assert!(text.ends_with("not found!\"); }"));
    }

    #[test]
    fn test_fallbacks_have_no_bare_commas() {
        for variant in Variant::ALL {
            let mut depth = 0i32;
            let mut in_string = false;
            let mut prev = ' ';
            for c in VariantProfile::of(variant).fallback().chars() {
                match c {
                    '"' if prev != '\\' => in_string = !in_string,
                    '(' if !in_string => depth += 1,
                    ')' if !in_string => depth -= 1,
                    ',' if !in_string => assert!(depth > 0, "{}", variant),
                    _ => {}
                }
                prev = c;
            }
        }
    }

    #[test]
    fn test_only_classic_is_guarded() {
        let guarded: Vec<Variant> = Variant::ALL
            .into_iter()
            .filter(|v| VariantProfile::of(*v).guarded)
            .collect();
        assert_eq!(guarded, vec![Variant::Classic]);
    }
}
