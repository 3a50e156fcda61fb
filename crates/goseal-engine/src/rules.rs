//! Rule identities reported by the engine.

/// Code, name, and description of one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleInfo {
    /// Rule code (e.g., "GS001").
    pub code: &'static str,
    /// Kebab-case rule name, matching the config key that drives it.
    pub name: &'static str,
    /// Brief description.
    pub description: &'static str,
}

/// Construction outside `init-scope`.
pub const INIT_SCOPE: RuleInfo = RuleInfo {
    code: "GS001",
    name: "init-scope",
    description: "Restricts where sealed structs may be built with a literal",
};

/// Construction outside a function matching `factory-names`.
pub const FACTORY_NAMES: RuleInfo = RuleInfo {
    code: "GS002",
    name: "factory-names",
    description: "Requires literals of sealed structs to appear inside factory functions",
};

/// Field assignment outside `mutation-scope`.
pub const MUTATION_SCOPE: RuleInfo = RuleInfo {
    code: "GS003",
    name: "mutation-scope",
    description: "Restricts where fields of sealed structs may be assigned directly",
};

/// Construction or assignment outside a constructor (constructor dialect).
pub const CONSTRUCTORS: RuleInfo = RuleInfo {
    code: "GS004",
    name: "constructors",
    description: "Requires structs to be built and assigned only inside constructor functions",
};

/// Every rule, in code order.
pub const ALL: &[RuleInfo] = &[INIT_SCOPE, FACTORY_NAMES, MUTATION_SCOPE, CONSTRUCTORS];

/// Looks up a rule by code or name.
#[must_use]
pub fn find(key: &str) -> Option<&'static RuleInfo> {
    ALL.iter().find(|r| r.code == key || r.name == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique_and_ordered() {
        let codes: Vec<&str> = ALL.iter().map(|r| r.code).collect();
        assert_eq!(codes, vec!["GS001", "GS002", "GS003", "GS004"]);
    }

    #[test]
    fn find_by_code_or_name() {
        assert_eq!(find("GS003"), Some(&MUTATION_SCOPE));
        assert_eq!(find("factory-names"), Some(&FACTORY_NAMES));
        assert_eq!(find("GS999"), None);
    }
}
