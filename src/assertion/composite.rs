//! Composite assertion bundle
//!
//! The bundle order (account, model user-assertion, system-user) is part of
//! the wire contract with devices. Parts are joined verbatim; malformed parts
//! produce a malformed bundle.

/// Join the three assertion texts in bundle order.
pub fn compose(account_assertion: &str, model_assertion: &str, system_user_assertion: &str) -> String {
    format!("{account_assertion}\n{model_assertion}\n{system_user_assertion}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_order() {
        let bundle = compose("ACCOUNT", "MODEL", "SYSTEM-USER");
        assert_eq!(bundle, "ACCOUNT\nMODEL\nSYSTEM-USER");
    }

    #[test]
    fn test_parts_are_not_validated() {
        let bundle = compose("", "not an assertion", "");
        assert_eq!(bundle, "\nnot an assertion\n");
    }
}
