//! SQL keywords that must be double-quoted when used as column names.
//!
//! Registration quotes matching column names once, and every later lookup by
//! name goes through [`quote_if_keyword`] so callers keep using the bare name.

use std::collections::HashSet;
use std::sync::{LazyLock, PoisonError, RwLock};

const PREDEFINED: &[&str] = &[
    "count", "index", "name", "type", "types", "from", "to", "order", "value", "state", "time",
    "left", "right", "day", "local",
];

static SQL_KEYWORDS: LazyLock<RwLock<HashSet<String>>> =
    LazyLock::new(|| RwLock::new(PREDEFINED.iter().map(|k| k.to_string()).collect()));

/// Add a keyword to the process-wide quoting set.
///
/// The keyword is stored lowercased; matching against column names is exact,
/// so only lowercase spellings are quoted.
pub fn add_sql_keyword(keyword: &str) {
    SQL_KEYWORDS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(keyword.to_lowercase());
}

/// Whether `name` is in the quoting set.
pub fn is_sql_keyword(name: &str) -> bool {
    SQL_KEYWORDS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains(name)
}

/// Wrap `name` in double quotes if it is a registered keyword.
pub fn quote_if_keyword(name: &str) -> String {
    if is_sql_keyword(name) {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predefined_keywords_are_quoted() {
        assert_eq!(quote_if_keyword("order"), "\"order\"");
        assert_eq!(quote_if_keyword("amount"), "amount");
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(quote_if_keyword("Order"), "Order");
    }

    #[test]
    fn added_keywords_are_lowercased() {
        add_sql_keyword("Sqlb_Test_Group");
        assert!(is_sql_keyword("sqlb_test_group"));
        assert!(!is_sql_keyword("Sqlb_Test_Group"));
        assert_eq!(quote_if_keyword("sqlb_test_group"), "\"sqlb_test_group\"");
    }

    #[test]
    fn already_quoted_name_is_left_alone() {
        assert_eq!(quote_if_keyword("\"order\""), "\"order\"");
    }
}
