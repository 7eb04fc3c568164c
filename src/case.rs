//! Case conversion for identifiers derived from introspected tables: snake_case table names -> PascalCase record type names.

/// Convert a single identifier to PascalCase.
/// e.g. "order_items" -> "OrderItems", "customers" -> "Customers", "Customer" -> "Customer"
pub fn to_pascal_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = true;
    for c in s.chars() {
        if c == '_' || c == '-' || c == ' ' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Case-insensitive identifier comparison.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_from_snake_case() {
        assert_eq!(to_pascal_case("order_items"), "OrderItems");
        assert_eq!(to_pascal_case("customers"), "Customers");
        assert_eq!(to_pascal_case("Customer"), "Customer");
        assert_eq!(to_pascal_case("_sys_log"), "SysLog");
    }

    #[test]
    fn case_insensitive_comparison() {
        assert!(eq_ignore_case("Customers", "CUSTOMERS"));
        assert!(eq_ignore_case("Ärzte", "ärzte"));
        assert!(!eq_ignore_case("Customer", "Customers"));
    }
}
