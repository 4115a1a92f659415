//! Identifier mangling between contract names and Rust names.
//!
//! Contract schema and property names arrive in whatever casing the contract
//! author used (`camelCase` wire fields are the common case). Generated code
//! follows Rust conventions instead: `PascalCase` types and `snake_case`
//! fields, with raw-identifier escaping where a field name lands on a Rust
//! keyword.

/// Rust keywords that cannot be used as bare field identifiers.
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
];

/// Converts a contract name to a `PascalCase` Rust type name.
///
/// Word boundaries are underscores, hyphens, spaces, and lower-to-upper case
/// transitions already present in the input. Leading digits are prefixed
/// with an underscore so the result is always a valid identifier.
#[must_use]
pub fn type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch == ' ' || ch == '.' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Converts a wire field name to a `snake_case` Rust field identifier.
///
/// Keywords are escaped with the `r#` prefix. The caller pairs this with a
/// `#[serde(rename = "...")]` attribute whenever the result differs from the
/// wire name, so the wire shape is unaffected by the conversion.
#[must_use]
pub fn field_ident(name: &str) -> String {
    let snake = snake_case(name);
    if KEYWORDS.contains(&snake.as_str()) {
        format!("r#{snake}")
    } else {
        snake
    }
}

/// Returns true when `ident` (with any `r#` prefix removed) spells the wire
/// name unchanged, meaning no serde rename is needed.
#[must_use]
pub fn ident_matches_wire(ident: &str, wire: &str) -> bool {
    ident.strip_prefix("r#").unwrap_or(ident) == wire
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch == '-' || ch == ' ' || ch == '.' {
            if !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        } else if ch.is_uppercase() {
            if prev_lower && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    let trimmed = out.trim_matches('_');
    let mut result = if trimmed.is_empty() { "field".to_string() } else { trimmed.to_string() };
    if result.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==== Type names ====

    #[test]
    fn test_type_name_from_snake() {
        assert_eq!(type_name("user_profile"), "UserProfile");
    }

    #[test]
    fn test_type_name_from_camel() {
        assert_eq!(type_name("createNote"), "CreateNote");
    }

    #[test]
    fn test_type_name_already_pascal() {
        assert_eq!(type_name("Thing"), "Thing");
    }

    #[test]
    fn test_type_name_with_hyphen() {
        assert_eq!(type_name("api-key"), "ApiKey");
    }

    #[test]
    fn test_type_name_leading_digit() {
        assert_eq!(type_name("2fa_config"), "_2faConfig");
    }

    // ==== Field identifiers ====

    #[test]
    fn test_field_ident_camel_case() {
        assert_eq!(field_ident("createdAt"), "created_at");
    }

    #[test]
    fn test_field_ident_already_snake() {
        assert_eq!(field_ident("display_name"), "display_name");
    }

    #[test]
    fn test_field_ident_keyword_escaped() {
        assert_eq!(field_ident("type"), "r#type");
        assert_eq!(field_ident("ref"), "r#ref");
    }

    #[test]
    fn test_field_ident_acronym_run() {
        assert_eq!(field_ident("HTMLBody"), "htmlbody");
        assert_eq!(field_ident("userID"), "user_id");
    }

    #[test]
    fn test_field_ident_leading_digit() {
        assert_eq!(field_ident("2fa"), "_2fa");
    }

    // ==== Wire comparison ====

    #[test]
    fn test_ident_matches_wire_plain() {
        assert!(ident_matches_wire("name", "name"));
        assert!(!ident_matches_wire("created_at", "createdAt"));
    }

    #[test]
    fn test_ident_matches_wire_raw_keyword() {
        assert!(ident_matches_wire("r#type", "type"));
        assert!(!ident_matches_wire("r#type", "Type"));
    }
}
