//! Helpers that fill in derivable definition fields from table keys.

use std::sync::LazyLock;

use regex::Regex;

use crate::definition::{HighLevelTable, LowLevelTable};
use crate::value::Code;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]+").expect("word pattern compiles"));

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateHighLevelOptions {
    pub disable_generate_class_name: bool,
    pub disable_generate_code: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateLowLevelOptions {
    pub disable_generate_sub_code: bool,
}

/// `INTERNAL_SERVER_ERROR` -> `InternalServerError`.
///
/// Only ASCII letter runs are kept; digits and separators are dropped.
pub fn to_pascal_case(input: &str) -> String {
    WORD.find_iter(input)
        .map(|word| {
            let word = word.as_str();
            let (head, tail) = word.split_at(1);
            let mut out = head.to_ascii_uppercase();
            out.push_str(&tail.to_ascii_lowercase());
            out
        })
        .collect()
}

/// Fill in missing `class_name` (PascalCase of the key) and `code` (the key).
pub fn generate_high_level_definitions(
    mut table: HighLevelTable,
    opts: &GenerateHighLevelOptions,
) -> HighLevelTable {
    for (key, def) in table.iter_mut() {
        if !opts.disable_generate_class_name
            && def.class_name.as_deref().is_none_or(str::is_empty)
        {
            def.class_name = Some(to_pascal_case(key));
        }
        if !opts.disable_generate_code && is_missing(def.code.as_ref()) {
            def.code = Some(Code::from(key.as_str()));
        }
    }
    table
}

/// Fill in missing `sub_code` with the key.
pub fn generate_low_level_definitions(
    mut table: LowLevelTable,
    opts: &GenerateLowLevelOptions,
) -> LowLevelTable {
    if opts.disable_generate_sub_code {
        return table;
    }
    for (key, def) in table.iter_mut() {
        if is_missing(def.sub_code.as_ref()) {
            def.sub_code = Some(Code::from(key.as_str()));
        }
    }
    table
}

fn is_missing(code: Option<&Code>) -> bool {
    match code {
        None => true,
        Some(Code::Text(text)) => text.is_empty(),
        Some(Code::Number(_) | Code::Decimal(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{HighLevelDefinition, LowLevelDefinition};

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("INTERNAL_SERVER_ERROR"), "InternalServerError");
        assert_eq!(to_pascal_case("auth-error"), "AuthError");
        assert_eq!(to_pascal_case("HTTP2_FAILURE"), "HttpFailure");
        assert_eq!(to_pascal_case("x"), "X");
        assert_eq!(to_pascal_case("__"), "");
    }

    #[test]
    fn test_generate_high_level_fills_missing_fields() {
        let mut table = HighLevelTable::new();
        table.insert("INTERNAL_ERROR".into(), HighLevelDefinition::new());
        table.insert(
            "AUTH_ERROR".into(),
            HighLevelDefinition::new().with_class_name("Unauthorized").with_code(401),
        );

        let table = generate_high_level_definitions(table, &GenerateHighLevelOptions::default());

        let internal = &table["INTERNAL_ERROR"];
        assert_eq!(internal.class_name.as_deref(), Some("InternalError"));
        assert_eq!(internal.code, Some(Code::from("INTERNAL_ERROR")));

        let auth = &table["AUTH_ERROR"];
        assert_eq!(auth.class_name.as_deref(), Some("Unauthorized"));
        assert_eq!(auth.code, Some(Code::Number(401)));
    }

    #[test]
    fn test_generate_high_level_respects_disable_flags() {
        let mut table = HighLevelTable::new();
        table.insert("INTERNAL_ERROR".into(), HighLevelDefinition::new());

        let opts = GenerateHighLevelOptions {
            disable_generate_class_name: true,
            disable_generate_code: false,
        };
        let generated = generate_high_level_definitions(table.clone(), &opts);
        assert!(generated["INTERNAL_ERROR"].class_name.is_none());
        assert!(generated["INTERNAL_ERROR"].code.is_some());

        let opts = GenerateHighLevelOptions {
            disable_generate_class_name: false,
            disable_generate_code: true,
        };
        let generated = generate_high_level_definitions(table, &opts);
        assert!(generated["INTERNAL_ERROR"].class_name.is_some());
        assert!(generated["INTERNAL_ERROR"].code.is_none());
    }

    #[test]
    fn test_generate_low_level_sub_codes() {
        let mut table = LowLevelTable::new();
        table.insert("DATABASE_FAILURE".into(), LowLevelDefinition::new("db down"));
        table.insert(
            "BAD_TOKEN".into(),
            LowLevelDefinition::new("bad token").with_sub_code("E_TOKEN"),
        );

        let generated =
            generate_low_level_definitions(table.clone(), &GenerateLowLevelOptions::default());
        assert_eq!(
            generated["DATABASE_FAILURE"].sub_code,
            Some(Code::from("DATABASE_FAILURE"))
        );
        assert_eq!(generated["BAD_TOKEN"].sub_code, Some(Code::from("E_TOKEN")));

        let untouched = generate_low_level_definitions(
            table,
            &GenerateLowLevelOptions {
                disable_generate_sub_code: true,
            },
        );
        assert!(untouched["DATABASE_FAILURE"].sub_code.is_none());
    }
}
