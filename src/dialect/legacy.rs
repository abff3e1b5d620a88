//! Hand-written PostgreSQL dialect kept for sources created before the
//! descriptor-driven dialect existed.

use super::SqlDialect;

#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyDialect;

impl SqlDialect for LegacyDialect {
    fn name(&self) -> &str {
        "PostgreSQL (legacy)"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn max_identifier_length(&self) -> Option<usize> {
        Some(63)
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    fn limit_offset_sql(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        let sql = match (limit, offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        };
        Some(sql)
    }

    fn native_type(&self, engine_type: &str) -> Option<String> {
        let native = match engine_type.to_ascii_lowercase().as_str() {
            "boolean" => "BOOLEAN",
            "integer" => "INTEGER",
            "bigint" => "BIGINT",
            "float" => "REAL",
            "double" => "DOUBLE PRECISION",
            "decimal" => "NUMERIC",
            "varchar" => "VARCHAR",
            "varbinary" => "BYTEA",
            "date" => "DATE",
            "time" => "TIME",
            "timestamp" => "TIMESTAMP",
            _ => return None,
        };
        Some(native.to_string())
    }

    fn supports_function(&self, name: &str, arity: usize) -> bool {
        matches!(
            (name.to_ascii_lowercase().as_str(), arity),
            ("abs" | "ceil" | "floor" | "sqrt" | "lower" | "upper" | "trim" | "char_length", 1)
                | ("round" | "mod" | "concat", 2)
                | ("substr", 3)
                | ("current_date" | "current_timestamp", 0)
                | ("coalesce", 1..)
        )
    }

    fn render_function(&self, name: &str, args: &[String]) -> Option<String> {
        if !self.supports_function(name, args.len()) {
            return None;
        }
        let name = name.to_ascii_lowercase();
        let sql = match name.as_str() {
            "concat" => format!("{} || {}", args[0], args[1]),
            "substr" => format!("SUBSTRING({} FROM {} FOR {})", args[0], args[1], args[2]),
            "current_date" => "CURRENT_DATE".to_string(),
            "current_timestamp" => "CURRENT_TIMESTAMP".to_string(),
            _ => format!("{}({})", name.to_uppercase(), args.join(", ")),
        };
        Some(sql)
    }
}
