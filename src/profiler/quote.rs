use std::fmt;

use serde::Deserialize;

// ─── Bindings ────────────────────────────────────────────────────

/// A parameter value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl Binding {
    /// Textual form handed to the driver's quoter. `None` for `NULL`,
    /// which is displayed bare rather than quoted.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_owned()),
            Self::Int(v) => Some(v.to_string()),
            Self::UInt(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }

    /// Display-safe SQL literal for this value.
    pub fn to_sql<Q: Quote + ?Sized>(&self, quoter: &Q) -> String {
        match self.as_text() {
            Some(text) => quoter.quote(&text),
            None => "NULL".to_owned(),
        }
    }
}

impl From<&str> for Binding {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Binding {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&String> for Binding {
    fn from(v: &String) -> Self {
        Self::Text(v.clone())
    }
}

impl From<bool> for Binding {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for Binding {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Binding {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

macro_rules! signed_binding {
    ($($t:ty),*) => {$(
        impl From<$t> for Binding {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        }
    )*};
}

macro_rules! unsigned_binding {
    ($($t:ty),*) => {$(
        impl From<$t> for Binding {
            fn from(v: $t) -> Self {
                Self::UInt(u64::from(v))
            }
        }
    )*};
}

signed_binding!(i8, i16, i32, i64);
unsigned_binding!(u8, u16, u32, u64);

impl<T: Into<Binding>> From<Option<T>> for Binding {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ─── Driver quoting ──────────────────────────────────────────────

/// The database driver's string-literal quoting capability.
pub trait Quote {
    fn quote(&self, value: &str) -> String;

    /// Whether `\` escapes the next character inside a string literal.
    fn backslash_escapes(&self) -> bool {
        false
    }
}

/// Quoting rules of the supported database drivers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
    #[serde(rename = "mysql")]
    MySql,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Quote for Dialect {
    fn backslash_escapes(&self) -> bool {
        matches!(self, Self::MySql)
    }

    fn quote(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        match self {
            Self::Sqlite | Self::Postgres => {
                for ch in value.chars() {
                    if ch == '\'' {
                        out.push('\'');
                    }
                    out.push(ch);
                }
            }
            Self::MySql => {
                for ch in value.chars() {
                    match ch {
                        '\\' => out.push_str("\\\\"),
                        '\'' => out.push_str("\\'"),
                        '"' => out.push_str("\\\""),
                        '\0' => out.push_str("\\0"),
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        '\x1a' => out.push_str("\\Z"),
                        _ => out.push(ch),
                    }
                }
            }
        }
        out.push('\'');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_quoting_doubles_single_quotes() {
        assert_eq!(Dialect::Sqlite.quote("O'Brien"), "'O''Brien'");
        assert_eq!(Dialect::Postgres.quote("a\\b"), "'a\\b'");
    }

    #[test]
    fn mysql_quoting_uses_backslashes() {
        assert_eq!(Dialect::MySql.quote("O'Brien"), "'O\\'Brien'");
        assert_eq!(Dialect::MySql.quote("a\\b\n"), "'a\\\\b\\n'");
    }

    #[test]
    fn only_mysql_treats_backslash_as_escape() {
        assert!(Dialect::MySql.backslash_escapes());
        assert!(!Dialect::Sqlite.backslash_escapes());
        assert!(!Dialect::Postgres.backslash_escapes());
    }

    #[test]
    fn scalars_are_quoted_as_text() {
        assert_eq!(Binding::from(5).to_sql(&Dialect::Sqlite), "'5'");
        assert_eq!(Binding::from(true).to_sql(&Dialect::Sqlite), "'1'");
        assert_eq!(Binding::from(1.5).to_sql(&Dialect::Sqlite), "'1.5'");
    }

    #[test]
    fn null_is_bare() {
        assert_eq!(Binding::from(None::<i32>).to_sql(&Dialect::MySql), "NULL");
        assert_eq!(Binding::from(Some("x")).to_sql(&Dialect::MySql), "'x'");
    }
}
