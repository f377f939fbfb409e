//! Command completion tags.

use std::fmt;

/// The completion tag PostgreSQL sends after a command, such as
/// `UPDATE 1` or `INSERT 0 3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandTag(String);

impl CommandTag {
    /// Build a tag for `operation` affecting `rows` rows.
    ///
    /// `INSERT` tags carry the legacy OID field, which is always `0`.
    ///
    /// ```rust
    /// use pgmock::CommandTag;
    ///
    /// assert_eq!(CommandTag::new("UPDATE", 1).to_string(), "UPDATE 1");
    /// assert_eq!(CommandTag::new("INSERT", 1).to_string(), "INSERT 0 1");
    /// ```
    pub fn new(operation: &str, rows: u64) -> Self {
        let operation = operation.trim().to_ascii_uppercase();
        if operation == "INSERT" {
            Self(format!("INSERT 0 {rows}"))
        } else {
            Self(format!("{operation} {rows}"))
        }
    }

    /// Wrap a raw tag string as returned by a server.
    pub fn from_raw(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Number of rows the command affected, taken from the last field.
    #[must_use]
    pub fn rows_affected(&self) -> u64 {
        self.0
            .rsplit(' ')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }

    /// The command keyword(s), for example `UPDATE` or `SELECT`.
    #[must_use]
    pub fn operation(&self) -> &str {
        let mut end = 0;
        for part in self.0.split(' ') {
            if part.parse::<u64>().is_ok() {
                break;
            }
            end += part.len() + 1;
        }
        &self.0[..end.saturating_sub(1).min(self.0.len())]
    }

    /// Check if this is an `INSERT` tag.
    #[must_use]
    pub fn is_insert(&self) -> bool {
        self.0.starts_with("INSERT")
    }

    /// Check if this is an `UPDATE` tag.
    #[must_use]
    pub fn is_update(&self) -> bool {
        self.0.starts_with("UPDATE")
    }

    /// Check if this is a `DELETE` tag.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.0.starts_with("DELETE")
    }

    /// Check if this is a `SELECT` tag.
    #[must_use]
    pub fn is_select(&self) -> bool {
        self.0.starts_with("SELECT")
    }

    /// The tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
