//! Named prepared statement registry.
//!
//! ## Lifecycle
//!
//! 1. `prepare(name, sql)` matches a prepare expectation and registers the
//!    statement under `name`
//! 2. Executing or querying with `name` as the statement text resolves to
//!    the registered SQL
//! 3. `deallocate(name)` removes one registration, `deallocate_all()`
//!    removes every registration
//! 4. Closing the connection drops the registry with it
//!
//! Preparing a name that is already registered replaces the previous
//! statement, as PostgreSQL does once the old one is deallocated.

use std::collections::HashMap;
use std::time::Instant;

/// A prepared statement registered on a mock connection.
#[derive(Debug, Clone)]
pub struct StatementDescription {
    name: String,
    sql: String,
    created_at: Instant,
}

impl StatementDescription {
    /// Create a new statement description.
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            created_at: Instant::now(),
        }
    }

    /// Get the statement name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Get the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}

/// Prepared statements of one connection, keyed by name.
#[derive(Debug, Default)]
pub struct StatementRegistry {
    statements: HashMap<String, StatementDescription>,
}

impl StatementRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a statement by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StatementDescription> {
        self.statements.get(name)
    }

    /// Register a statement, returning the one it replaced.
    pub fn insert(&mut self, stmt: StatementDescription) -> Option<StatementDescription> {
        tracing::trace!(name = %stmt.name, sql = %stmt.sql, "registering prepared statement");
        self.statements.insert(stmt.name.clone(), stmt)
    }

    /// Remove a statement by name.
    pub fn remove(&mut self, name: &str) -> Option<StatementDescription> {
        let removed = self.statements.remove(name);
        if removed.is_some() {
            tracing::trace!(name, "deallocated prepared statement");
        }
        removed
    }

    /// Remove every statement, returning them.
    pub fn clear(&mut self) -> impl Iterator<Item = StatementDescription> + '_ {
        tracing::trace!(count = self.statements.len(), "deallocating all prepared statements");
        self.statements.drain().map(|(_, stmt)| stmt)
    }

    /// Get the number of registered statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Check if no statements are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_insert_and_get() {
        let mut registry = StatementRegistry::new();
        assert!(registry.is_empty());

        let old = registry.insert(StatementDescription::new("balance_stmt", "UPDATE users"));
        assert!(old.is_none());
        assert_eq!(registry.get("balance_stmt").map(|s| s.sql()), Some("UPDATE users"));
        assert!(registry.get("order_stmt").is_none());
    }

    #[test]
    fn test_registry_replace() {
        let mut registry = StatementRegistry::new();
        registry.insert(StatementDescription::new("s", "SELECT 1"));
        let old = registry.insert(StatementDescription::new("s", "SELECT 2"));
        assert_eq!(old.map(|s| s.sql().to_string()), Some("SELECT 1".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_remove_and_clear() {
        let mut registry = StatementRegistry::new();
        registry.insert(StatementDescription::new("a", "SELECT 1"));
        registry.insert(StatementDescription::new("b", "SELECT 2"));

        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());

        let cleared: Vec<_> = registry.clear().collect();
        assert_eq!(cleared.len(), 1);
        assert!(registry.is_empty());
    }
}
