//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Tenant-Scoped Repositories                           │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.catalog(&tenant).list_by_category("drinks", None)          │
//! │       ▼                                                                 │
//! │  CatalogRepository { pool, tenant }                                    │
//! │       │                                                                 │
//! │       │  SELECT ... WHERE owner = <tenant> AND ...                     │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Every statement carries the owner filter, so a repository built for   │
//! │  one tenant can never read or write another tenant's rows.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository also exposes connection-level helpers (`pub(crate)`) so
//! the sale processor can run the same statements inside one transaction.
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Product CRUD, search, code lookup
//! - [`ledger::LedgerRepository`] - Sale records and history
//! - [`users::UserRepository`] - Accounts and roles

pub mod catalog;
pub mod ledger;
pub mod users;

/// Escapes `%`, `_` and `\` so user input matches literally inside
/// `LIKE ... ESCAPE '\'`.
pub(crate) fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
