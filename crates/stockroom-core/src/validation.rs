//! # Validation Module
//!
//! Input validation and fail-closed parsing for Stockroom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (apps/server)                                   │
//! │  ├── Deserialization                                                   │
//! │  └── THIS MODULE: parse quantities, trim and bound text                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Sale planning (sale.rs)                                      │
//! │  └── THIS MODULE again: quantity must be positive                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0) on products                                 │
//! │  ├── CHECK (quantity > 0) on sales_history                             │
//! │  └── UNIQUE username                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{parse_quantity, validate_code};
//!
//! assert_eq!(parse_quantity(" 5 ").unwrap(), 5);
//! assert!(parse_quantity("five").is_err());
//! assert!(parse_quantity("-1").is_err());
//!
//! assert_eq!(validate_code(" 4006381333931 ").unwrap(), "4006381333931");
//! ```

use crate::error::ValidationError;
use crate::MAX_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// File extensions accepted for product images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale or return quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level entered on a product form.
///
/// ## Rules
/// - Zero is allowed (sold out)
/// - Must not be negative or exceed MAX_QUANTITY
pub fn validate_stock(qty: i64) -> ValidationResult<()> {
    if !(0..=MAX_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Parses a textual quantity for a sale or return.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Client sends "quantity": "3"                                           │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  parse_quantity("3") ← THIS FUNCTION                                    │
/// │       │                                                                 │
/// │       ├── empty?            → Required                                  │
/// │       ├── "3.5", "abc"?     → InvalidFormat                             │
/// │       ├── "0", "-2"?        → MustBePositive                            │
/// │       ├── > MAX_QUANTITY?   → OutOfRange                                │
/// │       │                                                                 │
/// │       └── OK(3) → forwarded to the sale processor                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn parse_quantity(raw: &str) -> ValidationResult<i64> {
    let qty = parse_whole_number(raw)?;
    validate_quantity(qty)?;
    Ok(qty)
}

/// Parses a textual stock level (zero allowed).
pub fn parse_stock(raw: &str) -> ValidationResult<i64> {
    let qty = parse_whole_number(raw)?;
    validate_stock(qty)?;
    Ok(qty)
}

/// Parses a textual quantity without range checks.
///
/// Returns keep zero and negative values so the processor can report them
/// as an invalid return quantity.
pub fn parse_whole_number(raw: &str) -> ValidationResult<i64> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: "quantity".to_string(),
        });
    }

    raw.parse::<i64>().map_err(|_| ValidationError::InvalidFormat {
        field: "quantity".to_string(),
        reason: "must be a whole number".to_string(),
    })
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a scanned or typed barcode/QR code for preview.
///
/// ## Returns
/// The trimmed code.
pub fn validate_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 128,
        });
    }

    Ok(code.to_string())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    required_text("name", name, 200)
}

/// Validates a category segment.
pub fn validate_category(category: &str) -> ValidationResult<String> {
    required_text("category", category, 64)
}

/// Trims an optional text field; blank becomes `None`.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(Some(value.to_string()))
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query, or `None` when blank (list everything).
pub fn validate_search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    optional_text("search", query, 100)
}

/// Validates a username.
///
/// ## Rules
/// - 3 to 32 characters
/// - ASCII letters, digits, hyphens, underscores
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }

    if username.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 32,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(username.to_string())
}

/// Validates a new password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < 5 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 5,
        });
    }

    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

/// Reduces an uploaded file name to a safe basename.
///
/// ## Rules
/// - Directory components are dropped (`../../etc/passwd` → `passwd`)
/// - Spaces become `_`; anything outside `[A-Za-z0-9._-]` is removed
/// - Leading dots are stripped
/// - Extension must be one of [`IMAGE_EXTENSIONS`]
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::sanitize_image_filename;
///
/// assert_eq!(sanitize_image_filename("../My Photo.JPG").unwrap(), "My_Photo.JPG");
/// assert!(sanitize_image_filename("script.sh").is_err());
/// ```
pub fn sanitize_image_filename(filename: &str) -> ValidationResult<String> {
    let basename = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = basename
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return Err(ValidationError::Required {
            field: "image".to_string(),
        });
    }

    if cleaned.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "image".to_string(),
            max: 100,
        });
    }

    let extension = cleaned
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationError::NotAllowed {
            field: "image extension".to_string(),
            allowed: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        });
    }

    Ok(cleaned.to_string())
}

fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
