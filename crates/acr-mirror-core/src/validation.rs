//! Validation traits and types.
//!
//! Validation collects every failure instead of stopping at the first one.
//! Callers that want fail-fast behavior take the first entry, which is always
//! the first check that failed.

use std::fmt;

/// A single validation failure for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// A human-readable description of the validation failure.
    pub message: String,
}

impl ValidationError {
    /// Creates a new validation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use acr_mirror_core::ValidationError;
    ///
    /// let error = ValidationError::new("TargetACRResourceId", "must be a registry resource id");
    /// assert_eq!(error.field, "TargetACRResourceId");
    /// ```
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error for a required field that is missing or blank.
    pub fn required(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            message: format!("'{field}' cannot be null or empty"),
            field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error for '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// A collection of validation errors, in the order the checks ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Creates an empty validation errors collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a validation error to the collection.
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Returns true if there are no validation errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of validation errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns the first failure, which is what a fail-fast check would report.
    #[must_use]
    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    /// Returns an iterator over the validation errors.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Returns the names of every failing field.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    /// Converts to a Result, returning `Ok(())` if no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` if any errors exist in the collection.
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<T: IntoIterator<Item = ValidationError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "no validation errors"),
            [single] => write!(f, "{single}"),
            errors => {
                writeln!(f, "{} validation errors:", errors.len())?;
                for error in errors {
                    writeln!(f, "  - {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// Trait for types that can be validated.
pub trait Validate {
    /// Validates this instance and returns every failure found.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` containing all validation failures found.
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Returns true if this instance is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_required() {
        let error = ValidationError::required("SourceACRPullTokenName");
        assert_eq!(error.field, "SourceACRPullTokenName");
        assert_eq!(
            error.message,
            "'SourceACRPullTokenName' cannot be null or empty"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::new("TargetACRResourceId", "bad shape");
        let display = format!("{error}");
        assert!(display.contains("TargetACRResourceId"));
        assert!(display.contains("bad shape"));
    }

    #[test]
    fn test_validation_errors_into_result_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_validation_errors_keep_insertion_order() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::required("b"));
        errors.add(ValidationError::required("a"));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first().map(|e| e.field.as_str()), Some("b"));
        assert_eq!(errors.fields(), vec!["b", "a"]);
    }

    #[test]
    fn test_validation_errors_display_single() {
        let errors: ValidationErrors = vec![ValidationError::required("field")]
            .into_iter()
            .collect();

        let display = format!("{errors}");
        assert!(display.contains("field"));
        assert!(!display.contains("validation errors:"));
    }

    #[test]
    fn test_validation_errors_display_multiple() {
        let errors: ValidationErrors = vec![
            ValidationError::required("field1"),
            ValidationError::required("field2"),
        ]
        .into_iter()
        .collect();

        let display = format!("{errors}");
        assert!(display.contains("2 validation errors"));
        assert!(display.contains("field1"));
        assert!(display.contains("field2"));
    }
}
