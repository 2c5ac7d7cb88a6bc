use std::path::Path;

use crate::error::{Result, VendorError};

/// Largest header offset accepted for details sheets.
pub const MAX_SKIP_ROWS: usize = 50;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate an uploaded sheet path
    pub fn validate_upload_path(path: &Path, max_upload_mb: u64) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(VendorError::InvalidInput("Upload path cannot be empty".to_string()));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| VendorError::InvalidInput(format!("Cannot access upload {}: {e}", path.display())))?;

        if !metadata.is_file() {
            return Err(VendorError::InvalidInput(format!(
                "Upload is not a file: {}",
                path.display()
            )));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if extension != "csv" {
            return Err(VendorError::InvalidInput(format!(
                "Only CSV uploads are supported, got: {}",
                path.display()
            )));
        }

        let max_bytes = max_upload_mb.saturating_mul(1024 * 1024);
        if metadata.len() > max_bytes {
            return Err(VendorError::InvalidInput(format!(
                "Upload too large ({} bytes, max {max_upload_mb} MB)",
                metadata.len()
            )));
        }

        Ok(())
    }

    /// Validate a vendor name search term
    pub fn validate_search_term(term: &str) -> Result<()> {
        if term.len() > 200 {
            return Err(VendorError::InvalidInput(
                "Search term too long (max 200 characters)".to_string(),
            ));
        }

        if term.chars().any(char::is_control) {
            return Err(VendorError::InvalidInput(
                "Search term contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate the header offset for a details sheet
    pub fn validate_skip_rows(skip_rows: usize) -> Result<()> {
        if skip_rows > MAX_SKIP_ROWS {
            return Err(VendorError::InvalidInput(format!(
                "Skip rows too large (max {MAX_SKIP_ROWS})"
            )));
        }

        Ok(())
    }

    /// Validate a fuzzy-match threshold
    pub fn validate_threshold(threshold: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(VendorError::InvalidInput(
                "Fuzzy threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }

    /// Sanitize cell text
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Validate database URL
    pub fn validate_database_url(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(VendorError::InvalidConfig("Database URL cannot be empty".to_string()));
        }

        if !url.starts_with("sqlite:") {
            return Err(VendorError::InvalidConfig(
                "Only SQLite databases are supported".to_string(),
            ));
        }

        if url.len() > 1000 {
            return Err(VendorError::InvalidConfig("Database URL too long".to_string()));
        }

        Ok(())
    }
}
