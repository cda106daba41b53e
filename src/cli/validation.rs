use crate::cli::errors::{CliError, CliResult};
use crate::extract::validate_page_url;

/// Only http and https pages can be fetched
pub fn validate_url(url: &str) -> CliResult<()> {
    if url.trim().is_empty() {
        return Err(CliError::validation("url", "URL cannot be empty"));
    }

    validate_page_url(url)
        .map(|_| ())
        .map_err(|err| CliError::validation("url", err.to_string()))
}

pub fn validate_non_empty(field: &str, value: &str) -> CliResult<()> {
    if value.trim().is_empty() {
        return Err(CliError::validation(field, format!("{field} cannot be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/a").is_ok());
        assert!(validate_url("http://localhost:8000").is_ok());
        assert!(validate_url("").is_err());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("query", "rust").is_ok());
        let err = validate_non_empty("query", "   ").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: query: query cannot be empty");
    }
}
