//! Pattern grammar configuration
//!
//! The three grammar tokens (segment delimiter, variable markers and the
//! wildcard) are owned by a [`MuxConfig`] value handed to the parser and the
//! dispatcher at construction time. Two muxes with different tokens can live
//! in the same process without affecting each other.

use crate::error::ConfigError;

/// Tokens that make up the path pattern grammar.
///
/// # Example
///
/// ```
/// use route_mux::MuxConfig;
///
/// let config = MuxConfig::new().variable_markers("{", "}");
/// assert!(config.validate().is_ok());
/// assert_eq!(config.variable_open, "{");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxConfig {
    /// Separator between path segments (default `/`)
    pub delimiter: String,
    /// Opening marker of a variable segment (default `<<`)
    pub variable_open: String,
    /// Closing marker of a variable segment (default `>>`)
    pub variable_close: String,
    /// Terminal wildcard token, also the key wildcard captures are stored under (default `*`)
    pub wildcard: String,
    /// Percent-decode request path pieces before matching (default `false`)
    pub percent_decode: bool,
}

impl MuxConfig {
    pub const DEFAULT_DELIMITER: &'static str = "/";
    pub const DEFAULT_VARIABLE_OPEN: &'static str = "<<";
    pub const DEFAULT_VARIABLE_CLOSE: &'static str = ">>";
    pub const DEFAULT_WILDCARD: &'static str = "*";

    /// Create a configuration with the conventional tokens
    pub fn new() -> Self {
        Self {
            delimiter: Self::DEFAULT_DELIMITER.to_string(),
            variable_open: Self::DEFAULT_VARIABLE_OPEN.to_string(),
            variable_close: Self::DEFAULT_VARIABLE_CLOSE.to_string(),
            wildcard: Self::DEFAULT_WILDCARD.to_string(),
            percent_decode: false,
        }
    }

    /// Set the segment delimiter
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the variable open/close markers
    pub fn variable_markers(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.variable_open = open.into();
        self.variable_close = close.into();
        self
    }

    /// Set the wildcard token
    pub fn wildcard(mut self, wildcard: impl Into<String>) -> Self {
        self.wildcard = wildcard.into();
        self
    }

    /// Enable or disable percent-decoding of request path pieces
    pub fn percent_decode(mut self, enabled: bool) -> Self {
        self.percent_decode = enabled;
        self
    }

    /// Check that the tokens form an unambiguous grammar.
    ///
    /// # Validation Rules
    ///
    /// - No token may be empty
    /// - The wildcard may not equal the delimiter or either variable marker
    /// - The delimiter may not occur inside a marker or the wildcard, since
    ///   splitting would tear those tokens apart
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tokens = [
            ("delimiter", &self.delimiter),
            ("variable_open", &self.variable_open),
            ("variable_close", &self.variable_close),
            ("wildcard", &self.wildcard),
        ];
        for (name, token) in tokens {
            if token.is_empty() {
                return Err(ConfigError::EmptyToken(name));
            }
        }

        if self.wildcard == self.delimiter {
            return Err(ConfigError::Conflict(format!(
                "wildcard '{}' equals the delimiter",
                self.wildcard
            )));
        }

        if self.wildcard == self.variable_open || self.wildcard == self.variable_close {
            return Err(ConfigError::Conflict(format!(
                "wildcard '{}' equals a variable marker",
                self.wildcard
            )));
        }

        for (name, token) in &tokens[1..] {
            if token.contains(self.delimiter.as_str()) {
                return Err(ConfigError::Conflict(format!(
                    "{} '{}' contains the delimiter '{}'",
                    name, token, self.delimiter
                )));
            }
        }

        Ok(())
    }
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tokens() {
        let config = MuxConfig::default();
        assert_eq!(config.delimiter, "/");
        assert_eq!(config.variable_open, "<<");
        assert_eq!(config.variable_close, ">>");
        assert_eq!(config.wildcard, "*");
        assert!(!config.percent_decode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = MuxConfig::new()
            .delimiter(".")
            .variable_markers("{", "}")
            .wildcard("**")
            .percent_decode(true);

        assert_eq!(config.delimiter, ".");
        assert_eq!(config.variable_open, "{");
        assert_eq!(config.wildcard, "**");
        assert!(config.percent_decode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_token_rejected() {
        let result = MuxConfig::new().wildcard("").validate();
        assert!(matches!(result, Err(ConfigError::EmptyToken("wildcard"))));

        let result = MuxConfig::new().delimiter("").validate();
        assert!(matches!(result, Err(ConfigError::EmptyToken("delimiter"))));
    }

    #[test]
    fn test_wildcard_equal_to_delimiter_rejected() {
        let result = MuxConfig::new().wildcard("/").validate();
        assert!(matches!(result, Err(ConfigError::Conflict(_))));
    }

    #[test]
    fn test_wildcard_equal_to_marker_rejected() {
        let result = MuxConfig::new().wildcard("<<").validate();
        assert!(matches!(result, Err(ConfigError::Conflict(_))));
    }

    #[test]
    fn test_delimiter_inside_marker_rejected() {
        let result = MuxConfig::new().variable_markers("</", ">").validate();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("variable_open"));
    }
}
