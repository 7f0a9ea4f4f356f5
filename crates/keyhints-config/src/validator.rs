//! Settings validation.

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::schema::Settings;
use crate::search_engines::parse_search_engines;

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Settings validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the settings.
    pub fn validate(settings: &Settings) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_alphabet("link_hint_characters", &settings.link_hint_characters, &mut result);
        Self::validate_alphabet("link_hint_numbers", &settings.link_hint_numbers, &mut result);
        Self::validate_search(settings, &mut result);
        Self::validate_hints(settings, &mut result);
        Self::validate_completion(settings, &mut result);

        Ok(result)
    }

    fn validate_alphabet(path: &str, alphabet: &str, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        let mut count = 0;
        for ch in alphabet.chars() {
            count += 1;
            if !seen.insert(ch) {
                result.add_error(ValidationError::new(
                    path,
                    format!("Duplicate hint character '{}'", ch),
                ));
            }
        }
        if count < 2 {
            result.add_error(ValidationError::new(
                path,
                "At least two hint characters are required",
            ));
        }
    }

    fn validate_search(settings: &Settings, result: &mut ValidationResult) {
        if !settings.search_url.contains("://") {
            result.add_error(ValidationError::new(
                "search_url",
                "Search URL must include a protocol",
            ));
        }

        let engines = parse_search_engines(&settings.search_engines);
        for message in engines.validation_errors {
            result.add_warning(ValidationWarning::new("search_engines", message));
        }
    }

    fn validate_hints(settings: &Settings, result: &mut ValidationResult) {
        let hints = &settings.hints;
        if hints.suppression_timeout_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "hints.suppression_timeout_ms",
                "A zero failsafe lets stray keys through during activation",
            ));
        }
        if hints.descriptor_timeout_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "hints.descriptor_timeout_ms",
                "A zero timeout drops hints from every frame but the fastest",
            ));
        }
        if hints.min_rect_size < 0.0 {
            result.add_error(ValidationError::new(
                "hints.min_rect_size",
                "min_rect_size cannot be negative",
            ));
        }
    }

    fn validate_completion(settings: &Settings, result: &mut ValidationResult) {
        let completion = &settings.completion;
        if completion.max_results == 0 {
            result.add_error(ValidationError::new(
                "completion.max_results",
                "max_results must be greater than 0",
            ));
        }
        if completion.request_timeout_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "completion.request_timeout_ms",
                "A zero timeout disables completion engines",
            ));
        }
    }
}
