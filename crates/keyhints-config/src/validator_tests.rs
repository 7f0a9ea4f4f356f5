use super::*;

#[test]
fn test_validate_default_settings() {
    let result = ConfigValidator::validate(&Settings::default()).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_duplicate_hint_characters() {
    let settings = Settings {
        link_hint_characters: "abca".to_string(),
        ..Settings::default()
    };
    let result = ConfigValidator::validate(&settings).unwrap();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "link_hint_characters"));
}

#[test]
fn test_validate_single_hint_character() {
    let settings = Settings {
        link_hint_numbers: "1".to_string(),
        ..Settings::default()
    };
    let result = ConfigValidator::validate(&settings).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "link_hint_numbers"));
}

#[test]
fn test_validate_search_url_without_protocol() {
    let settings = Settings {
        search_url: "www.google.com/search?q=".to_string(),
        ..Settings::default()
    };
    let result = ConfigValidator::validate(&settings).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "search_url"));
}

#[test]
fn test_validate_bad_search_engine_is_warning() {
    let settings = Settings {
        search_engines: "nocolon https://a.com/%s".to_string(),
        ..Settings::default()
    };
    let result = ConfigValidator::validate(&settings).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "search_engines"));
}

#[test]
fn test_validate_zero_max_results() {
    let mut settings = Settings::default();
    settings.completion.max_results = 0;
    let result = ConfigValidator::validate(&settings).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "completion.max_results"));
}

#[test]
fn test_validate_zero_timeouts_warn() {
    let mut settings = Settings::default();
    settings.hints.descriptor_timeout_ms = 0;
    settings.completion.request_timeout_ms = 0;
    let result = ConfigValidator::validate(&settings).unwrap();
    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 2);
}

#[test]
fn test_validation_result_default() {
    let result = ValidationResult::default();
    assert!(result.is_valid());
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validation_error_new() {
    let err = ValidationError::new("search_url", "must include a protocol");
    assert_eq!(err.path, "search_url");
    assert_eq!(err.message, "must include a protocol");
}
