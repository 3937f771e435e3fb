use std::collections::BTreeMap;

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional text field with a max length (empty is OK).
pub fn validate_optional(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate a BCP-47-ish language code: `en`, `fr-CA`, `zh-Hant`, `cmn-Hans-CN`.
pub fn validate_language_code(code: &str, field_name: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    let mut parts = trimmed.split('-');
    let primary = parts.next().unwrap_or("");
    let primary_ok = (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
    let rest_ok = parts.all(|p| (2..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()));
    if !primary_ok || !rest_ok {
        return Some(format!("{field_name} must be a language code such as 'en' or 'fr-CA'"));
    }
    None
}

/// Validate a localized map: at least one entry, every key a language code,
/// at least one non-empty value.
pub fn validate_localized(value: &BTreeMap<String, String>, field_name: &str, max_len: usize) -> Vec<String> {
    let mut errors = Vec::new();
    if value.values().all(|v| v.trim().is_empty()) {
        errors.push(format!("{field_name} is required"));
        return errors;
    }
    for (lang, text) in value {
        errors.extend(validate_language_code(lang, &format!("{field_name} language")));
        errors.extend(validate_optional(text, &format!("{field_name} ({lang})"), max_len));
    }
    errors
}
