/// Input validators for signup and login payloads
/// 1. Length limits on every field
/// 2. Email format and phishing-style patterns
/// 3. Control characters in names
/// 4. Document-store operator injection (`$ne`, `$where`, embedded objects)

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 256;
const MAX_LOCAL_PART_LENGTH: usize = 64;
const MAX_NAME_SPECIAL_CHARS: usize = 5;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#%&'*+/=?^_`|~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref OPERATOR_PATTERNS: [Regex; 3] = [
        // Query operators: $ne, $gt, $where, $regex ...
        Regex::new(r"\$[a-zA-Z]").unwrap(),
        // Embedded documents or JSON fragments
        Regex::new(r"[{}]").unwrap(),
        // Server-side JavaScript
        Regex::new(r"(?i)\b(function\s*\(|this\.|sleep\s*\()").unwrap(),
    ];
}

/// Validates an email address and returns it trimmed and lowercased
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if contains_operator_patterns(trimmed) {
        return Err(ValidationError::PossibleInjection);
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    if has_suspicious_email_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent("email".to_string()));
    }

    Ok(trimmed.to_lowercase())
}

/// Validates a first or last name; `field` names it in the error
pub fn is_valid_name(field: &str, name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field.to_string(), MAX_NAME_LENGTH));
    }

    if has_suspicious_name_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent(field.to_string()));
    }

    if contains_operator_patterns(trimmed) {
        return Err(ValidationError::PossibleInjection);
    }

    Ok(trimmed.to_string())
}

fn has_suspicious_email_patterns(email: &str) -> bool {
    if email.matches('@').count() != 1 {
        return true;
    }

    if let Some(at_pos) = email.find('@') {
        if at_pos > MAX_LOCAL_PART_LENGTH {
            return true;
        }
    }

    email.contains('\0')
}

fn has_suspicious_name_patterns(name: &str) -> bool {
    if name.chars().any(|c| c.is_control()) {
        return true;
    }

    let special_char_count = name
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !matches!(c, '-' | '.' | '\''))
        .count();

    special_char_count > MAX_NAME_SPECIAL_CHARS
}

fn contains_operator_patterns(input: &str) -> bool {
    OPERATOR_PATTERNS.iter().any(|pattern| pattern.is_match(input))
}
