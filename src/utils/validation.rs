use crate::api::error::AppError;
use std::path::Path;

/// Longest folder or file name accepted, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Validates a folder or file display name and returns it trimmed.
pub fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(AppError::InvalidName("Name cannot be empty".to_string()));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(AppError::InvalidName(format!(
            "Name exceeds {} bytes",
            MAX_NAME_LEN
        )));
    }

    if name == "." || name == ".." {
        return Err(AppError::InvalidName(format!("'{}' is reserved", name)));
    }

    if name
        .chars()
        .any(|c| c.is_control() || c == '/' || c == '\\')
    {
        tracing::warn!("Rejected name with separator or control character: {:?}", name);
        return Err(AppError::InvalidName(
            "Name cannot contain path separators or control characters".to_string(),
        ));
    }

    Ok(name.to_string())
}

/// Reduces a display name to characters safe inside a blob key.
pub fn sanitize_for_key(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = sanitized.trim_start_matches('.');
    if trimmed.is_empty() {
        "blob".to_string()
    } else {
        trimmed.chars().take(100).collect()
    }
}

/// Extension of `name` with its leading dot (".txt"), or an empty string.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}
