use serde_json::Value;

use crate::server::response::ApiError;

const MAX_USERNAME_LEN: usize = 150;
const MAX_PROJECT_NAME_LEN: usize = 50;
const MAX_DOC_NAME_LEN: usize = 50;
const MAX_TAG_NAME_LEN: usize = 32;

fn validate_title(name: &str, entity: &str, max_len: usize) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err(format!("{entity} name cannot be empty"));
    }
    if name.chars().count() > max_len {
        return Err(format!("{entity} name cannot exceed {max_len} characters"));
    }
    if name.chars().any(char::is_control) {
        return Err(format!("{entity} name cannot contain control characters"));
    }
    Ok(())
}

/// Usernames appear inside restricted-list allowlists, so separators and
/// whitespace are kept out of them.
pub fn validate_username(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if name.len() > MAX_USERNAME_LEN {
        return Err(format!(
            "Username cannot exceed {MAX_USERNAME_LEN} characters"
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '+'))
    {
        return Err(
            "Username can only contain alphanumeric characters and - _ . @ +".to_string(),
        );
    }
    Ok(())
}

pub fn validate_project_name(name: &str) -> Result<(), ApiError> {
    validate_title(name, "Project", MAX_PROJECT_NAME_LEN).map_err(ApiError::bad_request)
}

pub fn validate_doc_name(name: &str) -> Result<(), ApiError> {
    validate_title(name, "Doc", MAX_DOC_NAME_LEN).map_err(ApiError::bad_request)
}

/// Reads a tag payload: a JSON list of strings.
pub fn tag_names(payload: &Value) -> Result<Vec<String>, ApiError> {
    let items = payload
        .as_array()
        .ok_or_else(|| ApiError::bad_request("tags must be a list"))?;

    items
        .iter()
        .map(|item| {
            let name = item
                .as_str()
                .ok_or_else(|| ApiError::bad_request("tags must be strings"))?;
            if name.trim().chars().count() > MAX_TAG_NAME_LEN {
                return Err(ApiError::bad_request(format!(
                    "Tag name cannot exceed {MAX_TAG_NAME_LEN} characters"
                )));
            }
            Ok(name.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.b-c_d@x").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("alice,bob").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_validate_titles() {
        assert!(validate_project_name("Team handbook").is_ok());
        assert!(validate_project_name("   ").is_err());
        assert!(validate_doc_name(&"x".repeat(51)).is_err());
        assert!(validate_doc_name("line\nbreak").is_err());
    }

    #[test]
    fn test_tag_names() {
        assert_eq!(
            tag_names(&json!(["a", " b "])).unwrap(),
            vec!["a".to_string(), " b ".to_string()]
        );
        assert!(tag_names(&json!("a,b")).is_err());
        assert!(tag_names(&json!([1, 2])).is_err());
        assert!(tag_names(&json!(["x".repeat(33)])).is_err());
    }
}
