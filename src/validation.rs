use crate::error::ApiError;

/// Validate a game or studio display name
pub fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
    }

    if name.len() > 100 {
        return Err(ApiError::BadRequest(
            "Name must be 100 characters or less".to_string(),
        ));
    }

    // Check for HTML tags (basic security check)
    if name.contains('<') || name.contains('>') {
        return Err(ApiError::BadRequest(
            "Name cannot contain HTML tags".to_string(),
        ));
    }

    Ok(())
}

/// Validate a description field
pub fn validate_description(description: &str) -> Result<(), ApiError> {
    if description.len() > 2000 {
        return Err(ApiError::BadRequest(
            "Description must be 2000 characters or less".to_string(),
        ));
    }

    if description.contains('<') || description.contains('>') {
        return Err(ApiError::BadRequest(
            "Description cannot contain HTML tags".to_string(),
        ));
    }

    Ok(())
}

/// Validate a username (alphanumeric + dash + underscore + dot only)
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }

    if username.len() > 40 {
        return Err(ApiError::BadRequest(
            "Username must be 40 characters or less".to_string(),
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ApiError::BadRequest(
            "Username must contain only alphanumeric characters, dashes, underscores, and dots"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate a password for account creation or change
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::BadRequest("Password cannot be empty".to_string()));
    }

    Ok(())
}

/// Validate the owning studio reference on a game
pub fn validate_owner(owned_by: &str) -> Result<(), ApiError> {
    if owned_by.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Owning studio cannot be empty".to_string(),
        ));
    }

    Ok(())
}
