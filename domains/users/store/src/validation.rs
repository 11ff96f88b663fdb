use user_errors::UserError;
use user_models::UserPayload;

/// Checks a create/update payload before it reaches storage.
pub fn validate_user(payload: &UserPayload) -> Result<(), UserError> {
    if payload.name.trim().is_empty() {
        return Err(UserError::validation("name must not be empty"));
    }

    let email = payload.email.trim();
    if email.is_empty() {
        return Err(UserError::validation("email must not be empty"));
    }
    if !email.contains('@') {
        return Err(UserError::validation("email must contain '@'"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_payload() {
        assert!(validate_user(&UserPayload::new("Jane", "jane@x.com")).is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = validate_user(&UserPayload::new("   ", "jane@x.com"))
            .unwrap_err();
        assert!(matches!(err, UserError::ValidationFailed(_)));
    }

    #[test]
    fn test_bad_email_rejected() {
        assert!(validate_user(&UserPayload::new("Jane", "")).is_err());
        assert!(validate_user(&UserPayload::new("Jane", "jane.x.com")).is_err());
    }
}
