use crate::{
    auth::Claims,
    errors::{AppError, AppResult},
};

/// Evaluators and admins only.
pub fn require_staff(claims: &Claims) -> AppResult<()> {
    if !claims.role.is_staff() {
        return Err(AppError::Forbidden(
            "Only evaluators and admins can perform this action".to_string(),
        ));
    }
    Ok(())
}

/// Students may only act on their own attempts; staff may act on anyone's.
pub fn require_self_or_staff(claims: &Claims, user_id: &str) -> AppResult<()> {
    if !claims.role.is_staff() && claims.sub != user_id {
        return Err(AppError::Forbidden(
            "You can only access your own exam attempts".to_string(),
        ));
    }
    Ok(())
}
