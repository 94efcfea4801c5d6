use actix_web::{get, web, HttpResponse};

use crate::{
    app_state::AppState, auth::AuthenticatedUser, errors::AppError,
    models::dto::response::ApiResponse,
};

#[get("/config/marks")]
pub async fn get_marks(
    state: web::Data<AppState>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let marks = state.catalog.scoring_config().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(marks, "Marks configuration")))
}

#[get("/config/durations")]
pub async fn get_durations(
    state: web::Data<AppState>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let durations = state
        .catalog
        .duration_config()
        .await?
        .ok_or_else(|| AppError::NotFound("Duration configuration not found".to_string()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(durations, "Duration configuration")))
}
