use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{require_self_or_staff, require_staff, AuthenticatedUser},
    errors::AppError,
    models::{
        domain::{Submission, UserRole},
        dto::{
            request::ReviewRequest,
            response::{ApiResponse, SubmissionSummary},
        },
    },
};

fn summaries(submissions: Vec<Submission>) -> Vec<SubmissionSummary> {
    submissions.into_iter().map(SubmissionSummary::from).collect()
}

#[get("/submissions/passed")]
pub async fn all_passed_submissions(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(auth.claims())?;

    let submissions = state.submission_service.all_passed_submissions().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(summaries(submissions), "Passed exams")))
}

#[get("/submissions/previous-attempts")]
pub async fn all_previous_attempts(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(auth.claims())?;

    let submissions = state.submission_service.all_previous_attempts().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(summaries(submissions), "Previous attempts")))
}

#[get("/submissions/passed/{user_id}")]
pub async fn passed_submissions(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_self_or_staff(auth.claims(), &user_id)?;

    let submissions = state.submission_service.passed_submissions(&user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(summaries(submissions), "Passed exams")))
}

#[get("/submissions/previous-attempts/{user_id}")]
pub async fn previous_attempts(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_self_or_staff(auth.claims(), &user_id)?;

    let submissions = state.submission_service.previous_attempts(&user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(summaries(submissions), "Previous attempts")))
}

#[get("/submissions/{id}")]
pub async fn get_submission(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let submission = state.submission_service.get_submission(&id).await?;
    require_self_or_staff(auth.claims(), &submission.user_id)?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        SubmissionSummary::from(submission),
        "Submission found",
    )))
}

#[post("/submissions/{id}/reviews")]
pub async fn add_review(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<ReviewRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(auth.claims())?;

    let submission = state
        .review_service
        .add_review(&id, auth.user_id(), request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::new(
        SubmissionSummary::from(submission),
        "Review added",
    )))
}

#[put("/submissions/{id}/reviews/{review_id}")]
pub async fn update_review(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<ReviewRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(auth.claims())?;
    let (id, review_id) = path.into_inner();

    let submission = state
        .review_service
        .update_review(&id, &review_id, auth.user_id(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        SubmissionSummary::from(submission),
        "Review updated",
    )))
}

#[delete("/submissions/{id}/reviews/{review_id}")]
pub async fn delete_review(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(auth.claims())?;
    let (id, review_id) = path.into_inner();
    let is_admin = auth.claims().role == UserRole::Admin;

    let submission = state
        .review_service
        .delete_review(&id, &review_id, auth.user_id(), is_admin)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        SubmissionSummary::from(submission),
        "Review deleted",
    )))
}
