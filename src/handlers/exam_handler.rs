use actix_web::{get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{require_self_or_staff, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{StartExamRequest, SubmitExamRequest},
        response::{ApiResponse, SubmissionSummary},
    },
};

#[post("/exam/start")]
pub async fn start_exam(
    state: web::Data<AppState>,
    request: web::Json<StartExamRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    require_self_or_staff(auth.claims(), &request.user_id)?;

    let response = state.attempt_service.start_exam(request).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(response, "Exam started")))
}

#[post("/exam/submit")]
pub async fn submit_exam(
    state: web::Data<AppState>,
    request: web::Json<SubmitExamRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    require_self_or_staff(auth.claims(), &request.user_id)?;

    let submission = state.submission_service.submit_exam(request).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        SubmissionSummary::from(submission),
        "Exam submitted successfully",
    )))
}

#[get("/exam/eligible/{user_id}")]
pub async fn eligible_exams(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_self_or_staff(auth.claims(), &user_id)?;

    let exams = state.eligibility_service.eligible_exams(&user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(exams, "Eligible exams")))
}
