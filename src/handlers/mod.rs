pub mod config_handler;
pub mod exam_handler;
pub mod health_handler;
pub mod submission_handler;

use actix_web::web;

use crate::auth::AuthMiddleware;

/// Authenticated routes under `/api`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(AuthMiddleware)
            .service(exam_handler::start_exam)
            .service(exam_handler::submit_exam)
            .service(exam_handler::eligible_exams)
            .service(submission_handler::all_passed_submissions)
            .service(submission_handler::all_previous_attempts)
            .service(submission_handler::passed_submissions)
            .service(submission_handler::previous_attempts)
            .service(submission_handler::get_submission)
            .service(submission_handler::add_review)
            .service(submission_handler::update_review)
            .service(submission_handler::delete_review)
            .service(config_handler::get_marks)
            .service(config_handler::get_durations),
    );
}

pub fn configure_health(cfg: &mut web::ServiceConfig) {
    cfg.service(health_handler::health)
        .service(health_handler::live)
        .service(health_handler::ready);
}
