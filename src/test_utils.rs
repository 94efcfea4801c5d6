#[cfg(test)]
pub mod fixtures {
    use crate::models::domain::{
        ExamDefinition, ExamStatus, QuestionDefinition, QuestionType, User, UserRole,
    };

    /// Active algebra exam at `level` over `question_count` questions `q-0..`.
    pub fn test_exam(level: u8, question_count: usize) -> ExamDefinition {
        ExamDefinition {
            id: format!("exam-l{}", level),
            exam_code: format!("ALG000{}", level),
            subject_id: "math".to_string(),
            subtopic_id: "algebra".to_string(),
            level,
            question_ids: (0..question_count).map(|i| format!("q-{}", i)).collect(),
            pass_percentage: 90.0,
            status: ExamStatus::Active,
            shuffle_questions: false,
            created_at: None,
            modified_at: None,
        }
    }

    pub fn single_choice_question(id: &str, correct: &str) -> QuestionDefinition {
        QuestionDefinition {
            id: id.to_string(),
            question_type: QuestionType::SingleChoice,
            question_text: format!("Question {}", id),
            options: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            correct_answers: vec![correct.to_string()],
            created_at: None,
        }
    }

    /// One single-choice question per exam slot, all answered by "A".
    pub fn questions_for(exam: &ExamDefinition) -> Vec<QuestionDefinition> {
        exam.question_ids
            .iter()
            .map(|id| single_choice_question(id, "A"))
            .collect()
    }

    pub fn test_user(id: &str, role: UserRole) -> User {
        User::new(id, id, &format!("{}@example.com", id), role)
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_exam_fixture_is_consistent() {
        let exam = test_exam(2, 3);
        let questions = questions_for(&exam);

        assert!(exam.is_active());
        assert_eq!(exam.prerequisite_level(), Some(1));
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[2].id, "q-2");
    }
}
