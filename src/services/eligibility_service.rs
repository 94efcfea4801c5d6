use std::{collections::HashMap, sync::Arc};

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{exam::MAX_LEVEL, ExamDefinition, ProgressRecord, ResolvedExam},
        dto::response::EligibleExam,
    },
    repositories::{CatalogRepository, ProgressRepository},
};

/// Level gating: level 1 is open to everyone, level N needs a pass on level N-1
/// of the same subject and subtopic.
pub struct EligibilityService {
    catalog: Arc<dyn CatalogRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl EligibilityService {
    pub fn new(catalog: Arc<dyn CatalogRepository>, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { catalog, progress }
    }

    /// Looks an active exam up by code and checks the user may take it.
    pub async fn resolve_exam(&self, user_id: &str, exam_code: &str) -> AppResult<ResolvedExam> {
        let exam = self
            .catalog
            .find_exam_by_code(exam_code)
            .await?
            .filter(ExamDefinition::is_active)
            .ok_or_else(|| AppError::NotFound(format!("Exam '{}' not found", exam_code)))?;

        self.check_level(user_id, &exam).await?;
        self.with_names(exam).await
    }

    pub async fn check_level(&self, user_id: &str, exam: &ExamDefinition) -> AppResult<()> {
        if !exam.has_valid_level() {
            return Err(AppError::InternalError(format!(
                "Exam '{}' has invalid level {}",
                exam.exam_code, exam.level
            )));
        }

        let Some(required) = exam.prerequisite_level() else {
            return Ok(());
        };

        let passed = self
            .progress
            .has_passed(user_id, &exam.subject_id, &exam.subtopic_id, required)
            .await?;
        if !passed {
            log::warn!(
                "User {} is not eligible for exam {} (level {} not passed)",
                user_id,
                exam.exam_code,
                required
            );
            return Err(AppError::Ineligible(format!(
                "Level {} must be passed before attempting level {}",
                required, exam.level
            )));
        }
        Ok(())
    }

    async fn with_names(&self, exam: ExamDefinition) -> AppResult<ResolvedExam> {
        let subject = self.catalog.find_subject(&exam.subject_id).await?;
        let subtopic_name = subject
            .as_ref()
            .and_then(|s| s.subtopic_name(&exam.subtopic_id))
            .map(str::to_string);

        Ok(ResolvedExam {
            subject_name: subject.map(|s| s.name),
            subtopic_name,
            exam,
        })
    }

    /// Active exams the user can start right now, one level per subtopic.
    pub async fn eligible_exams(&self, user_id: &str) -> AppResult<Vec<EligibleExam>> {
        let passed = self.progress.list_passed(user_id).await?;
        let highest = highest_passed_levels(&passed);
        let subjects = self.catalog.list_subjects().await?;

        let mut eligible = Vec::new();
        for subject in &subjects {
            for subtopic in &subject.subtopics {
                let key = (subject.id.as_str(), subtopic.id.as_str());
                let Some(level) = next_level(highest.get(&key).copied()) else {
                    continue;
                };

                let exams = self
                    .catalog
                    .list_active_exams(&subject.id, &subtopic.id, level)
                    .await?;
                eligible.extend(exams.into_iter().map(|exam| EligibleExam {
                    exam_id: exam.id,
                    exam_code: exam.exam_code,
                    subject_id: subject.id.clone(),
                    subject_name: Some(subject.name.clone()),
                    subtopic_id: subtopic.id.clone(),
                    subtopic_name: Some(subtopic.name.clone()),
                    level: exam.level,
                    pass_percentage: exam.pass_percentage,
                    question_count: exam.question_ids.len(),
                }));
            }
        }
        Ok(eligible)
    }
}

fn highest_passed_levels(records: &[ProgressRecord]) -> HashMap<(&str, &str), u8> {
    let mut highest = HashMap::new();
    for record in records.iter().filter(|r| r.pass) {
        let entry = highest
            .entry((record.subject_id.as_str(), record.subtopic_id.as_str()))
            .or_insert(0);
        *entry = (*entry).max(record.level);
    }
    highest
}

fn next_level(highest_passed: Option<u8>) -> Option<u8> {
    let next = highest_passed.unwrap_or(0) + 1;
    (next <= MAX_LEVEL).then_some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_level_starts_at_one_and_stops_after_four() {
        assert_eq!(next_level(None), Some(1));
        assert_eq!(next_level(Some(2)), Some(3));
        assert_eq!(next_level(Some(4)), None);
    }

    #[test]
    fn highest_level_is_tracked_per_subtopic() {
        let records = vec![
            ProgressRecord::passed("u", "math", "algebra", 1),
            ProgressRecord::passed("u", "math", "algebra", 2),
            ProgressRecord::passed("u", "math", "geometry", 1),
        ];

        let highest = highest_passed_levels(&records);

        assert_eq!(highest.get(&("math", "algebra")), Some(&2));
        assert_eq!(highest.get(&("math", "geometry")), Some(&1));
        assert_eq!(highest.get(&("science", "physics")), None);
    }

    #[test]
    fn failed_records_do_not_unlock_levels() {
        let mut record = ProgressRecord::passed("u", "math", "algebra", 3);
        record.pass = false;

        assert!(highest_passed_levels(&[record]).is_empty());
    }
}
