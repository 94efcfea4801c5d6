//! Per-question grading.
//!
//! Every question type produces one [`Evaluation`]; both the stored label
//! ([`classify`]) and the numeric mark ([`score`]) are read off it, so the two can
//! never disagree about a single answer.

use std::collections::HashSet;

use crate::models::domain::{AnswerStatus, LevelMarks, QuestionType, StudentAnswer};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub status: AnswerStatus,
    /// Share of the positive mark earned, in [0, 1].
    pub credit: f64,
    /// Whether the negative mark applies instead of any credit.
    pub penalised: bool,
}

impl Evaluation {
    fn skipped() -> Self {
        Self {
            status: AnswerStatus::Skipped,
            credit: 0.0,
            penalised: false,
        }
    }

    fn all_or_nothing(correct: bool, penalise_wrong: bool) -> Self {
        if correct {
            Self {
                status: AnswerStatus::Correct,
                credit: 1.0,
                penalised: false,
            }
        } else {
            Self {
                status: AnswerStatus::Incorrect,
                credit: 0.0,
                penalised: penalise_wrong,
            }
        }
    }

    fn proportional(hits: usize, total: usize) -> Self {
        if hits == 0 || total == 0 {
            return Self::all_or_nothing(false, false);
        }
        if hits >= total {
            return Self::all_or_nothing(true, false);
        }
        Self {
            status: AnswerStatus::PartiallyCorrect,
            credit: hits as f64 / total as f64,
            penalised: false,
        }
    }

    pub fn mark(&self, marks: LevelMarks) -> f64 {
        if self.penalised {
            -marks.negative
        } else {
            self.credit * marks.positive
        }
    }
}

pub fn evaluate(
    question_type: QuestionType,
    correct_answers: &[String],
    answer: Option<&StudentAnswer>,
) -> Evaluation {
    let answer = match answer {
        Some(answer) if !answer.is_blank() => answer,
        _ => return Evaluation::skipped(),
    };

    match question_type {
        QuestionType::SingleChoice => single_choice(correct_answers, answer),
        QuestionType::FillBlank => fill_blank(correct_answers, answer),
        QuestionType::MultiChoice => multi_choice(correct_answers, answer),
        QuestionType::ShortAnswer => short_answer(correct_answers, answer),
    }
}

pub fn classify(
    question_type: QuestionType,
    correct_answers: &[String],
    answer: Option<&StudentAnswer>,
) -> AnswerStatus {
    evaluate(question_type, correct_answers, answer).status
}

pub fn score(
    question_type: QuestionType,
    correct_answers: &[String],
    answer: Option<&StudentAnswer>,
    marks: LevelMarks,
) -> f64 {
    evaluate(question_type, correct_answers, answer).mark(marks)
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn without_whitespace(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

fn single_choice(correct_answers: &[String], answer: &StudentAnswer) -> Evaluation {
    let is_correct = answer.as_text().is_some_and(|text| {
        let picked = normalize(text);
        correct_answers.iter().any(|c| normalize(c) == picked)
    });
    Evaluation::all_or_nothing(is_correct, true)
}

fn fill_blank(correct_answers: &[String], answer: &StudentAnswer) -> Evaluation {
    let is_correct = answer.as_text().is_some_and(|text| {
        let written = without_whitespace(text);
        correct_answers.iter().any(|c| without_whitespace(c) == written)
    });
    Evaluation::all_or_nothing(is_correct, false)
}

fn multi_choice(correct_answers: &[String], answer: &StudentAnswer) -> Evaluation {
    let correct: HashSet<String> = correct_answers.iter().map(|c| normalize(c)).collect();
    let picked: HashSet<String> = answer
        .choices()
        .into_iter()
        .map(normalize)
        .filter(|c| !c.is_empty())
        .collect();

    if picked.iter().any(|p| !correct.contains(p)) {
        return Evaluation::all_or_nothing(false, false);
    }
    Evaluation::proportional(picked.len(), correct.len())
}

fn short_answer(correct_answers: &[String], answer: &StudentAnswer) -> Evaluation {
    let text = answer
        .choices()
        .into_iter()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let keywords: Vec<String> = correct_answers
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect();
    let matched = keywords
        .iter()
        .filter(|keyword| text.contains(keyword.as_str()))
        .count();
    Evaluation::proportional(matched, keywords.len())
}
