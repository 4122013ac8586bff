/// Quiz attempt grading
///
/// The score is the share of the quiz's multiple-choice questions answered
/// correctly, as a percentage. Unanswered multiple-choice questions count as
/// wrong. Free-text answers are stored but never scored, so a quiz without
/// multiple-choice questions produces no score.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::quiz::{QuestionType, QuizDetail};

/// One answer as submitted by a learner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    #[serde(default, alias = "selected_option_id")]
    pub option_id: Option<Uuid>,
    #[serde(default)]
    pub answer_text: Option<String>,
}

/// An answer after grading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub question_id: Uuid,
    pub selected_option_id: Option<Uuid>,
    pub answer_text: Option<String>,
    pub is_correct: Option<bool>,
}

/// A multiple-choice question the learner got wrong or skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissedQuestion {
    pub question_id: Uuid,
    pub question_text: String,
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedAttempt {
    pub answers: Vec<GradedAnswer>,
    pub correct_count: usize,
    pub scorable_count: usize,
    pub score: Option<f64>,
    pub missed: Vec<MissedQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("Question {0} does not belong to this quiz")]
    UnknownQuestion(Uuid),

    #[error("Option {option_id} does not belong to question {question_id}")]
    UnknownOption { question_id: Uuid, option_id: Uuid },

    #[error("Question {0} was answered more than once")]
    DuplicateAnswer(Uuid),
}

/// Grades a submission against a quiz with its answer key
pub fn grade(quiz: &QuizDetail, submitted: &[SubmittedAnswer]) -> Result<GradedAttempt, ScoringError> {
    let mut seen = HashSet::new();
    let mut answers = Vec::with_capacity(submitted.len());
    let mut correct_questions = HashSet::new();

    for answer in submitted {
        let question = quiz
            .question(answer.question_id)
            .ok_or(ScoringError::UnknownQuestion(answer.question_id))?;

        if !seen.insert(answer.question_id) {
            return Err(ScoringError::DuplicateAnswer(answer.question_id));
        }

        let is_correct = match question.question.question_type {
            QuestionType::Text => None,
            QuestionType::MultipleChoice => match answer.option_id {
                None => Some(false),
                Some(option_id) => {
                    let option = question
                        .options
                        .iter()
                        .find(|o| o.id == option_id)
                        .ok_or(ScoringError::UnknownOption {
                            question_id: answer.question_id,
                            option_id,
                        })?;
                    Some(option.is_correct)
                }
            },
        };

        if is_correct == Some(true) {
            correct_questions.insert(answer.question_id);
        }

        answers.push(GradedAnswer {
            question_id: answer.question_id,
            selected_option_id: answer.option_id,
            answer_text: answer
                .answer_text
                .as_ref()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            is_correct,
        });
    }

    let mut scorable_count = 0;
    let mut missed = Vec::new();
    for question in &quiz.questions {
        if question.question.question_type != QuestionType::MultipleChoice {
            continue;
        }
        scorable_count += 1;

        if !correct_questions.contains(&question.question.id) {
            missed.push(MissedQuestion {
                question_id: question.question.id,
                question_text: question.question.question_text.clone(),
                correct_answer: question.correct_option().map(|o| o.option_text.clone()),
            });
        }
    }

    let correct_count = correct_questions.len();
    let score = percentage(correct_count, scorable_count);

    Ok(GradedAttempt {
        answers,
        correct_count,
        scorable_count,
        score,
        missed,
    })
}

/// `part / whole` as a percentage rounded to two decimals; None for an empty whole
fn percentage(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        return None;
    }
    let raw = part as f64 / whole as f64 * 100.0;
    Some((raw * 100.0).round() / 100.0)
}

/// Human-readable feedback stored with an attempt
pub fn feedback_text(graded: &GradedAttempt) -> String {
    let Some(score) = graded.score else {
        return "Your answers have been submitted for review.".to_string();
    };

    let mut text = format!(
        "You answered {} of {} multiple-choice questions correctly ({}%).",
        graded.correct_count, graded.scorable_count, score
    );

    if graded.missed.is_empty() {
        text.push_str(" Great work, every multiple-choice answer was correct.");
        return text;
    }

    text.push_str("\nReview these questions:");
    for missed in &graded.missed {
        match &missed.correct_answer {
            Some(answer) => {
                text.push_str(&format!("\n- {} (correct answer: {})", missed.question_text, answer))
            }
            None => text.push_str(&format!("\n- {}", missed.question_text)),
        }
    }

    text
}
