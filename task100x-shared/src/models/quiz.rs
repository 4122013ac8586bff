/// Quiz, question and option models
///
/// A quiz belongs to a cohort week and holds ordered questions. Multiple
/// choice questions carry ordered options with exactly one correct option;
/// free-text questions carry none.
///
/// Learners never see `is_correct`: use [`QuizDetail::for_learner`] before
/// returning a quiz to them.
///
/// # Example
///
/// ```no_run
/// use task100x_shared::models::quiz::{NewOption, NewQuestion, NewQuiz, QuestionType, Quiz};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, cohort_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let quiz = NewQuiz {
///     cohort_id,
///     week_number: 1,
///     title: "Week 1 check-in".to_string(),
///     questions: vec![NewQuestion {
///         question_text: "2 + 2?".to_string(),
///         question_type: QuestionType::MultipleChoice,
///         options: vec![
///             NewOption { option_text: "4".to_string(), is_correct: true },
///             NewOption { option_text: "5".to_string(), is_correct: false },
///         ],
///     }],
/// };
/// quiz.check()?;
///
/// let mut tx = pool.begin().await?;
/// let created = Quiz::create(&mut tx, &quiz).await?;
/// tx.commit().await?;
/// println!("quiz {} has {} questions", created.quiz.id, created.questions.len());
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;
use validator::Validate;

/// Kind of question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "question_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    #[serde(alias = "multiple_choice", alias = "MCQ")]
    MultipleChoice,
    #[serde(alias = "text")]
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Quiz {
    pub id: Uuid,
    pub cohort_id: Uuid,
    pub week_number: i32,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub position: i32,
    pub question_text: String,
    pub question_type: QuestionType,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QuestionOption {
    pub id: Uuid,
    pub question_id: Uuid,
    pub position: i32,
    pub option_text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<QuestionOption>,
}

impl QuestionWithOptions {
    pub fn correct_option(&self) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.is_correct)
    }
}

/// A quiz with its questions and options, answers included
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<QuestionWithOptions>,
}

/// Option as shown to a learner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerOption {
    pub id: Uuid,
    pub position: i32,
    pub option_text: String,
}

/// Question as shown to a learner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerQuestion {
    pub id: Uuid,
    pub position: i32,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Vec<LearnerOption>,
}

/// Quiz as shown to a learner, without correct answers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerQuiz {
    pub id: Uuid,
    pub cohort_id: Uuid,
    pub week_number: i32,
    pub title: String,
    pub questions: Vec<LearnerQuestion>,
}

impl QuizDetail {
    /// Strips correct answers
    pub fn for_learner(&self) -> LearnerQuiz {
        LearnerQuiz {
            id: self.quiz.id,
            cohort_id: self.quiz.cohort_id,
            week_number: self.quiz.week_number,
            title: self.quiz.title.clone(),
            questions: self
                .questions
                .iter()
                .map(|q| LearnerQuestion {
                    id: q.question.id,
                    position: q.question.position,
                    question_text: q.question.question_text.clone(),
                    question_type: q.question.question_type,
                    options: q
                        .options
                        .iter()
                        .map(|o| LearnerOption {
                            id: o.id,
                            position: o.position,
                            option_text: o.option_text.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn question(&self, id: Uuid) -> Option<&QuestionWithOptions> {
        self.questions.iter().find(|q| q.question.id == id)
    }
}

/// Input option
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOption {
    #[serde(alias = "optionText")]
    pub option_text: String,
    #[serde(default, alias = "isCorrect")]
    pub is_correct: bool,
}

/// Input question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuestion {
    #[serde(alias = "questionText")]
    pub question_text: String,
    #[serde(alias = "questionType")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<NewOption>,
}

/// Input quiz, used for both create and full replacement
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewQuiz {
    pub cohort_id: Uuid,

    #[validate(range(min = 1, message = "Week number must be positive"))]
    pub week_number: i32,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub questions: Vec<NewQuestion>,
}

/// Structural problems in a quiz definition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizDefinitionError {
    #[error("Quiz must have at least one question")]
    NoQuestions,

    #[error("Question {0} has no text")]
    EmptyQuestion(usize),

    #[error("Question {0} needs at least two options")]
    TooFewOptions(usize),

    #[error("Question {index} must have exactly one correct option, found {found}")]
    CorrectOptionCount { index: usize, found: usize },

    #[error("Question {0} has an empty option")]
    EmptyOption(usize),
}

impl NewQuiz {
    /// Checks question structure; question numbers in errors are 1-based
    pub fn check(&self) -> Result<(), QuizDefinitionError> {
        if self.questions.is_empty() {
            return Err(QuizDefinitionError::NoQuestions);
        }

        for (i, question) in self.questions.iter().enumerate() {
            let index = i + 1;

            if question.question_text.trim().is_empty() {
                return Err(QuizDefinitionError::EmptyQuestion(index));
            }

            if question.question_type != QuestionType::MultipleChoice {
                continue;
            }

            if question.options.len() < 2 {
                return Err(QuizDefinitionError::TooFewOptions(index));
            }

            if question.options.iter().any(|o| o.option_text.trim().is_empty()) {
                return Err(QuizDefinitionError::EmptyOption(index));
            }

            let found = question.options.iter().filter(|o| o.is_correct).count();
            if found != 1 {
                return Err(QuizDefinitionError::CorrectOptionCount { index, found });
            }
        }

        Ok(())
    }
}

impl Quiz {
    /// Inserts a quiz with its questions and options
    ///
    /// Call inside a transaction.
    pub async fn create(conn: &mut PgConnection, data: &NewQuiz) -> Result<QuizDetail, sqlx::Error> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (cohort_id, week_number, title)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(data.cohort_id)
        .bind(data.week_number)
        .bind(&data.title)
        .fetch_one(&mut *conn)
        .await?;

        let questions = insert_questions(conn, quiz.id, &data.questions).await?;

        Ok(QuizDetail { quiz, questions })
    }

    /// Replaces a quiz's fields and all of its questions
    ///
    /// Returns None when the quiz doesn't exist. Call inside a transaction.
    pub async fn replace(
        conn: &mut PgConnection,
        id: Uuid,
        data: &NewQuiz,
    ) -> Result<Option<QuizDetail>, sqlx::Error> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            UPDATE quizzes
            SET cohort_id = $2, week_number = $3, title = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.cohort_id)
        .bind(data.week_number)
        .bind(&data.title)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(quiz) = quiz else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM questions WHERE quiz_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        let questions = insert_questions(conn, quiz.id, &data.questions).await?;

        Ok(Some(QuizDetail { quiz, questions }))
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Loads a quiz with ordered questions and options
    pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<QuizDetail>, sqlx::Error> {
        let Some(quiz) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let questions = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE quiz_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        let options = sqlx::query_as::<_, QuestionOption>(
            r#"
            SELECT o.* FROM question_options o
            JOIN questions q ON q.id = o.question_id
            WHERE q.quiz_id = $1
            ORDER BY o.position
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(Some(QuizDetail {
            quiz,
            questions: attach_options(questions, options),
        }))
    }

    pub async fn list_by_cohort<'e, E: PgExecutor<'e>>(
        executor: E,
        cohort_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Quiz>(
            "SELECT * FROM quizzes WHERE cohort_id = $1 ORDER BY week_number, created_at",
        )
        .bind(cohort_id)
        .fetch_all(executor)
        .await
    }

    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn insert_questions(
    conn: &mut PgConnection,
    quiz_id: Uuid,
    questions: &[NewQuestion],
) -> Result<Vec<QuestionWithOptions>, sqlx::Error> {
    let mut created = Vec::with_capacity(questions.len());

    for (position, data) in questions.iter().enumerate() {
        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (quiz_id, position, question_text, question_type)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(quiz_id)
        .bind(position as i32)
        .bind(data.question_text.trim())
        .bind(data.question_type)
        .fetch_one(&mut *conn)
        .await?;

        let mut options = Vec::new();
        if data.question_type == QuestionType::MultipleChoice {
            for (option_position, option) in data.options.iter().enumerate() {
                let row = sqlx::query_as::<_, QuestionOption>(
                    r#"
                    INSERT INTO question_options (question_id, position, option_text, is_correct)
                    VALUES ($1, $2, $3, $4)
                    RETURNING *
                    "#,
                )
                .bind(question.id)
                .bind(option_position as i32)
                .bind(option.option_text.trim())
                .bind(option.is_correct)
                .fetch_one(&mut *conn)
                .await?;
                options.push(row);
            }
        }

        created.push(QuestionWithOptions { question, options });
    }

    Ok(created)
}

/// Groups options under their questions, keeping both orders
fn attach_options(
    questions: Vec<Question>,
    options: Vec<QuestionOption>,
) -> Vec<QuestionWithOptions> {
    let mut by_question: HashMap<Uuid, Vec<QuestionOption>> = HashMap::new();
    for option in options {
        by_question.entry(option.question_id).or_default().push(option);
    }

    questions
        .into_iter()
        .map(|question| {
            let options = by_question.remove(&question.id).unwrap_or_default();
            QuestionWithOptions { question, options }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq(text: &str, options: &[(&str, bool)]) -> NewQuestion {
        NewQuestion {
            question_text: text.to_string(),
            question_type: QuestionType::MultipleChoice,
            options: options
                .iter()
                .map(|(t, c)| NewOption {
                    option_text: t.to_string(),
                    is_correct: *c,
                })
                .collect(),
        }
    }

    fn quiz(questions: Vec<NewQuestion>) -> NewQuiz {
        NewQuiz {
            cohort_id: Uuid::new_v4(),
            week_number: 1,
            title: "Week 1".to_string(),
            questions,
        }
    }

    #[test]
    fn test_check_accepts_valid_quiz() {
        let q = quiz(vec![
            mcq("Pick one", &[("a", true), ("b", false)]),
            NewQuestion {
                question_text: "Explain".to_string(),
                question_type: QuestionType::Text,
                options: vec![],
            },
        ]);
        assert_eq!(q.check(), Ok(()));
    }

    #[test]
    fn test_check_rejects_bad_questions() {
        assert_eq!(quiz(vec![]).check(), Err(QuizDefinitionError::NoQuestions));
        assert_eq!(
            quiz(vec![mcq("  ", &[("a", true), ("b", false)])]).check(),
            Err(QuizDefinitionError::EmptyQuestion(1))
        );
        assert_eq!(
            quiz(vec![mcq("Q", &[("a", true)])]).check(),
            Err(QuizDefinitionError::TooFewOptions(1))
        );
        assert_eq!(
            quiz(vec![
                mcq("Q1", &[("a", true), ("b", false)]),
                mcq("Q2", &[("a", true), ("b", true)])
            ])
            .check(),
            Err(QuizDefinitionError::CorrectOptionCount { index: 2, found: 2 })
        );
        assert_eq!(
            quiz(vec![mcq("Q", &[("a", false), ("b", false)])]).check(),
            Err(QuizDefinitionError::CorrectOptionCount { index: 1, found: 0 })
        );
    }

    #[test]
    fn test_question_type_aliases() {
        assert_eq!(
            serde_json::from_str::<QuestionType>("\"multiple_choice\"").unwrap(),
            QuestionType::MultipleChoice
        );
        assert_eq!(
            serde_json::to_string(&QuestionType::Text).unwrap(),
            "\"TEXT\""
        );
    }

    #[test]
    fn test_for_learner_hides_answers() {
        let quiz_id = Uuid::new_v4();
        let question_id = Uuid::new_v4();
        let detail = QuizDetail {
            quiz: Quiz {
                id: quiz_id,
                cohort_id: Uuid::new_v4(),
                week_number: 2,
                title: "T".to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            questions: vec![QuestionWithOptions {
                question: Question {
                    id: question_id,
                    quiz_id,
                    position: 0,
                    question_text: "Q".to_string(),
                    question_type: QuestionType::MultipleChoice,
                },
                options: vec![QuestionOption {
                    id: Uuid::new_v4(),
                    question_id,
                    position: 0,
                    option_text: "a".to_string(),
                    is_correct: true,
                }],
            }],
        };

        let json = serde_json::to_string(&detail.for_learner()).unwrap();
        assert!(!json.contains("is_correct"));
        assert!(json.contains("\"option_text\":\"a\""));
    }

    #[test]
    fn test_attach_options_keeps_order() {
        let quiz_id = Uuid::new_v4();
        let q1 = Question {
            id: Uuid::new_v4(),
            quiz_id,
            position: 0,
            question_text: "one".to_string(),
            question_type: QuestionType::MultipleChoice,
        };
        let q2 = Question {
            id: Uuid::new_v4(),
            quiz_id,
            position: 1,
            question_text: "two".to_string(),
            question_type: QuestionType::Text,
        };
        let option = |question_id, position| QuestionOption {
            id: Uuid::new_v4(),
            question_id,
            position,
            option_text: format!("o{}", position),
            is_correct: position == 0,
        };

        let grouped = attach_options(
            vec![q1.clone(), q2.clone()],
            vec![option(q1.id, 0), option(q1.id, 1)],
        );

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].options.len(), 2);
        assert_eq!(grouped[0].options[1].option_text, "o1");
        assert_eq!(grouped[0].correct_option().map(|o| o.position), Some(0));
        assert!(grouped[1].options.is_empty());
    }
}
