/// Chat-completion client
///
/// Talks to any OpenAI-compatible `/chat/completions` endpoint (Groq by
/// default).
///
/// # Example
///
/// ```no_run
/// use task100x_shared::llm::{LlmClient, LlmConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let Some(config) = LlmConfig::from_env() else {
///     return Ok(());
/// };
/// let client = LlmClient::new(config)?;
/// let questions = client.generate_quiz("Today we covered Rust ownership...").await?;
/// println!("{} questions", questions.len());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::parse::{parse_generated_quiz, parse_pointers, ReminderPointers};
use crate::models::launchpad::LaunchpadProfile;
use crate::models::notification::NotificationContext;
use crate::models::quiz::NewQuestion;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const REMINDER_SYSTEM_PROMPT: &str = "\
You write short reminders for an upcoming live learning session. \
Connect the session to the learner's background without naming their goals. \
Reply with exactly two lines:\n\
Pointer 1: a hook or question about the session (15-20 words)\n\
Pointer 2: why the session matters for someone like them (15-20 words)";

const QUIZ_SYSTEM_PROMPT: &str = "\
You create multiple-choice quizzes from session transcriptions. \
Reply with one JSON object with a single key \"questions\": an array of \
{\"questionText\", \"questionType\": \"MULTIPLE_CHOICE\", \"options\": \
[{\"optionText\", \"isCorrect\"}]}. Every question has exactly one correct \
option and at least two options. Cover the key concepts of the transcription.";

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("Could not parse LLM output: {0}")]
    InvalidOutput(String),
}

/// Provider settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    /// Reads `LLM_API_KEY`, `LLM_BASE_URL` and `LLM_MODEL`
    ///
    /// Returns None when no API key is set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`LlmConfig::from_env`] over an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let api_key = lookup("LLM_API_KEY").filter(|k| !k.trim().is_empty())?;

        Some(Self {
            api_key,
            base_url: lookup("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }
}

/// What a reminder is written from
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderContext {
    pub learner_name: String,
    pub session_title: String,
    pub session_description: String,
    pub launchpad: Option<LaunchpadProfile>,
}

impl ReminderContext {
    pub fn from_notification(ctx: &NotificationContext) -> Self {
        Self {
            learner_name: ctx.learner_display_name().to_string(),
            session_title: ctx.session_title.clone(),
            session_description: ctx.session_description.clone(),
            launchpad: ctx.launchpad(),
        }
    }

    fn prompt(&self) -> String {
        let background = self
            .launchpad
            .as_ref()
            .map(LaunchpadProfile::summary)
            .unwrap_or_else(|| "unknown".to_string());

        format!(
            "Learner: {}\nBackground: {}\nUpcoming session title: {}\nUpcoming session description: {}",
            self.learner_name, background, self.session_title, self.session_description
        )
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends one system + user exchange and returns the reply text
    pub async fn chat(
        &self,
        system: &str,
        user: &str,
        max_tokens: Option<u32>,
    ) -> Result<String, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.7,
            max_tokens,
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        tracing::debug!(model = %self.config.model, chars = content.len(), "LLM reply received");
        Ok(content)
    }

    /// Writes a two-pointer reminder for one learner
    pub async fn generate_reminder(
        &self,
        context: &ReminderContext,
    ) -> Result<ReminderPointers, LlmError> {
        let reply = self
            .chat(REMINDER_SYSTEM_PROMPT, &context.prompt(), Some(200))
            .await?;

        parse_pointers(&reply)
            .ok_or_else(|| LlmError::InvalidOutput("reply has no Pointer lines".to_string()))
    }

    /// Drafts quiz questions from a transcription
    pub async fn generate_quiz(&self, transcription: &str) -> Result<Vec<NewQuestion>, LlmError> {
        let prompt = format!(
            "Generate a quiz based on the following session transcription:\n\n{}",
            transcription
        );
        let reply = self.chat(QUIZ_SYSTEM_PROMPT, &prompt, None).await?;

        let questions =
            parse_generated_quiz(&reply).map_err(|e| LlmError::InvalidOutput(e.to_string()))?;
        if questions.is_empty() {
            return Err(LlmError::InvalidOutput("quiz has no questions".to_string()));
        }

        Ok(questions)
    }
}
