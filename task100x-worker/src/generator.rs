/// Reminder message generation
///
/// Messages are written by the LLM from the learner's launchpad and the
/// session. Without an LLM, or when it fails, a deterministic template is
/// used instead, so a PENDING notification always gets a draft.

use task100x_shared::llm::{LlmClient, ReminderContext, ReminderPointers};
use task100x_shared::models::notification::NotificationContext;

/// Where a draft came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    Llm,
    Template,
}

#[derive(Clone)]
pub struct MessageGenerator {
    llm: Option<LlmClient>,
}

impl MessageGenerator {
    pub fn new(llm: Option<LlmClient>) -> Self {
        Self { llm }
    }

    /// Template-only generator
    pub fn template_only() -> Self {
        Self { llm: None }
    }

    pub async fn generate(&self, ctx: &NotificationContext) -> (String, MessageSource) {
        let Some(llm) = &self.llm else {
            return (fallback_message(ctx), MessageSource::Template);
        };

        match llm.generate_reminder(&ReminderContext::from_notification(ctx)).await {
            Ok(pointers) if !pointers.is_empty() => (pointers.to_message(), MessageSource::Llm),
            Ok(_) => {
                tracing::warn!(
                    notification_id = %ctx.notification.id,
                    "LLM reminder was empty, using template"
                );
                (fallback_message(ctx), MessageSource::Template)
            }
            Err(e) => {
                tracing::warn!(
                    notification_id = %ctx.notification.id,
                    error = %e,
                    "LLM reminder failed, using template"
                );
                (fallback_message(ctx), MessageSource::Template)
            }
        }
    }
}

/// Deterministic two-pointer reminder
pub fn fallback_message(ctx: &NotificationContext) -> String {
    let description = ctx.session_description.trim();
    let pointer1 = if description.is_empty() {
        format!("Up next: {}.", ctx.session_title)
    } else {
        format!(
            "Up next: {}. {}.",
            ctx.session_title,
            description.trim_end_matches('.')
        )
    };

    let pointer2 = match ctx.launchpad() {
        Some(lp) if lp.work_experience => {
            "Bring your questions, this session maps straight onto day-to-day engineering work."
        }
        Some(lp) if lp.is_student => {
            "Bring your questions, this session builds on what you are already studying."
        }
        _ => "Bring your questions and join us live.",
    };

    ReminderPointers {
        pointer1,
        pointer2: pointer2.to_string(),
    }
    .to_message()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::test_support::context;
    use task100x_shared::models::notification::NotificationStatus;

    #[test]
    fn test_fallback_without_launchpad() {
        let ctx = context(NotificationStatus::Pending, None);
        let message = fallback_message(&ctx);

        assert_eq!(
            message,
            "• Up next: LLD of payment apps. How UPI apps are put together.\n\
             • Bring your questions and join us live."
        );
    }

    #[test]
    fn test_fallback_uses_launchpad() {
        let mut ctx = context(NotificationStatus::Pending, None);
        ctx.lp_is_student = Some(true);
        ctx.lp_work_experience = Some(false);

        assert!(fallback_message(&ctx).contains("already studying"));

        ctx.lp_work_experience = Some(true);
        assert!(fallback_message(&ctx).contains("engineering work"));
    }

    #[test]
    fn test_fallback_without_description() {
        let mut ctx = context(NotificationStatus::Pending, None);
        ctx.session_description = "  ".to_string();

        assert!(fallback_message(&ctx).starts_with("• Up next: LLD of payment apps.\n"));
    }

    #[tokio::test]
    async fn test_template_only_generator() {
        let ctx = context(NotificationStatus::Pending, None);
        let (message, source) = MessageGenerator::template_only().generate(&ctx).await;

        assert_eq!(source, MessageSource::Template);
        assert_eq!(message, fallback_message(&ctx));
    }
}
