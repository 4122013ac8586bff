/// WhatsApp delivery through the AiSensy campaign API
///
/// One POST per message with the campaign's template parameters. A 2xx
/// response means AiSensy accepted the message; anything else is returned as
/// [`ChannelError::Rejected`] with the provider's body for `last_error`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{ChannelError, NotificationChannel, OutboundMessage};
use crate::config::AiSensySettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest provider body kept in an error
const MAX_ERROR_BODY: usize = 500;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CampaignRequest<'a> {
    api_key: &'a str,
    campaign_name: &'a str,
    destination: &'a str,
    user_name: &'a str,
    template_params: [&'a str; 5],
}

pub struct AiSensyChannel {
    http: Client,
    api_url: String,
    api_key: String,
    campaign_name: String,
}

impl AiSensyChannel {
    /// Builds the channel, failing when the key or campaign is missing
    pub fn new(settings: &AiSensySettings) -> Result<Self, ChannelError> {
        let api_key = non_blank(&settings.api_key)
            .ok_or_else(|| ChannelError::NotConfigured("AISENSY_API_KEY is not set".to_string()))?;
        let campaign_name = non_blank(&settings.campaign_name).ok_or_else(|| {
            ChannelError::NotConfigured("AISENSY_CAMPAIGN_NAME is not set".to_string())
        })?;

        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            api_url: settings.api_url.clone(),
            api_key,
            campaign_name,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// WhatsApp numbers are digits with an optional leading `+`
fn check_destination(destination: &str) -> Result<(), ChannelError> {
    let digits = destination.strip_prefix('+').unwrap_or(destination);
    if digits.len() < 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ChannelError::InvalidDestination(destination.to_string()));
    }
    Ok(())
}

#[async_trait]
impl NotificationChannel for AiSensyChannel {
    fn name(&self) -> &str {
        "aisensy"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        check_destination(&message.destination)?;

        let request = CampaignRequest {
            api_key: &self.api_key,
            campaign_name: &self.campaign_name,
            destination: &message.destination,
            user_name: &message.user_name,
            template_params: message.template_params(),
        };

        let response = self.http.post(&self.api_url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut end = MAX_ERROR_BODY;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                body.truncate(end);
            }
            return Err(ChannelError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            campaign = %self.campaign_name,
            status = status.as_u16(),
            "AiSensy accepted message"
        );
        Ok(())
    }
}
