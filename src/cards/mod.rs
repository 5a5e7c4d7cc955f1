//! Greeting cards for upcoming occasions.
//!
//! Messages come from a [`MessageGenerator`] when one is reachable and from
//! canned text otherwise; composing a card never fails.

use crate::config::validate_message_url;
use crate::error::{AppError, AppResult};
use crate::http_config::HttpConfig;
use crate::models::{Card, EventType};
use crate::utils::logging::log_error_with_context;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

pub mod store;

pub use store::{CardHistory, TemplateStore, CARD_HISTORY_NAMESPACE, TEMPLATES_NAMESPACE};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> AppResult<String>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    message: String,
}

/// Generator backed by a JSON endpoint: POST `{"prompt": ...}`, expect
/// `{"message": ...}` back.
pub struct HttpMessageGenerator {
    client: Client,
    endpoint: Url,
}

impl HttpMessageGenerator {
    pub fn new(endpoint: &str, http: &HttpConfig) -> AppResult<Self> {
        let endpoint = validate_message_url(endpoint)?;
        Ok(Self {
            client: http.build_client()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl MessageGenerator for HttpMessageGenerator {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        debug!("Requesting message from {}", self.endpoint);
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&GenerateRequest { prompt })
            .send()
            .await?
            .error_for_status()?;

        let body: GenerateResponse = response.json().await?;
        let message = body.message.trim();
        if message.is_empty() {
            return Err(AppError::transport("Message generator returned an empty message"));
        }
        Ok(message.to_string())
    }
}

pub fn prompt_for(occasion: EventType, recipient: &str) -> String {
    match occasion {
        EventType::Birthday => format!("Write a short, warm birthday message for {}.", recipient),
        EventType::Anniversary => format!("Write a short, heartfelt anniversary message for {}.", recipient),
        EventType::Holiday => format!("Write a short, cheerful holiday greeting for {}.", recipient),
        EventType::Custom | EventType::Other => {
            format!("Write a short, friendly note celebrating a special day for {}.", recipient)
        }
    }
}

pub fn fallback_message(occasion: EventType, recipient: &str) -> String {
    match occasion {
        EventType::Birthday => format!("Happy birthday, {}! Wishing you a wonderful year ahead.", recipient),
        EventType::Anniversary => format!("Happy anniversary, {}! Here's to many more years together.", recipient),
        EventType::Holiday => format!("Happy holidays, {}! Wishing you joy and rest.", recipient),
        EventType::Custom | EventType::Other => {
            format!("Thinking of you on your special day, {}!", recipient)
        }
    }
}

/// Composes a card for `recipient`. Generator failures are logged and
/// replaced by [`fallback_message`].
pub async fn compose_message(
    generator: &dyn MessageGenerator,
    recipient: &str,
    occasion: EventType,
) -> Card {
    let recipient = recipient.trim();
    let (message, generated) = match generator.generate(&prompt_for(occasion, recipient)).await {
        Ok(message) => (message, true),
        Err(e) => {
            log_error_with_context(&e, "Card message generation");
            (fallback_message(occasion, recipient), false)
        }
    };

    info!("Composed {} card (generated: {})", occasion, generated);
    Card {
        id: uuid::Uuid::new_v4().to_string(),
        recipient: recipient.to_string(),
        occasion,
        message,
        event_id: None,
        generated,
        created_at: Utc::now(),
    }
}
