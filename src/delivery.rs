//! Handing the finished report to its readers.
//!
//! [`Deliver`] is the seam between the pipeline and whatever carries the
//! report out. [`TelegramDelivery`] posts the document to every configured
//! chat through the Bot API `sendDocument` method.
//!
//! Delivery is attempted once per chat. The first rejected or failed request
//! stops delivery and is returned to the caller; nothing is retried.

use crate::config::TelegramConfig;
use crate::error::DeliveryError;
use crate::utils::truncate_for_log;
use reqwest::multipart::{Form, Part};
use std::fmt;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Something that can carry a rendered report to its readers.
pub trait Deliver {
    /// Send `document` with `subject` as its caption.
    async fn deliver(&self, subject: &str, document: &str) -> Result<(), DeliveryError>;
}

/// Sends the report as an HTML file attachment to Telegram chats.
pub struct TelegramDelivery {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_ids: Vec<String>,
}

impl TelegramDelivery {
    pub fn new(config: &TelegramConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .user_agent(crate::feed::fetcher::USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_ids: config.chat_ids.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendDocument", self.api_base, self.bot_token)
    }
}

impl fmt::Debug for TelegramDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramDelivery")
            .field("api_base", &self.api_base)
            .field("bot_token", &"<redacted>")
            .field("chat_ids", &self.chat_ids)
            .finish()
    }
}

impl Deliver for TelegramDelivery {
    #[instrument(level = "info", skip_all, fields(%subject, chats = self.chat_ids.len()))]
    async fn deliver(&self, subject: &str, document: &str) -> Result<(), DeliveryError> {
        let file_name = document_file_name(subject);

        for chat_id in &self.chat_ids {
            let t0 = Instant::now();
            let part = Part::bytes(document.as_bytes().to_vec())
                .file_name(file_name.clone())
                .mime_str("text/html")?;
            let form = Form::new()
                .text("chat_id", chat_id.clone())
                .text("caption", subject.to_string())
                .part("document", part);

            let resp = self.client.post(self.endpoint()).multipart(form).send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                error!(
                    %chat_id,
                    status = status.as_u16(),
                    body = %truncate_for_log(&body, 300),
                    "Telegram rejected the document"
                );
                return Err(DeliveryError::Rejected {
                    chat_id: chat_id.clone(),
                    status: status.as_u16(),
                    body,
                });
            }
            info!(
                %chat_id,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Delivered report"
            );
        }
        Ok(())
    }
}

/// Attachment name derived from the subject line.
pub fn document_file_name(subject: &str) -> String {
    format!("{}.html", subject.replace(' ', "_"))
}
