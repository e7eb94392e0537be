// src/services/publish.rs

//! Dashboard publishing.
//!
//! The dashboard is a spreadsheet behind a web-app webhook. One POST carries
//! the complete ledger text; the webhook answers with a short status body.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::PublishConfig;

/// Pushes a serialized ledger to a dashboard.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Deliver `ledger_text` to the sheet `sheet_id`, returning the
    /// receiver's response body.
    async fn publish(&self, ledger_text: &str, sheet_id: &str) -> Result<String>;
}

/// JSON body the webhook expects.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    map_records: &'a str,
    sheet_id: &'a str,
}

/// Publisher that POSTs to the dashboard webhook.
#[derive(Debug, Clone)]
pub struct WebhookPublisher {
    client: reqwest::Client,
    url: String,
}

impl WebhookPublisher {
    pub fn new(config: &PublishConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.webhook_url.clone(),
        })
    }
}

#[async_trait]
impl Publisher for WebhookPublisher {
    async fn publish(&self, ledger_text: &str, sheet_id: &str) -> Result<String> {
        let payload = WebhookPayload {
            map_records: ledger_text,
            sheet_id,
        };
        log::debug!("POST {} ({} bytes of records)", self.url, ledger_text.len());

        // The webhook redirects once before answering; reqwest follows it
        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != reqwest::StatusCode::OK {
            return Err(AppError::Publish {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
