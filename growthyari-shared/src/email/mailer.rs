/// Email delivery backends

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::templates::RenderedEmail;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail provider returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), MailError>;
}

/// Sends through a JSON HTTP email API with a bearer key
#[derive(Debug, Clone)]
pub struct HttpMailer {
    api_url: String,
    api_key: String,
    from: String,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            http: crate::http::client(crate::http::DEFAULT_TIMEOUT),
        }
    }

    /// Replaces the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = crate::http::client(timeout);
        self
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), MailError> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&SendRequest {
                from: &self.from,
                to,
                subject: &email.subject,
                html: &email.html,
                text: &email.text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Logs instead of sending; used when no email API is configured
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), MailError> {
        tracing::info!(to = %to, subject = %email.subject, "Email delivery disabled, logging only");
        Ok(())
    }
}

/// Sends an email, logging rather than returning any failure
pub async fn deliver(mailer: &dyn Mailer, to: &str, email: &RenderedEmail) {
    match mailer.send(to, email).await {
        Ok(()) => tracing::debug!(subject = %email.subject, "Email sent"),
        Err(e) => tracing::warn!(error = %e, subject = %email.subject, "Email delivery failed"),
    }
}
