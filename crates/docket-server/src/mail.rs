//! Assignment e-mails through the Resend HTTP API.

use std::{future::Future, time::Duration};

use docket_core::notify::{AssignmentPayload, Delivery, Notifier, NotifyError};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tera::Tera;
use thiserror::Error;

use crate::EmailConfig;

/// Registered with a `.html` suffix so tera escapes every interpolated value.
const ASSIGNMENT_TEMPLATE: &str = "assignment.html";

const ASSIGNMENT_HTML: &str = r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333">
  <h2>New Assignment - {{ team }} Team</h2>
  <p>Inward No: {{ reference_no }}</p>
  <p><strong>Subject:</strong> {{ subject }}</p>
  <p><strong>From:</strong> {{ from_whom }}</p>
  <p><strong>Due Date:</strong> {{ due_date }}</p>
  {%- if instructions %}
  <p><strong>Instructions:</strong><br/>{{ instructions }}</p>
  {%- endif %}
  <p>Please coordinate with your team members to complete this task.</p>
  <p style="font-size: 12px; color: #6b7280">This is an automated notification from the Inward/Outward Management System</p>
</body>
</html>
"#;

#[derive(Debug, Error)]
pub enum MailError {
  #[error("http client error: {0}")]
  Client(#[from] reqwest::Error),

  #[error("template error: {0}")]
  Template(#[from] tera::Error),
}

/// A [`Notifier`] that posts to the Resend `/emails` endpoint.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ResendNotifier {
  client:    Client,
  config:    EmailConfig,
  templates: Tera,
}

#[derive(Deserialize)]
struct SentEmail {
  id: Option<String>,
}

impl ResendNotifier {
  pub fn new(config: EmailConfig) -> Result<Self, MailError> {
    let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
    let mut templates = Tera::default();
    templates.add_raw_template(ASSIGNMENT_TEMPLATE, ASSIGNMENT_HTML)?;
    Ok(Self { client, config, templates })
  }

  /// `false` when no API key is set; every notification is then skipped.
  pub fn is_configured(&self) -> bool { self.api_key().is_some() }

  fn api_key(&self) -> Option<&str> {
    self
      .config
      .api_key
      .as_deref()
      .map(str::trim)
      .filter(|k| !k.is_empty())
  }

  /// The HTML body of the assignment e-mail.
  pub fn html_body(&self, payload: &AssignmentPayload) -> Result<String, tera::Error> {
    let due_date = payload
      .due_date
      .map(|d| d.format("%A, %-d %B %Y").to_string())
      .unwrap_or_else(|| "Not specified".to_owned());

    let mut context = tera::Context::new();
    context.insert("team", payload.team.as_str());
    context.insert("reference_no", &payload.reference_no.to_string());
    context.insert("subject", &payload.subject);
    context.insert("from_whom", &payload.from_whom);
    context.insert("due_date", &due_date);
    context.insert("instructions", &payload.instructions);

    self.templates.render(ASSIGNMENT_TEMPLATE, &context)
  }

  async fn send(&self, api_key: &str, payload: &AssignmentPayload) -> Result<Delivery, NotifyError> {
    let html = self
      .html_body(payload)
      .map_err(|e| NotifyError::Render(e.to_string()))?;
    let message = json!({
      "from": self.config.from,
      "to": [payload.recipient],
      "subject": subject_line(payload),
      "html": html,
    });

    let resp = self
      .client
      .post(&self.config.endpoint)
      .bearer_auth(api_key)
      .json(&message)
      .send()
      .await
      .map_err(|e| NotifyError::Transport(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(NotifyError::Rejected { status: status.as_u16(), body });
    }

    let sent: SentEmail = resp
      .json()
      .await
      .map_err(|e| NotifyError::Transport(e.to_string()))?;
    Ok(Delivery::Sent { message_id: sent.id })
  }
}

impl Notifier for ResendNotifier {
  fn notify<'a>(
    &'a self,
    payload: &'a AssignmentPayload,
  ) -> impl Future<Output = Result<Delivery, NotifyError>> + Send + 'a {
    async move {
      match self.api_key() {
        Some(key) => self.send(key, payload).await,
        None => Ok(Delivery::Skipped { reason: "email not configured".to_owned() }),
      }
    }
  }
}

pub fn subject_line(payload: &AssignmentPayload) -> String {
  format!("New Assignment: {} [{}]", payload.subject, payload.reference_no)
}
