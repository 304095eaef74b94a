//! Quiz lead submission pipeline.
//!
//! `submit` is total: whatever the payload looks like, the caller gets a
//! success acknowledgement echoing the payload so it can persist the lead
//! itself. Downstream delivery problems are logged, never surfaced.

use crate::domain::models::{QuizAnswer, QuizSubmission, SubmissionAck};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const LEAD_ID_LEN: usize = 13;
const LEAD_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

const MSG_DELIVERED: &str = "✅ Dados enviados com sucesso!";
const MSG_RECEIVED: &str = "✅ Dados recebidos com sucesso!";

/// What a sink receives for each acknowledged lead.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord<'a> {
    pub lead_id: &'a str,
    pub timestamp: DateTime<Utc>,
    pub total_score: i64,
    pub lead: &'a Value,
}

#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn deliver(&self, record: &LeadRecord<'_>) -> Result<()>;
}

/// Stands in for a backend call with a fixed latency.
pub struct SimulatedSink {
    latency: Duration,
}

impl SimulatedSink {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl LeadSink for SimulatedSink {
    async fn deliver(&self, record: &LeadRecord<'_>) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        tracing::debug!("Simulated delivery of lead {}", record.lead_id);
        Ok(())
    }
}

/// Forwards each lead as `{"data": <record>}` to an HTTP endpoint
/// (a spreadsheet bridge, CRM hook and so on).
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl LeadSink for WebhookSink {
    async fn deliver(&self, record: &LeadRecord<'_>) -> Result<()> {
        self.client
            .post(&self.url)
            .json(&serde_json::json!({ "data": record }))
            .send()
            .await
            .context("lead webhook request failed")?
            .error_for_status()
            .context("lead webhook rejected the lead")?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct LeadPipeline {
    sink: Arc<dyn LeadSink>,
}

impl LeadPipeline {
    pub fn new(sink: Arc<dyn LeadSink>) -> Self {
        Self { sink }
    }

    pub async fn submit(&self, payload: Value) -> SubmissionAck {
        let submission = QuizSubmission::from_payload(&payload);
        log_submission(&submission);

        let lead_id = generate_lead_id();
        let timestamp = Utc::now();
        let record = LeadRecord {
            lead_id: &lead_id,
            timestamp,
            total_score: submission.total_score(),
            lead: &payload,
        };

        let message = match self.sink.deliver(&record).await {
            Ok(()) => MSG_DELIVERED,
            Err(e) => {
                tracing::warn!("Lead {} was not delivered downstream: {:#}", lead_id, e);
                MSG_RECEIVED
            }
        };

        SubmissionAck {
            success: true,
            message: message.to_string(),
            lead_id,
            timestamp,
            lead_data: payload,
        }
    }
}

fn log_submission(submission: &QuizSubmission) {
    let intent = if submission.interessado {
        "clicked to buy"
    } else {
        "completed quiz"
    };
    tracing::info!(
        lead_name = submission.name.as_deref().unwrap_or("-"),
        email = submission.email.as_deref().unwrap_or("-"),
        whatsapp = submission.whatsapp.as_deref().unwrap_or("-"),
        answers = ?submission.answer_summary(),
        utm_source = submission.utm_source.as_deref().unwrap_or("-"),
        utm_campaign = submission.utm_campaign.as_deref().unwrap_or("-"),
        utm_medium = submission.utm_medium.as_deref().unwrap_or("-"),
        intent,
        "Quiz submission received"
    );
}

pub fn generate_lead_id() -> String {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    (0..LEAD_ID_LEN)
        .map(|_| LEAD_ID_ALPHABET[rng.gen_range(0..LEAD_ID_ALPHABET.len())] as char)
        .collect()
}

impl QuizSubmission {
    pub fn from_payload(payload: &Value) -> Self {
        let answers = payload
            .get("answers")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.is_object())
                    .map(|item| QuizAnswer {
                        question_id: integer_field(item, "questionId"),
                        score: integer_field(item, "score"),
                        theme: text_field(item, "theme"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: text_field(payload, "name"),
            email: text_field(payload, "email").map(|e| e.to_lowercase()),
            whatsapp: text_field(payload, "whatsapp"),
            age: text_field(payload, "age"),
            gender: text_field(payload, "gender"),
            answers,
            utm_source: text_field(payload, "utm_source"),
            utm_campaign: text_field(payload, "utm_campaign"),
            utm_medium: text_field(payload, "utm_medium"),
            utm_content: text_field(payload, "utm_content"),
            utm_term: text_field(payload, "utm_term"),
            interessado: flag_field(payload, "interessado"),
            total_score: integer_field(payload, "totalScore"),
        }
    }

    /// Explicit `totalScore`, else the sum of answer scores. Saturates, since
    /// scores come straight from the client.
    pub fn total_score(&self) -> i64 {
        self.total_score.unwrap_or_else(|| {
            self.answers
                .iter()
                .filter_map(|a| a.score)
                .fold(0i64, i64::saturating_add)
        })
    }

    /// `Q{id}: {score}` per answer.
    pub fn answer_summary(&self) -> Vec<String> {
        self.answers
            .iter()
            .map(|a| format!("Q{}: {}", display_opt(a.question_id), display_opt(a.score)))
            .collect()
    }
}

fn display_opt(value: Option<i64>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

pub(crate) fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn integer_field(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn flag_field(value: &Value, key: &str) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "sim" | "1"),
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}
