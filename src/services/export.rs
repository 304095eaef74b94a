use crate::domain::models::QuizSubmission;
use crate::services::leads::text_field;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

const HEADERS: [&str; 15] = [
    "ID",
    "Data/Hora",
    "Nome",
    "Email",
    "WhatsApp",
    "Idade",
    "Gênero",
    "UTM Source",
    "UTM Medium",
    "UTM Campaign",
    "UTM Content",
    "UTM Term",
    "Interessado",
    "Score Total",
    "Respostas Quiz",
];

/// Renders client-stored leads (`{id, timestamp, ...quiz fields}`) as CSV.
pub fn export_csv(leads: &[Value]) -> String {
    let mut lines = Vec::with_capacity(leads.len() + 1);
    lines.push(HEADERS.join(","));
    lines.extend(leads.iter().map(lead_row));
    lines.join("\n")
}

pub fn export_filename(today: NaiveDate) -> String {
    format!("quiz_leads_{}.csv", today.format("%Y-%m-%d"))
}

fn lead_row(lead: &Value) -> String {
    let submission = QuizSubmission::from_payload(lead);
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();

    let answers = submission
        .answers
        .iter()
        .map(|a| {
            format!(
                "Q{}:{}",
                a.question_id.map(|v| v.to_string()).unwrap_or_default(),
                a.score.map(|v| v.to_string()).unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("; ");

    let cells = [
        plain(&text_field(lead, "id").unwrap_or_default()),
        plain(&format_timestamp(text_field(lead, "timestamp"))),
        quoted(&opt(&submission.name)),
        plain(&opt(&submission.email)),
        quoted(&opt(&submission.whatsapp)),
        plain(&opt(&submission.age)),
        plain(&opt(&submission.gender)),
        plain(&opt(&submission.utm_source)),
        plain(&opt(&submission.utm_medium)),
        plain(&opt(&submission.utm_campaign)),
        plain(&opt(&submission.utm_content)),
        plain(&opt(&submission.utm_term)),
        (if submission.interessado { "Sim" } else { "Não" }).to_string(),
        submission.total_score().to_string(),
        quoted(&answers),
    ];
    cells.join(",")
}

/// `dd/mm/yyyy, HH:MM:SS`; unparseable input passes through.
fn format_timestamp(raw: Option<String>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(ts) => ts
            .with_timezone(&Utc)
            .format("%d/%m/%Y, %H:%M:%S")
            .to_string(),
        Err(_) => raw,
    }
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn plain(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quoted(value)
    } else {
        value.to_string()
    }
}
