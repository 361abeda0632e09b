//! Turns raw Notion pages into [`Contact`]s.
//!
//! A record that is missing a field or carries a malformed email is rejected
//! and counted as failed; it never aborts the batch. Rejected records are not
//! stored anywhere, so every later run reads and checks them again: fixing the
//! row upstream is enough for it to sync.

use crate::config::toml_config::PropertyNames;
use crate::domain::model::{Contact, RawRecord, RunCounters};
use crate::utils::validation::is_valid_email;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("record has no usable '{field}' property")]
    MissingField { field: String },

    #[error("'{email}' is not a valid email address")]
    InvalidEmail { email: String },
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub contacts: Vec<Contact>,
    pub counters: RunCounters,
}

/// `properties.<name>.<kind>[0].text.content`，kind 為 `title` 或 `rich_text`
fn text_property<'a>(properties: &'a Value, name: &str, kind: &str) -> Option<&'a str> {
    properties
        .get(name)?
        .get(kind)?
        .get(0)?
        .get("text")?
        .get("content")?
        .as_str()
}

fn missing(field: &str) -> ValidationError {
    ValidationError::MissingField {
        field: field.to_string(),
    }
}

pub fn normalize(raw: &RawRecord, names: &PropertyNames) -> Result<Contact, ValidationError> {
    let properties = raw.get("properties").ok_or_else(|| missing("properties"))?;

    let last_name = text_property(properties, &names.last_name, "title")
        .ok_or_else(|| missing(&names.last_name))?;
    let first_name = text_property(properties, &names.first_name, "rich_text")
        .ok_or_else(|| missing(&names.first_name))?;
    let email = properties
        .get(&names.email)
        .and_then(|property| property.get("email"))
        .and_then(Value::as_str)
        .ok_or_else(|| missing(&names.email))?
        .trim();

    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail {
            email: email.to_string(),
        });
    }

    Ok(Contact::new(last_name.trim(), first_name.trim(), email))
}

/// 依來源順序驗證整批紀錄
pub fn normalize_batch(records: &[RawRecord], names: &PropertyNames) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (index, record) in records.iter().enumerate() {
        match normalize(record, names) {
            Ok(contact) => {
                batch.counters.success += 1;
                batch.contacts.push(contact);
            }
            Err(e) => {
                batch.counters.failed += 1;
                let id = record.get("id").and_then(Value::as_str).unwrap_or("no id");
                tracing::debug!("Rejected record #{} ({}): {}", index, id, e);
            }
        }
    }

    batch
}
