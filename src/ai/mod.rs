use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::io::json;
use crate::table::{Record, RowSet};

mod direct;
mod relay;
mod tests;

pub use direct::{DEFAULT_BASE_URL, DEFAULT_MODEL, DirectGateway};
pub use relay::{RelayGateway, RelayOptions};

/// Fixed system message constraining the model to reply with nothing but the
/// edited dataset as a JSON array.
pub const SYSTEM_PROMPT: &str = "You are an intelligent data editing assistant. \
Your task is to modify the provided JSON dataset based on the user's instruction. \
You must return ONLY the updated dataset in a valid JSON array-of-objects format. \
Do not add any commentary, explanations, markdown formatting, or any text outside \
of the JSON structure.";

#[derive(Debug)]
pub enum TransformError {
    EmptyInstruction,
    Upstream { detail: String },
    MalformedReply { detail: String },
    Timeout { waited: Duration },
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::EmptyInstruction => {
                write!(f, "instruction must not be blank")
            }
            TransformError::Upstream { detail } => {
                write!(f, "AI request failed: {detail}")
            }
            TransformError::MalformedReply { detail } => {
                write!(f, "AI reply did not contain a valid JSON array: {detail}")
            }
            TransformError::Timeout { waited } => {
                write!(f, "AI job did not complete within {}s", waited.as_secs())
            }
        }
    }
}

impl std::error::Error for TransformError {}

pub type Result<T> = std::result::Result<T, TransformError>;

/// Records parsed out of a validated model reply, with the reply's key order
/// preserved so the caller can rebuild the column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub records: Vec<Record>,
    pub columns: Vec<String>,
}

/// A backend that rewrites the full dataset according to a free-text
/// instruction. Asynchronous and fallible; implementations never partially
/// apply anything, they either return a fully validated record array or an
/// error.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, rowset: &RowSet, instruction: &str) -> Result<Transformed>;
}

/// The user message: the instruction verbatim plus a pretty-printed dump of
/// the dataset.
pub fn build_user_prompt(instruction: &str, dataset: &Value) -> String {
    let dump = serde_json::to_string_pretty(dataset).unwrap_or_else(|_| "[]".to_string());
    format!("User instruction: \"{instruction}\"\n\nInput Dataset:\n{dump}")
}

pub(crate) fn dataset_value(rowset: &RowSet) -> Value {
    json::to_value(rowset)
}

/// Validates and parses free-text model output. The model is not guaranteed
/// to return pure JSON, so the first `[` through the last `]` is taken as the
/// candidate array and everything around it discarded.
pub fn parse_reply(content: &str) -> Result<Transformed> {
    let candidate = extract_array(content).ok_or_else(|| TransformError::MalformedReply {
        detail: "no bracketed array in reply".to_string(),
    })?;
    let value: Value =
        serde_json::from_str(candidate).map_err(|err| TransformError::MalformedReply {
            detail: err.to_string(),
        })?;
    let (records, columns) =
        json::records_from_value(&value).ok_or_else(|| TransformError::MalformedReply {
            detail: "reply is not an array of objects".to_string(),
        })?;
    Ok(Transformed { records, columns })
}

fn extract_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
