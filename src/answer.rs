//! Answer values and the `{ "answer": ... }` response envelope

use serde::Serialize;

pub const NO_DATA: &str = "No data";
pub const QUESTION_NOT_RECOGNIZED: &str = "Question not recognized";
pub const INTERNAL_ERROR: &str = "Internal error";

/// A single scalar answer.
///
/// Serializes untagged, so the envelope carries a bare number, string or `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Integer(i64),
    Float(f64),
    Text(String),
    /// Mean over an empty selection
    Undefined,
}

impl Answer {
    pub fn no_data() -> Self {
        Answer::Text(NO_DATA.to_string())
    }

    pub fn not_recognized() -> Self {
        Answer::Text(QUESTION_NOT_RECOGNIZED.to_string())
    }

    pub fn internal_error() -> Self {
        Answer::Text(INTERNAL_ERROR.to_string())
    }

    /// Integer conversion of a sum, truncating toward zero
    pub fn from_total(total: f64) -> Self {
        Answer::Integer(total.trunc() as i64)
    }

    /// Mean rounded to two decimals; a NaN mean becomes [`Answer::Undefined`]
    pub fn from_mean(mean: f64) -> Self {
        if !mean.is_finite() {
            return Answer::Undefined;
        }
        Answer::Float((mean * 100.0).round() / 100.0)
    }

    /// True for the three fixed fallback strings
    #[cfg(test)]
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            Answer::Text(s) if s == NO_DATA || s == QUESTION_NOT_RECOGNIZED || s == INTERNAL_ERROR
        )
    }
}

impl From<usize> for Answer {
    fn from(count: usize) -> Self {
        Answer::Integer(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

/// Response body of the query endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub answer: Answer,
}

impl From<Answer> for QueryResponse {
    fn from(answer: Answer) -> Self {
        Self { answer }
    }
}
