use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::bank::{QuestionBank, QuestionId};

/// Lowest ordinal response ("not at all").
pub const MIN_RESPONSE: u8 = 1;
/// Highest ordinal response ("extremely").
pub const MAX_RESPONSE: u8 = 5;
/// Responses at or above this value count as elevated (positive) items.
pub const ELEVATED_RESPONSE: u8 = 2;

/// Raw submission keyed by item number.
///
/// Any JSON object deserializes. Keys that are not canonical item numbers
/// and values that are not integers are reported item by item during
/// validation instead of failing the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(pub BTreeMap<String, Value>);

impl AnswerSet {
    pub fn insert(&mut self, question: i64, value: impl Into<Value>) {
        self.0.insert(question.to_string(), value.into());
    }

    pub fn remove(&mut self, question: i64) -> Option<Value> {
        self.0.remove(&question.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every item of `bank` answered with `value`.
    pub fn uniform(bank: &QuestionBank, value: i64) -> Self {
        bank.question_ids()
            .map(|id| (i64::from(id.0), value))
            .collect()
    }
}

impl FromIterator<(i64, i64)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (i64, i64)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(question, value)| (question.to_string(), Value::from(value)))
                .collect(),
        )
    }
}

/// Offending items of a rejected submission.
///
/// `missing` and `out_of_range` are sorted by item number. `unknown` lists
/// numeric keys first in numeric order, then any other keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("invalid answer set: {}", describe(.missing, .unknown, .out_of_range))]
pub struct AnswerSetError {
    pub missing: Vec<QuestionId>,
    pub unknown: Vec<String>,
    pub out_of_range: Vec<QuestionId>,
}

impl AnswerSetError {
    fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unknown.is_empty() && self.out_of_range.is_empty()
    }
}

fn describe(missing: &[QuestionId], unknown: &[String], out_of_range: &[QuestionId]) -> String {
    fn join<T: ToString>(items: &[T]) -> String {
        items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing questions [{}]", join(missing)));
    }
    if !unknown.is_empty() {
        parts.push(format!("unknown questions [{}]", join(unknown)));
    }
    if !out_of_range.is_empty() {
        parts.push(format!(
            "responses outside {MIN_RESPONSE}..={MAX_RESPONSE} for questions [{}]",
            join(out_of_range)
        ));
    }
    parts.join("; ")
}

/// Item number for `key` when it is written canonically ("7", not "07" or "q7").
fn item_number(key: &str, count: u16) -> Option<u16> {
    key.parse::<u16>()
        .ok()
        .filter(|id| (1..=count).contains(id) && id.to_string() == key)
}

fn response_value(value: &Value) -> Option<u8> {
    value
        .as_i64()
        .and_then(|value| u8::try_from(value).ok())
        .filter(|value| (MIN_RESPONSE..=MAX_RESPONSE).contains(value))
}

/// A complete, in-range response vector bound to the bank that validated it.
///
/// Only [`ScoringEngine::validate`](super::ScoringEngine::validate) builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Responses {
    bank: Arc<QuestionBank>,
    values: Vec<u8>,
}

impl Responses {
    /// Checks that `answers` covers exactly `1..=question_count` with values in `1..=5`.
    pub(crate) fn validate(
        bank: &Arc<QuestionBank>,
        answers: &AnswerSet,
    ) -> Result<Self, AnswerSetError> {
        let count = bank.question_count();
        let mut error = AnswerSetError::default();
        let mut values = Vec::with_capacity(usize::from(count));

        for question in bank.question_ids() {
            match answers.0.get(&question.0.to_string()) {
                None => error.missing.push(question),
                Some(value) => match response_value(value) {
                    Some(value) => values.push(value),
                    None => error.out_of_range.push(question),
                },
            }
        }

        error.unknown = answers
            .0
            .keys()
            .filter(|key| item_number(key, count).is_none())
            .cloned()
            .collect();
        error.unknown.sort_by_cached_key(|key| {
            let numeric = key.parse::<i64>().ok();
            (numeric.is_none(), numeric, key.clone())
        });

        if error.is_empty() {
            Ok(Self {
                bank: Arc::clone(bank),
                values,
            })
        } else {
            Err(error)
        }
    }

    /// Bank the responses were validated against.
    pub fn bank(&self) -> &Arc<QuestionBank> {
        &self.bank
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Response for `question`, or `None` when the item is not part of the bank.
    pub fn value(&self, question: QuestionId) -> Option<u8> {
        usize::from(question.0)
            .checked_sub(1)
            .and_then(|index| self.values.get(index))
            .copied()
    }

    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        self.values.iter().copied()
    }

    /// Item-keyed view for persistence and export.
    pub fn to_map(&self) -> BTreeMap<QuestionId, u8> {
        self.values
            .iter()
            .enumerate()
            .map(|(index, &value)| (QuestionId(index as u16 + 1), value))
            .collect()
    }
}
