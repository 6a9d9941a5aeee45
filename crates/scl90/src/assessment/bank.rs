use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of items on the standard SCL-90 form.
pub const SCL90_QUESTION_COUNT: u16 = 90;

/// One-based item number on the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u16);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named sub-scale grouping a fixed subset of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    pub key: String,
    pub name: String,
    pub description: String,
    pub question_ids: Vec<QuestionId>,
}

impl Factor {
    pub fn new(key: &str, name: &str, description: &str, question_ids: &[u16]) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            question_ids: question_ids.iter().copied().map(QuestionId).collect(),
        }
    }
}

/// Immutable item layout: the item domain `1..=question_count` and the factors partitioning it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionBank {
    question_count: u16,
    factors: Vec<Factor>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionBankError {
    #[error("question bank must contain at least one question")]
    Empty,
    #[error("factor '{0}' has no questions")]
    EmptyFactor(String),
    #[error("factor key '{0}' is defined more than once")]
    DuplicateFactorKey(String),
    #[error("question {question} is outside 1..={question_count} (factor '{factor}')")]
    OutOfRange {
        factor: String,
        question: QuestionId,
        question_count: u16,
    },
    #[error("question {0} is assigned to more than one factor")]
    Duplicate(QuestionId),
    #[error("question {0} is not assigned to any factor")]
    Missing(QuestionId),
}

impl QuestionBank {
    /// Builds a bank after checking that the factors partition `1..=question_count`.
    pub fn new(question_count: u16, factors: Vec<Factor>) -> Result<Self, QuestionBankError> {
        if question_count == 0 {
            return Err(QuestionBankError::Empty);
        }

        let mut keys = BTreeSet::new();
        let mut seen = BTreeSet::new();
        for factor in &factors {
            if !keys.insert(factor.key.as_str()) {
                return Err(QuestionBankError::DuplicateFactorKey(factor.key.clone()));
            }
            if factor.question_ids.is_empty() {
                return Err(QuestionBankError::EmptyFactor(factor.key.clone()));
            }
            for &question in &factor.question_ids {
                if question.0 == 0 || question.0 > question_count {
                    return Err(QuestionBankError::OutOfRange {
                        factor: factor.key.clone(),
                        question,
                        question_count,
                    });
                }
                if !seen.insert(question) {
                    return Err(QuestionBankError::Duplicate(question));
                }
            }
        }

        if let Some(missing) = (1..=question_count)
            .map(QuestionId)
            .find(|question| !seen.contains(question))
        {
            return Err(QuestionBankError::Missing(missing));
        }

        Ok(Self {
            question_count,
            factors,
        })
    }

    /// The SCL-90 item assignment. Ten factors, "other" covering sleep and appetite items.
    pub fn standard() -> Self {
        Self {
            question_count: SCL90_QUESTION_COUNT,
            factors: standard_factors(),
        }
    }

    pub fn question_count(&self) -> u16 {
        self.question_count
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    pub fn factor(&self, key: &str) -> Option<&Factor> {
        self.factors.iter().find(|factor| factor.key == key)
    }

    pub fn question_ids(&self) -> impl Iterator<Item = QuestionId> {
        (1..=self.question_count).map(QuestionId)
    }
}

pub(crate) fn standard_factors() -> Vec<Factor> {
    vec![
        Factor::new(
            "somatization",
            "Somatization",
            "Subjective bodily discomfort",
            &[1, 4, 12, 27, 40, 42, 48, 49, 52, 53, 56, 58],
        ),
        Factor::new(
            "obsessive_compulsive",
            "Obsessive-Compulsive",
            "Clinical obsessive-compulsive symptom cluster",
            &[3, 9, 10, 28, 38, 45, 46, 51, 55, 65],
        ),
        Factor::new(
            "interpersonal_sensitivity",
            "Interpersonal Sensitivity",
            "Discomfort and inadequacy in interpersonal relationships",
            &[6, 21, 34, 36, 37, 41, 61, 69, 73],
        ),
        Factor::new(
            "depression",
            "Depression",
            "Dejected, depressed affective state",
            &[5, 14, 15, 20, 22, 26, 29, 30, 31, 32, 54, 71, 79],
        ),
        Factor::new(
            "anxiety",
            "Anxiety",
            "Nervousness, tension and related signs",
            &[2, 17, 23, 33, 39, 57, 72, 78, 80, 86],
        ),
        Factor::new(
            "hostility",
            "Hostility",
            "Hostile and aggressive thoughts or behavior",
            &[11, 24, 63, 67, 74, 81],
        ),
        Factor::new(
            "phobic_anxiety",
            "Phobic Anxiety",
            "Persistent fear of specific places or situations",
            &[13, 25, 47, 50, 70, 75, 82],
        ),
        Factor::new(
            "paranoid_ideation",
            "Paranoid Ideation",
            "Suspicion and projective thinking",
            &[8, 18, 43, 68, 76, 83],
        ),
        Factor::new(
            "psychoticism",
            "Psychoticism",
            "Withdrawn, isolated and psychotic-spectrum experiences",
            &[7, 16, 35, 62, 77, 84, 85, 87, 88, 90],
        ),
        Factor::new(
            "other",
            "Other",
            "Sleep and appetite disturbances",
            &[19, 44, 59, 60, 64, 66, 89],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_bank_partitions_all_ninety_items() {
        let bank = QuestionBank::new(SCL90_QUESTION_COUNT, standard_factors())
            .expect("standard factors partition the item domain");
        assert_eq!(bank, QuestionBank::standard());
        assert_eq!(bank.factors().len(), 10);

        let assigned: usize = bank
            .factors()
            .iter()
            .map(|factor| factor.question_ids.len())
            .sum();
        assert_eq!(assigned, 90);
    }

    #[test]
    fn factor_lookup_by_key() {
        let bank = QuestionBank::standard();
        let hostility = bank.factor("hostility").expect("hostility factor");
        assert_eq!(hostility.question_ids.len(), 6);
        assert!(bank.factor("unknown").is_none());
    }

    #[test]
    fn rejects_overlapping_factors() {
        let factors = vec![
            Factor::new("a", "A", "", &[1, 2]),
            Factor::new("b", "B", "", &[2, 3]),
        ];
        assert_eq!(
            QuestionBank::new(3, factors),
            Err(QuestionBankError::Duplicate(QuestionId(2)))
        );
    }

    #[test]
    fn rejects_gaps() {
        let factors = vec![Factor::new("a", "A", "", &[1, 3])];
        assert_eq!(
            QuestionBank::new(3, factors),
            Err(QuestionBankError::Missing(QuestionId(2)))
        );
    }

    #[test]
    fn rejects_out_of_range_and_degenerate_definitions() {
        let factors = vec![Factor::new("a", "A", "", &[1, 4])];
        assert!(matches!(
            QuestionBank::new(3, factors),
            Err(QuestionBankError::OutOfRange { .. })
        ));

        let factors = vec![Factor::new("a", "A", "", &[1]), Factor::new("a", "A", "", &[2])];
        assert_eq!(
            QuestionBank::new(2, factors),
            Err(QuestionBankError::DuplicateFactorKey("a".to_string()))
        );

        assert_eq!(
            QuestionBank::new(1, vec![Factor::new("a", "A", "", &[])]),
            Err(QuestionBankError::EmptyFactor("a".to_string()))
        );
        assert_eq!(QuestionBank::new(0, Vec::new()), Err(QuestionBankError::Empty));
    }
}
