use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::answers::{AnswerSet, AnswerSetError, Responses, ELEVATED_RESPONSE};
use super::bank::QuestionBank;

/// Qualitative band for a factor mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    Normal,
    Mild,
    Moderate,
    ModeratelySevere,
    Severe,
}

impl SeverityBand {
    pub fn label(self) -> &'static str {
        match self {
            SeverityBand::Normal => "normal",
            SeverityBand::Mild => "mild",
            SeverityBand::Moderate => "moderate",
            SeverityBand::ModeratelySevere => "moderately severe",
            SeverityBand::Severe => "severe",
        }
    }
}

// Lower bounds in hundredths, highest first. Closed on the left.
const FACTOR_LADDER: [(u32, SeverityBand); 4] = [
    (300, SeverityBand::Severe),
    (250, SeverityBand::ModeratelySevere),
    (200, SeverityBand::Moderate),
    (150, SeverityBand::Mild),
];

/// Overall reading derived from the global severity index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallLevel {
    Good,
    MildSymptoms,
    ModerateSymptoms,
    NeedsAttention,
}

impl OverallLevel {
    pub fn label(self) -> &'static str {
        match self {
            OverallLevel::Good => "good",
            OverallLevel::MildSymptoms => "mild symptoms",
            OverallLevel::ModerateSymptoms => "moderate symptoms",
            OverallLevel::NeedsAttention => "needs attention",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            OverallLevel::Good => {
                "Your results indicate good psychological well-being. Keep up your healthy routines."
            }
            OverallLevel::MildSymptoms => {
                "Your results show mild psychological strain. Consider adjusting your routines to protect your well-being."
            }
            OverallLevel::ModerateSymptoms => {
                "Your results show a moderate level of distress. Pay attention to how you feel and seek professional help if needed."
            }
            OverallLevel::NeedsAttention => {
                "Your results suggest your psychological health needs attention. Please consider consulting a counselor or physician."
            }
        }
    }
}

const OVERALL_LADDER: [(u32, OverallLevel); 3] = [
    (250, OverallLevel::NeedsAttention),
    (200, OverallLevel::ModerateSymptoms),
    (150, OverallLevel::MildSymptoms),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallAssessment {
    pub level: OverallLevel,
    pub label: &'static str,
    pub description: &'static str,
}

impl From<OverallLevel> for OverallAssessment {
    fn from(level: OverallLevel) -> Self {
        Self {
            level,
            label: level.label(),
            description: level.description(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorScore {
    pub score: u32,
    pub average: f64,
    pub severity: SeverityBand,
    pub label: &'static str,
}

/// Scored questionnaire. Reported means are rounded to two decimals.
///
/// `psi` repeats `positive_average`; both names are part of the output contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub total_score: u32,
    pub positive_count: u32,
    pub positive_average: f64,
    pub gsi: f64,
    pub psi: f64,
    pub factor_scores: BTreeMap<String, FactorScore>,
    pub assessment: OverallAssessment,
}

/// Responses were validated against a different question bank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("responses belong to a {actual}-item bank, engine expects {expected} items")]
pub struct BankMismatch {
    pub expected: u16,
    pub actual: u16,
}

/// Pure scorer bound to one question bank.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    bank: Arc<QuestionBank>,
}

impl ScoringEngine {
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self { bank }
    }

    pub fn standard() -> Self {
        Self::new(Arc::new(QuestionBank::standard()))
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn validate(&self, answers: &AnswerSet) -> Result<Responses, AnswerSetError> {
        Responses::validate(&self.bank, answers)
    }

    /// Scores responses produced by [`ScoringEngine::validate`] on an engine with the same bank.
    pub fn score(&self, responses: &Responses) -> Result<ScoreReport, BankMismatch> {
        if !Arc::ptr_eq(responses.bank(), &self.bank) && **responses.bank() != *self.bank {
            return Err(BankMismatch {
                expected: self.bank.question_count(),
                actual: responses.bank().question_count(),
            });
        }

        let total_score: u32 = responses.values().map(u32::from).sum();
        let (positive_count, positive_sum) = responses
            .values()
            .filter(|&value| value >= ELEVATED_RESPONSE)
            .fold((0u32, 0u32), |(count, sum), value| {
                (count + 1, sum + u32::from(value))
            });

        let positive_average = if positive_count > 0 {
            round_ratio(positive_sum, positive_count)
        } else {
            0.0
        };

        let question_count = u32::from(self.bank.question_count());
        let gsi = round_ratio(total_score, question_count);
        let level = band(total_score, question_count, &OVERALL_LADDER, OverallLevel::Good);

        let factor_scores = self
            .bank
            .factors()
            .iter()
            .map(|factor| {
                let score: u32 = factor
                    .question_ids
                    .iter()
                    .filter_map(|&question| responses.value(question))
                    .map(u32::from)
                    .sum();
                let items = factor.question_ids.len() as u32;
                let severity = band(score, items, &FACTOR_LADDER, SeverityBand::Normal);
                let entry = FactorScore {
                    score,
                    average: round_ratio(score, items),
                    severity,
                    label: severity.label(),
                };
                (factor.key.clone(), entry)
            })
            .collect();

        Ok(ScoreReport {
            total_score,
            positive_count,
            positive_average,
            gsi,
            psi: positive_average,
            factor_scores,
            assessment: level.into(),
        })
    }
}

/// `numerator / denominator` rounded half-up to two decimals, computed on integers.
fn round_ratio(numerator: u32, denominator: u32) -> f64 {
    let (numerator, denominator) = (u64::from(numerator), u64::from(denominator));
    let hundredths = (200 * numerator + denominator) / (2 * denominator);
    hundredths as f64 / 100.0
}

/// Walks a ladder against the unrounded mean `numerator / denominator`.
fn band<T: Copy>(numerator: u32, denominator: u32, ladder: &[(u32, T)], floor: T) -> T {
    let scaled = u64::from(numerator) * 100;
    ladder
        .iter()
        .find(|(bound, _)| scaled >= u64::from(*bound) * u64::from(denominator))
        .map(|&(_, level)| level)
        .unwrap_or(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::bank::Factor;

    fn engine() -> ScoringEngine {
        ScoringEngine::standard()
    }

    fn score(answers: &AnswerSet) -> ScoreReport {
        let engine = engine();
        let responses = engine.validate(answers).expect("valid answers");
        engine.score(&responses).expect("same bank")
    }

    fn four_item_engine() -> ScoringEngine {
        let bank = QuestionBank::new(
            4,
            vec![
                Factor::new("first", "First", "", &[1, 2]),
                Factor::new("second", "Second", "", &[3, 4]),
            ],
        )
        .expect("valid bank");
        ScoringEngine::new(Arc::new(bank))
    }

    fn patterned_answers() -> AnswerSet {
        (1..=90).map(|id| (id, (id * 7 % 5) + 1)).collect()
    }

    #[test]
    fn minimum_answers_score_as_good() {
        let report = score(&AnswerSet::uniform(&QuestionBank::standard(), 1));

        assert_eq!(report.total_score, 90);
        assert_eq!(report.gsi, 1.0);
        assert_eq!(report.positive_count, 0);
        assert_eq!(report.positive_average, 0.0);
        assert_eq!(report.psi, 0.0);
        assert_eq!(report.assessment.level, OverallLevel::Good);
        assert_eq!(report.assessment.label, "good");
        assert_eq!(report.factor_scores.len(), 10);
        for factor in report.factor_scores.values() {
            assert_eq!(factor.average, 1.0);
            assert_eq!(factor.severity, SeverityBand::Normal);
        }
    }

    #[test]
    fn maximum_answers_score_as_needs_attention() {
        let report = score(&AnswerSet::uniform(&QuestionBank::standard(), 5));

        assert_eq!(report.total_score, 450);
        assert_eq!(report.gsi, 5.0);
        assert_eq!(report.positive_count, 90);
        assert_eq!(report.positive_average, 5.0);
        assert_eq!(report.assessment.level, OverallLevel::NeedsAttention);
        assert!(report
            .factor_scores
            .values()
            .all(|factor| factor.severity == SeverityBand::Severe));
    }

    #[test]
    fn totals_and_positive_items_follow_the_answers() {
        let answers = patterned_answers();
        let values: Vec<i64> = (1..=90).map(|id| (id * 7 % 5) + 1).collect();
        let expected_total: i64 = values.iter().sum();
        let elevated: Vec<i64> = values.iter().copied().filter(|&v| v >= 2).collect();

        let report = score(&answers);

        assert_eq!(i64::from(report.total_score), expected_total);
        assert_eq!(report.positive_count as usize, elevated.len());
        assert!(report.positive_count <= 90);
        assert_eq!(report.psi, report.positive_average);
        let factor_total: u32 = report.factor_scores.values().map(|f| f.score).sum();
        assert_eq!(factor_total, report.total_score);
    }

    #[test]
    fn scoring_is_deterministic() {
        let answers = patterned_answers();
        let first = serde_json::to_vec(&score(&answers)).expect("serializes");
        let second = serde_json::to_vec(&score(&answers)).expect("serializes");
        assert_eq!(first, second);
    }

    #[test]
    fn rounds_half_up_on_exact_arithmetic() {
        assert_eq!(round_ratio(1, 8), 0.13);
        assert_eq!(round_ratio(19, 12), 1.58);
        assert_eq!(round_ratio(201, 200), 1.01);
        assert_eq!(round_ratio(14, 9), 1.56);
        assert_eq!(round_ratio(10, 10), 1.0);
    }

    #[test]
    fn bands_compare_unrounded_means() {
        // 1.50 exactly opens the mild band.
        assert_eq!(band(3, 2, &FACTOR_LADDER, SeverityBand::Normal), SeverityBand::Mild);
        // 149/100 stays normal even though it is close.
        assert_eq!(
            band(149, 100, &FACTOR_LADDER, SeverityBand::Normal),
            SeverityBand::Normal
        );
        // 2.4975 displays as 2.50 but remains moderate.
        assert_eq!(round_ratio(999, 400), 2.5);
        assert_eq!(
            band(999, 400, &FACTOR_LADDER, SeverityBand::Normal),
            SeverityBand::Moderate
        );
        assert_eq!(
            band(5, 2, &FACTOR_LADDER, SeverityBand::Normal),
            SeverityBand::ModeratelySevere
        );
        assert_eq!(band(3, 1, &FACTOR_LADDER, SeverityBand::Normal), SeverityBand::Severe);
    }

    #[test]
    fn overall_level_follows_gsi_ladder() {
        let bank = QuestionBank::standard();
        // 45 items at 2 and 45 at 1: gsi 1.5.
        let answers: AnswerSet = bank
            .question_ids()
            .map(|id| (i64::from(id.0), if id.0 <= 45 { 2 } else { 1 }))
            .collect();
        assert_eq!(score(&answers).assessment.level, OverallLevel::MildSymptoms);

        let report = score(&AnswerSet::uniform(&bank, 2));
        assert_eq!(report.assessment.level, OverallLevel::ModerateSymptoms);
        assert_eq!(report.positive_count, 90);

        let report = score(&AnswerSet::uniform(&bank, 3));
        assert_eq!(report.assessment.level, OverallLevel::NeedsAttention);
    }

    #[test]
    fn factor_scores_use_their_own_items() {
        let bank = QuestionBank::standard();
        let hostility = bank.factor("hostility").expect("hostility").clone();
        let answers: AnswerSet = bank
            .question_ids()
            .map(|id| {
                let value = if hostility.question_ids.contains(&id) { 4 } else { 1 };
                (i64::from(id.0), value)
            })
            .collect();

        let report = score(&answers);
        let entry = &report.factor_scores["hostility"];
        assert_eq!(entry.score, 24);
        assert_eq!(entry.average, 4.0);
        assert_eq!(entry.severity, SeverityBand::Severe);
        assert_eq!(entry.label, "severe");
        assert_eq!(report.factor_scores["depression"].label, "normal");
        assert_eq!(report.factor_scores["depression"].severity, SeverityBand::Normal);
        assert_eq!(report.positive_count, 6);
        assert_eq!(report.positive_average, 4.0);
    }

    #[test]
    fn engine_accepts_alternate_banks() {
        let engine = four_item_engine();
        let answers: AnswerSet = [(1, 1), (2, 2), (3, 5), (4, 5)].into_iter().collect();

        let report = engine
            .score(&engine.validate(&answers).expect("valid"))
            .expect("same bank");

        assert_eq!(report.total_score, 13);
        assert_eq!(report.gsi, 3.25);
        assert_eq!(report.positive_count, 3);
        assert_eq!(report.positive_average, 4.0);
        assert_eq!(report.factor_scores["first"].severity, SeverityBand::Mild);
        assert_eq!(report.factor_scores["second"].severity, SeverityBand::Severe);
    }

    #[test]
    fn responses_from_another_bank_are_rejected() {
        let small = four_item_engine();
        let standard = engine();
        let few = small
            .validate(&[(1, 2), (2, 2), (3, 2), (4, 2)].into_iter().collect::<AnswerSet>())
            .expect("valid for small bank");
        let full = standard
            .validate(&AnswerSet::uniform(standard.bank(), 1))
            .expect("valid for standard bank");

        assert_eq!(
            standard.score(&few),
            Err(BankMismatch {
                expected: 90,
                actual: 4
            })
        );
        assert_eq!(
            small.score(&full),
            Err(BankMismatch {
                expected: 4,
                actual: 90
            })
        );
    }

    #[test]
    fn equal_banks_in_separate_engines_score_alike() {
        let first = engine();
        let second = engine();
        let responses = first
            .validate(&AnswerSet::uniform(first.bank(), 2))
            .expect("valid");

        assert_eq!(second.score(&responses), first.score(&responses));
        assert!(second.score(&responses).is_ok());
    }
}
