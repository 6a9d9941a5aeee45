//! Question bank, answer validation and the scoring engine.

pub mod answers;
pub mod bank;
pub mod scoring;

pub use answers::{
    AnswerSet, AnswerSetError, Responses, ELEVATED_RESPONSE, MAX_RESPONSE, MIN_RESPONSE,
};
pub use bank::{Factor, QuestionBank, QuestionBankError, QuestionId, SCL90_QUESTION_COUNT};
pub use scoring::{
    BankMismatch, FactorScore, OverallAssessment, OverallLevel, ScoreReport, ScoringEngine,
    SeverityBand,
};
