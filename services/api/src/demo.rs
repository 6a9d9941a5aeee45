use crate::infra::{build_services, read_answers};
use clap::Args;
use scl90::assessment::{AnswerSet, ScoreReport, ScoringEngine};
use scl90::config::RedemptionConfig;
use scl90::error::AppError;
use scl90::redemption::{GateError, TokenState};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON object mapping item numbers (1-90) to responses (1-5)
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Print the full report as JSON instead of a text summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Response used for every item in the demo submission (1-5)
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..=5))]
    pub(crate) response: Option<i64>,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let engine = ScoringEngine::standard();
    let answers = read_answers(&args.answers)?;
    let responses = engine
        .validate(&answers)
        .map_err(|err| AppError::Gate(GateError::InvalidAnswerSet(err)))?;
    let report = engine
        .score(&responses)
        .map_err(|err| AppError::Gate(GateError::Scoring(err)))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_report(&report);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let response = args.response.unwrap_or(3);
    let services = build_services(&RedemptionConfig::default());

    println!("SCL-90 redemption demo");
    let token = services
        .admin
        .generate(1, None)?
        .into_iter()
        .next()
        .ok_or(GateError::NotFound)?;
    println!("- Issued code {}", token.code);

    let presented = token.code.as_str().to_lowercase();
    let handle = match services.gate.check(&presented)? {
        TokenState::Fresh { handle } => handle,
        TokenState::Consumed { .. } => {
            println!("  Code was already used");
            return Ok(());
        }
    };
    println!("- Verified '{presented}' -> fresh (code id {})", handle.token_id());

    let answers = AnswerSet::uniform(services.gate.engine().bank(), response);
    let result = services.gate.submit(&handle, &answers)?;
    println!("- Submitted {} answers (all {response})", answers.len());
    render_report(&result.report);

    match services.gate.submit(&handle, &answers) {
        Err(GateError::AlreadyConsumed { .. }) => {
            println!("\n- Second submission rejected: code already used")
        }
        Ok(_) => println!("\n- Second submission unexpectedly accepted"),
        Err(err) => return Err(err.into()),
    }

    if let TokenState::Consumed { result: replay } = services.gate.check(&presented)? {
        println!(
            "- Re-verification returns the stored result from {} (total {})",
            replay.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            replay.report.total_score
        );
    }

    let stats = services.admin.stats()?;
    println!(
        "- Usage: {}/{} codes used ({:.1}%)",
        stats.used_codes, stats.total_codes, stats.usage_rate
    );
    Ok(())
}

fn render_report(report: &ScoreReport) {
    println!("\nAssessment: {}", report.assessment.label);
    println!("  {}", report.assessment.description);
    println!(
        "  Total {} | GSI {:.2} | positive items {} | PSI {:.2}",
        report.total_score, report.gsi, report.positive_count, report.psi
    );
    println!("Factors:");
    for (key, factor) in &report.factor_scores {
        println!(
            "  - {key}: score {} | mean {:.2} | {}",
            factor.score,
            factor.average,
            factor.label
        );
    }
}
