//! # Drill - MathDrill command line driver
//!
//! Generates question batches and verifies answers using the `drill`
//! library, with the same configuration and logging a hosting service uses.
//!
//! ```text
//! drill generate --operations addition,division --range 1..20 --session <id>
//! drill verify 6 3 division 2
//! ```

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use drill_common::{
    DifficultyLevel, GenerationRequest, NumberRange, OperandConstraint, Operation, SeedMode,
    SubmittedAnswer,
};

mod config;

use config::AppConfig;

/// MathDrill - arithmetic practice question engine
#[derive(Parser, Debug)]
#[command(name = "drill")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/drill.toml")]
    config: String,

    /// Generation time budget in milliseconds (overrides config)
    #[arg(long, env = "DRILL_TIME_BUDGET_MS")]
    time_budget_ms: Option<u64>,

    /// Strict attempts per question (overrides config)
    #[arg(long, env = "DRILL_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a batch of questions and print it as JSON
    Generate(GenerateArgs),
    /// Check an answer: prints true or false
    Verify(VerifyArgs),
}

#[derive(ClapArgs, Debug)]
struct GenerateArgs {
    /// Number of questions (defaults to the session setting)
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Comma-separated operations (names or symbols)
    #[arg(short, long, value_delimiter = ',', default_value = "addition")]
    operations: Vec<Operation>,

    /// Shared range for both operands and the answer, e.g. 1..10
    #[arg(short, long, default_value = "1..10")]
    range: NumberRange,

    /// Range for operand A (defaults to --range)
    #[arg(long)]
    a_range: Option<NumberRange>,

    /// Operand A must be a multiple of this
    #[arg(long, default_value_t = 1)]
    a_multiple: i64,

    /// Range for operand B (defaults to --range)
    #[arg(long)]
    b_range: Option<NumberRange>,

    /// Operand B must be a multiple of this
    #[arg(long, default_value_t = 1)]
    b_multiple: i64,

    /// Range every answer must fall within (defaults to --range)
    #[arg(long)]
    answer_range: Option<NumberRange>,

    /// Session identifier; makes the batch reproducible
    #[arg(long, conflicts_with = "seed")]
    session: Option<String>,

    /// Explicit seed; makes the batch reproducible
    #[arg(long)]
    seed: Option<u64>,

    /// Difficulty preset (easy, medium, hard); defaults to the generator policy
    #[arg(short, long)]
    difficulty: Option<DifficultyLevel>,

    /// Print only question N (0-based) of the batch
    #[arg(long)]
    index: Option<usize>,
}

#[derive(ClapArgs, Debug)]
struct VerifyArgs {
    #[arg(allow_negative_numbers = true)]
    operand_a: i64,
    #[arg(allow_negative_numbers = true)]
    operand_b: i64,
    /// Operation name or symbol
    operation: String,
    /// Submitted answer
    #[arg(allow_negative_numbers = true)]
    answer: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    info!("Starting MathDrill v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::load(&args.config, &args)?;
    info!("Configuration loaded from {}", args.config);

    let service = config.build_service();

    match &args.command {
        Command::Generate(generate) => {
            let request = build_request(generate, &config)?;
            let batch = service
                .generate(request)
                .await
                .context("Question generation failed")?;

            let output = match generate.index {
                Some(index) => serde_json::to_string_pretty(&drill::session::pick(&batch, index)?)?,
                None => serde_json::to_string_pretty(&batch)?,
            };
            println!("{output}");
        }
        Command::Verify(verify) => {
            let submitted = SubmittedAnswer::from(verify.answer.as_str());
            let correct = service
                .verifier
                .verify_tagged(verify.operand_a, verify.operand_b, &verify.operation, &submitted)
                .context("Answer verification failed")?;
            println!("{correct}");
        }
    }

    Ok(())
}

/// Assemble a generation request from CLI arguments and configured defaults
fn build_request(args: &GenerateArgs, config: &AppConfig) -> Result<GenerationRequest> {
    let policy = match args.difficulty {
        Some(level) => level.policy(),
        None => config.generator.policy(),
    };
    let seed_mode = match (&args.session, args.seed) {
        (Some(session), _) => SeedMode::from_session_id(session),
        (None, Some(seed)) => SeedMode::Deterministic { seed },
        (None, None) => SeedMode::Entropy,
    };

    let operand_a = OperandConstraint::new(args.a_range.unwrap_or(args.range), args.a_multiple)
        .context("Invalid operand A constraint")?;
    let operand_b = OperandConstraint::new(args.b_range.unwrap_or(args.range), args.b_multiple)
        .context("Invalid operand B constraint")?;

    let count = args.count.unwrap_or(config.session.question_count);

    Ok(GenerationRequest::new(count, args.range, args.operations.clone())
        .with_operands(operand_a, operand_b)
        .with_answer_bounds(args.answer_range.unwrap_or(args.range))
        .with_policy(policy)
        .with_seed_mode(seed_mode))
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_args_build_request() {
        let args = Args::parse_from([
            "drill",
            "generate",
            "-n",
            "4",
            "--operations",
            "*,division",
            "--range",
            "1..100",
            "--a-range",
            "1..20",
            "--a-multiple",
            "5",
            "--session",
            "abc",
            "--difficulty",
            "hard",
        ]);
        let Command::Generate(generate) = &args.command else {
            panic!("expected generate subcommand");
        };
        let request = build_request(generate, &AppConfig::default()).unwrap();

        assert_eq!(request.question_count, 4);
        assert_eq!(
            request.operations,
            vec![Operation::Multiplication, Operation::Division]
        );
        assert_eq!(request.operand_a.multiple, 5);
        assert_eq!(request.operand_a.bounds, NumberRange::new(1, 20).unwrap());
        assert_eq!(request.operand_b.bounds, NumberRange::new(1, 100).unwrap());
        assert_eq!(request.seed_mode, SeedMode::from_session_id("abc"));
        assert_eq!(request.policy, DifficultyLevel::Hard.policy());
    }

    #[test]
    fn test_session_and_seed_conflict() {
        let result = Args::try_parse_from(["drill", "generate", "--session", "abc", "--seed", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_args() {
        let args = Args::parse_from(["drill", "verify", "6", "3", "division", "2"]);
        let Command::Verify(verify) = &args.command else {
            panic!("expected verify subcommand");
        };
        assert_eq!(verify.operation, "division");
        assert_eq!(verify.answer, "2");
    }

    #[test]
    fn test_verify_accepts_negative_answer() {
        let args = Args::parse_from(["drill", "verify", "5", "9", "subtraction", "-4"]);
        let Command::Verify(verify) = &args.command else {
            panic!("expected verify subcommand");
        };
        assert_eq!(verify.operand_a, 5);
        assert_eq!(verify.answer, "-4");
    }
}
