//! Core types shared across MathDrill components.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{DEFAULT_DIFFICULTY_FLOOR, MAX_OPERAND_VALUE, session_limits};
use crate::error::DrillError;

/// Arithmetic operation a question is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Addition,
        Operation::Subtraction,
        Operation::Multiplication,
        Operation::Division,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Addition => "addition",
            Self::Subtraction => "subtraction",
            Self::Multiplication => "multiplication",
            Self::Division => "division",
        }
    }

    /// Symbol used when rendering a question (`7 × 3`)
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Addition => "+",
            Self::Subtraction => "-",
            Self::Multiplication => "×",
            Self::Division => "÷",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = DrillError;

    /// Accepts operation names (any case) and the usual symbols.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "addition" | "add" | "+" => Ok(Self::Addition),
            "subtraction" | "subtract" | "-" => Ok(Self::Subtraction),
            "multiplication" | "multiply" | "*" | "×" | "x" => Ok(Self::Multiplication),
            "division" | "divide" | "/" | "÷" => Ok(Self::Division),
            other => Err(DrillError::InvalidOperation(other.to_string())),
        }
    }
}

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    pub lower: i64,
    pub upper: i64,
}

impl NumberRange {
    pub fn new(lower: i64, upper: i64) -> Result<Self, DrillError> {
        let range = Self { lower, upper };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), DrillError> {
        if self.lower > self.upper {
            return Err(DrillError::InvalidConstraint(format!(
                "lower bound {} exceeds upper bound {}",
                self.lower, self.upper
            )));
        }
        Ok(())
    }

    pub fn contains(&self, value: i64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

impl FromStr for NumberRange {
    type Err = DrillError;

    /// Parses `LO..HI` or `LO..=HI`, both inclusive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lower, upper) = s
            .split_once("..=")
            .or_else(|| s.split_once(".."))
            .ok_or_else(|| DrillError::InvalidInput(format!("expected LO..HI, got {s:?}")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<i64>()
                .map_err(|_| DrillError::InvalidInput(format!("invalid range bound: {v:?}")))
        };
        Self::new(parse(lower)?, parse(upper)?)
    }
}

impl fmt::Display for NumberRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

fn default_multiple() -> i64 {
    1
}

/// How one operand of a question must be chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperandConstraint {
    pub bounds: NumberRange,

    /// The operand must be an exact multiple of this factor
    #[serde(default = "default_multiple")]
    pub multiple: i64,
}

impl OperandConstraint {
    pub fn new(bounds: NumberRange, multiple: i64) -> Result<Self, DrillError> {
        let constraint = Self { bounds, multiple };
        constraint.validate()?;
        Ok(constraint)
    }

    /// Plain range, any integer allowed
    pub fn range(lower: i64, upper: i64) -> Result<Self, DrillError> {
        Self::new(NumberRange::new(lower, upper)?, 1)
    }

    pub fn validate(&self) -> Result<(), DrillError> {
        self.bounds.validate()?;
        if self.bounds.lower < 0 {
            return Err(DrillError::InvalidConstraint(format!(
                "operand bounds must be non-negative, got {}",
                self.bounds
            )));
        }
        if self.bounds.upper > MAX_OPERAND_VALUE {
            return Err(DrillError::InvalidConstraint(format!(
                "operand upper bound {} exceeds {}",
                self.bounds.upper, MAX_OPERAND_VALUE
            )));
        }
        if self.multiple < 1 {
            return Err(DrillError::InvalidConstraint(format!(
                "required multiple must be at least 1, got {}",
                self.multiple
            )));
        }
        Ok(())
    }

    /// True if `value` is within bounds and a multiple of the factor
    pub fn admits(&self, value: i64) -> bool {
        self.bounds.contains(value) && value % self.multiple == 0
    }
}

/// Filtering rules applied on top of arithmetic correctness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyPolicy {
    /// Reject zero/one factors, equal operands and zero-result subtractions
    pub reject_degenerate: bool,

    /// Minimum ratio of the smaller operand to the operation's scale, in `[0, 1]`
    pub difficulty_floor: f64,
}

impl DifficultyPolicy {
    pub fn strict(difficulty_floor: f64) -> Self {
        Self {
            reject_degenerate: true,
            difficulty_floor: difficulty_floor.clamp(0.0, 1.0),
        }
    }

    /// Only arithmetic correctness, no filtering
    pub fn relaxed() -> Self {
        Self {
            reject_degenerate: false,
            difficulty_floor: 0.0,
        }
    }
}

impl Default for DifficultyPolicy {
    fn default() -> Self {
        Self::strict(DEFAULT_DIFFICULTY_FLOOR)
    }
}

/// Session difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    /// Overall time limit for a session at this level
    pub fn time_limit_secs(&self) -> u64 {
        match self {
            Self::Easy => session_limits::EASY_SECS,
            Self::Medium => session_limits::MEDIUM_SECS,
            Self::Hard => session_limits::HARD_SECS,
        }
    }

    pub fn policy(&self) -> DifficultyPolicy {
        match self {
            Self::Easy => DifficultyPolicy::relaxed(),
            Self::Medium => DifficultyPolicy::strict(0.3),
            Self::Hard => DifficultyPolicy::strict(0.4),
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = DrillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(DrillError::InvalidInput(format!(
                "unknown difficulty level: {other}"
            ))),
        }
    }
}

/// Where the random stream of a request comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SeedMode {
    /// Batch is a pure function of the seed and the request
    Deterministic { seed: u64 },
    /// Seeded from the wall clock, not reproducible
    #[default]
    Entropy,
}

impl SeedMode {
    /// Derive a deterministic seed from a session identifier
    pub fn from_session_id(session_id: &str) -> Self {
        let digest = Sha256::digest(session_id.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self::Deterministic {
            seed: u64::from_le_bytes(bytes),
        }
    }

    pub fn is_deterministic(&self) -> bool {
        matches!(self, Self::Deterministic { .. })
    }
}

/// Everything the generator needs to build one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub question_count: usize,

    /// Range the result of every question must fall within
    pub answer_bounds: NumberRange,

    pub operand_a: OperandConstraint,
    pub operand_b: OperandConstraint,

    /// Allowed operations (treated as a set)
    pub operations: Vec<Operation>,

    /// Wall-clock budget; the generator's configured default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_budget: Option<Duration>,

    #[serde(default)]
    pub seed_mode: SeedMode,

    #[serde(default)]
    pub policy: DifficultyPolicy,
}

impl GenerationRequest {
    /// One shared range for both operands and the answer
    pub fn new(question_count: usize, range: NumberRange, operations: Vec<Operation>) -> Self {
        let operand = OperandConstraint {
            bounds: range,
            multiple: 1,
        };
        Self {
            question_count,
            answer_bounds: range,
            operand_a: operand,
            operand_b: operand,
            operations,
            time_budget: None,
            seed_mode: SeedMode::Entropy,
            policy: DifficultyPolicy::default(),
        }
    }

    pub fn with_operands(mut self, operand_a: OperandConstraint, operand_b: OperandConstraint) -> Self {
        self.operand_a = operand_a;
        self.operand_b = operand_b;
        self
    }

    pub fn with_answer_bounds(mut self, answer_bounds: NumberRange) -> Self {
        self.answer_bounds = answer_bounds;
        self
    }

    pub fn with_seed_mode(mut self, seed_mode: SeedMode) -> Self {
        self.seed_mode = seed_mode;
        self
    }

    pub fn with_policy(mut self, policy: DifficultyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Operations with duplicates removed, first occurrence wins
    pub fn distinct_operations(&self) -> Vec<Operation> {
        let mut ops = Vec::with_capacity(self.operations.len());
        for op in &self.operations {
            if !ops.contains(op) {
                ops.push(*op);
            }
        }
        ops
    }

    /// Check structural invariants (not satisfiability)
    pub fn validate(&self) -> Result<(), DrillError> {
        if self.operations.is_empty() {
            return Err(DrillError::InvalidOperation(
                "no operations selected".to_string(),
            ));
        }
        if self.question_count == 0 {
            return Err(DrillError::InvalidConstraint(
                "question count must be positive".to_string(),
            ));
        }
        self.answer_bounds.validate()?;
        self.operand_a.validate()?;
        self.operand_b.validate()?;
        Ok(())
    }
}

/// Identity of a question within a batch
pub type QuestionKey = (i64, i64, Operation);

/// A generated arithmetic question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub operand_a: i64,
    pub operand_b: i64,
    pub operation: Operation,
    pub correct_answer: i64,
}

impl Question {
    pub fn key(&self) -> QuestionKey {
        (self.operand_a, self.operand_b, self.operation)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.operand_a,
            self.operation.symbol(),
            self.operand_b
        )
    }
}

/// The generator's output: questions in slot order plus how they were obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBatch {
    pub questions: Vec<Question>,

    pub seed_mode: SeedMode,

    /// Seed actually used (equals the explicit seed in deterministic mode)
    pub seed: u64,

    /// Slots filled by the simple constructor after the strict ceiling
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_slots: Vec<usize>,

    /// Slots where a repeated question had to be accepted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repeated_slots: Vec<usize>,

    /// Unix timestamp (seconds)
    pub generated_at: i64,
}

impl QuestionBatch {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn has_repeats(&self) -> bool {
        !self.repeated_slots.is_empty()
    }
}

/// A submitted answer, numeric or in string form
///
/// JSON integers deserialize into `Integer` so large answers compare exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl SubmittedAnswer {
    /// Exact integer value; `"12"`, `"12.000"` and `12.0` all count, `12.5` does not
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Number(n) => integral(*n),
            Self::Text(s) => {
                let s = s.trim();
                if let Ok(n) = s.parse::<i64>() {
                    return Some(n);
                }
                match s.split_once('.') {
                    Some((whole, fraction))
                        if !whole.is_empty() && fraction.bytes().all(|c| c == b'0') =>
                    {
                        whole.parse::<i64>().ok()
                    }
                    _ => integral(s.parse::<f64>().ok()?),
                }
            }
        }
    }

    /// Normalize to a finite number; unparseable text yields `None`
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Self::Integer(n) => *n as f64,
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// Integral floats below 2^53, where `f64` still represents every integer
fn integral(value: f64) -> Option<i64> {
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;
    (value.is_finite() && value.fract() == 0.0 && value.abs() < EXACT_LIMIT)
        .then_some(value as i64)
}

impl From<i64> for SubmittedAnswer {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SubmittedAnswer {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for SubmittedAnswer {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// An answer to check, as received from a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub operand_a: i64,
    pub operand_b: i64,
    pub operation: String,
    pub submitted_answer: SubmittedAnswer,
}

/// Result of checking an answer against a re-derived question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerCheck {
    pub is_correct: bool,
    pub correct_answer: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parsing() {
        assert_eq!("Addition".parse::<Operation>().unwrap(), Operation::Addition);
        assert_eq!(" division ".parse::<Operation>().unwrap(), Operation::Division);
        assert_eq!("*".parse::<Operation>().unwrap(), Operation::Multiplication);
        assert_eq!("÷".parse::<Operation>().unwrap(), Operation::Division);
        assert!(matches!(
            "modulo".parse::<Operation>(),
            Err(DrillError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_operation_serde_names() {
        let json = serde_json::to_string(&Operation::Multiplication).unwrap();
        assert_eq!(json, "\"multiplication\"");
        let op: Operation = serde_json::from_str("\"subtraction\"").unwrap();
        assert_eq!(op, Operation::Subtraction);
    }

    #[test]
    fn test_range_parsing() {
        assert_eq!("1..10".parse::<NumberRange>().unwrap(), NumberRange::new(1, 10).unwrap());
        assert_eq!("5..=20".parse::<NumberRange>().unwrap(), NumberRange::new(5, 20).unwrap());
        assert!("10..1".parse::<NumberRange>().is_err());
        assert!("1-10".parse::<NumberRange>().is_err());
        assert!("a..b".parse::<NumberRange>().is_err());
    }

    #[test]
    fn test_constraint_validation() {
        assert!(NumberRange::new(10, 1).is_err());
        assert!(OperandConstraint::range(-5, 5).is_err());
        assert!(OperandConstraint::new(NumberRange::new(1, 20).unwrap(), 0).is_err());
        assert!(OperandConstraint::range(0, MAX_OPERAND_VALUE + 1).is_err());

        let fives = OperandConstraint::new(NumberRange::new(1, 20).unwrap(), 5).unwrap();
        assert!(fives.admits(15));
        assert!(!fives.admits(12));
        assert!(!fives.admits(25));
    }

    #[test]
    fn test_session_seed_is_stable() {
        let a = SeedMode::from_session_id("3f2a-session");
        let b = SeedMode::from_session_id("3f2a-session");
        let c = SeedMode::from_session_id("other-session");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_deterministic());
        assert!(!SeedMode::Entropy.is_deterministic());
    }

    #[test]
    fn test_difficulty_levels() {
        assert_eq!(DifficultyLevel::Easy.time_limit_secs(), 900);
        assert_eq!(DifficultyLevel::Hard.time_limit_secs(), 300);
        assert!(!DifficultyLevel::Easy.policy().reject_degenerate);
        assert_eq!(DifficultyLevel::Hard.policy().difficulty_floor, 0.4);
        assert_eq!("MEDIUM".parse::<DifficultyLevel>().unwrap(), DifficultyLevel::Medium);
    }

    #[test]
    fn test_request_validation() {
        let range = NumberRange::new(1, 10).unwrap();
        let empty = GenerationRequest::new(5, range, vec![]);
        assert!(matches!(empty.validate(), Err(DrillError::InvalidOperation(_))));

        let zero = GenerationRequest::new(0, range, vec![Operation::Addition]);
        assert!(matches!(zero.validate(), Err(DrillError::InvalidConstraint(_))));

        let dup = GenerationRequest::new(
            5,
            range,
            vec![Operation::Addition, Operation::Division, Operation::Addition],
        );
        assert_eq!(
            dup.distinct_operations(),
            vec![Operation::Addition, Operation::Division]
        );
    }

    #[test]
    fn test_submitted_answer_normalization() {
        assert_eq!(SubmittedAnswer::from("  2 ").as_number(), Some(2.0));
        assert_eq!(SubmittedAnswer::from("2.0").as_number(), Some(2.0));
        assert_eq!(SubmittedAnswer::from("two").as_number(), None);
        assert_eq!(SubmittedAnswer::from(7_i64).as_number(), Some(7.0));

        let parsed: SubmittedAnswer = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(parsed.as_number(), Some(12.0));
        let parsed: SubmittedAnswer = serde_json::from_str("12").unwrap();
        assert_eq!(parsed.as_number(), Some(12.0));
        assert_eq!(parsed, SubmittedAnswer::Integer(12));
        let parsed: SubmittedAnswer = serde_json::from_str("12.5").unwrap();
        assert_eq!(parsed, SubmittedAnswer::Number(12.5));
    }

    #[test]
    fn test_submitted_answer_integers_are_exact() {
        let big = 999_999_999_000_000_001_i64;
        assert_eq!(SubmittedAnswer::from(big).as_integer(), Some(big));
        assert_eq!(SubmittedAnswer::from(" 999999999000000001 ").as_integer(), Some(big));
        assert_eq!(SubmittedAnswer::from("-4.00").as_integer(), Some(-4));
        assert_eq!(SubmittedAnswer::from(12.0).as_integer(), Some(12));
        assert_eq!(SubmittedAnswer::from("3.5").as_integer(), None);
        assert_eq!(SubmittedAnswer::from(3.5).as_integer(), None);
        assert_eq!(SubmittedAnswer::from(1e18).as_integer(), None);
        assert_eq!(SubmittedAnswer::from("two").as_integer(), None);
    }

    #[test]
    fn test_question_display() {
        let q = Question {
            operand_a: 12,
            operand_b: 4,
            operation: Operation::Division,
            correct_answer: 3,
        };
        assert_eq!(q.to_string(), "12 ÷ 4");
        assert_eq!(q.key(), (12, 4, Operation::Division));
    }
}
