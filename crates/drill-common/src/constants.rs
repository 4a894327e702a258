//! Shared constants for MathDrill components.

/// Largest value an operand bound may take.
///
/// Keeps every product of two operands inside `i64`.
pub const MAX_OPERAND_VALUE: i64 = 1_000_000_000;

/// Default number of questions in a practice session
pub const DEFAULT_QUESTION_COUNT: usize = 15;

/// Strict attempts per question slot before falling back to a simple question
pub const DEFAULT_MAX_ATTEMPTS_PER_QUESTION: u32 = 100;

/// Default wall-clock budget for one generation call (2 seconds)
pub const DEFAULT_TIME_BUDGET_MS: u64 = 2_000;

/// Extra time the async runner grants before abandoning a blocking generation
pub const DEFAULT_TIMEOUT_GRACE_MS: u64 = 250;

/// Canonical difficulty floor (smaller operand vs. operation scale)
pub const DEFAULT_DIFFICULTY_FLOOR: f64 = 0.3;

/// Tries at drawing the first operand inside the simple question constructor
pub const SIMPLE_OPERAND_TRIES: u32 = 16;

/// Overall session time limits per difficulty level (seconds)
pub mod session_limits {
    /// Easy sessions: 15 minutes
    pub const EASY_SECS: u64 = 15 * 60;

    /// Medium sessions: 10 minutes
    pub const MEDIUM_SECS: u64 = 10 * 60;

    /// Hard sessions: 5 minutes
    pub const HARD_SECS: u64 = 5 * 60;
}
