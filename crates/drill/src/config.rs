//! Configuration management for Drill.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use drill::{AnswerVerifier, DivisionMode, DrillService, QuestionGenerator};
use drill_common::constants::{
    DEFAULT_DIFFICULTY_FLOOR, DEFAULT_MAX_ATTEMPTS_PER_QUESTION, DEFAULT_QUESTION_COUNT,
    DEFAULT_TIME_BUDGET_MS, DEFAULT_TIMEOUT_GRACE_MS,
};
use drill_common::{DifficultyLevel, DifficultyPolicy};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Question generator configuration
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Session defaults
    #[serde(default)]
    pub session: SessionConfig,
}

/// Generator-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// Strict attempts per question before the simple fallback
    #[serde(default = "default_max_attempts")]
    pub max_attempts_per_question: u32,

    /// Wall-clock budget per generation call in milliseconds
    #[serde(default = "default_time_budget_ms")]
    pub time_budget_ms: u64,

    /// Grace period before the async runner gives up, in milliseconds
    #[serde(default = "default_timeout_grace_ms")]
    pub timeout_grace_ms: u64,

    /// Minimum ratio of the smaller operand to the operation scale
    #[serde(default = "default_difficulty_floor")]
    pub difficulty_floor: f64,

    /// Reject zero/one factors and equal operands
    #[serde(default = "default_reject_degenerate")]
    pub reject_degenerate: bool,

    /// Exact or truncating division when verifying answers
    #[serde(default)]
    pub division_mode: DivisionMode,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_attempts_per_question: default_max_attempts(),
            time_budget_ms: default_time_budget_ms(),
            timeout_grace_ms: default_timeout_grace_ms(),
            difficulty_floor: default_difficulty_floor(),
            reject_degenerate: default_reject_degenerate(),
            division_mode: DivisionMode::default(),
        }
    }
}

impl GeneratorConfig {
    /// Policy for requests that do not name a difficulty level
    pub fn policy(&self) -> DifficultyPolicy {
        if self.reject_degenerate {
            DifficultyPolicy::strict(self.difficulty_floor)
        } else {
            DifficultyPolicy {
                reject_degenerate: false,
                difficulty_floor: self.difficulty_floor.clamp(0.0, 1.0),
            }
        }
    }
}

/// Session defaults
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Questions per session
    #[serde(default = "default_question_count")]
    pub question_count: usize,

    /// Difficulty preset
    #[serde(default)]
    pub difficulty: DifficultyLevel,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            question_count: default_question_count(),
            difficulty: DifficultyLevel::default(),
        }
    }
}

// Default value functions
fn default_max_attempts() -> u32 { DEFAULT_MAX_ATTEMPTS_PER_QUESTION }
fn default_time_budget_ms() -> u64 { DEFAULT_TIME_BUDGET_MS }
fn default_timeout_grace_ms() -> u64 { DEFAULT_TIMEOUT_GRACE_MS }
fn default_difficulty_floor() -> f64 { DEFAULT_DIFFICULTY_FLOOR }
fn default_reject_degenerate() -> bool { true }
fn default_question_count() -> usize { DEFAULT_QUESTION_COUNT }

impl AppConfig {
    /// Load configuration from file and `DRILL__*` environment, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        if !Path::new(config_path).exists() {
            tracing::warn!(path = config_path, "Config file not found, using defaults");
        }

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("DRILL").separator("__"))
            .build()
            .context("Failed to load config file")?;

        let mut config: Self = settings
            .try_deserialize()
            .context("Failed to parse config")?;

        // Apply CLI overrides
        if let Some(budget) = args.time_budget_ms {
            config.generator.time_budget_ms = budget;
        }
        if let Some(attempts) = args.max_attempts {
            config.generator.max_attempts_per_question = attempts;
        }

        Ok(config)
    }

    /// Wire the generator and verifier from this configuration
    pub fn build_service(&self) -> DrillService {
        let generator = QuestionGenerator::new(
            self.generator.max_attempts_per_question,
            Duration::from_millis(self.generator.time_budget_ms),
        );
        DrillService::new(
            generator,
            AnswerVerifier::new(self.generator.division_mode),
            Duration::from_millis(self.generator.timeout_grace_ms),
        )
    }
}
