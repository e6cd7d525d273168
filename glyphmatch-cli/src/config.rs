//! JSON configuration for the CLI.
//!
//! Every field has a default, so a partial file (or `{}`) is valid.

use glyphmatch::{AttackConfig, FailurePolicy, PipelineConfig, SolveConfig};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicyConfig {
    Abort,
    Skip,
}

impl From<FailurePolicyConfig> for FailurePolicy {
    fn from(value: FailurePolicyConfig) -> Self {
        match value {
            FailurePolicyConfig::Abort => FailurePolicy::Abort,
            FailurePolicyConfig::Skip => FailurePolicy::Skip,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AttackConfigJson {
    pub target: u32,
    pub time_budget_secs: Option<f64>,
    pub on_failure: FailurePolicyConfig,
}

impl Default for AttackConfigJson {
    fn default() -> Self {
        let cfg = AttackConfig::default();
        Self {
            target: cfg.target,
            time_budget_secs: None,
            on_failure: FailurePolicyConfig::Abort,
        }
    }
}

impl AttackConfigJson {
    pub fn to_attack_config(&self) -> AttackConfig {
        AttackConfig {
            target: self.target,
            time_budget: self
                .time_budget_secs
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64),
            on_failure: self.on_failure.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfigJson {
    pub threshold: u8,
    pub noise_tolerance: usize,
}

impl Default for PipelineConfigJson {
    fn default() -> Self {
        let cfg = PipelineConfig::default();
        Self {
            threshold: cfg.threshold,
            noise_tolerance: cfg.noise_tolerance,
        }
    }
}

impl From<&PipelineConfigJson> for PipelineConfig {
    fn from(value: &PipelineConfigJson) -> Self {
        PipelineConfig {
            threshold: value.threshold,
            noise_tolerance: value.noise_tolerance,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SolveConfigJson {
    pub min_similarity: f64,
    pub parallel: bool,
}

impl Default for SolveConfigJson {
    fn default() -> Self {
        let cfg = SolveConfig::default();
        Self {
            min_similarity: cfg.min_similarity,
            parallel: cfg.parallel,
        }
    }
}

impl SolveConfigJson {
    /// Converts to the library config.
    ///
    /// `parallel` needs a binary built with the `rayon` feature.
    pub fn to_solve_config(&self) -> Result<SolveConfig, String> {
        if self.parallel && !cfg!(feature = "rayon") {
            return Err("solve.parallel requires glyphmatch-cli built with --features rayon".into());
        }
        Ok(SolveConfig {
            min_similarity: self.min_similarity,
            parallel: self.parallel,
        })
    }
}

/// Strings and patterns used to read the challenge page.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Regex whose first capture group is the base64 image payload.
    pub image_pattern: String,
    /// Literal text present only on pages that accepted the answer.
    pub success_marker: String,
    /// Regex whose first capture group is the numeric score.
    pub score_pattern: String,
    /// Regex matching the completion token.
    pub token_pattern: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            image_pattern: r#"src="data:image/[a-z]+;base64,([^"]+)""#.to_string(),
            success_marker: r#"<div class="alert alert-success" role="alert">"#.to_string(),
            score_pattern: r"Score: (\d+)".to_string(),
            token_pattern: r"grey\{[^}]*\}".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub submit_path: String,
    pub answer_field: String,
    pub corpus_dir: String,
    pub request_timeout_secs: u64,
    pub attack: AttackConfigJson,
    pub pipeline: PipelineConfigJson,
    pub solve: SolveConfigJson,
    pub markers: MarkerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5003".to_string(),
            submit_path: "/submit".to_string(),
            answer_field: "captcha".to_string(),
            corpus_dir: "corpus".to_string(),
            request_timeout_secs: 10,
            attack: AttackConfigJson::default(),
            pipeline: PipelineConfigJson::default(),
            solve: SolveConfigJson::default(),
            markers: MarkerConfig::default(),
        }
    }
}

impl Config {
    /// Joins the server URL and the submit path.
    pub fn submit_url(&self) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            self.submit_path.trim_start_matches('/')
        )
    }
}
