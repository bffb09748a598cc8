// Copyright (c) 2025 - Cowboy AI, Inc.
//! Crop Review Gate
//!
//! Decides whether the user has to look at the auto-computed crops before
//! choosing delivery. Runs once per order at "finish photos", after every
//! photo has an auto-crop.
//!
//! | mode            | show review                  |
//! |-----------------|------------------------------|
//! | `always`        | yes                          |
//! | `problems_only` | only if a photo needs review |
//! | `never`         | no                           |

pub mod classifier;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use classifier::{
    CenterCropClassifier, ClassifierError, ClassifierSettings, CropAnalyzer, CropClassifier,
    ImageData, InMemoryPhotoSource, PhotoSource,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown crop review mode: {0}")]
pub struct UnknownReviewMode(pub String);

/// When to show the crop review screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropReviewMode {
    Always,
    #[default]
    ProblemsOnly,
    Never,
}

impl CropReviewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropReviewMode::Always => "always",
            CropReviewMode::ProblemsOnly => "problems_only",
            CropReviewMode::Never => "never",
        }
    }
}

impl fmt::Display for CropReviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CropReviewMode {
    type Err = UnknownReviewMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(CropReviewMode::Always),
            "problems_only" => Ok(CropReviewMode::ProblemsOnly),
            "never" => Ok(CropReviewMode::Never),
            _ => Err(UnknownReviewMode(s.to_string())),
        }
    }
}

/// Outcome of the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropReviewDecision {
    pub show_review: bool,
    /// Photos whose confidence reached the threshold
    pub auto_approved: usize,
    /// Photos below the threshold or without a score
    pub needs_review: usize,
}

/// Decide whether the crop review UI is shown
///
/// ```rust
/// use photo_order_engine::crop::{should_show_crop_review, CropReviewMode};
///
/// let decision = should_show_crop_review(&[Some(0.9), Some(0.4), None], 0.7, CropReviewMode::ProblemsOnly);
/// assert!(decision.show_review);
/// assert_eq!((decision.auto_approved, decision.needs_review), (1, 2));
/// ```
pub fn should_show_crop_review(
    scores: &[Option<f64>],
    threshold: f64,
    mode: CropReviewMode,
) -> CropReviewDecision {
    let auto_approved = scores
        .iter()
        .filter(|score| matches!(score, Some(confidence) if *confidence >= threshold))
        .count();
    let needs_review = scores.len() - auto_approved;

    let show_review = match mode {
        CropReviewMode::Always => true,
        CropReviewMode::ProblemsOnly => needs_review > 0,
        CropReviewMode::Never => false,
    };

    CropReviewDecision {
        show_review,
        auto_approved,
        needs_review,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const SCORES: [Option<f64>; 4] = [Some(0.95), Some(0.7), Some(0.69), None];

    #[test_case(CropReviewMode::Always, &[Some(1.0)] => true; "always shows")]
    #[test_case(CropReviewMode::Never, &SCORES => false; "never hides")]
    #[test_case(CropReviewMode::ProblemsOnly, &SCORES => true; "problems present")]
    #[test_case(CropReviewMode::ProblemsOnly, &[Some(0.8), Some(0.7)] => false; "all confident")]
    fn test_show_review(mode: CropReviewMode, scores: &[Option<f64>]) -> bool {
        should_show_crop_review(scores, 0.7, mode).show_review
    }

    #[test]
    fn test_counts_threshold_inclusive() {
        let decision = should_show_crop_review(&SCORES, 0.7, CropReviewMode::Never);
        assert_eq!(decision.auto_approved, 2);
        assert_eq!(decision.needs_review, 2);
    }

    #[test]
    fn test_empty_scores() {
        let decision = should_show_crop_review(&[], 0.7, CropReviewMode::ProblemsOnly);
        assert!(!decision.show_review);
        assert_eq!(decision.needs_review, 0);
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("problems_only".parse::<CropReviewMode>(), Ok(CropReviewMode::ProblemsOnly));
        assert_eq!(" ALWAYS ".parse::<CropReviewMode>(), Ok(CropReviewMode::Always));
        assert!("sometimes".parse::<CropReviewMode>().is_err());
        assert_eq!(CropReviewMode::default(), CropReviewMode::ProblemsOnly);
    }
}
