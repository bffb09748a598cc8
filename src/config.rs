// Copyright (c) 2025 - Cowboy AI, Inc.
//! Engine Configuration
//!
//! Plain structs with defaults matching production values. `from_env()`
//! overrides individual fields from `ORDER_*` environment variables:
//!
//! | variable                          | field                         |
//! |-----------------------------------|-------------------------------|
//! | `ORDER_MIN_PHOTOS`                | `min_photos`                  |
//! | `ORDER_DELIVERY_PRICE_<TYPE>`     | `delivery.<type>`             |
//! | `ORDER_FREE_DELIVERY_THRESHOLD`   | `delivery.free_delivery_threshold` |
//! | `ORDER_CROP_THRESHOLD`            | `crop_threshold`              |
//! | `ORDER_CROP_REVIEW_MODE`          | `crop_review_mode`            |
//! | `ORDER_ALBUM_DELAY_MS`            | `batching.album_delay`        |
//! | `ORDER_SINGLE_DELAY_MS`           | `batching.single_delay`       |
//! | `ORDER_CLASSIFIER_TIMEOUT_MS`     | `classifier.timeout`          |

use backon::ExponentialBuilder;
use std::str::FromStr;
use std::time::Duration;

use crate::batching::BatchSettings;
use crate::crop::{ClassifierSettings, CropReviewMode};
use crate::domain::{DeliveryPrices, DeliveryType};
use crate::errors::{OrderError, OrderResult};
use crate::pricing::HintSettings;

/// Backoff for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    /// Total attempts, including the first
    pub max_attempts: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(500),
        }
    }
}

impl RetrySettings {
    /// Jittered exponential backoff for `backon`
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1))
            .with_jitter()
    }
}

/// Order engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Photos required before an order can leave draft
    pub min_photos: u32,
    pub delivery: DeliveryPrices,
    pub hint: HintSettings,
    /// Confidence from which an auto crop is approved without review
    pub crop_threshold: f64,
    pub crop_review_mode: CropReviewMode,
    pub batching: BatchSettings,
    pub classifier: ClassifierSettings,
    pub store_retry: RetrySettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_photos: 10,
            delivery: DeliveryPrices::default(),
            hint: HintSettings::default(),
            crop_threshold: 0.7,
            crop_review_mode: CropReviewMode::default(),
            batching: BatchSettings::default(),
            classifier: ClassifierSettings::default(),
            store_retry: RetrySettings::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `ORDER_*` environment variables
    pub fn from_env() -> OrderResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> OrderResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(min) = parse_var(&lookup, "ORDER_MIN_PHOTOS")? {
            config.min_photos = min;
        }

        for delivery_type in DeliveryType::ALL {
            let name = format!(
                "ORDER_DELIVERY_PRICE_{}",
                delivery_type.as_str().to_uppercase()
            );
            if let Some(price) = parse_var(&lookup, &name)? {
                config.delivery.set_price(delivery_type, price);
            }
        }
        if let Some(threshold) = parse_var(&lookup, "ORDER_FREE_DELIVERY_THRESHOLD")? {
            config.delivery.free_delivery_threshold = threshold;
        }

        if let Some(threshold) = parse_var::<f64, _>(&lookup, "ORDER_CROP_THRESHOLD")? {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(OrderError::Configuration(format!(
                    "ORDER_CROP_THRESHOLD must be within [0, 1], got {}",
                    threshold
                )));
            }
            config.crop_threshold = threshold;
        }
        if let Some(mode) = parse_var(&lookup, "ORDER_CROP_REVIEW_MODE")? {
            config.crop_review_mode = mode;
        }

        if let Some(ms) = parse_var(&lookup, "ORDER_ALBUM_DELAY_MS")? {
            config.batching.album_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, "ORDER_SINGLE_DELAY_MS")? {
            config.batching.single_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, "ORDER_CLASSIFIER_TIMEOUT_MS")? {
            config.classifier.timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> OrderResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|e| {
            OrderError::Configuration(format!("{} has invalid value {:?}: {}", name, raw, e))
        }),
    }
}
