// Copyright (c) 2025 - Cowboy AI, Inc.
//! Auto-Crop Classification
//!
//! The face/saliency classifier is an external collaborator. Each call is
//! bounded by a timeout and transient failures are retried with backoff.
//! When the classifier cannot produce a result the photo gets a center crop
//! with zero confidence, so it always lands in the "needs review" bucket and
//! never blocks "finish photos".

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::AutoCrop;

/// Classifier and photo source failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Classifier timed out after {0:?}")]
    Timeout(Duration),

    #[error("Image could not be processed: {0}")]
    InvalidImage(String),

    #[error("Photo could not be fetched: {0}")]
    Fetch(String),
}

impl ClassifierError {
    /// Worth another attempt
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClassifierError::Unavailable(_) | ClassifierError::Timeout(_) | ClassifierError::Fetch(_)
        )
    }
}

/// Image bytes plus dimensions when the source knows them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub dimensions: Option<(u32, u32)>,
}

impl ImageData {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some((width, height));
        self
    }
}

/// Fetches photo content by upload file reference
#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn fetch(&self, file_ref: &str) -> Result<ImageData, ClassifierError>;
}

/// Photo source backed by memory, for tests and the simulator
#[derive(Debug, Default)]
pub struct InMemoryPhotoSource {
    photos: RwLock<HashMap<String, ImageData>>,
}

impl InMemoryPhotoSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, file_ref: impl Into<String>, image: ImageData) {
        self.photos
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file_ref.into(), image);
    }
}

#[async_trait]
impl PhotoSource for InMemoryPhotoSource {
    async fn fetch(&self, file_ref: &str) -> Result<ImageData, ClassifierError> {
        self.photos
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file_ref)
            .cloned()
            .ok_or_else(|| ClassifierError::InvalidImage(format!("no photo stored for {}", file_ref)))
    }
}

/// Computes a crop rectangle for a target aspect ratio
#[async_trait]
pub trait CropClassifier: Send + Sync {
    async fn classify(
        &self,
        image: &ImageData,
        aspect_ratio: f64,
    ) -> Result<AutoCrop, ClassifierError>;
}

/// Classifier that always answers with a centered crop at zero confidence
#[derive(Debug, Clone, Copy)]
pub struct CenterCropClassifier {
    fallback_size: (u32, u32),
}

impl CenterCropClassifier {
    pub fn new(fallback_size: (u32, u32)) -> Self {
        Self { fallback_size }
    }
}

impl Default for CenterCropClassifier {
    fn default() -> Self {
        Self::new(ClassifierSettings::default().fallback_image_size)
    }
}

#[async_trait]
impl CropClassifier for CenterCropClassifier {
    async fn classify(
        &self,
        image: &ImageData,
        aspect_ratio: f64,
    ) -> Result<AutoCrop, ClassifierError> {
        let (width, height) = image.dimensions.unwrap_or(self.fallback_size);
        Ok(AutoCrop::center_fallback(width, height, aspect_ratio))
    }
}

/// Timeout, retry and fallback parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    /// Bound on a single classifier call
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: usize,
    pub retry_min_delay: Duration,
    pub retry_max_delay: Duration,
    /// Used when the product has no aspect ratio
    pub default_aspect_ratio: f64,
    /// Used when the image size is unknown
    pub fallback_image_size: (u32, u32),
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_min_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(2),
            default_aspect_ratio: 0.76,
            fallback_image_size: (1920, 1080),
        }
    }
}

impl ClassifierSettings {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.retry_min_delay)
            .with_max_delay(self.retry_max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Runs the classifier for one photo and never fails
pub struct CropAnalyzer {
    classifier: Arc<dyn CropClassifier>,
    photos: Arc<dyn PhotoSource>,
    settings: ClassifierSettings,
}

impl CropAnalyzer {
    pub fn new(
        classifier: Arc<dyn CropClassifier>,
        photos: Arc<dyn PhotoSource>,
        settings: ClassifierSettings,
    ) -> Self {
        Self {
            classifier,
            photos,
            settings,
        }
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    /// Auto-crop for a photo, falling back to a center crop on any failure
    pub async fn analyze(&self, file_ref: &str, aspect_ratio: Option<f64>) -> AutoCrop {
        let ratio = aspect_ratio.unwrap_or(self.settings.default_aspect_ratio);

        let image = match (|| async { self.photos.fetch(file_ref).await })
            .retry(self.settings.backoff())
            .when(ClassifierError::is_transient)
            .await
        {
            Ok(image) => image,
            Err(e) => {
                warn!(file_ref, error = %e, "Photo fetch failed, using center crop");
                return self.fallback(None, ratio);
            }
        };

        let timeout = self.settings.timeout;
        let result = (|| async {
            match tokio::time::timeout(timeout, self.classifier.classify(&image, ratio)).await {
                Ok(result) => result,
                Err(_) => Err(ClassifierError::Timeout(timeout)),
            }
        })
        .retry(self.settings.backoff())
        .when(ClassifierError::is_transient)
        .notify(|e: &ClassifierError, delay: Duration| {
            debug!(file_ref, error = %e, delay = ?delay, "Classifier failed, retrying");
        })
        .await;

        match result {
            Ok(crop) => crop,
            Err(e) => {
                warn!(file_ref, error = %e, "Classifier failed, using center crop");
                self.fallback(image.dimensions, ratio)
            }
        }
    }

    fn fallback(&self, dimensions: Option<(u32, u32)>, aspect_ratio: f64) -> AutoCrop {
        let (width, height) = dimensions.unwrap_or(self.settings.fallback_image_size);
        AutoCrop::center_fallback(width, height, aspect_ratio)
    }
}
