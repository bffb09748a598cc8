// Copyright (c) 2025 - Cowboy AI, Inc.
//! Photo Entity and Crop Value Objects
//!
//! A photo belongs to exactly one order and targets one product. Its
//! `position` is an append-order marker assigned at insertion and never
//! renumbered when other photos are removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::ids::{PhotoId, ProductId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhotoError {
    #[error("Crop confidence must be within [0, 1]: {0}")]
    ConfidenceOutOfRange(f64),

    #[error("Unknown crop method: {0}")]
    UnknownMethod(String),
}

/// Crop rectangle in source image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Largest rectangle of `aspect_ratio` (width / height) centered in the image
    pub fn centered(image_width: u32, image_height: u32, aspect_ratio: f64) -> Self {
        if image_width == 0 || image_height == 0 || !(aspect_ratio.is_finite() && aspect_ratio > 0.0)
        {
            return Self::new(0, 0, image_width, image_height);
        }

        let image_ratio = f64::from(image_width) / f64::from(image_height);
        let (width, height) = if image_ratio > aspect_ratio {
            // wider than the target: full height
            let width = (f64::from(image_height) * aspect_ratio) as u32;
            (width.min(image_width), image_height)
        } else {
            let height = (f64::from(image_width) / aspect_ratio) as u32;
            (image_width, height.min(image_height))
        };

        Self::new(
            (image_width - width) / 2,
            (image_height - height) / 2,
            width,
            height,
        )
    }
}

/// How the classifier arrived at its crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropMethod {
    Face,
    Saliency,
    Center,
}

impl CropMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropMethod::Face => "face",
            CropMethod::Saliency => "saliency",
            CropMethod::Center => "center",
        }
    }
}

impl fmt::Display for CropMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CropMethod {
    type Err = PhotoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "face" => Ok(CropMethod::Face),
            "saliency" => Ok(CropMethod::Saliency),
            "center" => Ok(CropMethod::Center),
            _ => Err(PhotoError::UnknownMethod(s.to_string())),
        }
    }
}

/// Classifier output for one photo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoCrop {
    pub rect: CropRect,
    confidence: f64,
    pub method: CropMethod,
    pub face_count: u32,
}

impl AutoCrop {
    pub fn new(
        rect: CropRect,
        confidence: f64,
        method: CropMethod,
        face_count: u32,
    ) -> Result<Self, PhotoError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(PhotoError::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            rect,
            confidence,
            method,
            face_count,
        })
    }

    /// Center crop used when the classifier is unavailable
    pub fn center_fallback(image_width: u32, image_height: u32, aspect_ratio: f64) -> Self {
        Self {
            rect: CropRect::centered(image_width, image_height, aspect_ratio),
            confidence: 0.0,
            method: CropMethod::Center,
            face_count: 0,
        }
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Photo attached to an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub product_id: ProductId,
    /// Upload-transport file reference
    pub file_ref: String,
    pub thumbnail_ref: Option<String>,
    pub position: u32,
    /// Sent uncompressed (as a document) rather than as a compressed photo
    pub is_document: bool,
    pub auto_crop: Option<AutoCrop>,
    pub final_crop: Option<CropRect>,
    pub crop_confirmed: bool,
    pub added_at: DateTime<Utc>,
}

impl Photo {
    /// Rectangle to print with: the confirmed one, else the auto crop
    pub fn effective_crop(&self) -> Option<CropRect> {
        self.final_crop.or_else(|| self.auto_crop.map(|a| a.rect))
    }
}
