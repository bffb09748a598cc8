// Copyright (c) 2025 - Cowboy AI, Inc.
//! Human Readable Order Number
//!
//! Format: `YYMMDD-XXXX`, the creation date followed by four characters from
//! `[A-Z0-9]`. Uniqueness is enforced by the store; callers regenerate on
//! collision.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    #[error("Invalid order number format: {0}")]
    InvalidFormat(String),
}

/// Order number value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a number for an order created at `created_at`
    pub fn generate<R: Rng + ?Sized>(created_at: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        Self(format!("{}-{}", created_at.format("%y%m%d"), suffix))
    }

    /// Generate with the thread-local RNG
    pub fn random(created_at: DateTime<Utc>) -> Self {
        Self::generate(created_at, &mut rand::thread_rng())
    }

    pub fn parse(value: &str) -> Result<Self, OrderNumberError> {
        let invalid = || OrderNumberError::InvalidFormat(value.to_string());

        let (date, suffix) = value.split_once('-').ok_or_else(invalid)?;
        if date.len() != 6 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(date, "%y%m%d").map_err(|_| invalid())?;
        if suffix.len() != SUFFIX_LEN || !suffix.bytes().all(|b| ALPHABET.contains(&b)) {
            return Err(invalid());
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
