// Copyright (c) 2025 - Cowboy AI, Inc.
//! Delivery Methods and Pricing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::Amount;

/// Delivery parsing error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Unknown delivery type: {0}")]
    UnknownType(String),
}

/// Delivery method tag
///
/// Display names belong to the presentation layer; the core only carries the
/// tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    /// Parcel locker network
    Ozon,
    Cdek,
    /// National post
    Post,
    Courier,
    /// Self pickup at the studio
    Pickup,
}

impl DeliveryType {
    pub const ALL: [DeliveryType; 5] = [
        DeliveryType::Ozon,
        DeliveryType::Cdek,
        DeliveryType::Post,
        DeliveryType::Courier,
        DeliveryType::Pickup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryType::Ozon => "ozon",
            DeliveryType::Cdek => "cdek",
            DeliveryType::Post => "post",
            DeliveryType::Courier => "courier",
            DeliveryType::Pickup => "pickup",
        }
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryType {
    type Err = DeliveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        DeliveryType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| DeliveryError::UnknownType(s.to_string()))
    }
}

/// Delivery fields captured from the user, stored verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub delivery_type: DeliveryType,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Preferred date/time as typed by the user
    pub datetime: Option<String>,
}

impl DeliveryDetails {
    pub fn new(delivery_type: DeliveryType) -> Self {
        Self {
            delivery_type,
            city: None,
            address: None,
            phone: None,
            datetime: None,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_datetime(mut self, datetime: impl Into<String>) -> Self {
        self.datetime = Some(datetime.into());
        self
    }
}

/// Configured price per delivery method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPrices {
    pub ozon: Amount,
    pub cdek: Amount,
    pub post: Amount,
    pub courier: Amount,
    pub pickup: Amount,
    /// Photos subtotal from which delivery is free; 0 disables
    pub free_delivery_threshold: Amount,
}

impl Default for DeliveryPrices {
    fn default() -> Self {
        Self {
            ozon: 100,
            cdek: 350,
            post: 250,
            courier: 0,
            pickup: 0,
            free_delivery_threshold: 0,
        }
    }
}

impl DeliveryPrices {
    pub fn price_for(&self, delivery_type: DeliveryType) -> Amount {
        match delivery_type {
            DeliveryType::Ozon => self.ozon,
            DeliveryType::Cdek => self.cdek,
            DeliveryType::Post => self.post,
            DeliveryType::Courier => self.courier,
            DeliveryType::Pickup => self.pickup,
        }
    }

    pub fn set_price(&mut self, delivery_type: DeliveryType, price: Amount) {
        match delivery_type {
            DeliveryType::Ozon => self.ozon = price,
            DeliveryType::Cdek => self.cdek = price,
            DeliveryType::Post => self.post = price,
            DeliveryType::Courier => self.courier = price,
            DeliveryType::Pickup => self.pickup = price,
        }
    }

    /// Delivery cost for an order with the given photos subtotal
    pub fn cost_for(&self, delivery_type: DeliveryType, photos_cost: Amount) -> Amount {
        if self.free_delivery_threshold > 0 && photos_cost >= self.free_delivery_threshold {
            return 0;
        }
        self.price_for(delivery_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delivery_type() {
        assert_eq!("ozon".parse::<DeliveryType>(), Ok(DeliveryType::Ozon));
        assert_eq!(" CDEK ".parse::<DeliveryType>(), Ok(DeliveryType::Cdek));
        assert_eq!(
            "pigeon".parse::<DeliveryType>(),
            Err(DeliveryError::UnknownType("pigeon".to_string()))
        );
    }

    #[test]
    fn test_default_prices() {
        let prices = DeliveryPrices::default();
        assert_eq!(prices.price_for(DeliveryType::Ozon), 100);
        assert_eq!(prices.price_for(DeliveryType::Cdek), 350);
        assert_eq!(prices.price_for(DeliveryType::Post), 250);
        assert_eq!(prices.price_for(DeliveryType::Courier), 0);
        assert_eq!(prices.price_for(DeliveryType::Pickup), 0);
    }

    #[test]
    fn test_free_delivery_threshold() {
        let mut prices = DeliveryPrices::default();
        assert_eq!(prices.cost_for(DeliveryType::Cdek, 10_000), 350);

        prices.free_delivery_threshold = 2_000;
        assert_eq!(prices.cost_for(DeliveryType::Cdek, 1_999), 350);
        assert_eq!(prices.cost_for(DeliveryType::Cdek, 2_000), 0);
    }

    #[test]
    fn test_serde_tag() {
        let json = serde_json::to_string(&DeliveryType::Pickup).unwrap();
        assert_eq!(json, "\"pickup\"");
    }
}
