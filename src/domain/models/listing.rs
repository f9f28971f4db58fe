use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of offer a listing advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferType {
    Sell,
    Rent,
    Chalet,
}

impl OfferType {
    /// Parses the upstream string form ("SELL", "RENT", "CHALET"), case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "SELL" => Some(OfferType::Sell),
            "RENT" => Some(OfferType::Rent),
            "CHALET" => Some(OfferType::Chalet),
            _ => None,
        }
    }
}

/// Location of a listing, as supplied by the inbound payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingLocation {
    pub city_name: String,
    pub district_name: String,
    pub subdistrict_name: Option<String>,
}

/// Optional property specs that enrich the rendered message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingSpecs {
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub floors: Option<u32>,
    pub age_years: Option<u32>,
    pub frontage_width: Option<f64>,
    pub frontage_depth: Option<f64>,
}

/// An approved real-estate listing handed to the delivery pipeline.
///
/// Immutable once accepted; the pipeline never mutates it, only derives a
/// `RenderedMessage` from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingEvent {
    /// Unique per submission.
    pub id: String,
    /// Key into the city-channel table.
    pub city_id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub currency: String,
    /// Area in square meters.
    pub area: f64,
    pub location: ListingLocation,
    pub category: String,
    pub subcategory: String,
    pub offer_type: OfferType,
    /// Ordered photo URLs, possibly empty.
    pub photos: Vec<String>,
    pub phone: Option<String>,
    /// Deep link back to the listing.
    pub url: String,
    pub specs: ListingSpecs,
    pub received_at: DateTime<Utc>,
}
