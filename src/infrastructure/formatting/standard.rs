use crate::{
    application::services::renderer::{
        self, Renderer, check_required, escape_html, format_thousands, truncate_at_word,
    },
    domain::{
        errors::RenderError,
        models::{ListingEvent, OfferType, RenderedMessage},
    },
};

/// Formatter policy: descriptions are cut well below the platform limit so the
/// message stays scannable.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Plain left-to-right formatter.
pub struct StandardFormatter;

impl StandardFormatter {
    pub fn new() -> Self {
        Self
    }

    fn offer_label(offer_type: OfferType) -> &'static str {
        match offer_type {
            OfferType::Sell => "For Sale",
            OfferType::Rent => "For Rent",
            OfferType::Chalet => "Chalet",
        }
    }

    fn format_price(price: f64, currency: &str) -> String {
        if price <= 0.0 {
            return "Price on request".to_string();
        }
        format!("{} {}", format_thousands(price), currency)
    }

    fn format_location(listing: &ListingEvent) -> String {
        let mut location = format!(
            "{}, {}",
            listing.location.city_name, listing.location.district_name
        );
        if let Some(sub) = &listing.location.subdistrict_name {
            if sub != &listing.location.district_name {
                location.push_str(", ");
                location.push_str(sub);
            }
        }
        location
    }
}

impl Default for StandardFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for StandardFormatter {
    fn render(&self, listing: &ListingEvent) -> Result<RenderedMessage, RenderError> {
        check_required(listing)?;

        let mut parts: Vec<String> = vec![
            format!("<b>{}</b>", escape_html(&listing.title)),
            String::new(),
            Self::format_location(listing),
            format!("{} m²", format_thousands(listing.area)),
            Self::format_price(listing.price, &listing.currency),
        ];

        if let Some(description) = &listing.description {
            let escaped = escape_html(description);
            let clipped = if escaped.chars().count() > MAX_DESCRIPTION_LEN {
                truncate_at_word(&escaped, MAX_DESCRIPTION_LEN) + "..."
            } else {
                escaped
            };
            parts.push(String::new());
            parts.push(clipped);
        }

        parts.push(String::new());
        parts.push(format!("{} - {}", listing.category, listing.subcategory));
        parts.push(Self::offer_label(listing.offer_type).to_string());

        if let Some(phone) = &listing.phone {
            parts.push(format!("Tel: {phone}"));
        }

        parts.push(String::new());
        parts.push(format!(r#"<a href="{}">View Details</a>"#, listing.url));

        Ok(renderer::finish(parts.join("\n"), &listing.photos))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::models::{ListingLocation, ListingSpecs};

    fn listing() -> ListingEvent {
        ListingEvent {
            id: "abc123".to_string(),
            city_id: "1".to_string(),
            title: "2BR Apartment".to_string(),
            description: Some("Great view & balcony".to_string()),
            price: 450_000.0,
            currency: "USD".to_string(),
            area: 120.0,
            location: ListingLocation {
                city_name: "Baghdad".to_string(),
                district_name: "Al-Mansour".to_string(),
                subdistrict_name: Some("Al-Jamia".to_string()),
            },
            category: "Residential".to_string(),
            subcategory: "Apartment".to_string(),
            offer_type: OfferType::Sell,
            photos: vec!["https://example.com/1.jpg".to_string()],
            phone: Some("+964123456789".to_string()),
            url: "https://example.com/l/abc123".to_string(),
            specs: ListingSpecs::default(),
            received_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn render_is_deterministic() {
        let formatter = StandardFormatter::new();
        let event = listing();
        assert_eq!(
            formatter.render(&event).unwrap(),
            formatter.render(&event).unwrap()
        );
    }

    #[test]
    fn message_carries_the_expected_fields() {
        let message = StandardFormatter::new().render(&listing()).unwrap();
        assert!(message.text.contains("<b>2BR Apartment</b>"));
        assert!(message.text.contains("Baghdad, Al-Mansour, Al-Jamia"));
        assert!(message.text.contains("450,000 USD"));
        assert!(message.text.contains("Great view &amp; balcony"));
        assert!(message.text.contains("For Sale"));
        assert!(message.text.contains("Tel: +964123456789"));
        assert_eq!(message.photos, vec!["https://example.com/1.jpg"]);
        assert!(!message.truncated);
    }

    #[test]
    fn zero_price_reads_on_request() {
        let mut event = listing();
        event.price = 0.0;
        let message = StandardFormatter::new().render(&event).unwrap();
        assert!(message.text.contains("Price on request"));
    }

    #[test]
    fn long_description_is_clipped() {
        let mut event = listing();
        event.description = Some("word ".repeat(100));
        let message = StandardFormatter::new().render(&event).unwrap();
        assert!(message.text.contains("..."));
    }

    #[test]
    fn blank_title_is_a_render_error() {
        let mut event = listing();
        event.title = String::new();
        assert_eq!(
            StandardFormatter::new().render(&event),
            Err(RenderError::MissingField("title"))
        );
    }

    #[test]
    fn duplicate_subdistrict_is_not_repeated() {
        let mut event = listing();
        event.location.subdistrict_name = Some("Al-Mansour".to_string());
        let message = StandardFormatter::new().render(&event).unwrap();
        assert!(message.text.contains("Baghdad, Al-Mansour\n"));
        assert!(!message.text.contains("Al-Mansour, Al-Mansour"));
    }
}
