use crate::{
    application::services::renderer::{
        self, Renderer, check_required, escape_html, format_thousands, truncate_at_word,
    },
    domain::{
        errors::RenderError,
        models::{ListingEvent, OfferType, RenderedMessage},
    },
};

use super::standard::MAX_DESCRIPTION_LEN;

/// Right-to-left mark, prefixed to every non-empty line so Arabic text lays
/// out correctly in the channel.
const RTL: char = '\u{200F}';

/// Arabic formatter with RTL layout and emoji section markers.
pub struct ArabicFormatter;

impl ArabicFormatter {
    pub fn new() -> Self {
        Self
    }

    fn offer_label(offer_type: OfferType) -> &'static str {
        match offer_type {
            OfferType::Sell => "للبيع",
            OfferType::Rent => "للإيجار",
            OfferType::Chalet => "شاليه",
        }
    }

    fn currency_label(currency: &str) -> &str {
        match currency {
            "IQD" => "د.ع",
            "USD" => "$",
            other => other,
        }
    }

    fn format_price(price: f64, currency: &str) -> String {
        if price <= 0.0 {
            return "💰 <b>السعر عند الطلب</b>".to_string();
        }
        format!(
            "💰 <b>{} {}</b>",
            format_thousands(price),
            Self::currency_label(currency)
        )
    }
}

impl Default for ArabicFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for ArabicFormatter {
    fn render(&self, listing: &ListingEvent) -> Result<RenderedMessage, RenderError> {
        check_required(listing)?;

        let mut parts: Vec<String> = Vec::new();

        parts.push(format!(
            "<b>【 {} 】</b>",
            Self::offer_label(listing.offer_type)
        ));
        parts.push(format!("🏠 <b>{}</b>", escape_html(&listing.title)));
        parts.push(String::new());

        let mut location = format!(
            "{}، {}",
            listing.location.city_name, listing.location.district_name
        );
        if let Some(sub) = &listing.location.subdistrict_name {
            if sub != &listing.location.district_name {
                location.push_str("، ");
                location.push_str(sub);
            }
        }
        parts.push(format!("📍 {location}"));
        parts.push(String::new());

        parts.push(Self::format_price(listing.price, &listing.currency));
        parts.push(String::new());

        parts.push(format!("📐 المساحة: {} م²", format_thousands(listing.area)));
        if let Some(bedrooms) = listing.specs.bedrooms {
            parts.push(format!("🛏 غرف النوم: {bedrooms}"));
        }
        if let Some(bathrooms) = listing.specs.bathrooms {
            parts.push(format!("🚿 الحمامات: {bathrooms}"));
        }
        if let Some(floors) = listing.specs.floors {
            parts.push(format!("🏢 الطوابق: {floors}"));
        }
        if let Some(age) = listing.specs.age_years {
            parts.push(format!("📅 العمر: {age} سنة"));
        }
        if let (Some(width), Some(depth)) = (listing.specs.frontage_width, listing.specs.frontage_depth)
        {
            parts.push(format!("📏 الواجهة: {width}×{depth} م"));
        }
        parts.push(String::new());

        parts.push(format!("🏷 {} - {}", listing.category, listing.subcategory));

        if let Some(description) = &listing.description {
            let escaped = escape_html(description);
            let clipped = if escaped.chars().count() > MAX_DESCRIPTION_LEN {
                truncate_at_word(&escaped, MAX_DESCRIPTION_LEN) + "..."
            } else {
                escaped
            };
            parts.push(String::new());
            parts.push(format!("📝 {clipped}"));
        }

        if let Some(phone) = &listing.phone {
            parts.push(String::new());
            parts.push(format!("📞 للتواصل: {phone}"));
        }

        parts.push(String::new());
        parts.push(format!(
            r#"🔗 <a href="{}">عرض التفاصيل في التطبيق</a>"#,
            listing.url
        ));

        let text = parts
            .iter()
            .map(|part| {
                if part.is_empty() {
                    String::new()
                } else {
                    format!("{RTL}{part}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(renderer::finish(text, &listing.photos))
    }
}
