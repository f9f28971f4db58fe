use crate::domain::{
    errors::RenderError,
    models::{ListingEvent, RenderedMessage},
};

/// Platform limit for a bare text message.
pub const MAX_TEXT_LEN: usize = 4096;
/// Platform limit for a caption when photos are attached.
pub const MAX_CAPTION_LEN: usize = 1024;
/// Platform limit on photos per media group.
pub const MAX_PHOTOS: usize = 10;

/// Turns a listing into a channel-ready message. Pure and deterministic:
/// the same listing must always yield a byte-identical `RenderedMessage`.
///
/// Implementations only compose the body; size and attachment limits are
/// applied uniformly by [`finish`].
pub trait Renderer: Send + Sync {
    fn render(&self, listing: &ListingEvent) -> Result<RenderedMessage, RenderError>;
}

/// Checks the fields every formatter needs before composing the body.
pub fn check_required(listing: &ListingEvent) -> Result<(), RenderError> {
    if listing.title.trim().is_empty() {
        return Err(RenderError::MissingField("title"));
    }
    if listing.city_id.trim().is_empty() {
        return Err(RenderError::MissingField("city_id"));
    }
    Ok(())
}

/// Applies platform limits to a composed body and photo list.
///
/// The applicable text limit depends on whether photos ride along (caption
/// limits are tighter than message limits). Overlong content is cut at a word
/// boundary with an ellipsis; the cut is flagged, never an error.
pub fn finish(text: String, photos: &[String]) -> RenderedMessage {
    let mut truncated = false;

    let photos: Vec<String> = if photos.len() > MAX_PHOTOS {
        truncated = true;
        photos[..MAX_PHOTOS].to_vec()
    } else {
        photos.to_vec()
    };

    let limit = if photos.is_empty() {
        MAX_TEXT_LEN
    } else {
        MAX_CAPTION_LEN
    };

    let text = if text.chars().count() > limit {
        truncated = true;
        truncate_at_word(&text, limit - 1) + "…"
    } else {
        text
    };

    RenderedMessage {
        text,
        photos,
        truncated,
    }
}

/// Escapes the characters the platform's HTML parse mode reserves.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Formats a price with thousands separators, dropping the fractional part.
/// Non-positive prices mean "on request" and are handled by the formatters.
pub fn format_thousands(value: f64) -> String {
    let whole = value.round() as i64;
    let digits = whole.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0 {
        out.push('-');
    }
    let offset = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Cuts `text` to at most `max_chars`, backing up to the last space so words
/// stay whole. Falls back to a hard cut when there is no space to back up to.
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    let cut: String = text.chars().take(max_chars).collect();
    match cut.rfind(' ') {
        Some(pos) if pos > 0 => cut[..pos].to_string(),
        _ => cut,
    }
}
