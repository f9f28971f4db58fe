use std::collections::HashMap;

use crate::domain::{
    errors::{ChannelTableError, DeliveryError},
    models::ChannelTarget,
};

/// Immutable city-to-channel table.
///
/// Validated once at load; a handle that is neither `@name` nor a numeric chat
/// id is rejected there, so a successful `resolve` always returns a usable
/// target. A missing mapping at resolve time is the separate, per-listing
/// `UnknownCity` condition.
pub struct ChannelResolver {
    channels: HashMap<String, ChannelTarget>,
}

impl ChannelResolver {
    pub fn from_map(mapping: HashMap<String, String>) -> Result<Self, ChannelTableError> {
        let mut channels = HashMap::with_capacity(mapping.len());
        for (city_id, handle) in mapping {
            if !is_valid_handle(&handle) {
                return Err(ChannelTableError::InvalidHandle { city_id, handle });
            }
            channels.insert(city_id, ChannelTarget { handle });
        }
        Ok(Self { channels })
    }

    pub fn resolve(&self, city_id: &str) -> Result<&ChannelTarget, DeliveryError> {
        self.channels
            .get(city_id)
            .ok_or_else(|| DeliveryError::UnknownCity(city_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

fn is_valid_handle(handle: &str) -> bool {
    if let Some(name) = handle.strip_prefix('@') {
        return !name.is_empty();
    }
    // Numeric chat ids, including the -100... form for channels.
    let digits = handle.strip_prefix('-').unwrap_or(handle);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> Result<ChannelResolver, ChannelTableError> {
        ChannelResolver::from_map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn resolves_mapped_city() {
        let resolver = table(&[("1", "@city_channel")]).unwrap();
        assert_eq!(resolver.resolve("1").unwrap().handle, "@city_channel");
    }

    #[test]
    fn unmapped_city_is_unknown() {
        let resolver = table(&[("1", "@city_channel")]).unwrap();
        assert!(matches!(
            resolver.resolve("99"),
            Err(DeliveryError::UnknownCity(id)) if id == "99"
        ));
    }

    #[test]
    fn numeric_chat_ids_are_valid() {
        let resolver = table(&[("2", "-1001234567890")]).unwrap();
        assert_eq!(resolver.resolve("2").unwrap().handle, "-1001234567890");
    }

    #[test]
    fn invalid_handle_is_a_load_error() {
        assert!(matches!(
            table(&[("3", "not-a-handle")]),
            Err(ChannelTableError::InvalidHandle { .. })
        ));
    }
}
