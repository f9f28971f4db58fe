use poem::Result as PoemResult;

/// Checks the `X-Api-Key` header supplied by the inbound transport against
/// the configured key. The pipeline itself never sees credentials.
pub fn verify_api_key(provided: Option<&str>, expected: &str) -> PoemResult<()> {
    match provided {
        Some(key) if key == expected => Ok(()),
        _ => Err(poem::Error::from_string(
            "invalid or missing API key",
            poem::http::StatusCode::UNAUTHORIZED,
        )),
    }
}
