//! Query-string access and the parameter parsers used by the endpoints.
//!
//! [`parse_flag`] is the lenient boolean parser used by the meter
//! endpoints; [`parse_switch`] is the strict one used for `on`.

use crate::error::{Result, SimError};

/// Decoded query parameters in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v.as_str()))
    }

    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Lenient truthiness: `1`, `true`, `yes`, `y`, `on`, `minus`, `neg` and
/// `negative` (any case, surrounding whitespace ignored) are true; anything
/// else, including an absent or empty value, is false.
pub fn parse_flag(value: Option<&str>) -> bool {
    let Some(value) = value else {
        return false;
    };
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on" | "minus" | "neg" | "negative"
    )
}

/// Strict on/off parser. Returns `None` for anything outside
/// `1/true/on` and `0/false/off`.
pub fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// The mandatory integer `id` parameter.
pub fn require_id(params: &QueryParams) -> Result<i64> {
    let raw = params
        .get("id")
        .ok_or_else(|| SimError::invalid("id parameter required"))?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| SimError::invalid("id must be a number"))
}

/// The optional `on` parameter, strictly parsed.
pub fn optional_on(params: &QueryParams) -> Result<Option<bool>> {
    params
        .get("on")
        .map(|raw| {
            parse_switch(raw)
                .ok_or_else(|| SimError::invalid("on must be one of: true,false,1,0,on,off"))
        })
        .transpose()
}

/// The optional `brightness` parameter, an integer in `[0, 100]`.
pub fn optional_brightness(params: &QueryParams) -> Result<Option<u8>> {
    let Some(raw) = params.get("brightness") else {
        return Ok(None);
    };
    let level = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| SimError::invalid("brightness must be a number"))?;
    u8::try_from(level)
        .ok()
        .filter(|b| *b <= 100)
        .map(Some)
        .ok_or_else(|| SimError::invalid("brightness must be between 0 and 100"))
}
