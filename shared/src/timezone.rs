//! Timezone resolution
//!
//! Maps free-form location tokens (Russian city names, canonical IANA ids, or the
//! `timezone`/`tz` query parameter of a page URL) to a [`ZoneId`]. Resolution is total:
//! anything unrecognized falls back to [`DEFAULT_ZONE`].

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Zone used whenever an input cannot be resolved
pub const DEFAULT_ZONE: &str = "Europe/Moscow";

/// The tz database entry behind [`DEFAULT_ZONE`]
pub const DEFAULT_TZ: Tz = chrono_tz::Europe::Moscow;

/// Known city and region names, already case-folded
const CITY_ZONES: &[(&str, &str)] = &[
    ("калининград", "Europe/Kaliningrad"),
    ("москва", "Europe/Moscow"),
    ("самара", "Europe/Samara"),
    ("екатеринбург", "Asia/Yekaterinburg"),
    ("омск", "Asia/Omsk"),
    ("красноярск", "Asia/Krasnoyarsk"),
    ("иркутск", "Asia/Irkutsk"),
    ("якутск", "Asia/Yakutsk"),
    ("владивосток", "Asia/Vladivostok"),
    ("магадан", "Asia/Magadan"),
    ("петропавловск-камчатский", "Asia/Kamchatka"),
    ("петропавловск камчатский", "Asia/Kamchatka"),
    ("камчатка", "Asia/Kamchatka"),
];

/// Query parameter names consulted in order
const QUERY_KEYS: [&str; 2] = ["timezone", "tz"];

/// A canonical region/city timezone identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    /// Wrap an identifier without validation
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the tz database knows this identifier
    pub fn is_recognized(&self) -> bool {
        self.0.parse::<Tz>().is_ok()
    }

    /// The tz database entry for this zone.
    ///
    /// Identifiers passed through verbatim are not validated at resolution time, so an
    /// unknown one samples in the default zone instead of failing.
    pub fn tz(&self) -> Tz {
        self.0.parse().unwrap_or(DEFAULT_TZ)
    }
}

impl Default for ZoneId {
    fn default() -> Self {
        Self::new(DEFAULT_ZONE)
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve a location token to a zone id.
///
/// - `None` or empty input gives the default zone.
/// - Input containing `/` is taken as canonical and returned verbatim.
/// - Anything else is trimmed, case-folded and looked up in the city table.
pub fn resolve(input: Option<&str>) -> ZoneId {
    let Some(raw) = input.filter(|s| !s.is_empty()) else {
        return ZoneId::default();
    };

    let normalized = raw.trim().to_lowercase();
    if normalized.contains('/') {
        return ZoneId::new(raw);
    }

    CITY_ZONES
        .iter()
        .find(|(city, _)| *city == normalized)
        .map(|(_, zone)| ZoneId::new(*zone))
        .unwrap_or_default()
}

/// Extract the raw zone token from a URL or query string.
///
/// Accepts a full URL (`https://host/?tz=Омск`), a bare query (`?timezone=Asia/Omsk`) or a
/// query without the leading `?`. `timezone` wins over `tz`; empty values are skipped.
pub fn zone_param(input: &str) -> Option<String> {
    let query = match input.split_once('?') {
        Some((_, query)) => query,
        None => input,
    };
    let query = query.split('#').next().unwrap_or_default();

    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    QUERY_KEYS.iter().find_map(|key| {
        pairs
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.clone())
    })
}

/// Resolve the zone requested by a URL or query string
pub fn zone_from_query(input: &str) -> ZoneId {
    resolve(zone_param(input).as_deref())
}
