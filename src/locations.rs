//! Geographic metadata for known shuttle locations.
//!
//! Calendar clients that understand `X-APPLE-STRUCTURED-LOCATION` show a map
//! for events whose location is in the book. The built-in table covers the
//! campus stops; a JSON file with the same shape can replace it:
//!
//! ```json
//! {
//!   "Knight House": {
//!     "uri": "geo:40.861148,-73.462803",
//!     "params": { "value": "uri", "x-title": "Knight House" }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("failed to read location file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid location file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// A geo URI plus the display parameters attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeoLocation {
    pub uri: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl GeoLocation {
    fn new(uri: &str, params: &[(&str, &str)]) -> Self {
        Self {
            uri: uri.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Location name to geo metadata.
#[derive(Debug, Clone, Default)]
pub struct LocationBook {
    entries: HashMap<String, GeoLocation>,
}

impl LocationBook {
    /// An empty book: no event gets geo metadata.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let entries = [
            (
                "Grace Auditorium",
                GeoLocation::new(
                    "geo:40.858046,-73.466998",
                    &[
                        ("value", "uri"),
                        (
                            "x-apple-mapkit-handle",
                            "CAESmQIIrk0Qg/r9grPK+e6vARoSCSbXCXHUbURAEVHNgknjXVLAImEKDVVuaXRlZCBTdGF0ZXMSAlVTGghOZXcgWW9yayICTlkqDU5hc3NhdSBDb3VudHkyDUxhdXJlbCBIb2xsb3c6BTExNzkxQgtOb3J0aCBTaG9yZYoBC05vcnRoIFNob3JlKhVDU0hMIEdyYWNlIEF1ZGl0b3JpdW0yElN5b3NzZXQsIE5ZICAxMTc5MTINVW5pdGVkIFN0YXRlc1ABWlYKJQiD+v2Cs8r57q8BEhIJJtcJcdRtREARUc2CSeNdUsAYrk2QAwGiHywIg/r9grPK+e6vARofChVDU0hMIEdyYWNlIEF1ZGl0b3JpdW0QACoCZW5AAA==",
                        ),
                        ("x-apple-radius", "141.1748962402344"),
                        ("x-title", "Grace Auditorium"),
                    ],
                ),
            ),
            (
                "Syosset LIRR Station",
                GeoLocation::new(
                    "geo:40.824864,-73.500415",
                    &[
                        ("value", "uri"),
                        (
                            "x-apple-mapkit-handle",
                            "CAESpAEIrk0Qp+Ha+Jqewc0wGhIJ6dK/JJVpREAROFz1ygZgUsAiOQoNVW5pdGVkIFN0YXRlcxICVVMaCE5ldyBZb3JrIgJOWSoNTmFzc2F1IENvdW50eTIHU3lvc3NldCoPU3lvc3NldCBTdGF0aW9uMgtTeW9zc2V0LCBOWTINVW5pdGVkIFN0YXRlczgvUAFaFQoTCKfh2viansHNMBiuTZADAZgDAQ==",
                        ),
                        ("x-apple-radius", "188.604673864844"),
                        ("x-title", "Syosset LIRR Station"),
                    ],
                ),
            ),
            (
                "Knight House",
                GeoLocation::new(
                    "geo:40.861148,-73.462803",
                    &[
                        ("value", "uri"),
                        ("x-apple-radius", "141.1748962402344"),
                        ("x-title", "Knight House"),
                    ],
                ),
            ),
            (
                "Uplands Farm",
                GeoLocation::new(
                    "geo:40.857653,-73.453106",
                    &[
                        ("value", "uri"),
                        (
                            "x-apple-mapkit-handle",
                            "CAESgAMIrk0QuZHF1ObtsPq4ARoSCaanfpTHbURAEfqH46//XFLAIqEBCg1Vbml0ZWQgU3RhdGVzEgJVUxoITmV3IFlvcmsiAk5ZKg5TdWZmb2xrIENvdW50eTISQ29sZCBTcHJpbmcgSGFyYm9yOgUxMTcyNEILTm9ydGggU2hvcmVSEExhd3JlbmNlIEhpbGwgUmRaAzI1MGIUMjUwIExhd3JlbmNlIEhpbGwgUmRyC0xvbmcgSXNsYW5kigELTm9ydGggU2hvcmUqFlVwbGFuZHMgRmFybSBTYW5jdHVhcnkyFDI1MCBMYXdyZW5jZSBIaWxsIFJkMh1Db2xkIFNwcmluZyBIYXJib3IsIE5ZICAxMTcyNDINVW5pdGVkIFN0YXRlc1ABWloKKAi5kcXU5u2w+rgBEhIJpqd+lMdtREAR+ofjr/9cUsAYrk2QAwGYAwGiHy0IuZHF1ObtsPq4ARogChZVcGxhbmRzIEZhcm0gU2FuY3R1YXJ5EAAqAmVuQAA=",
                        ),
                        ("x-apple-radius", "188.604673864844"),
                        ("x-title", "Uplands Farm"),
                    ],
                ),
            ),
            (
                "Woodbury",
                GeoLocation::new(
                    "geo:40.801248,-73.467998",
                    &[
                        ("value", "uri"),
                        (
                            "x-apple-mapkit-handle",
                            "CAES/gIIrk0Qu8vw162PvuAUGhIJCryTT49mREARj+W4rvNdUsAikgEKDVVuaXRlZCBTdGF0ZXMSAlVTGghOZXcgWW9yayICTlkqDU5hc3NhdSBDb3VudHkyCFdvb2RidXJ5OgUxMTc5N0ILTm9ydGggU2hvcmVSDlN1bm55c2lkZSBCbHZkWgM1MDBiEjUwMCBTdW5ueXNpZGUgQmx2ZHILTG9uZyBJc2xhbmSKAQtOb3J0aCBTaG9yZSojQ29sZCBTcHJpbmcgSGFyYm9yIExhYm9yYXRvcnkgUHJlc3MyEjUwMCBTdW5ueXNpZGUgQmx2ZDITV29vZGJ1cnksIE5ZICAxMTc5NzINVW5pdGVkIFN0YXRlczgvUAFaZQonCLvL8Netj77gFBISCQq8k0+PZkRAEY/luK7zXVLAGK5NkAMBmAMBoh85CLvL8Netj77gFBotCiNDb2xkIFNwcmluZyBIYXJib3IgTGFib3JhdG9yeSBQcmVzcxAAKgJlbkAA",
                        ),
                        ("x-apple-referenceframe", "1"),
                        ("x-apple-radius", "225.3715646891437"),
                        ("x-title", "Woodbury"),
                    ],
                ),
            ),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|(name, geo)| (name.to_string(), geo))
                .collect(),
        }
    }

    /// Loads the book from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, LocationError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| LocationError::Read {
            path: display.clone(),
            source,
        })?;
        let entries = serde_json::from_str(&content).map_err(|source| LocationError::Parse {
            path: display,
            source,
        })?;
        Ok(Self { entries })
    }

    pub fn get(&self, location: &str) -> Option<&GeoLocation> {
        self.entries.get(location)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
