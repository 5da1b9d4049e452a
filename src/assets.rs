//! Flag assets module - embedded SVG lookup and the asset-source seam.
//! Flags are generated at build time from flags/*.svg.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::future::Future;
use thiserror::Error;

// Include auto-generated flag data
include!(concat!(env!("OUT_DIR"), "/flags_data.rs"));

/// Reference width of the flag artwork
pub const REFERENCE_WIDTH: f64 = 512.0;
/// Reference height of the flag artwork
pub const REFERENCE_HEIGHT: f64 = 336.0;

/// Raw SVG markup: borrowed from the embedded table or owned when fetched
pub type Markup = Cow<'static, str>;

/// Errors that can occur while resolving a flag asset
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Flag not found for country: {0}")]
    NotFound(String),
    #[error("HTTP request for {code} failed: {source}")]
    FetchFailed {
        code: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP status {status} while fetching {code}")]
    Status { code: String, status: u16 },
}

impl AssetError {
    /// True for a plain absent key, false for transport failures
    pub fn is_not_found(&self) -> bool {
        matches!(self, AssetError::NotFound(_))
    }
}

/// Backend that turns a country code into flag markup.
///
/// Implemented by the in-memory [`AssetStore`] and by
/// [`HttpAssets`](crate::fetch::HttpAssets). Implementations normalize the
/// code themselves.
pub trait AssetSource {
    fn resolve(&self, code: &str) -> impl Future<Output = Result<Markup, AssetError>> + Send;
}

/// Lowercases and trims a country code.
pub fn normalize_country_code(code: &str) -> String {
    code.trim().to_lowercase()
}

/// Checks the two-lowercase-letter format without consulting the manifest.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_lowercase())
}

/// Checks if the embedded manifest lists `code` (expects a normalized code)
pub fn is_available_country(code: &str) -> bool {
    AVAILABLE_COUNTRIES.binary_search(&code).is_ok()
}

/// Checks format and manifest membership after normalization.
pub fn is_valid_country_code(code: &str) -> bool {
    let code = normalize_country_code(code);
    is_well_formed(&code) && is_available_country(&code)
}

/// Sorted codes of every embedded flag
pub fn available_country_codes() -> &'static [&'static str] {
    AVAILABLE_COUNTRIES
}

/// Gets the embedded SVG for a country code, if there is one.
pub fn get_flag(country_code: &str) -> Option<&'static str> {
    let code = normalize_country_code(country_code);
    FLAGS
        .binary_search_by(|(c, _)| (*c).cmp(code.as_str()))
        .ok()
        .map(|i| FLAGS[i].1)
}

/// Returns the number of embedded flags
pub fn flag_count() -> usize {
    FLAGS.len()
}

/// Conventional path a flag is served under when assets are hosted separately
pub fn flag_path(code: &str) -> String {
    format!("/flags/{}.svg", code)
}

/// Generated grey placeholder showing the upper-cased code.
pub fn placeholder_svg(code: &str) -> String {
    format!(
        r##"<svg width="512" height="336" viewBox="0 0 512 336" xmlns="http://www.w3.org/2000/svg">
  <rect width="512" height="336" fill="#f0f0f0"/>
  <text x="256" y="168" text-anchor="middle" dy=".3em" font-family="Arial, sans-serif" font-size="24" fill="#666">{}</text>
</svg>"##,
        crate::annotate::escape_text(&code.trim().to_uppercase())
    )
}

/// Immutable code-to-markup table.
///
/// [`AssetStore::embedded`] wraps the build-time table; [`AssetStore::from_entries`]
/// builds a small stand-in for tests or custom asset sets.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    flags: BTreeMap<String, Markup>,
}

impl AssetStore {
    /// Store backed by the flags embedded at build time
    pub fn embedded() -> Self {
        Self {
            flags: FLAGS
                .iter()
                .map(|(code, svg)| ((*code).to_string(), Cow::Borrowed(*svg)))
                .collect(),
        }
    }

    /// Store built from arbitrary entries; codes are normalized on the way in
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Markup>,
    {
        Self {
            flags: entries
                .into_iter()
                .map(|(code, svg)| (normalize_country_code(code.as_ref()), svg.into()))
                .collect(),
        }
    }

    /// Synchronous lookup
    pub fn get(&self, code: &str) -> Result<&str, AssetError> {
        let code = normalize_country_code(code);
        self.flags
            .get(&code)
            .map(|svg| svg.as_ref())
            .ok_or(AssetError::NotFound(code))
    }

    /// Synchronous lookup returning shareable markup
    pub fn lookup(&self, code: &str) -> Result<Markup, AssetError> {
        let code = normalize_country_code(code);
        match self.flags.get(&code) {
            Some(svg) => Ok(svg.clone()),
            None => {
                tracing::debug!("No flag for {:?}", code);
                Err(AssetError::NotFound(code))
            }
        }
    }

    /// Checks if a flag exists for the given country code
    pub fn contains(&self, code: &str) -> bool {
        self.flags.contains_key(&normalize_country_code(code))
    }

    /// Codes in alphabetical order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.flags.keys().map(String::as_str)
    }

    /// Format check plus membership in this store
    pub fn is_valid_country_code(&self, code: &str) -> bool {
        let code = normalize_country_code(code);
        is_well_formed(&code) && self.flags.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl AssetSource for AssetStore {
    async fn resolve(&self, code: &str) -> Result<Markup, AssetError> {
        self.lookup(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_flag_existing() {
        let flag = get_flag("us").unwrap();
        assert!(flag.contains("<svg"));
    }

    #[test]
    fn test_get_flag_uppercase() {
        assert_eq!(get_flag(" US "), get_flag("us"));
    }

    #[test]
    fn test_get_flag_nonexistent() {
        assert!(get_flag("zz").is_none());
    }

    #[test]
    fn test_manifest_matches_table() {
        assert_eq!(flag_count(), AVAILABLE_COUNTRIES.len());
        assert!(AVAILABLE_COUNTRIES.windows(2).all(|w| w[0] < w[1]));
        for (code, (flag_code, _)) in AVAILABLE_COUNTRIES.iter().zip(FLAGS) {
            assert_eq!(code, flag_code);
        }
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["US", " gb ", "Fr", "de", "  ", "INVALID"] {
            let once = normalize_country_code(raw);
            assert_eq!(normalize_country_code(&once), once);
        }
    }

    #[test]
    fn test_is_valid_country_code() {
        assert!(is_valid_country_code("us"));
        assert!(is_valid_country_code("US"));
        assert!(is_valid_country_code(" gb "));
        assert!(!is_valid_country_code(""));
        assert!(!is_valid_country_code("u"));
        assert!(!is_valid_country_code("usa"));
        assert!(!is_valid_country_code("u s"));
        assert!(!is_valid_country_code("xx"));
    }

    #[test]
    fn test_store_resolution() {
        let store =
            AssetStore::from_entries([("US", "<svg id=\"us\"/>"), ("gb", "<svg id=\"gb\"/>")]);
        assert_eq!(store.get("us").unwrap(), "<svg id=\"us\"/>");
        assert_eq!(store.get(" GB").unwrap(), "<svg id=\"gb\"/>");
        assert!(store.get("fr").unwrap_err().is_not_found());
        assert_eq!(store.codes().collect::<Vec<_>>(), vec!["gb", "us"]);
        assert!(store.is_valid_country_code("US"));
        assert!(!store.is_valid_country_code("xx"));
    }

    #[test]
    fn test_resolve_is_stable_under_renormalization() {
        let store = AssetStore::embedded();
        let once = normalize_country_code(" De ");
        let twice = normalize_country_code(&once);
        assert_eq!(store.get(&once).unwrap(), store.get(&twice).unwrap());
    }

    #[tokio::test]
    async fn test_async_resolve_embedded() {
        let store = AssetStore::embedded();
        let svg = store.resolve("FR").await.unwrap();
        assert!(matches!(svg, Cow::Borrowed(_)));

        let err = store.resolve("xx").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Flag not found for country: xx");
    }

    #[test]
    fn test_placeholder_svg() {
        let svg = placeholder_svg("xx");
        assert!(svg.contains(">XX</text>"));
        assert!(svg.contains("viewBox=\"0 0 512 336\""));
    }

    #[test]
    fn test_flag_path() {
        assert_eq!(flag_path("de"), "/flags/de.svg");
    }
}
