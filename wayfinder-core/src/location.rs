//! Place-name queries and the coordinates they resolve to.

use thiserror::Error;

use crate::ProviderError;

/// Longest accepted place-name query, in characters.
pub const MAX_QUERY_CHARS: usize = 256;

/// A WGS84 position in decimal degrees.
///
/// Fields are public for cheap construction by providers; use
/// [`Coordinate::new`] or [`Coordinate::validate`] wherever the values come
/// from outside the engine.
///
/// # Examples
///
/// ```
/// use wayfinder_core::Coordinate;
///
/// let mumbai = Coordinate::new(19.076, 72.877)?;
/// assert_eq!(mumbai.lat, 19.076);
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// # Ok::<(), wayfinder_core::CoordinateError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    /// Latitude in `-90.0..=90.0`.
    pub lat: f64,
    /// Longitude in `-180.0..=180.0`.
    pub lon: f64,
}

/// Errors returned by [`Coordinate::new`] and [`Coordinate::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    /// Latitude or longitude was NaN or infinite.
    #[error("coordinate ({lat}, {lon}) is not finite")]
    NonFinite {
        /// Offending latitude.
        lat: f64,
        /// Offending longitude.
        lon: f64,
    },
    /// Latitude was outside `-90.0..=90.0`.
    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),
    /// Longitude was outside `-180.0..=180.0`.
    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
}

impl Coordinate {
    /// Validate and construct a coordinate.
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        let coord = Self { lat, lon };
        coord.validate()?;
        Ok(coord)
    }

    /// Check that both components are finite and in range.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err(CoordinateError::NonFinite {
                lat: self.lat,
                lon: self.lon,
            });
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoordinateError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(CoordinateError::LongitudeOutOfRange(self.lon));
        }
        Ok(())
    }
}

/// A free-text place name with an optional country or region hint.
///
/// Queries are immutable once built. Two queries that differ only in case
/// or surrounding whitespace share a [`cache_key`](Self::cache_key).
///
/// # Examples
///
/// ```
/// use wayfinder_core::LocationQuery;
///
/// let query = LocationQuery::new("  Mumbai ").with_hint("India");
/// assert_eq!(query.search_text(), "Mumbai, India");
/// assert_eq!(query.cache_key(), "mumbai|india");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    text: String,
    hint: Option<String>,
}

impl LocationQuery {
    /// Build a query for `text` with no hint.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hint: None,
        }
    }

    /// Attach a country or region hint. Blank hints are ignored.
    #[must_use]
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        let raw: String = hint.into();
        let trimmed = raw.trim();
        Self {
            hint: (!trimmed.is_empty()).then(|| trimmed.to_owned()),
            ..self
        }
    }

    /// Build a query from an optional hint, as received from callers.
    #[must_use]
    pub fn from_parts(text: impl Into<String>, hint: Option<&str>) -> Self {
        let query = Self::new(text);
        match hint {
            Some(value) => query.with_hint(value),
            None => query,
        }
    }

    /// The place name exactly as supplied.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The country or region hint, if any.
    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Text sent to providers: the trimmed name followed by `", <hint>"`,
    /// unless the name already ends with the hint.
    #[must_use]
    pub fn search_text(&self) -> String {
        let text = collapse_whitespace(&self.text);
        match &self.hint {
            Some(hint) if !ends_with_segment(&text, hint) => format!("{text}, {hint}"),
            _ => text,
        }
    }

    /// Normalised key for result caching and single-flight collapsing.
    ///
    /// Lowercased, trimmed, whitespace collapsed, hint appended after `|`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let text = normalise(&self.text);
        match &self.hint {
            Some(hint) => format!("{text}|{}", normalise(hint)),
            None => text,
        }
    }

    /// Reject queries no provider could answer.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::InvalidInput`](crate::ErrorKind::InvalidInput)
    /// error when the text is blank or longer than [`MAX_QUERY_CHARS`].
    pub fn validate(&self) -> Result<(), ProviderError> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            return Err(ProviderError::invalid_input("location text is empty"));
        }
        let chars = trimmed.chars().count();
        if chars > MAX_QUERY_CHARS {
            return Err(ProviderError::invalid_input(format!(
                "location text has {chars} characters, limit is {MAX_QUERY_CHARS}"
            )));
        }
        Ok(())
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalise(value: &str) -> String {
    collapse_whitespace(value).to_lowercase()
}

/// Whether the last comma-separated segment of `text` already names `hint`.
fn ends_with_segment(text: &str, hint: &str) -> bool {
    text.rsplit(',')
        .next()
        .is_some_and(|last| normalise(last) == normalise(hint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(90.0, 180.0)]
    #[case(-90.0, -180.0)]
    #[case(19.076, 72.877)]
    fn accepts_in_range_coordinates(#[case] lat: f64, #[case] lon: f64) {
        assert!(Coordinate::new(lat, lon).is_ok());
    }

    #[rstest]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::INFINITY)]
    #[case(f64::NEG_INFINITY, 0.0)]
    fn rejects_non_finite_coordinates(#[case] lat: f64, #[case] lon: f64) {
        let err = Coordinate::new(lat, lon).expect_err("non-finite should fail");
        assert!(matches!(err, CoordinateError::NonFinite { .. }));
    }

    #[rstest]
    fn rejects_out_of_range_components() {
        assert_eq!(
            Coordinate::new(90.5, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(90.5))
        );
        assert_eq!(
            Coordinate::new(0.0, -180.5),
            Err(CoordinateError::LongitudeOutOfRange(-180.5))
        );
    }

    #[rstest]
    #[case("Mumbai", None, "mumbai")]
    #[case("  MUMBAI  ", None, "mumbai")]
    #[case("New   Delhi", Some("IN"), "new delhi|in")]
    #[case("Pune", Some("  "), "pune")]
    fn cache_key_is_normalised(
        #[case] text: &str,
        #[case] hint: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(LocationQuery::from_parts(text, hint).cache_key(), expected);
    }

    #[rstest]
    fn differently_cased_queries_share_a_key() {
        let a = LocationQuery::new("Mumbai, India");
        let b = LocationQuery::new(" mumbai,  INDIA ");
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[rstest]
    #[case("Nagpur", Some("India"), "Nagpur, India")]
    #[case("Mumbai, India", Some("india"), "Mumbai, India")]
    #[case("  Surat ", None, "Surat")]
    #[case("Berlin", Some("IN"), "Berlin, IN")]
    #[case("Kochi, Kerala, IN", Some("in"), "Kochi, Kerala, IN")]
    #[case("Pune, Maharashtra India", Some("India"), "Pune, Maharashtra India, India")]
    fn search_text_appends_hint_once(
        #[case] text: &str,
        #[case] hint: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(LocationQuery::from_parts(text, hint).search_text(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_text_is_invalid(#[case] text: &str) {
        let err = LocationQuery::new(text)
            .validate()
            .expect_err("blank text should fail");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[rstest]
    fn overlong_text_is_invalid() {
        let err = LocationQuery::new("x".repeat(MAX_QUERY_CHARS + 1))
            .validate()
            .expect_err("long text should fail");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
