//! Location: the cache and registry key for a template resource.
//!
//! A [`Location`] wraps a [`Url`]. Style references inside a document are
//! resolved against the document's own location with [`Location::join`], so
//! `<style src="theme.css"/>` in `https://host/screens/main.xml` points at
//! `https://host/screens/theme.css`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use url::Url;

/// Errors from building a [`Location`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("invalid location `{input}`: {source}")]
    Invalid {
        input: String,
        #[source]
        source: url::ParseError,
    },
    #[error("cannot resolve `{reference}` against {base}")]
    Unresolvable { base: String, reference: String },
    #[error("path is not absolute: {0}")]
    RelativePath(String),
}

/// Opaque, hashable identifier for a template resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(Url);

impl Location {
    /// Parse an absolute URL into a location.
    pub fn parse(input: &str) -> Result<Self, LocationError> {
        Url::parse(input)
            .map(Self)
            .map_err(|source| LocationError::Invalid {
                input: input.to_owned(),
                source,
            })
    }

    /// Build a `file://` location from an absolute filesystem path.
    pub fn from_file_path(path: impl AsRef<Path>) -> Result<Self, LocationError> {
        let path = path.as_ref();
        Url::from_file_path(path)
            .map(Self)
            .map_err(|()| LocationError::RelativePath(path.display().to_string()))
    }

    /// Resolve a (possibly relative) reference against this location.
    pub fn join(&self, reference: &str) -> Result<Self, LocationError> {
        if self.0.cannot_be_a_base() {
            return Err(LocationError::Unresolvable {
                base: self.0.to_string(),
                reference: reference.to_owned(),
            });
        }
        self.0
            .join(reference)
            .map(Self)
            .map_err(|source| LocationError::Invalid {
                input: reference.to_owned(),
                source,
            })
    }

    /// The underlying URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// The location as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// URL scheme, e.g. `"https"` or `"file"`.
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }
}

impl From<Url> for Location {
    fn from(url: Url) -> Self {
        Self(url)
    }
}

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
