// ABOUTME: Validated reference to the manager container image.
// ABOUTME: Knows whether the reference lives in the managed conducto/ namespace.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),
}

/// A container image reference, normalized to carry an explicit tag.
///
/// `conducto/manager:0.1`, `manager-dev:0.1-abc`, or a fully qualified
/// `registry.example:5000/team/img:tag@sha256:...` all parse; a reference
/// with neither tag nor digest gets `latest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }
        if let Some(bad) = input
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !"/:.-_@".contains(*c))
        {
            return Err(ParseImageRefError::InvalidChar(bad));
        }

        let (rest, digest) = split_off(input, '@');

        // The last colon starts the tag, unless it sits inside a registry
        // host:port component (detectable by a slash after it).
        let (rest, tag) = match rest.rsplit_once(':') {
            Some((before, after)) if !after.contains('/') => (before, Some(after.to_string())),
            _ => (rest, None),
        };

        // A leading component with a dot, a colon, or the literal "localhost"
        // is a registry host; anything else belongs to the name.
        let (registry, name) = match rest.split_once('/') {
            Some((host, remainder))
                if host.contains('.') || host.contains(':') || host == "localhost" =>
            {
                (Some(host.to_string()), remainder.to_string())
            }
            _ => (None, rest.to_string()),
        };

        let tag = match (&tag, &digest) {
            (None, None) => Some("latest".to_string()),
            _ => tag,
        };

        Ok(Self {
            registry,
            name,
            tag,
            digest,
        })
    }

    /// True when the reference lives in the system's own registry namespace.
    /// Those images are pulled on every launch so a local run picks up the
    /// current release.
    pub fn is_managed_namespace(&self) -> bool {
        self.registry.is_none() && self.name.starts_with("conducto/")
    }
}

fn split_off(input: &str, sep: char) -> (&str, Option<String>) {
    match input.split_once(sep) {
        Some((before, after)) => (before, Some(after.to_string())),
        None => (input, None),
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }
        f.write_str(&self.name)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}
