//! Filter specification for a fetch.

use std::collections::BTreeSet;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Where a delivery event was emitted from. Fixed enumeration; unknown tags
/// are rejected at parse time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Device,
    Sdk,
    Portal,
}

impl EventSource {
    pub fn parse(raw: Option<&str>) -> Result<Option<Self>> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some("device") => Ok(Some(Self::Device)),
            Some("sdk") => Ok(Some(Self::Sdk)),
            Some("portal") => Ok(Some(Self::Portal)),
            Some(_) => Err(anyhow!("source must be one of: device, sdk, portal")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Sdk => "sdk",
            Self::Portal => "portal",
        }
    }
}

/// Which brands, which features, and optionally which source a fetch is
/// restricted to. Ordered sets so cache keys and bound query parameters are
/// stable regardless of input order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSpec {
    pub brands: BTreeSet<String>,
    pub features: BTreeSet<String>,
    pub source: Option<EventSource>,
}

impl FilterSpec {
    pub fn new<B, F>(brands: B, features: F, source: Option<EventSource>) -> Self
    where
        B: IntoIterator<Item = String>,
        F: IntoIterator<Item = String>,
    {
        Self {
            brands: brands.into_iter().collect(),
            features: features.into_iter().collect(),
            source,
        }
    }

    /// An empty selection must block the fetch and prompt the user, not
    /// silently widen into an unfiltered query.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.brands.is_empty() {
            return Err(EngineError::InvalidFilter(
                "select at least one brand".to_string(),
            ));
        }
        if self.features.is_empty() {
            return Err(EngineError::InvalidFilter(
                "select at least one feature".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(brands: &[&str], features: &[&str]) -> FilterSpec {
        FilterSpec::new(
            brands.iter().map(|s| s.to_string()),
            features.iter().map(|s| s.to_string()),
            None,
        )
    }

    #[test]
    fn empty_brands_blocked() {
        let err = spec(&[], &["oobe"]).validate().expect_err("must fail");
        assert!(err.to_string().contains("brand"));
    }

    #[test]
    fn empty_features_blocked() {
        let err = spec(&["acme"], &[]).validate().expect_err("must fail");
        assert!(err.to_string().contains("feature"));
    }

    #[test]
    fn populated_filter_passes() {
        assert!(spec(&["acme"], &["oobe"]).validate().is_ok());
    }

    #[test]
    fn source_parse_accepts_known_tags() {
        assert_eq!(
            EventSource::parse(Some("sdk")).expect("parse"),
            Some(EventSource::Sdk)
        );
        assert_eq!(EventSource::parse(None).expect("parse"), None);
        assert_eq!(EventSource::parse(Some("")).expect("parse"), None);
    }

    #[test]
    fn source_parse_rejects_unknown_tags() {
        assert!(EventSource::parse(Some("carrier")).is_err());
    }
}
