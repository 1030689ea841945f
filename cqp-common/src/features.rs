//! Cupping-score features and the artifact filename convention
//!
//! Artifact identifiers encode their feature set in the file name:
//! `model_Acidity_Body_Balance_4.pkl` was trained on Acidity, Body and
//! Balance (in that order); the trailing number only disambiguates files.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Lowest accepted cupping score
pub const SCORE_MIN: f64 = 5.0;

/// Highest accepted cupping score
pub const SCORE_MAX: f64 = 10.0;

/// Slider step used by the input form
pub const SCORE_STEP: f64 = 0.1;

/// Column name of the categorical input in every tabular record
pub const COUNTRY_COLUMN: &str = "CountryOfOrigin";

static ARTIFACT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^model_(.+)\.pkl$").expect("artifact name pattern is valid"));

/// A numeric cupping-score dimension a model can be trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    Aroma,
    Acidity,
    Body,
    Balance,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::Aroma,
        Feature::Acidity,
        Feature::Body,
        Feature::Balance,
    ];

    /// Column name used in tabular records (matches the training data)
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Aroma => "Aroma",
            Feature::Acidity => "Acidity",
            Feature::Body => "Body",
            Feature::Balance => "Balance",
        }
    }

    /// One-line explanation shown next to the input slider
    pub fn description(&self) -> &'static str {
        match self {
            Feature::Aroma => "fragrance or smell",
            Feature::Acidity => "brightness or sharpness of flavor adding complexity to the coffee",
            Feature::Body => "weight and texture of the coffee on your tongue and in your mouth",
            Feature::Balance => {
                "harmonious interaction between its various components, including acidity, \
                 sweetness, bitterness, and body"
            }
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Feature::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| Error::Format(format!("unknown feature '{}'", s)))
    }
}

/// Recover the ordered feature names encoded in an artifact identifier.
///
/// Strips the `model_` prefix and `.pkl` suffix, splits the remainder on
/// `_` and drops purely numeric tokens.
///
/// # Errors
///
/// `Error::Format` if the prefix/suffix do not match, if a token is empty
/// (`model__1.pkl`) or if no non-numeric token remains (`model_1_2.pkl`).
///
/// # Examples
///
/// ```
/// use cqp_common::features::parse_features;
///
/// let names = parse_features("model_Acidity_Body_Balance_4.pkl").unwrap();
/// assert_eq!(names, vec!["Acidity", "Body", "Balance"]);
/// ```
pub fn parse_features(artifact_name: &str) -> Result<Vec<String>> {
    let stem = ARTIFACT_NAME
        .captures(artifact_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            Error::Format(format!(
                "'{}' does not match model_<features>.pkl",
                artifact_name
            ))
        })?;

    let mut names = Vec::new();
    for token in stem.split('_') {
        if token.is_empty() {
            return Err(Error::Format(format!(
                "'{}' contains an empty name segment",
                artifact_name
            )));
        }
        if token.chars().all(char::is_numeric) {
            continue;
        }
        names.push(token.to_string());
    }

    if names.is_empty() {
        return Err(Error::Format(format!(
            "'{}' encodes no feature names",
            artifact_name
        )));
    }

    Ok(names)
}

/// Like [`parse_features`], but maps every name onto a known [`Feature`]
/// and rejects duplicates.
pub fn parse_feature_set(artifact_name: &str) -> Result<Vec<Feature>> {
    let mut features: Vec<Feature> = Vec::new();
    for name in parse_features(artifact_name)? {
        let feature: Feature = name.parse().map_err(|_| {
            Error::Format(format!(
                "'{}' names unknown feature '{}'",
                artifact_name, name
            ))
        })?;
        if features.contains(&feature) {
            return Err(Error::Format(format!(
                "'{}' lists feature '{}' twice",
                artifact_name, feature
            )));
        }
        features.push(feature);
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_features() {
        assert_eq!(
            parse_features("model_Acidity_Body_Balance_4.pkl").unwrap(),
            vec!["Acidity", "Body", "Balance"]
        );
    }

    #[test]
    fn test_parse_drops_numeric_tokens_anywhere() {
        assert_eq!(
            parse_features("model_Aroma_12_Body_3.pkl").unwrap(),
            vec!["Aroma", "Body"]
        );
    }

    #[test]
    fn test_parse_drops_non_ascii_digit_tokens() {
        assert_eq!(
            parse_features("model_Aroma_Body_٣.pkl").unwrap(),
            vec!["Aroma", "Body"]
        );
    }

    #[test]
    fn test_parse_rejects_wrong_prefix_or_suffix() {
        assert!(matches!(
            parse_features("Aroma_Body_2.pkl"),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            parse_features("model_Aroma_Body_2.joblib"),
            Err(Error::Format(_))
        ));
        assert!(matches!(parse_features("model_.pkl"), Err(Error::Format(_))));
    }

    #[test]
    fn test_parse_rejects_all_numeric_name() {
        assert!(matches!(
            parse_features("model_1_2.pkl"),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_segment() {
        assert!(matches!(
            parse_features("model_Aroma__Body_1.pkl"),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_parse_feature_set_known_names() {
        assert_eq!(
            parse_feature_set("model_Aroma_Balance_3.pkl").unwrap(),
            vec![Feature::Aroma, Feature::Balance]
        );
    }

    #[test]
    fn test_parse_feature_set_rejects_unknown_and_duplicates() {
        assert!(matches!(
            parse_feature_set("model_Aroma_Sweetness_3.pkl"),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            parse_feature_set("model_Aroma_Aroma_3.pkl"),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_feature_round_trips_through_name() {
        for feature in Feature::ALL {
            assert_eq!(feature.name().parse::<Feature>().unwrap(), feature);
        }
        assert!("aroma".parse::<Feature>().is_err());
    }
}
