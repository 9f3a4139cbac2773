use crate::data_types::color::{Color, ColorError, ColorPalette};
use crate::data_types::genotype::Allele;
use crate::data_types::match_category::{MatchCategory, SegmentKind};

use log::info;
use std::str::FromStr;

/// Controls which positions survive when individuals are merged
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq,
    strum_macros::AsRefStr, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AlignmentPolicy {
    /// Only positions reported by every individual
    Intersection,
    /// Every position reported by any individual, absent calls become the missing sentinel
    Union
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("unknown alignment policy {0:?}, expected \"intersection\" or \"union\"")]
    UnknownPolicy(String),
    #[error("{name} gap must be >= 0, got {value}")]
    NegativeGap { name: String, value: i64 },
    #[error("{name} minimum run must be >= 1, got {value}")]
    MinimumRun { name: String, value: i64 },
    #[error("missing value sentinel {0:?} collides with a raw allele symbol")]
    ReservedSentinel(char),
    #[error("missing value sentinel must be a single printable character, got {0:?}")]
    InvalidSentinel(String),
    #[error("unknown match category {0:?}")]
    UnknownCategory(String),
    #[error("unknown segment kind {0:?}, expected no_match, full_match, or half_match")]
    UnknownSegmentKind(String),
    #[error("color assignment {0:?} must have the form NAME=COLOR")]
    AssignmentFormat(String),
    #[error(transparent)]
    Color(#[from] ColorError)
}

/// Settings for the position aligner
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlignmentConfig {
    /// How positions from different individuals are merged
    pub policy: AlignmentPolicy,
    /// Drop an individual's call if either allele is an insertion
    pub filter_insert: bool,
    /// Drop an individual's call if either allele is a deletion
    pub filter_delete: bool,
    /// Drop an individual's call if either allele is a no-call
    pub filter_no_call: bool,
    /// Drop rows where every allele of every individual is identical
    pub filter_uninformative_rows: bool,
    /// Printable symbol for missing slots
    missing_value_sentinel: char
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        AlignmentConfig {
            policy: AlignmentPolicy::Intersection,
            filter_insert: true,
            filter_delete: true,
            filter_no_call: true,
            filter_uninformative_rows: true,
            missing_value_sentinel: 'Z'
        }
    }
}

impl AlignmentConfig {
    /// Sets the printable missing value sentinel.
    /// # Errors
    /// * if the sentinel is whitespace or could be parsed as a raw allele symbol
    pub fn set_missing_value_sentinel(&mut self, sentinel: char) -> Result<(), ConfigError> {
        if sentinel.is_whitespace() || sentinel.is_control() {
            return Err(ConfigError::InvalidSentinel(sentinel.to_string()));
        }
        if Allele::is_reserved_symbol(sentinel) {
            return Err(ConfigError::ReservedSentinel(sentinel));
        }
        self.missing_value_sentinel = sentinel;
        Ok(())
    }

    pub fn missing_value_sentinel(&self) -> char {
        self.missing_value_sentinel
    }

    /// Returns true if a genotype containing `allele` should be dropped before merging
    pub fn is_filtered(&self, allele: Allele) -> bool {
        match allele {
            Allele::Insertion => self.filter_insert,
            Allele::Deletion => self.filter_delete,
            Allele::NoCall => self.filter_no_call,
            _ => false
        }
    }
}

/// Gap tolerance and minimum run length for one streak detector
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StreakThresholds {
    /// Largest dense-index difference between consecutive qualifying rows that still extends a run
    gap: usize,
    /// Fewest qualifying rows a run needs before it is painted
    min_run: usize
}

impl StreakThresholds {
    /// Validates and creates a new set of thresholds.
    /// # Arguments
    /// * `name` - label used in error messages
    /// * `gap` - must be >= 0
    /// * `min_run` - must be >= 1
    /// # Errors
    /// * if either value is out of range
    pub fn new(name: &str, gap: i64, min_run: i64) -> Result<StreakThresholds, ConfigError> {
        let gap: usize = usize::try_from(gap)
            .map_err(|_| ConfigError::NegativeGap { name: name.to_string(), value: gap })?;
        if min_run < 1 {
            return Err(ConfigError::MinimumRun { name: name.to_string(), value: min_run });
        }
        let min_run: usize = usize::try_from(min_run)
            .map_err(|_| ConfigError::MinimumRun { name: name.to_string(), value: min_run })?;
        Ok(StreakThresholds {
            gap,
            min_run
        })
    }

    pub fn gap(&self) -> usize {
        self.gap
    }

    pub fn min_run(&self) -> usize {
        self.min_run
    }
}

/// Thresholds for both segment detectors
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SegmentConfig {
    pub no_match: StreakThresholds,
    pub full_match: StreakThresholds
}

impl Default for SegmentConfig {
    fn default() -> Self {
        SegmentConfig {
            no_match: StreakThresholds { gap: 600, min_run: 5 },
            full_match: StreakThresholds { gap: 1, min_run: 100 }
        }
    }
}

impl SegmentConfig {
    /// Returns the thresholds for a given segment kind
    pub fn thresholds(&self, kind: SegmentKind) -> StreakThresholds {
        match kind {
            SegmentKind::NoMatch => self.no_match,
            SegmentKind::FullMatch => self.full_match
        }
    }
}

/// Full validated configuration for a run, built once and handed to each component
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PhasingConfig {
    pub alignment: AlignmentConfig,
    pub segments: SegmentConfig,
    pub palette: ColorPalette
}

impl PhasingConfig {
    /// Writes the configuration to the logger
    pub fn log_settings(&self) {
        let enabled = |b: bool| if b { "ENABLED" } else { "DISABLED" };
        info!("Alignment:");
        info!("\tPolicy: {}", self.alignment.policy);
        info!("\tFilter inserts: {}", enabled(self.alignment.filter_insert));
        info!("\tFilter deletes: {}", enabled(self.alignment.filter_delete));
        info!("\tFilter no-calls: {}", enabled(self.alignment.filter_no_call));
        info!("\tFilter uninformative rows: {}", enabled(self.alignment.filter_uninformative_rows));
        info!("\tMissing value sentinel: {:?}", self.alignment.missing_value_sentinel());
        info!("Segments:");
        info!("\tNo-match gap: {}", self.segments.no_match.gap());
        info!("\tNo-match minimum run: {}", self.segments.no_match.min_run());
        info!("\tFull-match gap: {}", self.segments.full_match.gap());
        info!("\tFull-match minimum run: {}", self.segments.full_match.min_run());
    }
}

/// Parses an alignment policy name
/// # Errors
/// * if the name is not "intersection" or "union"
pub fn parse_policy(value: &str) -> Result<AlignmentPolicy, ConfigError> {
    AlignmentPolicy::from_str(&value.to_ascii_lowercase())
        .map_err(|_| ConfigError::UnknownPolicy(value.to_string()))
}

/// Splits a "NAME=COLOR" assignment into its parts
fn split_assignment(assignment: &str) -> Result<(&str, Color), ConfigError> {
    match assignment.split_once('=') {
        Some((name, color)) if !name.trim().is_empty() => {
            Ok((name.trim(), Color::parse(color)?))
        },
        _ => Err(ConfigError::AssignmentFormat(assignment.to_string()))
    }
}

/// Applies a "CATEGORY=COLOR" override to the raw colors of a palette
/// # Errors
/// * if the assignment is malformed, the category is unknown, or the color is unknown
pub fn apply_raw_color(palette: &mut ColorPalette, assignment: &str) -> Result<(), ConfigError> {
    let (name, color) = split_assignment(assignment)?;
    let category = MatchCategory::from_str(name)
        .map_err(|_| ConfigError::UnknownCategory(name.to_string()))?;
    palette.set_raw_color(category, color);
    Ok(())
}

/// Applies a "KIND=COLOR" override to the segment colors of a palette, where "half_match" sets the default color
/// # Errors
/// * if the assignment is malformed, the kind is unknown, or the color is unknown
pub fn apply_segment_color(palette: &mut ColorPalette, assignment: &str) -> Result<(), ConfigError> {
    let (name, color) = split_assignment(assignment)?;
    if name == MatchCategory::HalfMatch.as_ref() {
        palette.set_default_segment_color(color);
    } else {
        let kind = SegmentKind::from_str(name)
            .map_err(|_| ConfigError::UnknownSegmentKind(name.to_string()))?;
        palette.set_segment_color(kind, color);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streak_thresholds() {
        let thresholds = StreakThresholds::new("no-match", 0, 1).unwrap();
        assert_eq!(thresholds.gap(), 0);
        assert_eq!(thresholds.min_run(), 1);

        assert_eq!(
            StreakThresholds::new("no-match", -1, 3),
            Err(ConfigError::NegativeGap { name: "no-match".to_string(), value: -1 })
        );
        assert_eq!(
            StreakThresholds::new("full-match", 1, 0),
            Err(ConfigError::MinimumRun { name: "full-match".to_string(), value: 0 })
        );
        assert!(StreakThresholds::new("full-match", 1, -5).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = PhasingConfig::default();
        assert_eq!(config.alignment.policy, AlignmentPolicy::Intersection);
        assert!(config.alignment.filter_insert && config.alignment.filter_delete && config.alignment.filter_no_call);
        assert!(config.alignment.filter_uninformative_rows);
        assert_eq!(config.alignment.missing_value_sentinel(), 'Z');
        assert_eq!(config.segments.thresholds(SegmentKind::NoMatch), StreakThresholds::new("", 600, 5).unwrap());
        assert_eq!(config.segments.thresholds(SegmentKind::FullMatch), StreakThresholds::new("", 1, 100).unwrap());
    }

    #[test]
    fn test_sentinel() {
        let mut config = AlignmentConfig::default();
        assert!(config.set_missing_value_sentinel('?').is_ok());
        assert_eq!(config.missing_value_sentinel(), '?');
        assert_eq!(config.set_missing_value_sentinel('0'), Err(ConfigError::ReservedSentinel('0')));
        assert_eq!(config.set_missing_value_sentinel('D'), Err(ConfigError::ReservedSentinel('D')));
        assert_eq!(config.set_missing_value_sentinel('-'), Err(ConfigError::ReservedSentinel('-')));
        assert!(config.set_missing_value_sentinel(' ').is_err());
        // failures leave the previous value alone
        assert_eq!(config.missing_value_sentinel(), '?');
    }

    #[test]
    fn test_filters() {
        let mut config = AlignmentConfig::default();
        assert!(config.is_filtered(Allele::Insertion));
        assert!(config.is_filtered(Allele::NoCall));
        assert!(!config.is_filtered(Allele::A));
        assert!(!config.is_filtered(Allele::Missing));
        config.filter_delete = false;
        assert!(!config.is_filtered(Allele::Deletion));
    }

    #[test]
    fn test_policy() {
        assert_eq!(parse_policy("union").unwrap(), AlignmentPolicy::Union);
        assert_eq!(parse_policy("Intersection").unwrap(), AlignmentPolicy::Intersection);
        assert_eq!(parse_policy("outer"), Err(ConfigError::UnknownPolicy("outer".to_string())));
    }

    #[test]
    fn test_color_assignments() {
        let mut palette = ColorPalette::default();
        apply_raw_color(&mut palette, "missing=purple").unwrap();
        assert_eq!(palette.raw_color(MatchCategory::Missing).to_string(), "purple");
        apply_segment_color(&mut palette, "full_match=#00ff00").unwrap();
        assert_eq!(palette.segment_color(SegmentKind::FullMatch).to_string(), "lime");
        apply_segment_color(&mut palette, "half_match=white").unwrap();
        assert_eq!(palette.default_segment_color().to_string(), "white");

        assert_eq!(
            apply_raw_color(&mut palette, "purple"),
            Err(ConfigError::AssignmentFormat("purple".to_string()))
        );
        assert_eq!(
            apply_raw_color(&mut palette, "sort_of_match=red"),
            Err(ConfigError::UnknownCategory("sort_of_match".to_string()))
        );
        assert_eq!(
            apply_segment_color(&mut palette, "no_call=red"),
            Err(ConfigError::UnknownSegmentKind("no_call".to_string()))
        );
        assert!(apply_raw_color(&mut palette, "no_match=reddish").is_err());
    }
}
