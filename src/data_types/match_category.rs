use serde::Serialize;

/// The closed set of outcomes when comparing two individuals at one aligned row.
/// Variants are listed in the priority order used by the classifier.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize,
    strum_macros::AsRefStr, strum_macros::Display, strum_macros::EnumCount,
    strum_macros::EnumIter, strum_macros::EnumString, strum_macros::FromRepr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchCategory {
    /// At least one allele is a no-call
    NoCall=0,
    /// At least one allele is a deletion
    Delete,
    /// At least one allele is an insertion
    Insert,
    /// At least one individual had no call at this position (union alignment only)
    Missing,
    /// Both alleles agree, in either order
    FullMatch,
    /// No allele agrees
    NoMatch,
    /// Everything else, i.e. one shared allele
    HalfMatch
}

/// The categories that the segment detector builds runs for
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize,
    strum_macros::AsRefStr, strum_macros::Display, strum_macros::EnumIter, strum_macros::EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    NoMatch,
    FullMatch
}

impl SegmentKind {
    /// The classification that qualifies a row for this kind of segment
    pub fn target_category(&self) -> MatchCategory {
        match self {
            SegmentKind::NoMatch => MatchCategory::NoMatch,
            SegmentKind::FullMatch => MatchCategory::FullMatch
        }
    }
}
