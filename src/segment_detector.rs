use crate::data_types::color::{Color, ColorPalette};
use crate::data_types::match_category::{MatchCategory, SegmentKind};
use crate::phasing_config::{SegmentConfig, StreakThresholds};

use log::trace;

/// A gap-tolerant run of qualifying dense indices, before any minimum length check
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Streak {
    /// First qualifying dense index
    pub start: usize,
    /// Last qualifying dense index, inclusive
    pub end: usize,
    /// Number of qualifying indices in the streak
    pub count: usize
}

/// Groups ascending dense indices into streaks.
/// Consecutive indices stay in the same streak while their difference is at most `gap`.
/// The first index always opens a streak.
/// # Arguments
/// * `indices` - qualifying dense indices, sorted ascending
/// * `gap` - the largest allowed difference between consecutive indices in a streak
pub fn find_streaks(indices: &[usize], gap: usize) -> Vec<Streak> {
    let mut streaks: Vec<Streak> = vec![];
    let mut current: Option<Streak> = None;
    for &index in indices.iter() {
        current = match current {
            Some(mut streak) if index - streak.end <= gap => {
                streak.end = index;
                streak.count += 1;
                Some(streak)
            },
            previous => {
                if let Some(streak) = previous {
                    streaks.push(streak);
                }
                Some(Streak { start: index, end: index, count: 1 })
            }
        };
    }
    if let Some(streak) = current {
        streaks.push(streak);
    }
    streaks
}

/// A painted stretch of dense indices for one pair
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Segment {
    kind: SegmentKind,
    /// First dense index, inclusive
    start: usize,
    /// Last dense index, inclusive
    end: usize,
    /// Number of rows in the stretch that actually had the target category
    count: usize,
    color: Color
}

impl Segment {
    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Total rows painted, including rows of other categories swept into the stretch
    pub fn painted_rows(&self) -> usize {
        self.end - self.start + 1
    }
}

/// The smoothed result for one pair
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SegmentColorSeries {
    /// One segment color per dense index
    colors: Vec<Color>,
    /// Every painted segment, no-match segments first
    segments: Vec<Segment>
}

impl SegmentColorSeries {
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// Runs the no-match and full-match streak detectors over a pair's categories
pub struct SegmentDetector {
    config: SegmentConfig,
    palette: ColorPalette
}

impl SegmentDetector {
    pub fn new(config: SegmentConfig, palette: ColorPalette) -> SegmentDetector {
        SegmentDetector {
            config,
            palette
        }
    }

    /// Builds the segment colors for one pair.
    /// The no-match pass is painted first and the full-match pass second, so full-match wins any overlap.
    /// Rows that no segment claims get the default segment color.
    /// # Arguments
    /// * `categories` - the category of each dense index for the pair
    pub fn detect(&self, categories: &[MatchCategory]) -> SegmentColorSeries {
        let mut colors: Vec<Color> = vec![self.palette.default_segment_color(); categories.len()];
        let mut segments: Vec<Segment> = vec![];

        for kind in [SegmentKind::NoMatch, SegmentKind::FullMatch] {
            let thresholds: StreakThresholds = self.config.thresholds(kind);
            let target: MatchCategory = kind.target_category();
            let color: Color = self.palette.segment_color(kind);

            let indices: Vec<usize> = categories.iter()
                .enumerate()
                .filter(|(_i, category)| **category == target)
                .map(|(i, _category)| i)
                .collect();

            for streak in find_streaks(&indices, thresholds.gap()) {
                if streak.count < thresholds.min_run() {
                    trace!("Skipping {} streak {}-{} with {} rows", kind, streak.start, streak.end, streak.count);
                    continue;
                }
                colors[streak.start..=streak.end].fill(color);
                segments.push(Segment {
                    kind,
                    start: streak.start,
                    end: streak.end,
                    count: streak.count,
                    color
                });
            }
        }

        SegmentColorSeries {
            colors,
            segments
        }
    }
}
