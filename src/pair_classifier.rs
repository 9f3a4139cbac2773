use crate::data_types::color::{Color, ColorPalette};
use crate::data_types::genotype::{Allele, Genotype};
use crate::data_types::match_category::MatchCategory;
use crate::data_types::match_pair::MatchPair;
use crate::position_aligner::AlignedTable;

use log::trace;

/// Classifies one row for a pair of individuals.
/// Rules are checked in priority order and the first one that applies wins:
/// no-call, deletion, insertion, missing, full match, no match, and finally half match.
/// The result does not depend on which genotype is passed first.
/// # Arguments
/// * `first` - the genotype of one individual
/// * `second` - the genotype of the other individual
pub fn classify(first: &Genotype, second: &Genotype) -> MatchCategory {
    let any_allele = |allele: Allele| first.contains(allele) || second.contains(allele);
    if any_allele(Allele::NoCall) {
        return MatchCategory::NoCall;
    }
    if any_allele(Allele::Deletion) {
        return MatchCategory::Delete;
    }
    if any_allele(Allele::Insertion) {
        return MatchCategory::Insert;
    }
    if any_allele(Allele::Missing) {
        return MatchCategory::Missing;
    }

    let [p1, p2] = first.alleles();
    let [q1, q2] = second.alleles();
    if (p1 == q1 && p2 == q2) || (p1 == q2 && p2 == q1) {
        return MatchCategory::FullMatch;
    }
    if p1 != q1 && p1 != q2 && p2 != q1 && p2 != q2 {
        return MatchCategory::NoMatch;
    }
    MatchCategory::HalfMatch
}

/// The classification of every aligned row for one pair
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PairClassification {
    pair: MatchPair,
    /// One category per dense index
    categories: Vec<MatchCategory>,
    /// One raw color per dense index
    raw_colors: Vec<Color>
}

impl PairClassification {
    pub fn pair(&self) -> MatchPair {
        self.pair
    }

    pub fn categories(&self) -> &[MatchCategory] {
        &self.categories
    }

    pub fn raw_colors(&self) -> &[Color] {
        &self.raw_colors
    }

    /// Returns the number of rows in each category, indexed by `MatchCategory as usize`
    pub fn category_counts(&self) -> [usize; MatchCategory::HalfMatch as usize + 1] {
        let mut counts = [0; MatchCategory::HalfMatch as usize + 1];
        for &category in self.categories.iter() {
            counts[category as usize] += 1;
        }
        counts
    }
}

/// Applies `classify` across an aligned table and maps the result to raw colors
pub struct PairClassifier {
    palette: ColorPalette
}

impl PairClassifier {
    pub fn new(palette: ColorPalette) -> PairClassifier {
        PairClassifier {
            palette
        }
    }

    /// Classifies every row of the table for a single pair.
    /// # Panics
    /// * if either pair index is outside the table roster
    pub fn classify_pair(&self, table: &AlignedTable, pair: MatchPair) -> PairClassification {
        let categories: Vec<MatchCategory> = table.rows().iter()
            .map(|row| classify(&row.genotype(pair.first()), &row.genotype(pair.second())))
            .collect();
        let raw_colors: Vec<Color> = categories.iter()
            .map(|&category| self.palette.raw_color(category))
            .collect();
        trace!("{} {}-{}: classified {} rows", table.chromosome(), pair.first(), pair.second(), categories.len());
        PairClassification {
            pair,
            categories,
            raw_colors
        }
    }

    /// Classifies every row of the table for each pair, in the given order
    pub fn classify_all(&self, table: &AlignedTable, pairs: &[MatchPair]) -> Vec<PairClassification> {
        pairs.iter()
            .map(|&pair| self.classify_pair(table, pair))
            .collect()
    }
}
