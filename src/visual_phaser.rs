use crate::data_types::genotype::GenotypeSequence;
use crate::data_types::match_pair::{ComparisonPlan, MatchPair};
use crate::pair_classifier::{PairClassification, PairClassifier};
use crate::phasing_config::PhasingConfig;
use crate::position_aligner::{AlignedTable, AlignmentError, PositionAligner};
use crate::raw_parsing::{GenotypeProvider, IngestError};
use crate::segment_detector::{SegmentColorSeries, SegmentDetector};

use log::debug;

#[derive(thiserror::Error, Debug)]
pub enum PhasingError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Alignment(#[from] AlignmentError)
}

/// Everything computed for one pair on one chromosome
#[derive(Clone, Debug)]
pub struct PairResult {
    /// The pair that was compared
    pub pair: MatchPair,
    /// Display label, e.g. "KEN-ALAN"
    pub label: String,
    /// Per-row categories and raw colors
    pub classification: PairClassification,
    /// Per-row segment colors and the painted segments
    pub segments: SegmentColorSeries
}

impl PairResult {
    /// Number of rows in the pair's tracks
    pub fn len(&self) -> usize {
        self.classification.categories().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classification.categories().is_empty()
    }
}

/// The output of solving a single chromosome
#[derive(Clone, Debug)]
pub struct ChromosomeResult {
    /// The normalized chromosome name
    pub chromosome: String,
    /// Position of this chromosome in the run order, used to keep output sorted
    pub chrom_index: usize,
    /// The aligned rows every pair was computed over
    pub table: AlignedTable,
    /// One result per pair, in plan order
    pub pair_results: Vec<PairResult>
}

/// Core function that runs a full visual phasing pass on one chromosome.
/// This is safe to run on any worker thread, all inputs are read-only.
/// # Arguments
/// * `chromosome` - the normalized chromosome name
/// * `chrom_index` - the index of the chromosome in the run order
/// * `provider` - the source of genotype calls
/// * `plan` - the individuals to load and the pairs to compare
/// * `config` - the validated run configuration
/// # Errors
/// * if any individual cannot be loaded from `provider`
/// * if alignment fails, e.g. missing input on this chromosome or no surviving rows
pub fn solve_chromosome(
    chromosome: &str, chrom_index: usize, provider: &dyn GenotypeProvider,
    plan: &ComparisonPlan, config: &PhasingConfig
) -> Result<ChromosomeResult, PhasingError> {
    debug!("Solving chromosome {}...", chromosome);
    let sequences: Vec<GenotypeSequence> = plan.individuals().iter()
        .map(|individual| provider.load_chromosome(individual, chromosome))
        .collect::<Result<Vec<GenotypeSequence>, IngestError>>()?;

    let aligner = PositionAligner::new(config.alignment.clone());
    let table: AlignedTable = aligner.align(chromosome, &sequences)?;
    debug!("Aligned {} rows on chromosome {}", table.len(), chromosome);

    let classifier = PairClassifier::new(config.palette.clone());
    let detector = SegmentDetector::new(config.segments, config.palette.clone());
    let pair_results: Vec<PairResult> = plan.pairs().iter()
        .map(|&pair| {
            let classification = classifier.classify_pair(&table, pair);
            let segments = detector.detect(classification.categories());
            debug!("{} {}: {} segments painted", chromosome, plan.pair_label(&pair), segments.segments().len());
            PairResult {
                pair,
                label: plan.pair_label(&pair),
                classification,
                segments
            }
        })
        .collect();

    Ok(ChromosomeResult {
        chromosome: chromosome.to_string(),
        chrom_index,
        table,
        pair_results
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::genotype::{Genotype, GenotypeCall};
    use crate::data_types::match_category::MatchCategory;
    use crate::phasing_config::StreakThresholds;
    use crate::raw_parsing::GenotypeStore;
    use std::path::Path;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    /// Builds a sequence on chromosome "1" with one call per genotype, at positions 10, 20, ...
    fn build_sequence(individual: &str, genotypes: &[&str]) -> GenotypeSequence {
        let calls: Vec<GenotypeCall> = genotypes.iter()
            .enumerate()
            .map(|(i, &g)| GenotypeCall::new(
                format!("rs{i}"), "1".to_string(), 10 * (i as u64 + 1), Genotype::from_combined(g).unwrap()
            ))
            .collect();
        GenotypeSequence::new(individual.to_string(), calls)
    }

    #[test]
    fn test_solve_from_files() {
        let plan = ComparisonPlan::new(&names(&["KEN", "ALAN", "BRIAN"]), None).unwrap();
        let store = GenotypeStore::from_directory(Path::new("./test_data"), plan.individuals()).unwrap();
        let config = PhasingConfig::default();
        let result = solve_chromosome("1", 0, &store, &plan, &config).unwrap();

        assert_eq!(result.chromosome, "1");
        assert_eq!(result.chrom_index, 0);
        // the no-call row at 400 is filtered out
        let positions: Vec<u64> = result.table.rows().iter().map(|r| r.position()).collect();
        assert_eq!(positions, vec![100, 200, 300, 500]);

        let labels: Vec<&str> = result.pair_results.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["KEN-ALAN", "KEN-BRIAN", "ALAN-BRIAN"]);

        let ken_alan = &result.pair_results[0];
        assert_eq!(ken_alan.len(), 4);
        assert_eq!(ken_alan.classification.categories(), &[
            MatchCategory::FullMatch, MatchCategory::HalfMatch, MatchCategory::FullMatch, MatchCategory::NoMatch
        ]);
        assert_eq!(result.pair_results[1].classification.categories(), &[
            MatchCategory::HalfMatch, MatchCategory::NoMatch, MatchCategory::HalfMatch, MatchCategory::HalfMatch
        ]);
        assert!(result.pair_results[2].classification.categories().iter().all(|&c| c == MatchCategory::HalfMatch));

        // default thresholds are far too large for four rows
        for pair_result in result.pair_results.iter() {
            assert!(pair_result.segments.segments().is_empty());
            assert!(pair_result.segments.colors().iter().all(|c| c.to_string() == "yellow"));
        }
    }

    #[test]
    fn test_solve_with_segments() {
        let store = GenotypeStore::from_sequences(vec![
            build_sequence("A", &["AA", "AA", "AA", "AG", "AA", "CC"]),
            build_sequence("B", &["GG", "GG", "GG", "AG", "AA", "CC"]),
            build_sequence("C", &["AG", "AG", "AG", "AG", "AG", "CT"])
        ]);
        let plan = ComparisonPlan::new(&names(&["A", "B"]), Some("C")).unwrap();
        let mut config = PhasingConfig::default();
        config.segments.no_match = StreakThresholds::new("no-match", 1, 3).unwrap();
        config.segments.full_match = StreakThresholds::new("full-match", 1, 2).unwrap();

        let result = solve_chromosome("1", 3, &store, &plan, &config).unwrap();
        assert_eq!(result.chrom_index, 3);
        assert_eq!(result.table.len(), 6);
        assert_eq!(result.pair_results.len(), 3);
        assert!(result.pair_results[1].pair.is_outside());

        let a_b = &result.pair_results[0];
        let raw: Vec<String> = a_b.classification.raw_colors().iter().map(|c| c.to_string()).collect();
        assert_eq!(raw, vec!["red", "red", "red", "forestgreen", "forestgreen", "forestgreen"]);
        let painted: Vec<String> = a_b.segments.colors().iter().map(|c| c.to_string()).collect();
        assert_eq!(painted, vec!["red", "red", "red", "limegreen", "limegreen", "limegreen"]);
        assert_eq!(a_b.segments.segments().len(), 2);
    }

    #[test]
    fn test_solve_errors() {
        let store = GenotypeStore::from_sequences(vec![
            build_sequence("A", &["AA", "AG"]),
            build_sequence("B", &["GG", "GG"])
        ]);
        let config = PhasingConfig::default();

        // C was never loaded
        let plan = ComparisonPlan::new(&names(&["A", "B", "C"]), None).unwrap();
        assert!(matches!(
            solve_chromosome("1", 0, &store, &plan, &config),
            Err(PhasingError::Ingest(IngestError::MissingInput { .. }))
        ));

        // nothing on chromosome 2
        let plan = ComparisonPlan::new(&names(&["A", "B"]), None).unwrap();
        assert!(matches!(
            solve_chromosome("2", 1, &store, &plan, &config),
            Err(PhasingError::Alignment(AlignmentError::MissingInput { .. }))
        ));
    }
}
