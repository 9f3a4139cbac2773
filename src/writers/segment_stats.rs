use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::data_types::color::Color;
use crate::data_types::match_category::{MatchCategory, SegmentKind};
use crate::visual_phaser::ChromosomeResult;

/// Number of match categories, used to size the count arrays
const NUM_CATEGORIES: usize = MatchCategory::HalfMatch as usize + 1;

/// A painted segment along with where it came from
#[derive(Clone, Debug)]
struct SegmentRecord {
    chrom_index: usize,
    pair_index: usize,
    row: SegmentRow
}

/// Contains all the data written to each row of our segments file
#[derive(Clone, Debug, Serialize)]
struct SegmentRow {
    /// the chromosome of the segment
    chromosome: String,
    /// the pair label, e.g. "KEN-ALAN"
    pair: String,
    /// the kind of run that was painted
    kind: SegmentKind,
    /// first dense index, inclusive
    start_index: usize,
    /// last dense index, inclusive
    end_index: usize,
    /// genomic position of the first row
    start_position: u64,
    /// genomic position of the last row
    end_position: u64,
    /// rows in the segment that had the target category
    qualifying_rows: usize,
    /// all rows painted by the segment
    painted_rows: usize,
    color: Color
}

/// Per-pair, per-chromosome tallies
#[derive(Clone, Debug, Default)]
struct PairTally {
    chrom_index: usize,
    chromosome: String,
    pair_index: usize,
    pair: String,
    num_rows: usize,
    category_counts: [usize; NUM_CATEGORIES],
    /// indexed by `SegmentKind as usize`
    segment_counts: [usize; 2],
    /// indexed by `SegmentKind as usize`
    painted_rows: [usize; 2]
}

impl PairTally {
    /// Adds another tally into this one, used for the "all" rows
    fn accumulate(&mut self, other: &PairTally) {
        self.num_rows += other.num_rows;
        for (total, count) in self.category_counts.iter_mut().zip(other.category_counts.iter()) {
            *total += count;
        }
        for i in 0..2 {
            self.segment_counts[i] += other.segment_counts[i];
            self.painted_rows[i] += other.painted_rows[i];
        }
    }
}

#[derive(Serialize)]
struct SummaryRow {
    /// the pair label
    pair: String,
    /// the chromosome or "all"
    chromosome: String,
    /// the number of aligned rows
    num_rows: usize,
    /// rows per category
    num_no_call: usize,
    num_delete: usize,
    num_insert: usize,
    num_missing: usize,
    num_full_match: usize,
    num_no_match: usize,
    num_half_match: usize,
    /// painted segments per kind
    num_no_match_segments: usize,
    num_full_match_segments: usize,
    /// painted rows per kind
    no_match_painted_rows: usize,
    full_match_painted_rows: usize
}

impl From<&PairTally> for SummaryRow {
    fn from(tally: &PairTally) -> Self {
        let count = |category: MatchCategory| tally.category_counts[category as usize];
        SummaryRow {
            pair: tally.pair.clone(),
            chromosome: tally.chromosome.clone(),
            num_rows: tally.num_rows,
            num_no_call: count(MatchCategory::NoCall),
            num_delete: count(MatchCategory::Delete),
            num_insert: count(MatchCategory::Insert),
            num_missing: count(MatchCategory::Missing),
            num_full_match: count(MatchCategory::FullMatch),
            num_no_match: count(MatchCategory::NoMatch),
            num_half_match: count(MatchCategory::HalfMatch),
            num_no_match_segments: tally.segment_counts[SegmentKind::NoMatch as usize],
            num_full_match_segments: tally.segment_counts[SegmentKind::FullMatch as usize],
            no_match_painted_rows: tally.painted_rows[SegmentKind::NoMatch as usize],
            full_match_painted_rows: tally.painted_rows[SegmentKind::FullMatch as usize]
        }
    }
}

/// This is a wrapper for collecting segment statistics and writing them to a file at the end
#[derive(Default)]
pub struct SegmentStatsCollector {
    /// Segments that will be written out eventually
    segments: Vec<SegmentRecord>,
    /// One tally per pair per chromosome
    tallies: Vec<PairTally>
}

impl SegmentStatsCollector {
    pub fn new() -> SegmentStatsCollector {
        Self::default()
    }

    /// Adds all segments and category counts from a chromosome result
    /// # Arguments
    /// * `result` - the solved chromosome, results can be added in any order
    pub fn add_result(&mut self, result: &ChromosomeResult) {
        for (pair_index, pair_result) in result.pair_results.iter().enumerate() {
            let mut tally = PairTally {
                chrom_index: result.chrom_index,
                chromosome: result.chromosome.clone(),
                pair_index,
                pair: pair_result.label.clone(),
                num_rows: pair_result.len(),
                category_counts: pair_result.classification.category_counts(),
                ..Default::default()
            };

            for segment in pair_result.segments.segments().iter() {
                let kind_index: usize = segment.kind() as usize;
                tally.segment_counts[kind_index] += 1;
                tally.painted_rows[kind_index] += segment.painted_rows();

                self.segments.push(SegmentRecord {
                    chrom_index: result.chrom_index,
                    pair_index,
                    row: SegmentRow {
                        chromosome: result.chromosome.clone(),
                        pair: pair_result.label.clone(),
                        kind: segment.kind(),
                        start_index: segment.start(),
                        end_index: segment.end(),
                        start_position: result.table.rows()[segment.start()].position(),
                        end_position: result.table.rows()[segment.end()].position(),
                        qualifying_rows: segment.count(),
                        painted_rows: segment.painted_rows(),
                        color: segment.color()
                    }
                });
            }
            self.tallies.push(tally);
        }
    }

    /// Will write all segments to a CSV filename, ordered by chromosome, pair, then start index
    /// # Arguments
    /// * `filename` - the filename for the output (tsv/csv)
    pub fn write_segments(&mut self, filename: &Path) -> csv::Result<()> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;
        self.serialize_segments(&mut csv_writer)
    }

    fn serialize_segments<W: Write>(&mut self, csv_writer: &mut csv::Writer<W>) -> csv::Result<()> {
        // make sure we go through the segments in order
        self.segments.sort_by_key(|s| (s.chrom_index, s.pair_index, s.row.start_index, s.row.kind));
        for segment in self.segments.iter() {
            csv_writer.serialize(&segment.row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Will write out a file containing chromosome level pair statistics and an "all" row per pair.
    /// # Arguments
    /// * `pair_labels` - every pair label in output order, pairs with no results still get an "all" row
    /// * `filename` - the filename for the output (tsv/csv)
    pub fn write_summary(&mut self, pair_labels: &[String], filename: &Path) -> csv::Result<()> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;
        self.serialize_summary(pair_labels, &mut csv_writer)
    }

    fn serialize_summary<W: Write>(&mut self, pair_labels: &[String], csv_writer: &mut csv::Writer<W>) -> csv::Result<()> {
        self.tallies.sort_by_key(|t| (t.pair_index, t.chrom_index));
        for (pair_index, label) in pair_labels.iter().enumerate() {
            let mut all_tally = PairTally {
                chromosome: "all".to_string(),
                pair_index,
                pair: label.clone(),
                ..Default::default()
            };
            for tally in self.tallies.iter().filter(|t| t.pair_index == pair_index) {
                csv_writer.serialize(SummaryRow::from(tally))?;
                all_tally.accumulate(tally);
            }
            csv_writer.serialize(SummaryRow::from(&all_tally))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::genotype::{Genotype, GenotypeCall, GenotypeSequence};
    use crate::data_types::match_pair::ComparisonPlan;
    use crate::phasing_config::{PhasingConfig, StreakThresholds};
    use crate::raw_parsing::GenotypeStore;
    use crate::visual_phaser::solve_chromosome;

    /// Builds calls on one chromosome at positions 10, 20, ...
    fn build_calls(chromosome: &str, genotypes: &[&str]) -> Vec<GenotypeCall> {
        genotypes.iter()
            .enumerate()
            .map(|(i, &g)| GenotypeCall::new(
                format!("rs{i}"), chromosome.to_string(), 10 * (i as u64 + 1), Genotype::from_combined(g).unwrap()
            ))
            .collect()
    }

    fn solve_pair() -> (ComparisonPlan, Vec<ChromosomeResult>) {
        let mut a_calls = build_calls("1", &["AA", "AA", "AA", "AG", "CT"]);
        a_calls.extend(build_calls("2", &["AA", "AG"]));
        let mut b_calls = build_calls("1", &["GG", "GG", "GG", "AG", "TC"]);
        b_calls.extend(build_calls("2", &["GG", "AG"]));
        let store = GenotypeStore::from_sequences(vec![
            GenotypeSequence::new("A".to_string(), a_calls),
            GenotypeSequence::new("B".to_string(), b_calls)
        ]);

        let plan = ComparisonPlan::new(&["A".to_string(), "B".to_string()], None).unwrap();
        let mut config = PhasingConfig::default();
        config.segments.no_match = StreakThresholds::new("no-match", 1, 3).unwrap();
        config.segments.full_match = StreakThresholds::new("full-match", 1, 2).unwrap();

        let results = vec![
            solve_chromosome("2", 1, &store, &plan, &config).unwrap(),
            solve_chromosome("1", 0, &store, &plan, &config).unwrap()
        ];
        (plan, results)
    }

    #[test]
    fn test_write_segments() {
        let (_plan, results) = solve_pair();
        let mut collector = SegmentStatsCollector::new();
        for result in results.iter() {
            collector.add_result(result);
        }

        let mut csv_writer = csv::WriterBuilder::new().delimiter(b',').from_writer(vec![]);
        collector.serialize_segments(&mut csv_writer).unwrap();
        let output = String::from_utf8(csv_writer.get_ref().clone()).unwrap();
        assert_eq!(output, "\
chromosome,pair,kind,start_index,end_index,start_position,end_position,qualifying_rows,painted_rows,color
1,A-B,no_match,0,2,10,30,3,3,red
1,A-B,full_match,3,4,40,50,2,2,limegreen
");
    }

    #[test]
    fn test_write_summary() {
        let (plan, results) = solve_pair();
        let mut collector = SegmentStatsCollector::new();
        for result in results.iter() {
            collector.add_result(result);
        }

        let labels: Vec<String> = plan.pairs().iter().map(|p| plan.pair_label(p)).collect();
        let mut csv_writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(vec![]);
        collector.serialize_summary(&labels, &mut csv_writer).unwrap();
        let output = String::from_utf8(csv_writer.get_ref().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("pair\tchromosome\tnum_rows\tnum_no_call"));
        assert_eq!(lines[1], "A-B\t1\t5\t0\t0\t0\t0\t2\t3\t0\t1\t1\t3\t2");
        assert_eq!(lines[2], "A-B\t2\t2\t0\t0\t0\t0\t1\t1\t0\t0\t0\t0\t0");
        assert_eq!(lines[3], "A-B\tall\t7\t0\t0\t0\t0\t3\t4\t0\t1\t1\t3\t2");
    }
}
