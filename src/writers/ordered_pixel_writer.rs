use crate::data_types::color::Color;
use crate::data_types::match_category::MatchCategory;
use crate::visual_phaser::ChromosomeResult;
use crate::writers::aligned_writer::AlignedTableWriter;

use log::{debug, trace};
use rustc_hash::FxHashMap as HashMap;
use serde::Serialize;
use simple_error::bail;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One pixel column of one pair track
#[derive(Serialize)]
struct PixelRow<'a> {
    /// the chromosome of the row
    chromosome: &'a str,
    /// the pair label, e.g. "KEN-ALAN"
    pair: &'a str,
    /// the 0-based index after filtering
    dense_index: usize,
    /// the genomic coordinate
    position: u64,
    /// the classification for this pair
    category: MatchCategory,
    /// the color of the category
    raw_color: Color,
    /// the color after segment smoothing
    segment_color: Color
}

/// Structure that maintains chromosome order while writing pixel tracks.
/// Results from worker threads may arrive in any order, they are buffered until every earlier chromosome is written.
pub struct OrderedPixelWriter<W: Write> {
    /// the pixel track file
    csv_writer: csv::Writer<W>,
    /// optional writer for the aligned tables, fed in the same order
    aligned_writer: Option<AlignedTableWriter<W>>,
    /// the data that may be cached because we are waiting on earlier results; None marks a skipped chromosome
    map_store: HashMap<usize, Option<ChromosomeResult>>,
    /// the index of data we are waiting for
    current_index: usize,
    /// total pixel rows written so far
    rows_written: u64
}

impl OrderedPixelWriter<File> {
    /// Creates a new `OrderedPixelWriter` for a file.
    /// # Arguments
    /// * `filename` - the output path, ".csv" gets a comma delimiter and anything else is tab-delimited
    pub fn new(filename: &Path) -> csv::Result<OrderedPixelWriter<File>> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;
        Ok(OrderedPixelWriter::from_csv_writer(csv_writer))
    }
}

impl<W: Write> OrderedPixelWriter<W> {
    /// Same as `new(...)` but around an arbitrary writer
    pub fn from_writer(writer: W, delimiter: u8) -> OrderedPixelWriter<W> {
        let csv_writer: csv::Writer<W> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        OrderedPixelWriter::from_csv_writer(csv_writer)
    }

    fn from_csv_writer(csv_writer: csv::Writer<W>) -> OrderedPixelWriter<W> {
        OrderedPixelWriter {
            csv_writer,
            aligned_writer: None,
            map_store: Default::default(),
            current_index: 0,
            rows_written: 0
        }
    }

    /// Attaches a writer that receives each aligned table in chromosome order
    pub fn set_aligned_writer(&mut self, aligned_writer: AlignedTableWriter<W>) {
        self.aligned_writer = Some(aligned_writer);
    }

    /// Returns the chromosome index that the writer is currently waiting to receive.
    pub fn get_wait_index(&self) -> usize {
        self.current_index
    }

    /// Returns the number of pixel rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Adds a chromosome result to our queue for writing.
    /// # Arguments
    /// * `result` - a solved chromosome that will be written in the correct order with other chromosomes
    pub fn write_chromosome(&mut self, result: ChromosomeResult) -> Result<(), Box<dyn std::error::Error>> {
        let chrom_index: usize = result.chrom_index;
        self.insert(chrom_index, Some(result))
    }

    /// Marks a chromosome as skipped so later chromosomes are not blocked waiting on it.
    /// # Arguments
    /// * `chrom_index` - the index of the chromosome that failed
    pub fn write_dummy_chromosome(&mut self, chrom_index: usize) -> Result<(), Box<dyn std::error::Error>> {
        self.insert(chrom_index, None)
    }

    fn insert(&mut self, chrom_index: usize, entry: Option<ChromosomeResult>) -> Result<(), Box<dyn std::error::Error>> {
        if chrom_index < self.current_index {
            bail!("Chromosome index {} is smaller than next expected index {}", chrom_index, self.current_index);
        }
        if self.map_store.insert(chrom_index, entry).is_some() {
            bail!("Chromosome index {} was already present in the map_store", chrom_index);
        }
        self.drain_map_store()
    }

    /// This will drain chromosome results in the correct order if they have been received.
    /// It drains as far as it can given the current results and then stops to wait for more data.
    fn drain_map_store(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        while let Some(entry) = self.map_store.remove(&self.current_index) {
            match entry {
                Some(result) => {
                    trace!("Draining {} ({})", self.current_index, result.chromosome);
                    self.write_result(&result)?;
                    if let Some(aligned_writer) = self.aligned_writer.as_mut() {
                        aligned_writer.write_table(&result.table)?;
                    }
                },
                None => {
                    debug!("Skipping chromosome index {}", self.current_index);
                }
            };
            self.current_index += 1;
        }
        Ok(())
    }

    /// Writes every pair track of a single chromosome
    fn write_result(&mut self, result: &ChromosomeResult) -> csv::Result<()> {
        for pair_result in result.pair_results.iter() {
            let categories = pair_result.classification.categories();
            let raw_colors = pair_result.classification.raw_colors();
            let segment_colors = pair_result.segments.colors();
            for (i, row) in result.table.rows().iter().enumerate() {
                let pixel_row = PixelRow {
                    chromosome: &result.chromosome,
                    pair: &pair_result.label,
                    dense_index: row.dense_index(),
                    position: row.position(),
                    category: categories[i],
                    raw_color: raw_colors[i],
                    segment_color: segment_colors[i]
                };
                self.csv_writer.serialize(&pixel_row)?;
                self.rows_written += 1;
            }
        }
        Ok(())
    }

    /// Flushes all outputs once every chromosome has been received.
    /// # Errors
    /// * if any results are still waiting on an earlier chromosome
    /// * if we have any issues flushing the files
    pub fn finalize(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.map_store.is_empty() {
            let mut waiting: Vec<usize> = self.map_store.keys().cloned().collect();
            waiting.sort();
            bail!("Writer finalized while waiting on chromosome index {}, buffered: {:?}", self.current_index, waiting);
        }
        self.csv_writer.flush()?;
        if let Some(aligned_writer) = self.aligned_writer.as_mut() {
            aligned_writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::genotype::{Genotype, GenotypeCall, GenotypeSequence};
    use crate::data_types::match_pair::ComparisonPlan;
    use crate::phasing_config::PhasingConfig;
    use crate::raw_parsing::GenotypeStore;
    use crate::visual_phaser::solve_chromosome;

    fn build_calls(chromosome: &str, genotypes: &[&str]) -> Vec<GenotypeCall> {
        genotypes.iter()
            .enumerate()
            .map(|(i, &g)| GenotypeCall::new(
                format!("rs{i}"), chromosome.to_string(), 10 * (i as u64 + 1), Genotype::from_combined(g).unwrap()
            ))
            .collect()
    }

    /// Solves chromosomes "1", "2", "3" for a single pair, with two rows each
    fn solve_all() -> (ComparisonPlan, Vec<ChromosomeResult>) {
        let mut a_calls: Vec<GenotypeCall> = vec![];
        let mut b_calls: Vec<GenotypeCall> = vec![];
        for chromosome in ["1", "2", "3"] {
            a_calls.extend(build_calls(chromosome, &["AG", "AA"]));
            b_calls.extend(build_calls(chromosome, &["AG", "GG"]));
        }
        let store = GenotypeStore::from_sequences(vec![
            GenotypeSequence::new("A".to_string(), a_calls),
            GenotypeSequence::new("B".to_string(), b_calls)
        ]);
        let plan = ComparisonPlan::new(&["A".to_string(), "B".to_string()], None).unwrap();
        let config = PhasingConfig::default();
        let results: Vec<ChromosomeResult> = ["1", "2", "3"].iter()
            .enumerate()
            .map(|(i, chromosome)| solve_chromosome(chromosome, i, &store, &plan, &config).unwrap())
            .collect();
        (plan, results)
    }

    fn output_chromosomes(writer: &OrderedPixelWriter<Vec<u8>>) -> Vec<String> {
        let output = String::from_utf8(writer.csv_writer.get_ref().clone()).unwrap();
        output.lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_pixel_rows() {
        let (_plan, mut results) = solve_all();
        let mut writer = OrderedPixelWriter::from_writer(vec![], b',');
        writer.write_chromosome(results.remove(0)).unwrap();
        writer.finalize().unwrap();

        let output = String::from_utf8(writer.csv_writer.get_ref().clone()).unwrap();
        assert_eq!(output, "\
chromosome,pair,dense_index,position,category,raw_color,segment_color
1,A-B,0,10,full_match,forestgreen,yellow
1,A-B,1,20,no_match,red,yellow
");
        assert_eq!(writer.rows_written(), 2);
    }

    #[test]
    fn test_out_of_order() {
        let (_plan, results) = solve_all();
        let mut results: Vec<Option<ChromosomeResult>> = results.into_iter().map(Some).collect();
        let mut writer = OrderedPixelWriter::from_writer(vec![], b',');

        writer.write_chromosome(results[2].take().unwrap()).unwrap();
        writer.write_chromosome(results[1].take().unwrap()).unwrap();
        assert_eq!(writer.get_wait_index(), 0);
        assert!(output_chromosomes(&writer).is_empty());
        assert!(writer.finalize().is_err());

        writer.write_chromosome(results[0].take().unwrap()).unwrap();
        assert_eq!(writer.get_wait_index(), 3);
        writer.finalize().unwrap();
        assert_eq!(output_chromosomes(&writer), vec!["1", "1", "2", "2", "3", "3"]);
    }

    #[test]
    fn test_skipped_chromosome() {
        let (plan, mut results) = solve_all();
        let mut writer = OrderedPixelWriter::from_writer(vec![], b',');
        let aligned_writer = AlignedTableWriter::from_writer(vec![], b',', plan.individuals(), 'Z').unwrap();
        writer.set_aligned_writer(aligned_writer);

        let third = results.remove(2);
        let first = results.remove(0);
        writer.write_chromosome(third).unwrap();
        writer.write_dummy_chromosome(1).unwrap();
        writer.write_chromosome(first).unwrap();
        writer.finalize().unwrap();
        assert_eq!(output_chromosomes(&writer), vec!["1", "1", "3", "3"]);

        // duplicates and stale indices are errors
        assert!(writer.write_dummy_chromosome(1).is_err());
        assert!(writer.write_dummy_chromosome(10).is_ok());
        assert!(writer.write_dummy_chromosome(10).is_err());
    }
}
