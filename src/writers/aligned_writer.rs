use crate::position_aligner::AlignedTable;

use simple_error::bail;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes aligned tables as one row per position with two allele columns per individual
pub struct AlignedTableWriter<W: Write> {
    csv_writer: csv::Writer<W>,
    /// The roster every table must match
    individuals: Vec<String>,
    /// Printed for missing alleles
    missing_sentinel: char
}

impl AlignedTableWriter<File> {
    /// Creates a new writer and writes the header.
    /// # Arguments
    /// * `filename` - the output path, ".csv" gets a comma delimiter and anything else is tab-delimited
    /// * `individuals` - the roster, in the order of every table that will be written
    /// * `missing_sentinel` - the symbol printed for missing alleles
    pub fn new(filename: &Path, individuals: &[String], missing_sentinel: char) -> csv::Result<AlignedTableWriter<File>> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;
        AlignedTableWriter::from_csv_writer(csv_writer, individuals, missing_sentinel)
    }
}

impl<W: Write> AlignedTableWriter<W> {
    /// Same as `new(...)` but around an arbitrary writer
    pub fn from_writer(writer: W, delimiter: u8, individuals: &[String], missing_sentinel: char) -> csv::Result<AlignedTableWriter<W>> {
        let csv_writer: csv::Writer<W> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        AlignedTableWriter::from_csv_writer(csv_writer, individuals, missing_sentinel)
    }

    fn from_csv_writer(mut csv_writer: csv::Writer<W>, individuals: &[String], missing_sentinel: char) -> csv::Result<AlignedTableWriter<W>> {
        let mut header: Vec<String> = vec![
            "chromosome".to_string(),
            "position".to_string(),
            "dense_index".to_string()
        ];
        for individual in individuals.iter() {
            header.push(format!("{individual}-allele1"));
            header.push(format!("{individual}-allele2"));
        }
        csv_writer.write_record(&header)?;

        Ok(AlignedTableWriter {
            csv_writer,
            individuals: individuals.to_vec(),
            missing_sentinel
        })
    }

    /// Writes every row of a table.
    /// # Errors
    /// * if the table roster does not match the header
    /// * if there are any errors while writing
    pub fn write_table(&mut self, table: &AlignedTable) -> Result<(), Box<dyn std::error::Error>> {
        if table.individuals() != self.individuals.as_slice() {
            bail!("Aligned table for {} has individuals {:?}, expected {:?}", table.chromosome(), table.individuals(), self.individuals);
        }

        let mut record: Vec<String> = Vec::with_capacity(3 + 2 * self.individuals.len());
        for row in table.rows().iter() {
            record.clear();
            record.push(table.chromosome().to_string());
            record.push(row.position().to_string());
            record.push(row.dense_index().to_string());
            for genotype in row.genotypes().iter() {
                for allele in genotype.alleles() {
                    record.push(allele.symbol(self.missing_sentinel).to_string());
                }
            }
            self.csv_writer.write_record(&record)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.csv_writer.flush()
    }
}
