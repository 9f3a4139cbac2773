use crate::data_types::genotype::{Allele, Genotype, GenotypeCall, GenotypeError, GenotypeSequence};

use flate2::bufread::MultiGzDecoder;
use log::{debug, info, trace, warn};
use rustc_hash::FxHashMap as HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("no raw data source found for individual {individual:?}")]
    MissingInput { individual: String },
    #[error("{path:?}, line {line}: {message}")]
    Parse { path: PathBuf, line: usize, message: String },
    #[error("error while reading {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error }
}

/// The boundary between raw data and the alignment engine.
/// Implementations must be shareable across chromosome worker threads.
pub trait GenotypeProvider: Send + Sync {
    /// Returns the calls of one individual on one chromosome, sorted by ascending position.
    /// An individual with a source but no calls on the chromosome returns an empty sequence.
    /// # Errors
    /// * `IngestError::MissingInput` if there is no source for `individual`
    fn load_chromosome(&self, individual: &str, chromosome: &str) -> Result<GenotypeSequence, IngestError>;
}

/// Normalizes chromosome labels across vendors.
/// Removes any "chr" prefix and converts the AncestryDNA numeric codes for sex and mitochondrial chromosomes.
/// # Examples
/// * `chr7` -> `7`
/// * `23` -> `X`, `24` -> `Y`, `25` -> `XY`, `26` -> `MT`
pub fn normalize_chromosome(chromosome: &str) -> String {
    let trimmed = chromosome.trim();
    let stripped = match trimmed.get(..3) {
        Some(prefix) if trimmed.len() > 3 && prefix.eq_ignore_ascii_case("chr") => &trimmed[3..],
        _ => trimmed
    };
    match stripped.to_ascii_uppercase().as_str() {
        "23" => "X".to_string(),
        "24" => "Y".to_string(),
        "25" => "XY".to_string(),
        "26" | "M" => "MT".to_string(),
        other => other.to_string()
    }
}

/// Looks for the raw data file of an individual in a directory.
/// A candidate file name must contain the individual identifier and the word "raw", and end in ".txt" or ".txt.gz".
/// Files where the identifier is a whole `_`, `-`, or `.` delimited token are preferred over plain substring hits,
/// so "KEN" never resolves to a "KENNETH" file while a "KEN" file is present.
/// # Arguments
/// * `directory` - the directory holding all raw files
/// * `individual` - the identifier, matched case-sensitively against the file name
/// # Errors
/// * if the directory cannot be read
/// * if no file matches, as `IngestError::MissingInput`
pub fn discover_raw_file(directory: &Path, individual: &str) -> Result<PathBuf, IngestError> {
    let io_error = |source: std::io::Error| IngestError::Io { path: directory.to_path_buf(), source };
    let mut exact_candidates: Vec<PathBuf> = vec![];
    let mut partial_candidates: Vec<PathBuf> = vec![];
    for entry in std::fs::read_dir(directory).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let file_name: String = entry.file_name().to_string_lossy().to_string();
        let is_text: bool = file_name.ends_with(".txt") || file_name.ends_with(".txt.gz");
        if is_text && file_name.contains("raw") && file_name.contains(individual) && entry.path().is_file() {
            if file_name.split(['_', '-', '.']).any(|token| token == individual) {
                exact_candidates.push(entry.path());
            } else {
                partial_candidates.push(entry.path());
            }
        }
    }

    let mut candidates: Vec<PathBuf> = if exact_candidates.is_empty() {
        if !partial_candidates.is_empty() {
            debug!("No exact file name match for {:?}, falling back to substring matches", individual);
        }
        partial_candidates
    } else {
        exact_candidates
    };
    candidates.sort();

    match candidates.len() {
        0 => Err(IngestError::MissingInput { individual: individual.to_string() }),
        1 => Ok(candidates.remove(0)),
        n => {
            warn!("Found {} raw files for {:?}, using {:?}", n, individual, candidates[0]);
            Ok(candidates.remove(0))
        }
    }
}

/// Parses one non-comment line of a raw file.
/// Returns `Ok(None)` for the column header line.
/// # Errors
/// * if the field count matches neither vendor layout
/// * if the position is not an unsigned integer
/// * if any allele symbol is outside the accepted alphabet
fn parse_raw_line(line: &str) -> Result<Option<GenotypeCall>, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.first().map(|f| f.eq_ignore_ascii_case("rsid")).unwrap_or(false) {
        return Ok(None);
    }

    let genotype: Genotype = match fields.len() {
        // AncestryDNA: rsid, chromosome, position, allele1, allele2
        5 => {
            let mut alleles: [Allele; 2] = [Allele::NoCall; 2];
            for (slot, field) in alleles.iter_mut().zip(fields[3..5].iter()) {
                let mut symbols = field.chars();
                *slot = match (symbols.next(), symbols.next()) {
                    (Some(symbol), None) => Allele::from_symbol(symbol).map_err(|e| e.to_string())?,
                    _ => return Err(format!("allele {field:?} must be a single symbol"))
                };
            }
            Genotype::new(alleles[0], alleles[1])
        },
        // 23andMe: rsid, chromosome, position, genotype
        4 => Genotype::from_combined(fields[3]).map_err(|e: GenotypeError| e.to_string())?,
        n => return Err(format!("expected 4 or 5 fields, found {n}"))
    };

    let position: u64 = fields[2].parse()
        .map_err(|e| format!("invalid position {:?}: {}", fields[2], e))?;
    Ok(Some(GenotypeCall::new(
        fields[0].to_string(),
        normalize_chromosome(fields[1]),
        position,
        genotype
    )))
}

/// Loads every genotype call from a raw data file, gzip is allowed.
/// Calls are returned in file order.
/// # Arguments
/// * `path` - the raw file, decompressed if the extension is ".gz"
/// # Errors
/// * if the file cannot be opened or read
/// * if any line fails to parse
pub fn parse_raw_file(path: &Path) -> Result<Vec<GenotypeCall>, IngestError> {
    info!("Loading {:?}...", path);
    let io_error = |source: std::io::Error| IngestError::Io { path: path.to_path_buf(), source };
    let raw_file: File = File::open(path).map_err(io_error)?;
    let file_reader = BufReader::new(raw_file);
    let reader: Box<dyn BufRead> = if path.extension().unwrap_or_default() == "gz" {
        debug!("Detected gzip extension, loading raw file with MultiGzDecoder...");
        Box::new(BufReader::new(MultiGzDecoder::new(file_reader)))
    } else {
        Box::new(file_reader)
    };

    let mut calls: Vec<GenotypeCall> = vec![];
    for (line_index, line_result) in reader.lines().enumerate() {
        let line: String = line_result.map_err(io_error)?;
        let trimmed: &str = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match parse_raw_line(trimmed) {
            Ok(Some(call)) => calls.push(call),
            Ok(None) => trace!("Skipping header line {}", line_index + 1),
            Err(message) => {
                return Err(IngestError::Parse {
                    path: path.to_path_buf(),
                    line: line_index + 1,
                    message
                });
            }
        }
    }
    info!("Finished loading {} genotype calls.", calls.len());
    Ok(calls)
}

/// In-memory store of every loaded individual's calls, indexed by chromosome
#[derive(Default)]
pub struct GenotypeStore {
    /// Key is individual, then chromosome; calls are sorted by position
    calls: HashMap<String, HashMap<String, Vec<GenotypeCall>>>,
    /// The file each individual was loaded from, if any
    sources: HashMap<String, PathBuf>
}

impl GenotypeStore {
    /// Discovers and loads the raw file for each individual in a directory.
    /// # Arguments
    /// * `directory` - the directory containing raw files
    /// * `individuals` - the individuals to load, all are required
    /// # Errors
    /// * `IngestError::MissingInput` if any individual has no raw file
    /// * if any file fails to read or parse
    pub fn from_directory(directory: &Path, individuals: &[String]) -> Result<GenotypeStore, IngestError> {
        let mut store = GenotypeStore::default();
        for individual in individuals.iter() {
            let filename: PathBuf = discover_raw_file(directory, individual)?;
            info!("Raw file for {}: {:?}", individual, filename);
            let calls: Vec<GenotypeCall> = parse_raw_file(&filename)?;
            store.add_sequence(GenotypeSequence::new(individual.clone(), calls));
            store.sources.insert(individual.clone(), filename);
        }
        Ok(store)
    }

    /// Builds a store directly from pre-loaded sequences, each may span multiple chromosomes.
    pub fn from_sequences(sequences: Vec<GenotypeSequence>) -> GenotypeStore {
        let mut store = GenotypeStore::default();
        for sequence in sequences.into_iter() {
            store.add_sequence(sequence);
        }
        store
    }

    /// Splits a sequence by chromosome and adds it to the store, sorting each chromosome by position
    fn add_sequence(&mut self, sequence: GenotypeSequence) {
        let individual_calls = self.calls.entry(sequence.individual_id().to_string()).or_default();
        for call in sequence.calls().iter() {
            individual_calls.entry(call.chromosome().to_string()).or_default().push(call.clone());
        }
        for chrom_calls in individual_calls.values_mut() {
            // stable, so duplicated positions keep file order
            chrom_calls.sort_by_key(|c| c.position());
        }
    }

    /// Returns the source file for an individual, if it was loaded from disk
    pub fn source_file(&self, individual: &str) -> Option<&Path> {
        self.sources.get(individual).map(|p| p.as_path())
    }

    /// Returns the number of calls for an individual on a chromosome
    pub fn num_calls(&self, individual: &str, chromosome: &str) -> usize {
        self.calls.get(individual)
            .and_then(|chroms| chroms.get(chromosome))
            .map(|calls| calls.len())
            .unwrap_or(0)
    }
}

impl GenotypeProvider for GenotypeStore {
    fn load_chromosome(&self, individual: &str, chromosome: &str) -> Result<GenotypeSequence, IngestError> {
        let individual_calls = self.calls.get(individual)
            .ok_or_else(|| IngestError::MissingInput { individual: individual.to_string() })?;
        let calls: Vec<GenotypeCall> = individual_calls.get(chromosome).cloned().unwrap_or_default();
        Ok(GenotypeSequence::new(individual.to_string(), calls))
    }
}
