use clap::Parser;
use chrono::Datelike;
use log::{error, info, warn};
use std::path::{Path, PathBuf};

use crate::phasing_config::{AlignmentConfig, ConfigError, PhasingConfig, SegmentConfig, StreakThresholds, apply_raw_color, apply_segment_color, parse_policy};
use crate::raw_parsing::normalize_chromosome;

#[derive(Clone, Parser)]
#[clap(author,
    version,
    about,
    after_help = format!("Copyright (C) 2024-{}     The pixelphase developers
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year()))]
pub struct Settings {
    /// Directory containing the raw genotype files (e.g. AncestryDNA_KEN_raw_dna.txt)
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "data-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub data_dir: PathBuf,

    /// Sibling identifier, must be part of the raw file name
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "individual")]
    #[clap(value_name = "NAME")]
    #[clap(help_heading = Some("Input/Output"))]
    pub individuals: Vec<String>,

    /// Optional outside relative, compared against each sibling only
    #[clap(short = 'e')]
    #[clap(long = "extra-match")]
    #[clap(value_name = "NAME")]
    #[clap(help_heading = Some("Input/Output"))]
    pub extra_match: Option<String>,

    /// Chromosome to process (default: 1-22 and X)
    #[clap(short = 'c')]
    #[clap(long = "chromosome")]
    #[clap(value_name = "CHROM")]
    #[clap(help_heading = Some("Input/Output"))]
    pub chromosomes: Vec<String>,

    /// Output pixel track file (csv/tsv)
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-pixels")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_pixels_filename: PathBuf,

    /// Output painted segments file (optional, csv/tsv)
    #[clap(long = "segments-file")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub segments_filename: Option<PathBuf>,

    /// Output summary pair statistics file (optional, csv/tsv)
    #[clap(long = "summary-file")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub summary_filename: Option<PathBuf>,

    /// Output aligned genotype table file (optional, csv/tsv)
    #[clap(long = "aligned-file")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub aligned_filename: Option<PathBuf>,

    /// Number of threads to use, one chromosome per thread
    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    pub threads: usize,

    /// Enable verbose output
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Position merge policy: "intersection" keeps positions reported by everyone, "union" keeps all of them
    #[clap(long = "alignment-policy")]
    #[clap(value_name = "POLICY")]
    #[clap(default_value = "intersection")]
    #[clap(help_heading = Some("Alignment"))]
    pub alignment_policy: String,

    /// Keep calls containing an insertion allele
    #[clap(long = "keep-inserts")]
    #[clap(help_heading = Some("Alignment"))]
    pub keep_inserts: bool,

    /// Keep calls containing a deletion allele
    #[clap(long = "keep-deletes")]
    #[clap(help_heading = Some("Alignment"))]
    pub keep_deletes: bool,

    /// Keep calls containing a no-call allele
    #[clap(long = "keep-no-calls")]
    #[clap(help_heading = Some("Alignment"))]
    pub keep_no_calls: bool,

    /// Keep rows where every allele of every individual is identical
    #[clap(long = "keep-uninformative")]
    #[clap(help_heading = Some("Alignment"))]
    pub keep_uninformative: bool,

    /// Symbol printed for alleles that are missing after union alignment
    #[clap(long = "missing-sentinel")]
    #[clap(value_name = "CHAR")]
    #[clap(default_value = "Z")]
    #[clap(help_heading = Some("Alignment"))]
    pub missing_sentinel: String,

    /// Largest dense-index gap between no-match rows within one segment
    #[clap(long = "no-match-gap")]
    #[clap(value_name = "ROWS")]
    #[clap(default_value = "600")]
    #[clap(allow_negative_numbers = true)]
    #[clap(help_heading = Some("Segmentation"))]
    pub no_match_gap: i64,

    /// Minimum number of no-match rows to paint a segment
    #[clap(long = "min-no-match-run")]
    #[clap(value_name = "ROWS")]
    #[clap(default_value = "5")]
    #[clap(allow_negative_numbers = true)]
    #[clap(help_heading = Some("Segmentation"))]
    pub min_no_match_run: i64,

    /// Largest dense-index gap between full-match rows within one segment
    #[clap(long = "full-match-gap")]
    #[clap(value_name = "ROWS")]
    #[clap(default_value = "1")]
    #[clap(allow_negative_numbers = true)]
    #[clap(help_heading = Some("Segmentation"))]
    pub full_match_gap: i64,

    /// Minimum number of full-match rows to paint a segment
    #[clap(long = "min-full-match-run")]
    #[clap(value_name = "ROWS")]
    #[clap(default_value = "100")]
    #[clap(allow_negative_numbers = true)]
    #[clap(help_heading = Some("Segmentation"))]
    pub min_full_match_run: i64,

    /// Overrides a category color, e.g. "missing=purple" or "no_match=#ff0000"
    #[clap(long = "raw-color")]
    #[clap(value_name = "CATEGORY=COLOR")]
    #[clap(help_heading = Some("Colors"))]
    pub raw_colors: Vec<String>,

    /// Overrides a segment color for no_match, full_match, or half_match (the default)
    #[clap(long = "segment-color")]
    #[clap(value_name = "KIND=COLOR")]
    #[clap(help_heading = Some("Colors"))]
    pub segment_colors: Vec<String>,
}

/// Checks if a file exists and will otherwise exit
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
fn check_required_directory(filename: &Path, label: &str) {
    if !filename.is_dir() {
        error!("{} does not exist or is not a directory: \"{}\"", label, filename.display());
        std::process::exit(exitcode::NOINPUT);
    } else {
        info!("{}: \"{}\"", label, filename.display());
    }
}

/// Checks that the parent folder of an output exists, otherwise exit
/// # Arguments
/// * `filename` - the output file path
/// * `label` - the label to use for error messages
fn check_output_filename(filename: &Path, label: &str) {
    let parent_exists: bool = match filename.parent() {
        Some(parent) => parent.as_os_str().is_empty() || parent.is_dir(),
        None => true
    };
    if !parent_exists {
        error!("{} folder does not exist: \"{}\"", label, filename.display());
        std::process::exit(exitcode::CANTCREAT);
    } else {
        info!("{}: \"{}\"", label, filename.display());
    }
}

/// The chromosomes processed when none are given: 1-22 and X
pub fn default_chromosomes() -> Vec<String> {
    (1..=22).map(|c: u32| c.to_string())
        .chain(std::iter::once("X".to_string()))
        .collect()
}

/// Parses a single-character sentinel from the command line
fn parse_sentinel(value: &str) -> Result<char, ConfigError> {
    let mut symbols = value.chars();
    match (symbols.next(), symbols.next()) {
        (Some(symbol), None) => Ok(symbol),
        _ => Err(ConfigError::InvalidSentinel(value.to_string()))
    }
}

impl Settings {
    /// Builds the validated configuration that is handed to each component
    /// # Errors
    /// * if any threshold, policy, sentinel, or color is invalid
    pub fn phasing_config(&self) -> Result<PhasingConfig, ConfigError> {
        let mut alignment = AlignmentConfig::default();
        alignment.policy = parse_policy(&self.alignment_policy)?;
        alignment.filter_insert = !self.keep_inserts;
        alignment.filter_delete = !self.keep_deletes;
        alignment.filter_no_call = !self.keep_no_calls;
        alignment.filter_uninformative_rows = !self.keep_uninformative;
        alignment.set_missing_value_sentinel(parse_sentinel(&self.missing_sentinel)?)?;

        let segments = SegmentConfig {
            no_match: StreakThresholds::new("no-match", self.no_match_gap, self.min_no_match_run)?,
            full_match: StreakThresholds::new("full-match", self.full_match_gap, self.min_full_match_run)?
        };

        let mut config = PhasingConfig {
            alignment,
            segments,
            ..Default::default()
        };
        for assignment in self.raw_colors.iter() {
            apply_raw_color(&mut config.palette, assignment)?;
        }
        for assignment in self.segment_colors.iter() {
            apply_segment_color(&mut config.palette, assignment)?;
        }
        Ok(config)
    }
}

pub fn get_raw_settings() -> Settings {
    Settings::parse()
}

/// Do some additional checks here, we may increase these as we go.
/// Also can modify settings if needed since we're passing it around.
/// # Arguments
/// * `settings` - the raw settings, nothing has been checked other than what clap does for us.
pub fn check_settings(mut settings: Settings) -> Settings {
    // check for any of our required inputs
    check_required_directory(&settings.data_dir, "Raw data directory");

    // check the outputs can be created
    check_output_filename(&settings.output_pixels_filename, "Pixel track file");
    if let Some(ref filename) = settings.segments_filename {
        check_output_filename(filename, "Segments file");
    }
    if let Some(ref filename) = settings.summary_filename {
        check_output_filename(filename, "Summary file");
    }
    if let Some(ref filename) = settings.aligned_filename {
        check_output_filename(filename, "Aligned table file");
    }

    // normalize the chromosome names so they match what the parser produces
    if settings.chromosomes.is_empty() {
        settings.chromosomes = default_chromosomes();
    }
    let mut chromosomes: Vec<String> = vec![];
    for chromosome in settings.chromosomes.iter().map(|c| normalize_chromosome(c)) {
        if chromosomes.contains(&chromosome) {
            warn!("Chromosome {:?} was provided more than once, ignoring duplicate.", chromosome);
        } else {
            chromosomes.push(chromosome);
        }
    }
    settings.chromosomes = chromosomes;

    // 0 doesn't make sense, so lets just error proof it up to 1
    if settings.threads == 0 {
        settings.threads = 1;
    }

    // dump stuff to the logger
    info!("Individuals: {:?}", settings.individuals);
    if let Some(ref extra_match) = settings.extra_match {
        info!("Extra match: {:?}", extra_match);
    }
    info!("Chromosomes: {:?}", settings.chromosomes);
    info!("Processing threads: {}", settings.threads);
    if settings.threads > settings.chromosomes.len() {
        warn!("More threads ({}) than chromosomes ({}), some threads will be idle.", settings.threads, settings.chromosomes.len());
    }

    //send the settings back
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::match_category::{MatchCategory, SegmentKind};
    use crate::phasing_config::AlignmentPolicy;

    fn parse(args: &[&str]) -> Settings {
        let mut full_args: Vec<&str> = vec!["pixelphase", "-d", "./test_data", "-i", "KEN", "-i", "ALAN", "-o", "pixels.tsv"];
        full_args.extend_from_slice(args);
        Settings::try_parse_from(full_args).unwrap()
    }

    #[test]
    fn test_default_config() {
        let settings = parse(&[]);
        assert_eq!(settings.phasing_config().unwrap(), PhasingConfig::default());
        assert_eq!(default_chromosomes().len(), 23);
        assert_eq!(default_chromosomes()[22], "X");
    }

    #[test]
    fn test_custom_config() {
        let settings = parse(&[
            "--alignment-policy", "union",
            "--keep-no-calls", "--keep-uninformative",
            "--missing-sentinel", "?",
            "--no-match-gap", "0", "--min-no-match-run", "3",
            "--raw-color", "missing=purple",
            "--segment-color", "half_match=white"
        ]);
        let config = settings.phasing_config().unwrap();
        assert_eq!(config.alignment.policy, AlignmentPolicy::Union);
        assert!(!config.alignment.filter_no_call);
        assert!(config.alignment.filter_insert);
        assert!(!config.alignment.filter_uninformative_rows);
        assert_eq!(config.alignment.missing_value_sentinel(), '?');
        assert_eq!(config.segments.thresholds(SegmentKind::NoMatch), StreakThresholds::new("", 0, 3).unwrap());
        assert_eq!(config.palette.raw_color(MatchCategory::Missing).to_string(), "purple");
        assert_eq!(config.palette.default_segment_color().to_string(), "white");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            parse(&["--no-match-gap", "-1"]).phasing_config(),
            Err(ConfigError::NegativeGap { .. })
        ));
        assert!(matches!(
            parse(&["--min-full-match-run", "0"]).phasing_config(),
            Err(ConfigError::MinimumRun { .. })
        ));
        assert_eq!(
            parse(&["--alignment-policy", "outer"]).phasing_config(),
            Err(ConfigError::UnknownPolicy("outer".to_string()))
        );
        assert_eq!(
            parse(&["--missing-sentinel", "0"]).phasing_config(),
            Err(ConfigError::ReservedSentinel('0'))
        );
        assert_eq!(
            parse(&["--missing-sentinel", "ZZ"]).phasing_config(),
            Err(ConfigError::InvalidSentinel("ZZ".to_string()))
        );
        assert!(parse(&["--raw-color", "no_match=reddish"]).phasing_config().is_err());
    }

    #[test]
    fn test_help_footer() {
        use clap::CommandFactory;
        let help: String = Settings::command().render_long_help().to_string();
        assert!(help.contains("The pixelphase developers"));
        assert!(help.contains("ABSOLUTELY NO WARRANTY"));
    }
}
