/// CLI functionality and checks
pub mod cli;
/// Contains multiple wrappers for useful data types in pixelphase
pub mod data_types;
/// Classifies aligned rows for each pair into match categories and raw colors
pub mod pair_classifier;
/// Validated configuration shared by every component
pub mod phasing_config;
/// Merges per-individual genotype calls into a dense, position-ordered table
pub mod position_aligner;
/// Discovery and parsing of raw consumer genotype files, plus the provider boundary
pub mod raw_parsing;
/// Gap-tolerant no-match and full-match run detection
pub mod segment_detector;
/// Organizes the primary workflow for a chromosome: loading, aligning, classifying, and segmenting every pair
pub mod visual_phaser;
/// Contains all the various output writer functionality
pub mod writers;
