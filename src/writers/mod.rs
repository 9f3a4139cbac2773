/// Contains the writer for aligned genotype tables
pub mod aligned_writer;
/// Contains the in-order writer for pixel tracks
pub mod ordered_pixel_writer;
/// Contains the collector for segment statistics, both the segments themselves and the summary
pub mod segment_stats;
