use crate::data_types::genotype::{Genotype, GenotypeSequence};
use crate::phasing_config::{AlignmentConfig, AlignmentPolicy};

use log::{debug, trace};
use std::cmp::Ordering;

/// One surviving position after alignment, with a genotype for every individual in roster order
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlignedRow {
    /// The genomic coordinate
    position: u64,
    /// Contiguous 0-based index after all filtering, this is the coordinate used for runs
    dense_index: usize,
    /// One genotype per individual, ordered as in `AlignedTable::individuals`
    genotypes: Vec<Genotype>
}

impl AlignedRow {
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn dense_index(&self) -> usize {
        self.dense_index
    }

    pub fn genotypes(&self) -> &[Genotype] {
        &self.genotypes
    }

    /// Returns the genotype of the individual at roster index `individual`
    pub fn genotype(&self, individual: usize) -> Genotype {
        self.genotypes[individual]
    }
}

/// The aligned positions of a single chromosome
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlignedTable {
    chromosome: String,
    individuals: Vec<String>,
    rows: Vec<AlignedRow>
}

impl AlignedTable {
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn individuals(&self) -> &[String] {
        &self.individuals
    }

    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AlignmentError {
    #[error("individual {individual:?} has no usable genotype calls on chromosome {chromosome}")]
    MissingInput { individual: String, chromosome: String },
    #[error("no rows survived {policy} alignment on chromosome {chromosome}")]
    AlignmentEmpty { chromosome: String, policy: AlignmentPolicy }
}

/// Merges per-individual genotype sequences into a dense, position-ordered table
pub struct PositionAligner {
    config: AlignmentConfig
}

impl PositionAligner {
    pub fn new(config: AlignmentConfig) -> PositionAligner {
        PositionAligner {
            config
        }
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Restricts a sequence to one chromosome, drops filtered calls, and removes duplicate positions.
    /// Returns (position, genotype) sorted by position.
    fn usable_calls(&self, chromosome: &str, sequence: &GenotypeSequence) -> Vec<(u64, Genotype)> {
        let mut calls: Vec<(u64, Genotype)> = sequence.calls().iter()
            .filter(|c| c.chromosome() == chromosome)
            .filter(|c| !c.genotype().alleles().iter().any(|&a| self.config.is_filtered(a)))
            .map(|c| (c.position(), c.genotype()))
            .collect();

        // stable, so the first reported call at a position stays first
        calls.sort_by_key(|&(position, _genotype)| position);
        let before: usize = calls.len();
        calls.dedup_by(|later, earlier| {
            let duplicate: bool = later.0 == earlier.0;
            if duplicate {
                debug!("{}: ignoring duplicate call at {}:{}", sequence.individual_id(), chromosome, later.0);
            }
            duplicate
        });
        trace!("{}: {} usable calls on {}, {} duplicates removed", sequence.individual_id(), calls.len(), chromosome, before - calls.len());
        calls
    }

    /// Merges the next individual's calls into the rows built so far.
    /// # Arguments
    /// * `merged` - sorted rows, each with one genotype per previously merged individual
    /// * `num_merged` - the number of previously merged individuals
    /// * `calls` - the next individual's sorted, de-duplicated calls
    fn merge_individual(&self, merged: Vec<(u64, Vec<Genotype>)>, num_merged: usize, calls: &[(u64, Genotype)]) -> Vec<(u64, Vec<Genotype>)> {
        let union: bool = self.config.policy == AlignmentPolicy::Union;
        let mut result: Vec<(u64, Vec<Genotype>)> = Vec::with_capacity(merged.len().max(calls.len()));
        let mut merged_iter = merged.into_iter().peekable();
        let mut call_iter = calls.iter().peekable();

        loop {
            let ordering: Ordering = match (merged_iter.peek(), call_iter.peek()) {
                (Some((merged_pos, _)), Some((call_pos, _))) => merged_pos.cmp(call_pos),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => break
            };

            match ordering {
                Ordering::Equal => {
                    // both peeks were Some
                    if let (Some((position, mut genotypes)), Some(&(_, genotype))) = (merged_iter.next(), call_iter.next()) {
                        genotypes.push(genotype);
                        result.push((position, genotypes));
                    }
                },
                Ordering::Less => {
                    if let Some((position, mut genotypes)) = merged_iter.next() {
                        if union {
                            genotypes.push(Genotype::missing());
                            result.push((position, genotypes));
                        }
                    }
                },
                Ordering::Greater => {
                    if let Some(&(position, genotype)) = call_iter.next() {
                        if union {
                            let mut genotypes: Vec<Genotype> = vec![Genotype::missing(); num_merged];
                            genotypes.push(genotype);
                            result.push((position, genotypes));
                        }
                    }
                }
            };
        }
        result
    }

    /// Returns true if every allele of every individual in the row has the same value
    fn is_uninformative(genotypes: &[Genotype]) -> bool {
        let mut seen: u8 = 0;
        for genotype in genotypes.iter() {
            for allele in genotype.alleles() {
                seen |= 1 << (allele as u8);
            }
        }
        seen.count_ones() <= 1
    }

    /// Aligns all individuals on a single chromosome.
    /// # Arguments
    /// * `chromosome` - the normalized chromosome to align
    /// * `sequences` - one sequence per individual, in roster order; calls on other chromosomes are ignored
    /// # Errors
    /// * `AlignmentError::MissingInput` if any individual has no usable calls on the chromosome
    /// * `AlignmentError::AlignmentEmpty` if no row survives merging and filtering
    pub fn align(&self, chromosome: &str, sequences: &[GenotypeSequence]) -> Result<AlignedTable, AlignmentError> {
        let mut merged: Vec<(u64, Vec<Genotype>)> = vec![];
        for (num_merged, sequence) in sequences.iter().enumerate() {
            let calls: Vec<(u64, Genotype)> = self.usable_calls(chromosome, sequence);
            if calls.is_empty() {
                return Err(AlignmentError::MissingInput {
                    individual: sequence.individual_id().to_string(),
                    chromosome: chromosome.to_string()
                });
            }

            merged = if num_merged == 0 {
                calls.into_iter()
                    .map(|(position, genotype)| (position, vec![genotype]))
                    .collect()
            } else {
                self.merge_individual(merged, num_merged, &calls)
            };
            debug!("{}: {} rows after merging {}", chromosome, merged.len(), sequence.individual_id());
        }

        if self.config.filter_uninformative_rows {
            let before: usize = merged.len();
            merged.retain(|(_position, genotypes)| !Self::is_uninformative(genotypes));
            debug!("{}: removed {} uninformative rows", chromosome, before - merged.len());
        }

        if merged.is_empty() {
            return Err(AlignmentError::AlignmentEmpty {
                chromosome: chromosome.to_string(),
                policy: self.config.policy
            });
        }

        let rows: Vec<AlignedRow> = merged.into_iter()
            .enumerate()
            .map(|(dense_index, (position, genotypes))| AlignedRow {
                position,
                dense_index,
                genotypes
            })
            .collect();

        Ok(AlignedTable {
            chromosome: chromosome.to_string(),
            individuals: sequences.iter().map(|s| s.individual_id().to_string()).collect(),
            rows
        })
    }
}
