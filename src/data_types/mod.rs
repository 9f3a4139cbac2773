
/// Contains named colors and the category-to-color palette
pub mod color;
/// Contains the allele alphabet, genotypes, and genotype calls
pub mod genotype;
/// Contains the match categories and segment kinds
pub mod match_category;
/// Contains match pairs and the comparison plan for a run
pub mod match_pair;
