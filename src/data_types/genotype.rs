/// The finite allele alphabet we accept from raw genotype files
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Allele {
    A=0,
    C,
    G,
    T,
    /// Insertion marker, "I" in raw files
    Insertion,
    /// Deletion marker, "D" in raw files
    Deletion,
    /// No-call marker, "0" (AncestryDNA) or "-" (23andMe) in raw files
    NoCall,
    /// Sentinel for a slot that had no call at all, only created by union alignment
    Missing // make sure Missing is always the last one in the list
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GenotypeError {
    #[error("unrecognized allele symbol {symbol:?}")]
    UnknownSymbol { symbol: char },
    #[error("genotype {genotype:?} must contain one or two allele symbols")]
    GenotypeLength { genotype: String }
}

impl Allele {
    /// Parses a single allele symbol from a raw file.
    /// The missing sentinel is never accepted here, it only comes from alignment.
    /// # Arguments
    /// * `symbol` - the symbol to parse, nucleotides are case-insensitive
    /// # Errors
    /// * if the symbol is not part of the raw file alphabet
    pub fn from_symbol(symbol: char) -> Result<Allele, GenotypeError> {
        match symbol.to_ascii_uppercase() {
            'A' => Ok(Allele::A),
            'C' => Ok(Allele::C),
            'G' => Ok(Allele::G),
            'T' => Ok(Allele::T),
            'I' => Ok(Allele::Insertion),
            'D' => Ok(Allele::Deletion),
            '0' | '-' => Ok(Allele::NoCall),
            _ => Err(GenotypeError::UnknownSymbol { symbol })
        }
    }

    /// Returns the printable symbol for this allele.
    /// # Arguments
    /// * `missing_sentinel` - the symbol to use for `Allele::Missing`
    pub fn symbol(&self, missing_sentinel: char) -> char {
        match self {
            Allele::A => 'A',
            Allele::C => 'C',
            Allele::G => 'G',
            Allele::T => 'T',
            Allele::Insertion => 'I',
            Allele::Deletion => 'D',
            Allele::NoCall => '0',
            Allele::Missing => missing_sentinel
        }
    }

    /// Returns true if `symbol` would collide with a symbol that can be parsed from a raw file
    pub fn is_reserved_symbol(symbol: char) -> bool {
        Allele::from_symbol(symbol).is_ok()
    }
}

/// An unphased diploid genotype, stored in the order the vendor reported it
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Genotype {
    allele1: Allele,
    allele2: Allele
}

impl Genotype {
    pub fn new(allele1: Allele, allele2: Allele) -> Genotype {
        Genotype {
            allele1,
            allele2
        }
    }

    /// The genotype used to fill slots that an individual did not report during union alignment
    pub fn missing() -> Genotype {
        Genotype::new(Allele::Missing, Allele::Missing)
    }

    /// Parses a combined genotype string such as "AG", "--", or "A" (haploid calls are duplicated).
    /// # Errors
    /// * if the string is empty or longer than two symbols
    /// * if either symbol is not part of the raw file alphabet
    pub fn from_combined(genotype: &str) -> Result<Genotype, GenotypeError> {
        let symbols: Vec<char> = genotype.chars().collect();
        match symbols.len() {
            1 => {
                let allele = Allele::from_symbol(symbols[0])?;
                Ok(Genotype::new(allele, allele))
            },
            2 => Ok(Genotype::new(
                Allele::from_symbol(symbols[0])?,
                Allele::from_symbol(symbols[1])?
            )),
            _ => Err(GenotypeError::GenotypeLength { genotype: genotype.to_string() })
        }
    }

    pub fn allele1(&self) -> Allele {
        self.allele1
    }

    pub fn allele2(&self) -> Allele {
        self.allele2
    }

    pub fn alleles(&self) -> [Allele; 2] {
        [self.allele1, self.allele2]
    }

    /// Returns true if either allele is `allele`
    pub fn contains(&self, allele: Allele) -> bool {
        self.allele1 == allele || self.allele2 == allele
    }
}

/// A single genotype call from one individual's raw file
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GenotypeCall {
    /// The vendor SNP identifier, only kept for diagnostics
    rsid: String,
    /// Normalized chromosome name, e.g. "1" or "X"
    chromosome: String,
    /// The reported 1-based coordinate
    position: u64,
    /// The two called alleles
    genotype: Genotype
}

impl GenotypeCall {
    pub fn new(rsid: String, chromosome: String, position: u64, genotype: Genotype) -> GenotypeCall {
        GenotypeCall {
            rsid,
            chromosome,
            position,
            genotype
        }
    }

    pub fn rsid(&self) -> &str {
        &self.rsid
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn genotype(&self) -> Genotype {
        self.genotype
    }
}

/// The ordered calls of a single individual, typically restricted to one chromosome
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GenotypeSequence {
    /// The individual these calls belong to
    individual_id: String,
    /// Calls sorted by ascending position
    calls: Vec<GenotypeCall>
}

impl GenotypeSequence {
    pub fn new(individual_id: String, calls: Vec<GenotypeCall>) -> GenotypeSequence {
        GenotypeSequence {
            individual_id,
            calls
        }
    }

    pub fn individual_id(&self) -> &str {
        &self.individual_id
    }

    pub fn calls(&self) -> &[GenotypeCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allele_symbols() {
        assert_eq!(Allele::from_symbol('a').unwrap(), Allele::A);
        assert_eq!(Allele::from_symbol('T').unwrap(), Allele::T);
        assert_eq!(Allele::from_symbol('I').unwrap(), Allele::Insertion);
        assert_eq!(Allele::from_symbol('D').unwrap(), Allele::Deletion);
        assert_eq!(Allele::from_symbol('0').unwrap(), Allele::NoCall);
        assert_eq!(Allele::from_symbol('-').unwrap(), Allele::NoCall);
        assert_eq!(Allele::from_symbol('Z'), Err(GenotypeError::UnknownSymbol { symbol: 'Z' }));
        assert_eq!(Allele::from_symbol('N'), Err(GenotypeError::UnknownSymbol { symbol: 'N' }));

        assert_eq!(Allele::Missing.symbol('Z'), 'Z');
        assert_eq!(Allele::Missing.symbol('?'), '?');
        assert_eq!(Allele::NoCall.symbol('Z'), '0');
        assert!(Allele::is_reserved_symbol('0'));
        assert!(!Allele::is_reserved_symbol('Z'));
    }

    #[test]
    fn test_combined_genotype() {
        let genotype = Genotype::from_combined("AG").unwrap();
        assert_eq!(genotype.alleles(), [Allele::A, Allele::G]);

        let genotype = Genotype::from_combined("--").unwrap();
        assert_eq!(genotype.alleles(), [Allele::NoCall, Allele::NoCall]);

        // haploid calls on X/Y/MT are reported as a single symbol
        let genotype = Genotype::from_combined("T").unwrap();
        assert_eq!(genotype.alleles(), [Allele::T, Allele::T]);

        let genotype = Genotype::from_combined("DI").unwrap();
        assert!(genotype.contains(Allele::Insertion));
        assert!(genotype.contains(Allele::Deletion));
        assert!(!genotype.contains(Allele::NoCall));

        assert!(Genotype::from_combined("").is_err());
        assert!(Genotype::from_combined("AGT").is_err());
        assert!(Genotype::from_combined("AX").is_err());
    }
}
