use log::{debug, warn};

/// An unordered pair of individuals being compared, stored as indices into the roster of a `ComparisonPlan`
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct MatchPair {
    /// Roster index of the first individual
    first: usize,
    /// Roster index of the second individual
    second: usize,
    /// If true, `second` is the outside comparator rather than a sibling
    outside: bool
}

impl MatchPair {
    /// Creates a new pair.
    /// # Panics
    /// * if `first == second`
    pub fn new(first: usize, second: usize, outside: bool) -> MatchPair {
        assert_ne!(first, second, "an individual cannot be paired with itself");
        MatchPair {
            first,
            second,
            outside
        }
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn second(&self) -> usize {
        self.second
    }

    pub fn is_outside(&self) -> bool {
        self.outside
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PlanError {
    #[error("at least two distinct individuals are required, found {count}")]
    TooFewIndividuals { count: usize },
    #[error("individual identifiers cannot be empty")]
    EmptyIdentifier
}

/// The fixed set of individuals and pairs compared for every chromosome in a run
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComparisonPlan {
    /// All individuals that must be loaded; siblings first, then the optional outside comparator
    individuals: Vec<String>,
    /// The pairs to compare, in output order
    pairs: Vec<MatchPair>
}

impl ComparisonPlan {
    /// Builds the comparison plan from the siblings and an optional extra relative.
    /// Siblings are de-duplicated, keeping the first occurrence.
    /// The extra relative is only compared against siblings, and is ignored if it is already a sibling.
    /// # Arguments
    /// * `siblings` - the siblings to compare against each other
    /// * `extra_match` - an optional outside relative compared against each sibling
    /// # Errors
    /// * if any identifier is empty
    /// * if there are fewer than two distinct individuals in total
    pub fn new(siblings: &[String], extra_match: Option<&str>) -> Result<ComparisonPlan, PlanError> {
        let mut individuals: Vec<String> = vec![];
        for sibling in siblings.iter() {
            if sibling.is_empty() {
                return Err(PlanError::EmptyIdentifier);
            }
            if individuals.contains(sibling) {
                debug!("Ignoring duplicate sibling {:?}", sibling);
            } else {
                individuals.push(sibling.clone());
            }
        }
        let num_siblings: usize = individuals.len();

        let mut pairs: Vec<MatchPair> = vec![];
        for first in 0..num_siblings {
            for second in (first+1)..num_siblings {
                pairs.push(MatchPair::new(first, second, false));
            }
        }

        if let Some(extra) = extra_match {
            if extra.is_empty() {
                return Err(PlanError::EmptyIdentifier);
            }
            if individuals.iter().any(|i| i == extra) {
                warn!("Extra match {:?} is already a sibling, ignoring it.", extra);
            } else {
                let extra_index: usize = individuals.len();
                individuals.push(extra.to_string());
                for sibling_index in 0..num_siblings {
                    pairs.push(MatchPair::new(sibling_index, extra_index, true));
                }
            }
        }

        if individuals.len() < 2 {
            return Err(PlanError::TooFewIndividuals { count: individuals.len() });
        }
        if num_siblings < 3 {
            warn!("Only {} distinct siblings provided, visual phasing typically requires at least three.", num_siblings);
        }

        Ok(ComparisonPlan {
            individuals,
            pairs
        })
    }

    pub fn individuals(&self) -> &[String] {
        &self.individuals
    }

    pub fn pairs(&self) -> &[MatchPair] {
        &self.pairs
    }

    /// Returns the display label for a pair, e.g. "KEN-ALAN"
    pub fn pair_label(&self, pair: &MatchPair) -> String {
        format!("{}-{}", self.individuals[pair.first()], self.individuals[pair.second()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sibling_pairs() {
        let plan = ComparisonPlan::new(&names(&["KEN", "ALAN", "BRIAN"]), None).unwrap();
        assert_eq!(plan.individuals(), &names(&["KEN", "ALAN", "BRIAN"]));
        let labels: Vec<String> = plan.pairs().iter().map(|p| plan.pair_label(p)).collect();
        assert_eq!(labels, names(&["KEN-ALAN", "KEN-BRIAN", "ALAN-BRIAN"]));
        assert!(plan.pairs().iter().all(|p| !p.is_outside()));
    }

    #[test]
    fn test_extra_match() {
        let plan = ComparisonPlan::new(&names(&["KEN", "ALAN", "BRIAN"]), Some("BERYL")).unwrap();
        assert_eq!(plan.individuals(), &names(&["KEN", "ALAN", "BRIAN", "BERYL"]));
        let labels: Vec<String> = plan.pairs().iter().map(|p| plan.pair_label(p)).collect();
        assert_eq!(labels, names(&[
            "KEN-ALAN", "KEN-BRIAN", "ALAN-BRIAN",
            "KEN-BERYL", "ALAN-BERYL", "BRIAN-BERYL"
        ]));
        assert_eq!(plan.pairs().iter().filter(|p| p.is_outside()).count(), 3);
    }

    #[test]
    fn test_duplicates() {
        // duplicate sibling and an extra that is already a sibling
        let plan = ComparisonPlan::new(&names(&["KEN", "ALAN", "KEN", "BRIAN"]), Some("ALAN")).unwrap();
        assert_eq!(plan.individuals(), &names(&["KEN", "ALAN", "BRIAN"]));
        assert_eq!(plan.pairs().len(), 3);
    }

    #[test]
    fn test_too_few() {
        assert_eq!(
            ComparisonPlan::new(&names(&["KEN", "KEN"]), None),
            Err(PlanError::TooFewIndividuals { count: 1 })
        );
        assert_eq!(
            ComparisonPlan::new(&names(&["KEN", ""]), None),
            Err(PlanError::EmptyIdentifier)
        );

        // one sibling plus an outsider is still a valid comparison
        let plan = ComparisonPlan::new(&names(&["KEN"]), Some("BERYL")).unwrap();
        assert_eq!(plan.pairs(), &[MatchPair::new(0, 1, true)]);
    }
}
