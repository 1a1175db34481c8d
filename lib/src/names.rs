//! Folding of team-name spelling variants into one canonical name per team.

use crate::{similarity, Result};
use itertools::Itertools;
use polars::prelude::*;
use std::collections::HashMap;

/// Two names belong to the same team when their similarity is strictly above
/// this value.
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Raw team name → canonical team name, for every name seen in a dataset.
///
/// Clustering is greedy: names are visited in first-appearance order, each
/// unassigned name opens a cluster with every later unassigned name similar
/// to it, and cluster members are never reconsidered. The relation is not
/// closed transitively, so the result depends on the input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TeamNameMapping {
    observed: Vec<String>,
    canonical: HashMap<String, String>,
}

impl TeamNameMapping {
    pub fn build<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let observed: Vec<String> = names.into_iter().unique().map(str::to_string).collect();
        let mut assigned = vec![false; observed.len()];
        let mut canonical = HashMap::with_capacity(observed.len());

        for root in 0..observed.len() {
            if assigned[root] {
                continue;
            }
            // Every name before `root` is already assigned.
            let cluster: Vec<usize> = std::iter::once(root)
                .chain((root + 1..observed.len()).filter(|&other| {
                    !assigned[other]
                        && similarity::ratio(&observed[root], &observed[other]) > SIMILARITY_THRESHOLD
                }))
                .collect();

            // First longest wins, so ties keep the root.
            let longest = cluster.iter().copied().fold(root, |best, idx| {
                if char_len(&observed[idx]) > char_len(&observed[best]) {
                    idx
                } else {
                    best
                }
            });
            let name = observed[longest].clone();
            if cluster.len() > 1 {
                log::debug!(
                    "{} -> {}",
                    cluster.iter().map(|&idx| observed[idx].as_str()).join(" | "),
                    name
                );
            }
            for idx in cluster {
                assigned[idx] = true;
                canonical.insert(observed[idx].clone(), name.clone());
            }
        }

        Self { observed, canonical }
    }

    /// Builds the mapping from the distinct non-null values of a team column.
    pub fn from_series(teams: &Series) -> Result<Self> {
        let teams = teams.cast(&DataType::String)?;
        let mapping = Self::build(teams.str()?.into_iter().flatten());
        Ok(mapping)
    }

    pub fn canonical(&self, raw: &str) -> Option<&str> {
        self.canonical.get(raw).map(String::as_str)
    }

    /// Raw names in first-appearance order, each with its canonical name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.observed
            .iter()
            .map(move |raw| (raw.as_str(), self.canonical[raw].as_str()))
    }

    /// Distinct canonical names in first-appearance order.
    pub fn canonical_names(&self) -> Vec<&str> {
        self.iter().map(|(_, canonical)| canonical).unique().collect()
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Rewrites a team column to canonical names. Nulls and names outside the
    /// mapping are left as they are.
    pub fn apply(&self, teams: &Series) -> Result<Series> {
        let raw = teams.cast(&DataType::String)?;
        let mapped: Vec<Option<String>> = raw
            .str()?
            .into_iter()
            .map(|team| team.map(|t| self.canonical(t).unwrap_or(t).to_string()))
            .collect();
        Ok(Series::new(teams.name(), mapped))
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
