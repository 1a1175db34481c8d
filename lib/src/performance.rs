use crate::{
    columns::{self, ALIAS, JORNADA, JORNADA_LABEL, NAME, PLAYER_ID, TEAM},
    jornada::{self, Jornada},
    names::TeamNameMapping,
    Result,
};
use derive_deref::Deref;
use itertools::Itertools;
use polars::prelude::*;
use std::path::Path;

/// One row per player per match.
#[derive(Clone, Deref)]
pub struct PerformanceDf(DataFrame);

impl PerformanceDf {
    pub fn new(df: DataFrame) -> Self {
        PerformanceDf(df)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let df = crate::load_parquet(path)?;
        log::info!("Loaded {} rows, {} columns", df.height(), df.width());
        Ok(PerformanceDf(df))
    }

    pub fn into_inner(self) -> DataFrame {
        self.0
    }

    /// Folds team-name variants into canonical names, normalizes jornadas and
    /// reads player ids as text.
    ///
    /// `Jornada` becomes an integer column; raw values that are not jornada
    /// numbers are kept in `Jornada Original` with a null `Jornada`.
    pub fn normalize(self) -> Result<(Self, TeamNameMapping)> {
        log::trace!("performance::normalize");
        let mut df = self.0;
        columns::require_column(&df, TEAM)?;
        columns::require_column(&df, JORNADA)?;

        let mapping = TeamNameMapping::from_series(df.column(TEAM)?)?;
        let teams = mapping.apply(df.column(TEAM)?)?;
        df.with_column(teams)?;

        // A second pass must not wipe labels kept by the first.
        if !columns::has_column(&df, JORNADA_LABEL) {
            let (numbers, labels): (Vec<Option<i64>>, Vec<Option<String>>) =
                jornada::normalize_series(df.column(JORNADA)?)?
                    .into_iter()
                    .map(|j| match j {
                        Some(Jornada::Number(n)) => (Some(n), None),
                        Some(Jornada::Label(label)) => (None, Some(label)),
                        None => (None, None),
                    })
                    .unzip();
            df.with_column(Series::new(JORNADA, numbers))?;
            df.with_column(Series::new(JORNADA_LABEL, labels))?;
        }

        if columns::has_column(&df, PLAYER_ID) {
            let ids = df.column(PLAYER_ID)?.cast(&DataType::String)?;
            df.with_column(ids)?;
        }

        log::info!(
            "Normalized {} team names into {} teams",
            mapping.len(),
            mapping.canonical_names().len()
        );
        Ok((PerformanceDf(df), mapping))
    }

    pub fn filter(&self, filter: Expr) -> Result<Self> {
        let df = self.0.clone().lazy().filter(filter).collect()?;
        log::debug!("{} rows after filter", df.height());
        Ok(PerformanceDf(df))
    }

    /// Uses `Nombre` wherever `Alias` is blank.
    pub fn fill_missing_alias(self) -> Result<Self> {
        if !columns::has_column(&self.0, ALIAS) || !columns::has_column(&self.0, NAME) {
            return Ok(self);
        }
        let aliases = columns::string_values(&self.0, ALIAS)?;
        let names = columns::string_values(&self.0, NAME)?;
        let filled: Vec<Option<String>> = aliases
            .into_iter()
            .zip(names)
            .map(|(alias, name)| {
                if columns::is_blank(alias.as_deref()) {
                    name
                } else {
                    alias
                }
            })
            .collect();

        let mut df = self.0;
        df.with_column(Series::new(ALIAS, filled))?;
        Ok(PerformanceDf(df))
    }

    /// Sorted distinct team names.
    pub fn available_teams(&self) -> Result<Vec<String>> {
        let teams = columns::string_values(&self.0, TEAM)?;
        Ok(teams.into_iter().flatten().unique().sorted().collect())
    }

    /// Sorted distinct numbered jornadas, optionally for one team.
    pub fn available_jornadas(&self, team: Option<&str>) -> Result<Vec<i64>> {
        let jornadas = match team {
            Some(team) => {
                let df = self.filter(col(TEAM).eq(lit(team)))?;
                columns::int_values(&df, JORNADA)?
            }
            None => columns::int_values(&self.0, JORNADA)?,
        };
        Ok(jornadas.into_iter().flatten().unique().sorted().collect())
    }

    /// The last `n` jornadas the team played up to and including `reference`,
    /// ascending.
    pub fn last_jornadas(&self, team: &str, reference: i64, n: usize) -> Result<Vec<i64>> {
        let played: Vec<i64> = self
            .available_jornadas(Some(team))?
            .into_iter()
            .filter(|&j| j <= reference)
            .collect();
        let skip = played.len().saturating_sub(n);
        Ok(played.into_iter().skip(skip).collect())
    }

    /// First record of every player.
    pub fn unique_players(self) -> Result<Self> {
        let expr = col(PLAYER_ID).is_first_distinct();
        let df = self.0.lazy().filter(expr).collect()?;
        Ok(PerformanceDf(df))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> DataFrame {
        df!(
            PLAYER_ID => &[10i64, 11, 10, 12],
            NAME => &["Daniel Parejo", "Gerard Moreno", "Daniel Parejo", "Ayoze Pérez"],
            ALIAS => &[Some("Parejo"), Some(""), None, Some("Ayoze")],
            TEAM => &["Villarreal", "Villarreal CF", "Villarreal CF", "Villarreal"],
            JORNADA => &["J1", "J1", "J2", "Final"]
        )
        .unwrap()
    }

    #[test]
    fn normalize_rewrites_teams_and_jornadas() {
        let (df, mapping) = PerformanceDf::new(raw()).normalize().unwrap();

        assert_eq!(mapping.canonical_names(), vec!["Villarreal CF"]);
        assert_eq!(df.available_teams().unwrap(), vec!["Villarreal CF".to_string()]);
        assert_eq!(columns::int_values(&df, JORNADA).unwrap(), vec![Some(1), Some(1), Some(2), None]);
        assert_eq!(
            columns::string_values(&df, JORNADA_LABEL).unwrap(),
            vec![None, None, None, Some("Final".to_string())]
        );
        assert_eq!(df.column(PLAYER_ID).unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn normalize_is_idempotent() {
        let (once, first) = PerformanceDf::new(raw()).normalize().unwrap();
        let (twice, second) = once.clone().normalize().unwrap();

        assert_eq!(first.canonical_names(), second.canonical_names());
        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn blank_alias_falls_back_to_name() {
        let df = PerformanceDf::new(raw()).fill_missing_alias().unwrap();
        let aliases = columns::string_values(&df, ALIAS).unwrap();
        assert_eq!(
            aliases,
            vec![
                Some("Parejo".to_string()),
                Some("Gerard Moreno".to_string()),
                Some("Daniel Parejo".to_string()),
                Some("Ayoze".to_string()),
            ]
        );
    }

    #[test]
    fn last_jornadas_looks_back_from_reference() {
        let df = df!(
            TEAM => &["Getafe CF"; 7],
            JORNADA => &[1i64, 2, 3, 5, 6, 8, 9]
        )
        .unwrap();
        let df = PerformanceDf::new(df);

        assert_eq!(df.last_jornadas("Getafe CF", 8, 5).unwrap(), vec![2, 3, 5, 6, 8]);
        assert_eq!(df.last_jornadas("Getafe CF", 2, 5).unwrap(), vec![1, 2]);
        assert!(df.last_jornadas("Girona FC", 8, 5).unwrap().is_empty());
    }

    #[test]
    fn unique_players_keeps_first_record() {
        let (df, _) = PerformanceDf::new(raw()).normalize().unwrap();
        let players = df.unique_players().unwrap();
        assert_eq!(players.height(), 3);
    }
}
