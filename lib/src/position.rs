//! Imputation of missing demarcations from each player's history.

use crate::{
    columns::{self, PLAYER_ID, POSITION},
    Result,
};
use polars::prelude::*;
use std::collections::HashMap;

/// Assigned to records of players who never had a position recorded.
pub const UNKNOWN_POSITION: &str = "Sin Posición";

/// Most frequent non-empty demarcation of every player, computed once over a
/// dataset and consulted per record.
#[derive(Clone, Debug, Default)]
pub struct PositionIndex {
    modes: HashMap<String, String>,
}

impl PositionIndex {
    /// Without an id or demarcation column the index is empty and every
    /// imputed record gets [`UNKNOWN_POSITION`].
    pub fn build(df: &DataFrame) -> Result<Self> {
        log::trace!("position::build");
        for name in [PLAYER_ID, POSITION] {
            if !columns::has_column(df, name) {
                log::warn!("No '{}' column, positions cannot be imputed from history", name);
                return Ok(Self::default());
            }
        }
        let ids = columns::string_values(df, PLAYER_ID)?;
        let positions = columns::string_values(df, POSITION)?;
        let index = Self::from_pairs(
            ids.iter()
                .zip(positions.iter())
                .filter_map(|(id, position)| Some((id.as_deref()?, position.as_deref()?))),
        );
        log::debug!("{} players with a known position", index.modes.len());
        Ok(index)
    }

    /// Builds the index from `(player id, demarcation)` pairs in dataset
    /// order. Blank demarcations are ignored; ties go to the demarcation seen
    /// first.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        // player -> (position, count) in first-appearance order
        let mut counts: HashMap<&str, Vec<(&str, usize)>> = HashMap::new();
        for (id, position) in pairs {
            if columns::is_blank(Some(position)) {
                continue;
            }
            let seen = counts.entry(id).or_default();
            match seen.iter_mut().find(|(p, _)| *p == position) {
                Some((_, count)) => *count += 1,
                None => seen.push((position, 1)),
            }
        }

        let modes = counts
            .into_iter()
            .filter_map(|(id, seen)| {
                let mut best: Option<(&str, usize)> = None;
                for (position, count) in seen {
                    if best.map_or(true, |(_, top)| count > top) {
                        best = Some((position, count));
                    }
                }
                best.map(|(position, _)| (id.to_string(), position.to_string()))
            })
            .collect();
        Self { modes }
    }

    pub fn mode(&self, player_id: &str) -> Option<&str> {
        self.modes.get(player_id).map(String::as_str)
    }

    /// The recorded position when present, else the player's mode, else
    /// [`UNKNOWN_POSITION`].
    pub fn resolve<'a>(&'a self, player_id: Option<&str>, recorded: Option<&'a str>) -> &'a str {
        match recorded {
            Some(position) if !columns::is_blank(Some(position)) => position,
            _ => player_id
                .and_then(|id| self.mode(id))
                .unwrap_or(UNKNOWN_POSITION),
        }
    }

    /// Returns a copy of `df` with every blank demarcation filled in.
    pub fn impute(&self, df: &DataFrame) -> Result<DataFrame> {
        let ids = columns::optional_string_values(df, PLAYER_ID)?;
        let recorded = columns::optional_string_values(df, POSITION)?;

        let mut from_history = 0;
        let mut unknown = 0;
        let positions: Vec<String> = ids
            .iter()
            .zip(recorded.iter())
            .map(|(id, position)| {
                let resolved = self.resolve(id.as_deref(), position.as_deref());
                if columns::is_blank(position.as_deref()) {
                    if resolved == UNKNOWN_POSITION {
                        unknown += 1;
                    } else {
                        from_history += 1;
                    }
                }
                resolved.to_string()
            })
            .collect();

        if from_history + unknown > 0 {
            log::info!(
                "Filled {} empty positions from history, {} left as {}",
                from_history,
                unknown,
                UNKNOWN_POSITION
            );
        }

        let mut df = df.clone();
        df.with_column(Series::new(POSITION, positions))?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> DataFrame {
        df!(
            PLAYER_ID => &["7", "7", "7", "7", "9", "4"],
            POSITION => &[Some("Mediocentro"), Some("Interior Derecho"), Some("Mediocentro"), Some(" "), None, Some("Portero")]
        )
        .unwrap()
    }

    #[test]
    fn mode_ignores_blank_positions() {
        let index = PositionIndex::build(&history()).unwrap();
        assert_eq!(index.mode("7"), Some("Mediocentro"));
        assert_eq!(index.mode("4"), Some("Portero"));
        assert_eq!(index.mode("9"), None);
    }

    #[test]
    fn ties_go_to_first_seen() {
        let index = PositionIndex::from_pairs([("5", "Lateral Izquierdo"), ("5", "Extremo Izquierdo")]);
        assert_eq!(index.mode("5"), Some("Lateral Izquierdo"));

        let index = PositionIndex::from_pairs([("5", "Extremo Izquierdo"), ("5", "Lateral Izquierdo")]);
        assert_eq!(index.mode("5"), Some("Extremo Izquierdo"));
    }

    #[test]
    fn imputes_from_full_history() {
        let index = PositionIndex::build(&history()).unwrap();
        let subset = df!(
            PLAYER_ID => &["7", "9", "4", "12"],
            POSITION => &[None, Some(""), Some("Delantero Centro"), None]
        )
        .unwrap();

        let imputed = index.impute(&subset).unwrap();
        let positions = columns::string_values(&imputed, POSITION).unwrap();
        assert_eq!(
            positions,
            vec![
                Some("Mediocentro".to_string()),
                Some(UNKNOWN_POSITION.to_string()),
                Some("Delantero Centro".to_string()),
                Some(UNKNOWN_POSITION.to_string()),
            ]
        );
        // input untouched
        assert_eq!(subset.column(POSITION).unwrap().null_count(), 2);
    }

    #[test]
    fn missing_position_column_imputes_sentinel() {
        let df = df!(PLAYER_ID => &["7", "4"]).unwrap();
        let index = PositionIndex::build(&df).unwrap();
        assert_eq!(index.mode("7"), None);

        let imputed = index.impute(&df).unwrap();
        assert_eq!(
            columns::string_values(&imputed, POSITION).unwrap(),
            vec![Some(UNKNOWN_POSITION.to_string()); 2]
        );

        let without_ids = history().drop(PLAYER_ID).unwrap();
        assert_eq!(PositionIndex::build(&without_ids).unwrap().mode("7"), None);
    }

    #[test]
    fn no_position_is_left_blank() {
        let index = PositionIndex::build(&history()).unwrap();
        let imputed = index.impute(&history()).unwrap();
        let positions = columns::string_values(&imputed, POSITION).unwrap();
        assert!(positions.iter().all(|p| !columns::is_blank(p.as_deref())));
    }
}
