//! Column names of the physical-performance dataset and the reduction rule of
//! every metric column.

use crate::{error::Error, Result};
use parse_display::Display;
use polars::prelude::*;

pub const PLAYER_ID: &str = "Id Jugador";
pub const NAME: &str = "Nombre";
pub const ALIAS: &str = "Alias";
pub const DORSAL: &str = "Dorsal";
pub const POSITION: &str = "Demarcacion";
pub const TEAM: &str = "Equipo";
pub const JORNADA: &str = "Jornada";
/// Raw jornada values that did not normalize to a number.
pub const JORNADA_LABEL: &str = "Jornada Original";
pub const MATCH: &str = "Partido";
pub const MINUTES: &str = "Minutos jugados";
pub const MINUTES_FIRST_HALF: &str = "Minutos jugados 1P";
pub const MINUTES_SECOND_HALF: &str = "Minutos jugados 2P";
/// Number of matches that contributed to an aggregated row.
pub const MATCHES_PLAYED: &str = "Partidos";
/// Minutes summed over the aggregated matches.
pub const TOTAL_MINUTES: &str = "Minutos totales";

pub const TOTAL_DISTANCE: &str = "Distancia Total";
pub const DISTANCE_PER_MINUTE: &str = "Distancia Total / min";
pub const DISTANCE_14_21: &str = "Distancia Total 14-21 km / h";
pub const DISTANCE_21_24: &str = "Distancia Total  21-24 km / h";
pub const DISTANCE_OVER_21: &str = "Distancia Total >21 km / h";
pub const DISTANCE_OVER_24: &str = "Distancia Total >24 km / h";
pub const DISTANCE_14_21_PER_MINUTE: &str = "Distancia Total 14-21 km / h / min";
pub const DISTANCE_OVER_21_PER_MINUTE: &str = "Distancia Total >21 km / h / min";
pub const DISTANCE_OVER_24_PER_MINUTE: &str = "Distancia Total >24 km / h / min";
pub const SPRINTS_21_24: &str = "N Total Sprints 21-24 km / h";
pub const SPRINTS_OVER_21: &str = "N Total Sprints >21 km / h";
pub const SPRINTS_OVER_24: &str = "N Total Sprints >24 km / h";
pub const MAX_SPEED: &str = "Velocidad Máxima Total";
pub const MAX_SPEED_FIRST_HALF: &str = "Velocidad Máxima 1P";
pub const MAX_SPEED_SECOND_HALF: &str = "Velocidad Máxima 2P";

/// How a per-match metric collapses into one value per player.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
#[display(style = "lowercase")]
pub enum Reduction {
    /// Cumulative quantities: distances and sprint counts.
    Sum,
    /// Rates: per-minute distances.
    Mean,
    /// Peaks: maximum speeds.
    Max,
}

impl Reduction {
    /// Guesses the reduction of a column from its name, for metrics outside
    /// [`METRICS`].
    pub fn infer(column: &str) -> Self {
        if column.trim_end().ends_with("/ min") {
            Reduction::Mean
        } else if column.starts_with("Velocidad") {
            Reduction::Max
        } else {
            Reduction::Sum
        }
    }

    pub(crate) fn expr(self, column: &str) -> Expr {
        let values = col(column).cast(DataType::Float64);
        match self {
            Reduction::Sum => values.sum(),
            Reduction::Mean => values.mean(),
            Reduction::Max => values.max(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Metric {
    pub column: &'static str,
    pub reduction: Reduction,
}

impl Metric {
    pub const fn new(column: &'static str, reduction: Reduction) -> Self {
        Self { column, reduction }
    }
}

pub const METRICS: &[Metric] = &[
    Metric::new(TOTAL_DISTANCE, Reduction::Sum),
    Metric::new(DISTANCE_14_21, Reduction::Sum),
    Metric::new(DISTANCE_21_24, Reduction::Sum),
    Metric::new(DISTANCE_OVER_21, Reduction::Sum),
    Metric::new(DISTANCE_OVER_24, Reduction::Sum),
    Metric::new(SPRINTS_21_24, Reduction::Sum),
    Metric::new(SPRINTS_OVER_21, Reduction::Sum),
    Metric::new(SPRINTS_OVER_24, Reduction::Sum),
    Metric::new(MINUTES_FIRST_HALF, Reduction::Sum),
    Metric::new(MINUTES_SECOND_HALF, Reduction::Sum),
    Metric::new(DISTANCE_PER_MINUTE, Reduction::Mean),
    Metric::new(DISTANCE_14_21_PER_MINUTE, Reduction::Mean),
    Metric::new(DISTANCE_OVER_21_PER_MINUTE, Reduction::Mean),
    Metric::new(DISTANCE_OVER_24_PER_MINUTE, Reduction::Mean),
    Metric::new(MAX_SPEED, Reduction::Max),
    Metric::new(MAX_SPEED_FIRST_HALF, Reduction::Max),
    Metric::new(MAX_SPEED_SECOND_HALF, Reduction::Max),
];

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().contains(&name)
}

pub fn require_column(df: &DataFrame, name: &str) -> Result<()> {
    if has_column(df, name) {
        Ok(())
    } else {
        Err(Error::MissingColumn(name.to_string()))
    }
}

/// Null, empty and whitespace-only cells all count as blank.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    require_column(df, name)?;
    let series = df.column(name)?.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

pub fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    require_column(df, name)?;
    let series = df.column(name)?.cast(&DataType::Float64)?;
    let values = series.f64()?.into_iter().collect();
    Ok(values)
}

pub fn int_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    require_column(df, name)?;
    let series = df.column(name)?.cast(&DataType::Int64)?;
    let values = series.i64()?.into_iter().collect();
    Ok(values)
}

/// Like [`string_values`], but an absent column reads as all nulls.
pub fn optional_string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    if has_column(df, name) {
        string_values(df, name)
    } else {
        Ok(vec![None; df.height()])
    }
}

/// Columns whose name mentions a distance.
pub fn distance_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .filter(|name| name.contains("istancia") || name.contains("Distance"))
        .map(str::to_string)
        .collect()
}

/// Columns whose name mentions a speed band or speed.
pub fn speed_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .filter(|name| {
            let lower = name.to_lowercase();
            lower.contains("km") || lower.contains("speed") || lower.contains("vel")
        })
        .map(str::to_string)
        .collect()
}
