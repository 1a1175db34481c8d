use crate::Result;
use polars::prelude::*;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A jornada (matchday) after normalization.
///
/// Numbered jornadas come from integer cells or from `"J12"`-style labels.
/// Anything else is kept verbatim as a `Label` and never equals a number, so
/// a dataset can mix both without coercion.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Jornada {
    Number(i64),
    Label(String),
}

impl Jornada {
    /// Normalizes a raw string cell: a `J`/`j` prefix followed by an integer
    /// becomes that number, everything else passes through unchanged.
    pub fn normalize(raw: &str) -> Self {
        raw.strip_prefix(|c: char| c == 'J' || c == 'j')
            .and_then(|digits| digits.trim().parse().ok())
            .map(Jornada::Number)
            .unwrap_or_else(|| Jornada::Label(raw.to_string()))
    }

    pub fn number(&self) -> Option<i64> {
        match self {
            Jornada::Number(n) => Some(*n),
            Jornada::Label(_) => None,
        }
    }
}

impl From<i64> for Jornada {
    fn from(n: i64) -> Self {
        Jornada::Number(n)
    }
}

/// Parses user input: bare integers are numbers, other text goes through
/// [`Jornada::normalize`].
impl FromStr for Jornada {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse() {
            Ok(n) => Jornada::Number(n),
            Err(_) => Jornada::normalize(s),
        })
    }
}

impl fmt::Display for Jornada {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Jornada::Number(n) => write!(f, "J{}", n),
            Jornada::Label(label) => f.write_str(label),
        }
    }
}

/// Normalizes a raw jornada column cell by cell. Numeric columns are read as
/// integers; any other column is read as text.
pub fn normalize_series(raw: &Series) -> Result<Vec<Option<Jornada>>> {
    if raw.dtype().is_numeric() {
        let numbers = raw.cast(&DataType::Int64)?;
        let values = numbers
            .i64()?
            .into_iter()
            .map(|v| v.map(Jornada::Number))
            .collect();
        Ok(values)
    } else {
        let labels = raw.cast(&DataType::String)?;
        let values = labels
            .str()?
            .into_iter()
            .map(|v| v.map(Jornada::normalize))
            .collect();
        Ok(values)
    }
}
