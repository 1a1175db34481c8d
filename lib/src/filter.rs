use crate::{
    columns::{JORNADA, JORNADA_LABEL, PLAYER_ID, TEAM},
    Jornada, Result,
};
use polars::{prelude::*, sql::SQLContext};

/// Runs an SQL query against the records, registered as the `records` table.
pub fn filter_sql(df: LazyFrame, query: &str) -> Result<LazyFrame> {
    let mut ctx = SQLContext::new();
    ctx.register("records", df);
    let df = ctx.execute(query)?;
    Ok(df)
}

/// Builds a row filter over normalized performance records. Every added
/// condition is combined with AND.
#[derive(Clone, Default)]
pub struct RecordFilter {
    filter_expr: Option<Expr>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn team(self, team_name: &str) -> Self {
        let expr = col(TEAM).eq(lit(team_name));
        self.extend_filter(expr)
    }

    pub fn player_id(self, player_id: &str) -> Self {
        let expr = col(PLAYER_ID).eq(lit(player_id));
        self.extend_filter(expr)
    }

    pub fn jornada(self, jornada: &Jornada) -> Self {
        let expr = jornada_expr(jornada);
        self.extend_filter(expr)
    }

    /// Matches any of the given jornadas. An empty set matches nothing.
    pub fn jornadas<'a, I>(self, jornadas: I) -> Self
    where
        I: IntoIterator<Item = &'a Jornada>,
    {
        let expr = jornadas
            .into_iter()
            .map(jornada_expr)
            .reduce(|acc, expr| acc.or(expr))
            .unwrap_or_else(|| lit(false));
        self.extend_filter(expr)
    }

    pub fn jornada_range(self, start: i64, end: i64) -> Self {
        let expr = col(JORNADA).is_between(lit(start), lit(end), ClosedInterval::Both);
        self.extend_filter(expr)
    }

    pub fn up_to_jornada(self, last: i64) -> Self {
        let expr = col(JORNADA).lt_eq(lit(last));
        self.extend_filter(expr)
    }

    fn extend_filter(mut self, new_expr: Expr) -> Self {
        self.filter_expr = match self.filter_expr.take() {
            Some(existing_expr) => Some(existing_expr.and(new_expr)),
            None => Some(new_expr),
        };
        self
    }

    pub fn build(self) -> Expr {
        self.filter_expr.unwrap_or_else(|| lit(true))
    }
}

// Labels live in their own column, so a label never matches a number.
fn jornada_expr(jornada: &Jornada) -> Expr {
    match jornada {
        Jornada::Number(n) => col(JORNADA).eq(lit(*n)),
        Jornada::Label(label) => col(JORNADA_LABEL).eq(lit(label.as_str())),
    }
}
