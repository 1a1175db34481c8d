use crate::{
    columns::{
        self, Metric, ALIAS, DORSAL, JORNADA, MATCHES_PLAYED, METRICS, MINUTES, NAME, PLAYER_ID, POSITION, TEAM,
        TOTAL_MINUTES,
    },
    filter::RecordFilter,
    performance::PerformanceDf,
    position::PositionIndex,
    Jornada, Result,
};
use derive_deref::Deref;
use parse_display::Display;
use polars::prelude::*;

/// Which of a player's matches count towards the minutes threshold.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Display)]
#[display(style = "snake_case")]
pub enum MinutesRule {
    /// Only matches where the player reached the threshold are aggregated.
    #[default]
    PerMatch,
    /// Every match is aggregated; the player is kept if the mean minutes
    /// reach the threshold.
    Average,
}

#[derive(Clone, Debug)]
pub struct AggregateOptions {
    pub min_minutes: f64,
    pub rule: MinutesRule,
    pub metrics: Vec<Metric>,
}

impl AggregateOptions {
    pub fn new(min_minutes: f64) -> Self {
        Self {
            min_minutes,
            rule: MinutesRule::default(),
            metrics: METRICS.to_vec(),
        }
    }

    pub fn rule(mut self, rule: MinutesRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn metrics<I: IntoIterator<Item = Metric>>(mut self, metrics: I) -> Self {
        self.metrics = metrics.into_iter().collect();
        self
    }
}

/// Selects and aggregates records of a normalized dataset.
///
/// Missing positions in a selection are filled from the player's history in
/// the whole dataset, not only the selected jornadas.
pub struct Aggregator<'a> {
    dataset: &'a PerformanceDf,
    positions: PositionIndex,
}

impl<'a> Aggregator<'a> {
    pub fn new(dataset: &'a PerformanceDf) -> Result<Self> {
        let positions = PositionIndex::build(dataset)?;
        Ok(Self { dataset, positions })
    }

    pub fn dataset(&self) -> &PerformanceDf {
        self.dataset
    }

    pub fn positions(&self) -> &PositionIndex {
        &self.positions
    }

    /// Records of `team` in the given jornadas, with positions imputed and
    /// blank aliases filled.
    pub fn select(&self, team: &str, jornadas: &[Jornada]) -> Result<PerformanceDf> {
        let filter = RecordFilter::new().team(team).jornadas(jornadas).build();
        self.select_with(filter)
    }

    pub fn select_with(&self, filter: Expr) -> Result<PerformanceDf> {
        let subset = self.dataset.filter(filter)?;
        let imputed = self.positions.impute(&subset)?;
        PerformanceDf::new(imputed).fill_missing_alias()
    }

    /// One row per player of `team` meeting the minutes threshold over
    /// `jornadas`.
    pub fn aggregate(&self, team: &str, jornadas: &[Jornada], options: &AggregateOptions) -> Result<PlayerTotalsDf> {
        log::trace!("aggregate::aggregate");
        let records = self.select(team, jornadas)?;
        log::debug!("{} records for {} in {} jornadas", records.height(), team, jornadas.len());
        aggregate_players(&records, options)
    }
}

// Per-record player key used for grouping.
const PLAYER_KEY: &str = "__player_key";

/// Key of every record's player: the id, or the alias when the id is blank.
/// Records with neither have no key.
pub(crate) fn player_keys(df: &DataFrame) -> Result<Vec<Option<String>>> {
    let ids = columns::optional_string_values(df, PLAYER_ID)?;
    let aliases = columns::optional_string_values(df, ALIAS)?;
    let keys = ids
        .into_iter()
        .zip(aliases)
        .map(|(id, alias)| match (id, alias) {
            (Some(id), _) if !columns::is_blank(Some(id.as_str())) => Some(format!("id:{}", id)),
            (_, Some(alias)) if !columns::is_blank(Some(alias.as_str())) => Some(format!("alias:{}", alias.trim())),
            _ => None,
        })
        .collect();
    Ok(keys)
}

/// Reduces per-match records to one row per player.
///
/// Sums cumulative metrics, averages rates and minutes, takes the maximum of
/// peak speeds and copies identity fields from the most recent record. The
/// position is the most frequent one over the aggregated matches. Players
/// are told apart by id, or by alias where the id is missing. Without a
/// minutes column, or with neither ids nor aliases, the result is empty.
pub fn aggregate_players(records: &DataFrame, options: &AggregateOptions) -> Result<PlayerTotalsDf> {
    if !columns::has_column(records, MINUTES) {
        log::warn!("No '{}' column, nothing to aggregate", MINUTES);
        return Ok(PlayerTotalsDf::empty());
    }
    if !columns::has_column(records, PLAYER_ID) && !columns::has_column(records, ALIAS) {
        log::warn!("No '{}' or '{}' column, nothing to aggregate", PLAYER_ID, ALIAS);
        return Ok(PlayerTotalsDf::empty());
    }

    let keys = player_keys(records)?;
    let unkeyed = keys.iter().filter(|k| k.is_none()).count();
    if unkeyed > 0 {
        log::warn!("Dropping {} records without player id or alias", unkeyed);
    }
    let mut keyed = records.clone();
    keyed.with_column(Series::new(PLAYER_KEY, keys))?;

    let mut lf = keyed
        .lazy()
        .filter(col(PLAYER_KEY).is_not_null())
        .with_column(col(MINUTES).cast(DataType::Float64).alias(MINUTES));
    if options.rule == MinutesRule::PerMatch {
        lf = lf.filter(col(MINUTES).gt_eq(lit(options.min_minutes)));
    }
    if columns::has_column(records, JORNADA) {
        lf = lf.sort([JORNADA], SortMultipleOptions::default().with_maintain_order(true));
    }
    let included = lf.collect()?;
    log::debug!("{} matches included", included.height());

    let mut aggs = vec![];
    for identity in [PLAYER_ID, NAME, ALIAS, DORSAL, TEAM, POSITION] {
        if columns::has_column(&included, identity) {
            aggs.push(col(identity).last());
        }
    }
    aggs.push(col(MINUTES).count().alias(MATCHES_PLAYED));
    aggs.push(col(MINUTES).mean().alias(MINUTES));
    aggs.push(col(MINUTES).sum().alias(TOTAL_MINUTES));
    for metric in &options.metrics {
        if columns::has_column(&included, metric.column) {
            aggs.push(metric.reduction.expr(metric.column).alias(metric.column));
        } else {
            log::warn!("Skipping missing metric '{}'", metric.column);
        }
    }

    let mut totals = included.clone().lazy().group_by_stable([col(PLAYER_KEY)]).agg(aggs);
    if options.rule == MinutesRule::Average {
        totals = totals.filter(col(MINUTES).gt_eq(lit(options.min_minutes)));
    }
    let mut df = totals.collect()?;

    if columns::has_column(&df, POSITION) {
        let included_keys = columns::string_values(&included, PLAYER_KEY)?;
        let included_positions = columns::string_values(&included, POSITION)?;
        let modes = PositionIndex::from_pairs(
            included_keys
                .iter()
                .zip(included_positions.iter())
                .filter_map(|(key, position)| Some((key.as_deref()?, position.as_deref()?))),
        );
        let keys = columns::string_values(&df, PLAYER_KEY)?;
        let latest = columns::string_values(&df, POSITION)?;
        let positions: Vec<Option<String>> = keys
            .iter()
            .zip(latest)
            .map(|(key, latest)| {
                key.as_deref()
                    .and_then(|key| modes.mode(key))
                    .map(str::to_string)
                    .or(latest)
            })
            .collect();
        df.with_column(Series::new(POSITION, positions))?;
    }
    let df = df.drop(PLAYER_KEY)?;

    log::debug!("{} players aggregated", df.height());
    Ok(PlayerTotalsDf(df))
}

/// One row per player, as produced by [`aggregate_players`].
#[derive(Clone, Deref)]
pub struct PlayerTotalsDf(DataFrame);

impl PlayerTotalsDf {
    pub fn empty() -> Self {
        PlayerTotalsDf(DataFrame::empty())
    }

    pub fn into_inner(self) -> DataFrame {
        self.0
    }

    pub fn filter(self, filter: Expr) -> Result<Self> {
        let df = self.0.lazy().filter(filter).collect()?;
        Ok(PlayerTotalsDf(df))
    }

    /// Sorts descending by `column`.
    pub fn sort_by(self, column: &str) -> Result<Self> {
        columns::require_column(&self.0, column)?;
        let df = self
            .0
            .lazy()
            .sort(
                [column],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .collect()?;
        Ok(PlayerTotalsDf(df))
    }
}
