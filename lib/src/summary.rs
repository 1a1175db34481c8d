use crate::{
    aggregate::{self, Aggregator},
    columns::{self, ALIAS, DORSAL, JORNADA, PLAYER_ID, TEAM},
    filter::RecordFilter,
    performance::PerformanceDf,
    Jornada, Result,
};
use polars::prelude::*;
use std::collections::HashMap;

/// Mean of each metric over every team's records in the given jornadas, as a
/// single-row frame. Metrics missing from the dataset are skipped.
pub fn league_means(dataset: &PerformanceDf, jornadas: &[Jornada], metrics: &[&str]) -> Result<DataFrame> {
    log::trace!("summary::league_means");
    let means: Vec<Expr> = present_metrics(dataset, metrics)
        .into_iter()
        .map(|metric| col(metric).cast(DataType::Float64).mean().alias(metric))
        .collect();

    let filter = RecordFilter::new().jornadas(jornadas).build();
    let df = dataset.filter(filter)?.into_inner().lazy().select(means).collect()?;
    Ok(df)
}

/// Team sum of `metric` for each jornada, in the order given. Jornadas
/// without records total zero.
pub fn team_totals_by_jornada(dataset: &PerformanceDf, team: &str, jornadas: &[i64], metric: &str) -> Result<DataFrame> {
    log::trace!("summary::team_totals_by_jornada");
    columns::require_column(dataset, metric)?;
    let selected: Vec<Jornada> = jornadas.iter().copied().map(Jornada::from).collect();
    let filter = RecordFilter::new().team(team).jornadas(&selected).build();
    let sums = dataset
        .filter(filter)?
        .into_inner()
        .lazy()
        .group_by([col(JORNADA)])
        .agg([col(metric).cast(DataType::Float64).sum()])
        .collect()?;

    let by_jornada: HashMap<i64, f64> = columns::int_values(&sums, JORNADA)?
        .into_iter()
        .zip(columns::float_values(&sums, metric)?)
        .filter_map(|(jornada, total)| Some((jornada?, total.unwrap_or(0.0))))
        .collect();
    let totals: Vec<f64> = jornadas
        .iter()
        .map(|j| by_jornada.get(j).copied().unwrap_or(0.0))
        .collect();

    let df = DataFrame::new(vec![
        Series::new(JORNADA, jornadas),
        Series::new(TEAM, vec![team; jornadas.len()]),
        Series::new(metric, totals),
    ])?;
    Ok(df)
}

/// One row per player and jornada of `team`, with each metric summed over
/// the player's records in that jornada. Players appear in order of first
/// record and jornadas in the order given; a jornada the player missed has
/// zero in every metric. Identity columns come from the player's first
/// record.
pub fn player_jornada_table(
    aggregator: &Aggregator,
    team: &str,
    jornadas: &[i64],
    metrics: &[&str],
) -> Result<DataFrame> {
    log::trace!("summary::player_jornada_table");
    let selected: Vec<Jornada> = jornadas.iter().copied().map(Jornada::from).collect();
    let records = aggregator.select(team, &selected)?;
    let metrics = present_metrics(&records, metrics);

    let keys = aggregate::player_keys(&records)?;
    let rounds = columns::int_values(&records, JORNADA)?;
    let ids = columns::optional_string_values(&records, PLAYER_ID)?;
    let aliases = columns::optional_string_values(&records, ALIAS)?;
    let dorsals = if columns::has_column(&records, DORSAL) {
        columns::int_values(&records, DORSAL)?
    } else {
        vec![None; records.height()]
    };
    let values = metrics
        .iter()
        .map(|metric| columns::float_values(&records, metric))
        .collect::<Result<Vec<_>>>()?;

    // first record of each player, in order
    let mut players: Vec<usize> = vec![];
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut sums: HashMap<(usize, i64), Vec<f64>> = HashMap::new();
    for (row, (key, jornada)) in keys.iter().zip(&rounds).enumerate() {
        let (Some(key), Some(jornada)) = (key, jornada) else {
            continue;
        };
        let player = *index.entry(key.as_str()).or_insert_with(|| {
            players.push(row);
            players.len() - 1
        });
        let totals = sums.entry((player, *jornada)).or_insert_with(|| vec![0.0; metrics.len()]);
        for (total, column) in totals.iter_mut().zip(&values) {
            *total += column[row].unwrap_or(0.0);
        }
    }
    log::debug!("{} players over {} jornadas", players.len(), jornadas.len());

    let mut id_column = vec![];
    let mut alias_column = vec![];
    let mut dorsal_column = vec![];
    let mut jornada_column = vec![];
    let mut metric_columns = vec![Vec::new(); metrics.len()];
    for (player, &first) in players.iter().enumerate() {
        for jornada in jornadas {
            id_column.push(ids[first].clone());
            alias_column.push(aliases[first].clone());
            dorsal_column.push(dorsals[first]);
            jornada_column.push(*jornada);
            let totals = sums.get(&(player, *jornada));
            for (m, column) in metric_columns.iter_mut().enumerate() {
                column.push(totals.map_or(0.0, |t| t[m]));
            }
        }
    }

    let mut series = vec![
        Series::new(PLAYER_ID, id_column),
        Series::new(ALIAS, alias_column),
        Series::new(DORSAL, dorsal_column),
        Series::new(JORNADA, jornada_column),
    ];
    for (metric, column) in metrics.iter().zip(metric_columns) {
        series.push(Series::new(metric, column));
    }
    Ok(DataFrame::new(series)?)
}

fn present_metrics<'m>(df: &DataFrame, metrics: &[&'m str]) -> Vec<&'m str> {
    metrics
        .iter()
        .copied()
        .filter(|metric| {
            let present = columns::has_column(df, metric);
            if !present {
                log::warn!("Skipping missing metric '{}'", metric);
            }
            present
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{MAX_SPEED, MINUTES, MINUTES_FIRST_HALF, SPRINTS_OVER_21};

    fn dataset() -> PerformanceDf {
        let df = df!(
            TEAM => &["Villarreal CF", "Villarreal CF", "Getafe CF", "Getafe CF", "Villarreal CF"],
            JORNADA => &[1i64, 1, 1, 2, 3],
            SPRINTS_OVER_21 => &[12i64, 8, 15, 20, 9],
            MAX_SPEED => &[32.0, 30.0, 34.0, 29.0, 31.0]
        )
        .unwrap();
        PerformanceDf::new(df)
    }

    #[test]
    fn league_means_span_all_teams() {
        let jornadas = [Jornada::Number(1), Jornada::Number(2)];
        let means = league_means(&dataset(), &jornadas, &[MAX_SPEED, "Goles"]).unwrap();

        assert_eq!(means.width(), 1);
        assert_eq!(columns::float_values(&means, MAX_SPEED).unwrap(), vec![Some(31.25)]);
    }

    #[test]
    fn totals_fill_missing_jornadas_with_zero() {
        let totals = team_totals_by_jornada(&dataset(), "Villarreal CF", &[1, 2, 3], SPRINTS_OVER_21).unwrap();

        assert_eq!(columns::int_values(&totals, JORNADA).unwrap(), vec![Some(1), Some(2), Some(3)]);
        assert_eq!(
            columns::float_values(&totals, SPRINTS_OVER_21).unwrap(),
            vec![Some(20.0), Some(0.0), Some(9.0)]
        );
    }

    #[test]
    fn player_table_zero_fills_missed_jornadas() {
        let df = df!(
            PLAYER_ID => &[Some("1"), Some("2"), Some("1"), None, Some("9")],
            ALIAS => &["Pau", "Parejo", "Pau", "Moleiro", "Mayoral"],
            DORSAL => &[4i64, 10, 4, 21, 22],
            TEAM => &["Villarreal CF", "Villarreal CF", "Villarreal CF", "Villarreal CF", "Getafe CF"],
            JORNADA => &[1i64, 1, 3, 3, 1],
            MINUTES_FIRST_HALF => &[45.0, 45.0, 45.0, 10.0, 45.0],
            MINUTES => &[90.0, 60.0, 90.0, 10.0, 90.0]
        )
        .unwrap();
        let dataset = PerformanceDf::new(df);
        let aggregator = Aggregator::new(&dataset).unwrap();
        let table =
            player_jornada_table(&aggregator, "Villarreal CF", &[1, 2, 3], &[MINUTES_FIRST_HALF, MINUTES, "Goles"])
                .unwrap();

        assert_eq!(table.height(), 9);
        assert!(!columns::has_column(&table, "Goles"));
        let aliases: Vec<String> = columns::string_values(&table, ALIAS)
            .unwrap()
            .into_iter()
            .map(Option::unwrap)
            .collect();
        assert_eq!(aliases, ["Pau", "Pau", "Pau", "Parejo", "Parejo", "Parejo", "Moleiro", "Moleiro", "Moleiro"]);
        let rounds = columns::int_values(&table, JORNADA).unwrap();
        assert_eq!(rounds[..3], [Some(1i64), Some(2), Some(3)]);
        assert_eq!(
            columns::float_values(&table, MINUTES).unwrap(),
            vec![Some(90.0), Some(0.0), Some(90.0), Some(60.0), Some(0.0), Some(0.0), Some(0.0), Some(0.0), Some(10.0)]
        );
        assert_eq!(columns::int_values(&table, DORSAL).unwrap()[3], Some(10));
        assert_eq!(columns::string_values(&table, PLAYER_ID).unwrap()[6], None);
    }
}
