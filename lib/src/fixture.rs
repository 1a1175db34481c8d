//! Match labels (`"athleticclub1-0valenciacf"`) and a team's recent matches.

use crate::{
    aggregate::Aggregator,
    columns::{self, JORNADA, MATCH, MINUTES},
    filter::RecordFilter,
    performance::PerformanceDf,
    similarity, Result,
};
use itertools::Itertools;
use parse_display::{Display, FromStr};
use polars::prelude::*;

/// Matches shown in a recent-matches report.
pub const DEFAULT_LAST_MATCHES: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, FromStr)]
#[display(style = "lowercase")]
pub enum Venue {
    Home,
    Away,
    Unknown,
}

/// Both sides of a match label, with goals when the label carries them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchLabel {
    pub home: String,
    pub away: String,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
}

impl MatchLabel {
    /// Which side `team` plays on: the side whose name is more similar to
    /// it. Equal similarity is `Unknown`.
    pub fn venue(&self, team: &str) -> Venue {
        let home = similarity::ratio(team, &self.home);
        let away = similarity::ratio(team, &self.away);
        if home > away {
            Venue::Home
        } else if away > home {
            Venue::Away
        } else {
            Venue::Unknown
        }
    }

    /// The side `team` is not. Equal similarity names the home side.
    pub fn rival(&self, team: &str) -> &str {
        match self.venue(team) {
            Venue::Home => &self.away,
            Venue::Away | Venue::Unknown => &self.home,
        }
    }
}

/// Splits a label on its single `-`. Trailing digits of the home side and
/// leading digits of the away side are the score. Labels without exactly
/// one `-` are not parsed.
pub fn parse_match(label: &str) -> Option<MatchLabel> {
    let (home, away) = label.split('-').collect_tuple()?;
    let (home, home_goals) = split_trailing_goals(home.trim());
    let (away_goals, away) = split_leading_goals(away.trim());
    Some(MatchLabel {
        home: home.trim().to_string(),
        away: away.trim().to_string(),
        home_goals,
        away_goals,
    })
}

// The name keeps at least one character.
fn split_trailing_goals(side: &str) -> (&str, Option<u32>) {
    let name_len = side.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let name_len = match side.chars().next() {
        Some(first) if name_len == 0 => first.len_utf8(),
        _ => name_len,
    };
    if name_len < side.len() {
        (&side[..name_len], side[name_len..].parse().ok())
    } else {
        (side, None)
    }
}

fn split_leading_goals(side: &str) -> (Option<u32>, &str) {
    let digits = side.len() - side.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let digits = if digits == side.len() { digits.saturating_sub(1) } else { digits };
    if digits > 0 {
        (side[..digits].parse().ok(), &side[digits..])
    } else {
        (None, side)
    }
}

pub fn venue(label: &str, team: &str) -> Venue {
    parse_match(label).map_or(Venue::Unknown, |m| m.venue(team))
}

/// The opponent's name, or `"Rival"` when the label does not parse.
pub fn rival(label: &str, team: &str) -> String {
    parse_match(label).map_or_else(|| "Rival".to_string(), |m| m.rival(team).to_string())
}

/// One of a team's recent matches, with the records of the players who
/// reached the minutes threshold in it.
#[derive(Clone)]
pub struct RecentMatch {
    pub label: String,
    pub jornada: i64,
    pub venue: Venue,
    pub rival: String,
    pub players: PerformanceDf,
}

impl<'a> Aggregator<'a> {
    /// The last `n` matches of `team` up to `max_jornada`, most recent first,
    /// optionally only those played at `venue`. Matches where no player
    /// reached `min_minutes` are left out.
    pub fn last_matches(
        &self,
        team: &str,
        max_jornada: i64,
        venue: Option<Venue>,
        n: usize,
        min_minutes: f64,
    ) -> Result<Vec<RecentMatch>> {
        log::trace!("fixture::last_matches");
        let filter = RecordFilter::new().team(team).up_to_jornada(max_jornada).build();
        let records = self.select_with(filter)?;
        columns::require_column(&records, MATCH)?;

        let labels = columns::string_values(&records, MATCH)?;
        let jornadas = columns::int_values(&records, JORNADA)?;
        let candidates: Vec<(String, i64, Venue)> = labels
            .into_iter()
            .zip(jornadas)
            .filter_map(|(label, jornada)| Some((label?, jornada?)))
            .unique()
            .map(|(label, jornada)| {
                let venue = self::venue(&label, team);
                (label, jornada, venue)
            })
            .filter(|(_, _, v)| venue.map_or(true, |wanted| *v == wanted))
            .sorted_by(|a, b| b.1.cmp(&a.1))
            .take(n)
            .collect();
        log::debug!("{} candidate matches for {}", candidates.len(), team);

        let mut matches = vec![];
        for (label, jornada, venue) in candidates {
            let mut expr = col(MATCH).eq(lit(label.as_str()));
            if columns::has_column(&records, MINUTES) {
                expr = expr.and(col(MINUTES).cast(DataType::Float64).gt_eq(lit(min_minutes)));
            }
            let players = records.filter(expr)?;
            if players.height() == 0 {
                log::info!("J{} {}: no players with {}+ minutes", jornada, label, min_minutes);
                continue;
            }
            let rival = rival(&label, team);
            matches.push(RecentMatch {
                label,
                jornada,
                venue,
                rival,
                players,
            });
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_score_and_sides() {
        let parsed = parse_match("athleticclub1-0valenciacf").unwrap();
        assert_eq!(
            parsed,
            MatchLabel {
                home: "athleticclub".into(),
                away: "valenciacf".into(),
                home_goals: Some(1),
                away_goals: Some(0),
            }
        );

        let parsed = parse_match("villarrealcf 10 - 2 realmadrid").unwrap();
        assert_eq!(parsed.home, "villarrealcf");
        assert_eq!(parsed.home_goals, Some(10));
        assert_eq!(parsed.away, "realmadrid");
        assert_eq!(parsed.away_goals, Some(2));
    }

    #[test]
    fn labels_without_score() {
        let parsed = parse_match("Getafe CF - Sevilla FC").unwrap();
        assert_eq!(parsed.home, "Getafe CF");
        assert_eq!(parsed.away, "Sevilla FC");
        assert_eq!(parsed.home_goals, None);
        assert_eq!(parsed.away_goals, None);
    }

    #[test]
    fn needs_exactly_one_dash() {
        assert_eq!(parse_match("villarrealcf"), None);
        assert_eq!(parse_match("rcd-espanyol2-1getafecf"), None);
        assert_eq!(venue("villarrealcf", "Villarreal CF"), Venue::Unknown);
        assert_eq!(rival("a-b-c", "Villarreal CF"), "Rival");
    }

    #[test]
    fn all_digit_sides_keep_a_name() {
        assert_eq!(split_trailing_goals("123"), ("1", Some(23)));
        assert_eq!(split_leading_goals("123"), (Some(12), "3"));
    }

    #[test]
    fn finds_venue_and_rival() {
        let label = "villarrealcf2-1sevillafc";
        assert_eq!(venue(label, "Villarreal CF"), Venue::Home);
        assert_eq!(rival(label, "Villarreal CF"), "sevillafc");
        assert_eq!(venue(label, "Sevilla FC"), Venue::Away);
        assert_eq!(rival(label, "Sevilla FC"), "villarrealcf");
    }

    #[test]
    fn venue_names() {
        assert_eq!(Venue::Home.to_string(), "home");
        assert_eq!("away".parse::<Venue>().unwrap(), Venue::Away);
    }
}
