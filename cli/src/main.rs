use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use fisico::{
    columns::{
        self, ALIAS, DORSAL, MINUTES, MINUTES_FIRST_HALF, MINUTES_SECOND_HALF, NAME, PLAYER_ID, POSITION,
        SPRINTS_OVER_21,
    },
    filter::{self, RecordFilter},
    fixture::{Venue, DEFAULT_LAST_MATCHES},
    lineup::{self, LineupEntry, LineupOptions, PitchSlot, STARTING_SLOTS},
    report, summary, AggregateOptions, Aggregator, Jornada, MinutesRule, PerformanceDf,
};
use itertools::Itertools;
use log::LevelFilter;
use polars::prelude::*;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        default_value = "prueba_extraccion/data/rendimiento_fisico.parquet"
    )]
    file: PathBuf,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Canonical team names
    Teams {
        /// Print every raw name with its canonical name
        #[arg(long)]
        mapping: bool,
    },
    /// Jornadas present in the dataset
    Jornadas {
        #[arg(short = 't', long = "team")]
        team: Option<String>,
    },
    /// Squad list of a team
    Players {
        #[arg(short = 't', long = "team")]
        team: String,
    },
    /// Distance and speed columns of the dataset
    Columns,
    /// Per-player totals over a set of jornadas
    Aggregate {
        #[arg(short = 't', long = "team")]
        team: String,

        /// Comma separated, e.g. J10,J11,12
        #[arg(short = 'j', long = "jornadas", value_delimiter = ',')]
        jornadas: Vec<Jornada>,

        #[arg(long, requires = "to", conflicts_with = "jornadas")]
        from: Option<i64>,

        #[arg(long, requires = "from")]
        to: Option<i64>,

        #[arg(short = 'm', long = "min-minutes")]
        min_minutes: f64,

        /// Keep players by average minutes instead of per match
        #[arg(long)]
        average: bool,

        /// Metric column to sort by, descending
        #[arg(long)]
        sort: Option<String>,

        /// SQL condition over the aggregated rows, e.g. "Partidos >= 2"
        #[arg(long = "where")]
        condition: Option<String>,

        /// Directory to write the CSV report into
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },
    /// Probable starting eleven
    Lineup {
        #[arg(short = 't', long = "team")]
        team: String,

        #[arg(short = 'j', long = "jornada")]
        jornada: Jornada,

        #[arg(long)]
        fallback: Option<PitchSlot>,

        #[arg(long)]
        lookback: Option<usize>,
    },
    /// Players of a team's last matches, grouped by pitch slot
    Matches {
        #[arg(short = 't', long = "team")]
        team: String,

        #[arg(short = 'j', long = "jornada")]
        jornada: Jornada,

        #[arg(short = 'm', long = "min-minutes")]
        min_minutes: f64,

        #[arg(long)]
        venue: Option<Venue>,

        #[arg(long, default_value_t = DEFAULT_LAST_MATCHES)]
        count: usize,

        #[arg(long, default_value = "box_to_box")]
        fallback: PitchSlot,
    },
    /// Per-player values in each jornada, zero where the player did not play
    ByJornada {
        #[arg(short = 't', long = "team")]
        team: String,

        #[arg(short = 'j', long = "jornadas", value_delimiter = ',', required = true)]
        jornadas: Vec<Jornada>,

        /// Metric columns, comma separated. Defaults to minutes per half and total
        #[arg(long, value_delimiter = ',')]
        metrics: Vec<String>,

        /// Directory to write the CSV report into
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },
    /// League means of the peak-speed metrics
    League {
        #[arg(short = 'j', long = "jornadas", value_delimiter = ',', required = true)]
        jornadas: Vec<Jornada>,
    },
    /// Team sprint totals per jornada
    Sprints {
        #[arg(short = 't', long = "team")]
        team: String,

        #[arg(short = 'j', long = "jornadas", value_delimiter = ',', required = true)]
        jornadas: Vec<Jornada>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new().add_filter_allow_str("fisico").build();
    TermLogger::init(default_level, config, TerminalMode::Mixed, ColorChoice::Auto)?;

    log::trace!("Args {:#?}", args);

    let (dataset, mapping) = PerformanceDf::load(&args.file)?.normalize()?;

    match args.command {
        Command::Teams { mapping: true } => {
            for (raw, canonical) in mapping.iter() {
                println!("{} -> {}", raw, canonical);
            }
        }
        Command::Teams { mapping: false } => {
            for team in dataset.available_teams()? {
                println!("{}", team);
            }
        }
        Command::Jornadas { team } => {
            let jornadas = dataset.available_jornadas(team.as_deref())?;
            println!("{}", jornadas.iter().map(|j| format!("J{}", j)).join(", "));
        }
        Command::Players { team } => {
            let aggregator = Aggregator::new(&dataset)?;
            let filter = RecordFilter::new().team(&team).build();
            let players = aggregator.select_with(filter)?.unique_players()?;
            println!("{}", select_present(&players, &[PLAYER_ID, DORSAL, ALIAS, NAME, POSITION])?);
        }
        Command::Columns => {
            println!("Distance columns:");
            for name in columns::distance_columns(&dataset) {
                println!("  {}", name);
            }
            println!("Speed columns:");
            for name in columns::speed_columns(&dataset) {
                println!("  {}", name);
            }
        }
        Command::Aggregate {
            team,
            jornadas,
            from,
            to,
            min_minutes,
            average,
            sort,
            condition,
            out,
        } => {
            let jornadas = match (from, to) {
                (Some(from), Some(to)) => dataset
                    .available_jornadas(Some(&team))?
                    .into_iter()
                    .filter(|j| (from..=to).contains(j))
                    .map(Jornada::from)
                    .collect(),
                _ if !jornadas.is_empty() => jornadas,
                _ => bail!("Pass --jornadas or --from/--to"),
            };
            let rule = if average { MinutesRule::Average } else { MinutesRule::PerMatch };
            let options = AggregateOptions::new(min_minutes).rule(rule);

            let aggregator = Aggregator::new(&dataset)?;
            let mut totals = aggregator.aggregate(&team, &jornadas, &options)?;
            if totals.height() == 0 {
                bail!("No players of {} reached {} minutes", team, min_minutes);
            }
            if let Some(metric) = sort {
                totals = totals.sort_by(&metric)?;
            }
            let mut df = match condition {
                Some(condition) => {
                    let query = format!("SELECT * FROM records WHERE {}", condition);
                    filter::filter_sql(totals.into_inner().lazy(), &query)?.collect()?
                }
                None => totals.into_inner(),
            };
            println!("{}", df);

            if let Some(dir) = out {
                let numbers: Vec<i64> = jornadas.iter().filter_map(Jornada::number).collect();
                let path = dir.join(report::report_file_name("aggregate", &team, &numbers));
                report::write_csv(&mut df, &path)?;
                println!("Saved {}", path.display());
            }
        }
        Command::Lineup {
            team,
            jornada,
            fallback,
            lookback,
        } => {
            let Some(reference) = jornada.number() else {
                bail!("Jornada must be a number, got {}", jornada);
            };
            let mut options = LineupOptions::default();
            if let Some(fallback) = fallback {
                options.fallback = fallback;
            }
            if let Some(lookback) = lookback {
                options.lookback = lookback;
            }

            let aggregator = Aggregator::new(&dataset)?;
            let eleven = aggregator.probable_eleven(&team, reference, &options)?;
            if eleven.players.is_empty() {
                bail!("No data for {} up to {}", team, jornada);
            }
            println!(
                "{} probable eleven ({})",
                team,
                eleven.jornadas.iter().map(|j| format!("J{}", j)).join(", ")
            );
            for slot in STARTING_SLOTS {
                match eleven.players.get(&slot) {
                    Some(player) => println!("{:<20} {}", slot.to_string(), describe(player)),
                    None => println!("{:<20} -", slot.to_string()),
                }
            }
        }
        Command::Matches {
            team,
            jornada,
            min_minutes,
            venue,
            count,
            fallback,
        } => {
            let Some(max_jornada) = jornada.number() else {
                bail!("Jornada must be a number, got {}", jornada);
            };
            let aggregator = Aggregator::new(&dataset)?;
            let matches = aggregator.last_matches(&team, max_jornada, venue, count, min_minutes)?;
            if matches.is_empty() {
                bail!("No matches for {} up to {}", team, jornada);
            }
            for recent in matches {
                println!("J{} {} ({}) vs {}", recent.jornada, recent.label, recent.venue, recent.rival);
                let players = LineupEntry::from_frame(&recent.players, MINUTES)?;
                for (slot, players) in lineup::group_by_slot(players, fallback) {
                    println!("  {:<20} {}", slot.to_string(), players.iter().map(describe).join(", "));
                }
            }
        }
        Command::ByJornada {
            team,
            jornadas,
            metrics,
            out,
        } => {
            let numbers: Vec<i64> = jornadas.iter().filter_map(Jornada::number).collect();
            let metrics: Vec<&str> = if metrics.is_empty() {
                vec![MINUTES_FIRST_HALF, MINUTES_SECOND_HALF, MINUTES]
            } else {
                metrics.iter().map(String::as_str).collect()
            };
            let aggregator = Aggregator::new(&dataset)?;
            let mut df = summary::player_jornada_table(&aggregator, &team, &numbers, &metrics)?;
            if df.height() == 0 {
                bail!("No records of {} in {}", team, jornadas.iter().join(", "));
            }
            println!("{}", df);

            if let Some(dir) = out {
                let path = dir.join(report::report_file_name("by_jornada", &team, &numbers));
                report::write_csv(&mut df, &path)?;
                println!("Saved {}", path.display());
            }
        }
        Command::League { jornadas } => {
            let metrics = columns::speed_columns(&dataset);
            let metrics: Vec<&str> = metrics
                .iter()
                .map(String::as_str)
                .filter(|name| name.starts_with("Velocidad"))
                .collect();
            println!("{}", summary::league_means(&dataset, &jornadas, &metrics)?);
        }
        Command::Sprints { team, jornadas } => {
            let numbers: Vec<i64> = jornadas.iter().filter_map(Jornada::number).collect();
            println!(
                "{}",
                summary::team_totals_by_jornada(&dataset, &team, &numbers, SPRINTS_OVER_21)?
            );
        }
    }

    Ok(())
}

fn describe(player: &LineupEntry) -> String {
    let dorsal = player.dorsal.map_or_else(|| "-".to_string(), |d| d.to_string());
    let alias = player.alias.as_deref().unwrap_or(&player.player_id);
    format!("{} {} ({:.0} min)", dorsal, alias, player.minutes)
}

fn select_present(df: &DataFrame, names: &[&str]) -> Result<DataFrame> {
    let present: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| columns::has_column(df, name))
        .collect();
    Ok(df.select(present)?)
}
