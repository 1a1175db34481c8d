use crate::Result;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// `"{kind}_{team}_J{first}-J{last}.csv"`, with the team name lowercased and
/// spaces replaced by underscores. A single jornada is written as `J{n}`.
pub fn report_file_name(kind: &str, team: &str, jornadas: &[i64]) -> String {
    let team_slug = team.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("_");
    let first = jornadas.iter().min();
    let last = jornadas.iter().max();
    let range = match (first, last) {
        (Some(first), Some(last)) if first == last => format!("J{}", first),
        (Some(first), Some(last)) => format!("J{}-J{}", first, last),
        _ => "sin_jornadas".to_string(),
    };
    format!("{}_{}_{}.csv", kind, team_slug, range)
}

pub fn write_csv<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    log::info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_embed_team_and_range() {
        assert_eq!(
            report_file_name("aggregate", "Villarreal CF", &[12, 10, 11]),
            "aggregate_villarreal_cf_J10-J12.csv"
        );
        assert_eq!(report_file_name("lineup", "Getafe CF", &[7]), "lineup_getafe_cf_J7.csv");
        assert_eq!(report_file_name("league", "Girona FC", &[]), "league_girona_fc_sin_jornadas.csv");
    }

    #[test]
    fn writes_csv() {
        let mut df = df!("Alias" => &["Pau", "Parejo"], "Partidos" => &[3u32, 2]).unwrap();
        let path = std::env::temp_dir().join(format!("fisico-report-{}.csv", std::process::id()));

        write_csv(&mut df, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(written, "Alias,Partidos\nPau,3\nParejo,2\n");
    }
}
