//! Pitch slots, probable starting eleven and per-slot grouping of players.

use crate::{
    aggregate::{AggregateOptions, Aggregator},
    columns::{self, ALIAS, DORSAL, PLAYER_ID, POSITION, TOTAL_MINUTES},
    Jornada, Result,
};
use parse_display::{Display, FromStr};
use polars::prelude::*;
use std::collections::BTreeMap;

/// Jornadas looked back over when picking a probable eleven.
pub const DEFAULT_LOOKBACK: usize = 5;

/// A place on the pitch in a 4-3-3 drawing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, FromStr)]
#[display(style = "snake_case")]
pub enum PitchSlot {
    Goalkeeper,
    RightBack,
    RightCentreBack,
    LeftCentreBack,
    LeftBack,
    HoldingMidfielder,
    BoxToBox,
    Playmaker,
    RightWing,
    LeftWing,
    AttackingMidfielder,
    Striker,
    SecondStriker,
}

/// Slots filled in a probable eleven, goalkeeper first.
pub const STARTING_SLOTS: [PitchSlot; 11] = [
    PitchSlot::Goalkeeper,
    PitchSlot::RightBack,
    PitchSlot::RightCentreBack,
    PitchSlot::LeftCentreBack,
    PitchSlot::LeftBack,
    PitchSlot::HoldingMidfielder,
    PitchSlot::BoxToBox,
    PitchSlot::Playmaker,
    PitchSlot::RightWing,
    PitchSlot::LeftWing,
    PitchSlot::Striker,
];

impl PitchSlot {
    /// Slot of a demarcation label as written in the dataset. Unknown labels
    /// and the no-position sentinel have no slot.
    pub fn from_demarcation(label: &str) -> Option<Self> {
        let slot = match label.trim() {
            "Portero" => PitchSlot::Goalkeeper,
            "Defensa - Lateral Derecho" => PitchSlot::RightBack,
            "Defensa - Central Derecho" => PitchSlot::RightCentreBack,
            "Defensa - Central Izquierdo" => PitchSlot::LeftCentreBack,
            "Defensa - Lateral Izquierdo" => PitchSlot::LeftBack,
            "Centrocampista - MC Posicional" => PitchSlot::HoldingMidfielder,
            "Centrocampista - MC Box to Box" => PitchSlot::BoxToBox,
            "Centrocampista - MC Organizador" => PitchSlot::Playmaker,
            "Centrocampista de ataque - Banda Derecha" => PitchSlot::RightWing,
            "Centrocampista de ataque - Banda Izquierda" => PitchSlot::LeftWing,
            "Centrocampista de ataque - Mediapunta" => PitchSlot::AttackingMidfielder,
            "Delantero - Delantero Centro" => PitchSlot::Striker,
            "Delantero - Segundo Delantero" => PitchSlot::SecondStriker,
            _ => return None,
        };
        Some(slot)
    }

    pub fn resolve(label: Option<&str>, fallback: PitchSlot) -> Self {
        label.and_then(Self::from_demarcation).unwrap_or(fallback)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct LineupOptions {
    /// Slot for players whose demarcation has no slot of its own.
    pub fallback: PitchSlot,
    pub lookback: usize,
}

impl Default for LineupOptions {
    fn default() -> Self {
        Self {
            fallback: PitchSlot::HoldingMidfielder,
            lookback: DEFAULT_LOOKBACK,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineupEntry {
    pub player_id: String,
    pub alias: Option<String>,
    pub dorsal: Option<i64>,
    pub position: Option<String>,
    pub minutes: f64,
}

impl LineupEntry {
    /// Reads one entry per row, taking minutes from `minutes_column`. Rows
    /// without a player id are skipped.
    pub fn from_frame(df: &DataFrame, minutes_column: &str) -> Result<Vec<LineupEntry>> {
        let ids = columns::string_values(df, PLAYER_ID)?;
        let minutes = columns::float_values(df, minutes_column)?;
        let aliases = columns::optional_string_values(df, ALIAS)?;
        let positions = columns::optional_string_values(df, POSITION)?;
        let dorsals = if columns::has_column(df, DORSAL) {
            columns::int_values(df, DORSAL)?
        } else {
            vec![None; df.height()]
        };

        let entries = ids
            .into_iter()
            .zip(minutes)
            .zip(aliases.into_iter().zip(positions))
            .zip(dorsals)
            .filter_map(|(((id, minutes), (alias, position)), dorsal)| {
                Some(LineupEntry {
                    player_id: id?,
                    alias,
                    dorsal,
                    position,
                    minutes: minutes.unwrap_or(0.0),
                })
            })
            .collect();
        Ok(entries)
    }

    pub fn slot(&self, fallback: PitchSlot) -> PitchSlot {
        PitchSlot::resolve(self.position.as_deref(), fallback)
    }
}


#[derive(Clone, Debug, Default)]
pub struct ProbableEleven {
    /// Jornadas the lineup was computed over, ascending.
    pub jornadas: Vec<i64>,
    pub players: BTreeMap<PitchSlot, LineupEntry>,
}

impl<'a> Aggregator<'a> {
    /// For every starting slot, the player with most minutes over the last
    /// `options.lookback` jornadas up to `reference`.
    pub fn probable_eleven(&self, team: &str, reference: i64, options: &LineupOptions) -> Result<ProbableEleven> {
        log::trace!("lineup::probable_eleven");
        let jornadas = self.dataset().last_jornadas(team, reference, options.lookback)?;
        if jornadas.is_empty() {
            log::warn!("No jornadas for {} up to J{}", team, reference);
            return Ok(ProbableEleven::default());
        }
        log::info!("Probable eleven for {} over jornadas {:?}", team, jornadas);

        let selected: Vec<Jornada> = jornadas.iter().copied().map(Jornada::from).collect();
        let totals = self.aggregate(team, &selected, &AggregateOptions::new(0.0))?;
        if totals.height() == 0 {
            return Ok(ProbableEleven { jornadas, players: BTreeMap::new() });
        }

        let mut players: BTreeMap<PitchSlot, LineupEntry> = BTreeMap::new();
        for entry in LineupEntry::from_frame(&totals, TOTAL_MINUTES)? {
            let slot = entry.slot(options.fallback);
            if !STARTING_SLOTS.contains(&slot) {
                continue;
            }
            // Ties keep the player listed first.
            let better = players.get(&slot).map_or(true, |best| entry.minutes > best.minutes);
            if better {
                players.insert(slot, entry);
            }
        }
        for (slot, entry) in &players {
            log::debug!("{}: {} ({} min)", slot, entry.player_id, entry.minutes);
        }
        Ok(ProbableEleven { jornadas, players })
    }
}

/// Groups players by slot, most minutes first, then balances the centre
/// backs and splits the centre forwards.
///
/// When one centre-back side is empty and the other holds two or more, the
/// last player moves across. Two or more strikers are split in half; the
/// larger half stays and the rest join the second strikers.
pub fn group_by_slot(mut players: Vec<LineupEntry>, fallback: PitchSlot) -> BTreeMap<PitchSlot, Vec<LineupEntry>> {
    players.sort_by(|a, b| b.minutes.total_cmp(&a.minutes));

    let mut slots: BTreeMap<PitchSlot, Vec<LineupEntry>> = BTreeMap::new();
    for player in players {
        slots.entry(player.slot(fallback)).or_default().push(player);
    }

    let right = slots.get(&PitchSlot::RightCentreBack).map_or(0, Vec::len);
    let left = slots.get(&PitchSlot::LeftCentreBack).map_or(0, Vec::len);
    if left == 0 && right > 1 {
        move_last(&mut slots, PitchSlot::RightCentreBack, PitchSlot::LeftCentreBack);
    } else if right == 0 && left > 1 {
        move_last(&mut slots, PitchSlot::LeftCentreBack, PitchSlot::RightCentreBack);
    }

    if let Some(strikers) = slots.get_mut(&PitchSlot::Striker) {
        if strikers.len() > 1 {
            let half = strikers.len().div_ceil(2);
            let second = strikers.split_off(half);
            slots.entry(PitchSlot::SecondStriker).or_default().extend(second);
        }
    }

    slots
}

fn move_last(slots: &mut BTreeMap<PitchSlot, Vec<LineupEntry>>, from: PitchSlot, to: PitchSlot) {
    if let Some(player) = slots.get_mut(&from).and_then(Vec::pop) {
        log::debug!("{} moved from {} to {}", player.player_id, from, to);
        slots.entry(to).or_default().push(player);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, position: &str, minutes: f64) -> LineupEntry {
        LineupEntry {
            player_id: id.to_string(),
            alias: Some(id.to_string()),
            dorsal: None,
            position: Some(position.to_string()),
            minutes,
        }
    }

    fn ids(players: &[LineupEntry]) -> Vec<&str> {
        players.iter().map(|p| p.player_id.as_str()).collect()
    }

    #[test]
    fn maps_demarcations() {
        assert_eq!(PitchSlot::from_demarcation("Portero"), Some(PitchSlot::Goalkeeper));
        assert_eq!(
            PitchSlot::from_demarcation("Centrocampista - MC Box to Box"),
            Some(PitchSlot::BoxToBox)
        );
        assert_eq!(PitchSlot::from_demarcation("Sin Posición"), None);
        assert_eq!(PitchSlot::resolve(Some("Sin Posición"), PitchSlot::BoxToBox), PitchSlot::BoxToBox);
        assert_eq!(PitchSlot::resolve(None, PitchSlot::HoldingMidfielder), PitchSlot::HoldingMidfielder);
    }

    #[test]
    fn slot_names_round_trip_through_text() {
        assert_eq!(PitchSlot::RightCentreBack.to_string(), "right_centre_back");
        assert_eq!("box_to_box".parse::<PitchSlot>().unwrap(), PitchSlot::BoxToBox);
        assert!("libero".parse::<PitchSlot>().is_err());
    }

    #[test]
    fn moves_a_centre_back_to_the_empty_side() {
        let players = vec![
            entry("albiol", "Defensa - Central Derecho", 80.0),
            entry("foyth", "Defensa - Central Derecho", 90.0),
            entry("bailly", "Defensa - Central Derecho", 70.0),
        ];
        let slots = group_by_slot(players, PitchSlot::HoldingMidfielder);

        assert_eq!(ids(&slots[&PitchSlot::RightCentreBack]), vec!["foyth", "albiol"]);
        assert_eq!(ids(&slots[&PitchSlot::LeftCentreBack]), vec!["bailly"]);
    }

    #[test]
    fn single_centre_back_stays() {
        let players = vec![entry("albiol", "Defensa - Central Derecho", 80.0)];
        let slots = group_by_slot(players, PitchSlot::HoldingMidfielder);
        assert_eq!(slots[&PitchSlot::RightCentreBack].len(), 1);
        assert!(!slots.contains_key(&PitchSlot::LeftCentreBack));
    }

    #[test]
    fn splits_strikers() {
        let players = vec![
            entry("moreno", "Delantero - Delantero Centro", 85.0),
            entry("ayoze", "Delantero - Delantero Centro", 90.0),
            entry("mikautadze", "Delantero - Delantero Centro", 60.0),
            entry("barry", "Delantero - Segundo Delantero", 30.0),
        ];
        let slots = group_by_slot(players, PitchSlot::HoldingMidfielder);

        assert_eq!(ids(&slots[&PitchSlot::Striker]), vec!["ayoze", "moreno"]);
        assert_eq!(ids(&slots[&PitchSlot::SecondStriker]), vec!["barry", "mikautadze"]);
    }

    #[test]
    fn unknown_positions_use_fallback() {
        let players = vec![entry("nuevo", "Sin Posición", 45.0)];
        let slots = group_by_slot(players, PitchSlot::BoxToBox);
        assert_eq!(ids(&slots[&PitchSlot::BoxToBox]), vec!["nuevo"]);
    }

    #[test]
    fn reads_entries_from_a_frame() {
        let df = df!(
            PLAYER_ID => &[Some("1"), None, Some("3")],
            ALIAS => &["Pau", "x", "Pépé"],
            TOTAL_MINUTES => &[180.0, 90.0, 95.5]
        )
        .unwrap();
        let entries = LineupEntry::from_frame(&df, TOTAL_MINUTES).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].alias.as_deref(), Some("Pépé"));
        assert_eq!(entries[1].minutes, 95.5);
        assert_eq!(entries[1].position, None);
        assert_eq!(entries[0].dorsal, None);
    }
}
