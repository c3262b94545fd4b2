// Tournament-wide aggregates for the admin summary view.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Dataset, Player, PlayerStats, Role};

/// How many leaders the top-scorer tables list.
pub const TOP_N: usize = 5;

/// A player together with the stat they lead in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatLeader {
    pub player_id: String,
    pub name: String,
    pub university: String,
    pub role: Option<Role>,
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UniversityTotals {
    pub runs: u64,
    pub wickets: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentSummary {
    pub total_runs: u64,
    pub total_wickets: u64,
    pub highest_run_scorer: Option<StatLeader>,
    pub highest_wicket_taker: Option<StatLeader>,
    pub role_distribution: BTreeMap<Role, usize>,
    pub university_performance: BTreeMap<String, UniversityTotals>,
    pub top_run_scorers: Vec<StatLeader>,
    pub top_wicket_takers: Vec<StatLeader>,
}

fn leader(stats: &PlayerStats, player: Option<&Player>, total: u32) -> StatLeader {
    StatLeader {
        player_id: stats.player_id.clone(),
        name: player.map(|p| p.name.clone()).unwrap_or_default(),
        university: player.map(|p| p.university.clone()).unwrap_or_default(),
        role: player.map(|p| p.role),
        total,
    }
}

/// First record with the strictly highest value; earlier records win ties.
fn highest<'a>(
    stats: &'a [PlayerStats],
    key: impl Fn(&PlayerStats) -> u32,
) -> Option<&'a PlayerStats> {
    stats.iter().fold(None, |best: Option<&PlayerStats>, s| match best {
        Some(b) if key(s) <= key(b) => Some(b),
        _ => Some(s),
    })
}

fn top(dataset: &Dataset, key: impl Fn(&PlayerStats) -> u32) -> Vec<StatLeader> {
    let mut ranked: Vec<&PlayerStats> = dataset.player_stats.iter().collect();
    // Stable sort keeps feed order among equal totals.
    ranked.sort_by(|a, b| key(b).cmp(&key(a)));
    ranked
        .into_iter()
        .take(TOP_N)
        .map(|s| leader(s, dataset.player(&s.player_id), key(s)))
        .collect()
}

/// Aggregate a dataset. Stats are joined to players by id.
pub fn tournament_summary(dataset: &Dataset) -> TournamentSummary {
    let runs = |s: &PlayerStats| s.runs;
    let wickets = |s: &PlayerStats| s.wickets;

    let total_runs = dataset.player_stats.iter().map(|s| u64::from(s.runs)).sum();
    let total_wickets = dataset.player_stats.iter().map(|s| u64::from(s.wickets)).sum();

    let highest_run_scorer = highest(&dataset.player_stats, runs)
        .map(|s| leader(s, dataset.player(&s.player_id), s.runs));
    let highest_wicket_taker = highest(&dataset.player_stats, wickets)
        .map(|s| leader(s, dataset.player(&s.player_id), s.wickets));

    let mut role_distribution = BTreeMap::new();
    let mut university_performance: BTreeMap<String, UniversityTotals> = BTreeMap::new();
    for player in &dataset.players {
        *role_distribution.entry(player.role).or_insert(0) += 1;

        let totals = university_performance
            .entry(player.university.clone())
            .or_default();
        if let Some(stats) = dataset.stats_for(&player.id) {
            totals.runs += u64::from(stats.runs);
            totals.wickets += u64::from(stats.wickets);
        }
    }

    TournamentSummary {
        total_runs,
        total_wickets,
        highest_run_scorer,
        highest_wicket_taker,
        role_distribution,
        university_performance,
        top_run_scorers: top(dataset, runs),
        top_wicket_takers: top(dataset, wickets),
    }
}
