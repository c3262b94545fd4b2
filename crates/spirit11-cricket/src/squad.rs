// User squads: budgeted team selection and the leaderboard built on them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Player, Role};

/// Players in a complete squad.
pub const SQUAD_SIZE: usize = 11;

/// Budget every new user starts with, in rupees.
pub const INITIAL_BUDGET: i64 = 9_000_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SquadError {
    #[error("squad is already full ({0} players)")]
    Full(usize),

    #[error("player {0} is already in the squad")]
    AlreadySelected(String),

    #[error("not enough budget: player costs {needed}, {available} remaining")]
    InsufficientBudget { needed: i64, available: i64 },
}

/// A user's selected players and the budget left to spend.
///
/// Players are stored as snapshots taken at selection time, so the price
/// refunded on removal is the price that was paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Squad {
    pub budget: i64,
    pub players: Vec<Player>,
    #[serde(default = "default_capacity")]
    capacity: usize,
}

fn default_capacity() -> usize {
    SQUAD_SIZE
}

impl Default for Squad {
    fn default() -> Self {
        Self::new(INITIAL_BUDGET)
    }
}

impl Squad {
    pub fn new(budget: i64) -> Self {
        Self::with_capacity(budget, SQUAD_SIZE)
    }

    /// Squad with a non-standard size, as configured per game.
    pub fn with_capacity(budget: i64, capacity: usize) -> Self {
        Self {
            budget,
            players: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_complete(&self) -> bool {
        self.players.len() == self.capacity
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    /// Add a player, paying their current value from the budget.
    pub fn add_player(&mut self, player: &Player) -> Result<(), SquadError> {
        if self.players.len() >= self.capacity {
            return Err(SquadError::Full(self.capacity));
        }
        if self.contains(&player.id) {
            return Err(SquadError::AlreadySelected(player.id.clone()));
        }
        if self.budget < player.value {
            return Err(SquadError::InsufficientBudget {
                needed: player.value,
                available: self.budget,
            });
        }
        self.budget -= player.value;
        self.players.push(player.clone());
        Ok(())
    }

    /// Remove a player and refund what was paid for them.
    pub fn remove_player(&mut self, player_id: &str) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == player_id)?;
        let player = self.players.remove(idx);
        self.budget += player.value;
        Some(player)
    }

    /// Sum of player points; a squad only scores once it is complete.
    pub fn team_points(&self) -> i64 {
        if !self.is_complete() {
            return 0;
        }
        self.players.iter().map(|p| p.points).sum()
    }

    pub fn spent(&self) -> i64 {
        self.players.iter().map(|p| p.value).sum()
    }

    /// Money spent per role. Roles with no players are omitted.
    pub fn spend_by_role(&self) -> BTreeMap<Role, i64> {
        let mut spend = BTreeMap::new();
        for player in &self.players {
            *spend.entry(player.role).or_insert(0) += player.value;
        }
        spend
    }

    pub fn players_in_role(&self, role: Role) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(move |p| p.role == role)
    }
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// A user's standing input: who they are and their squad.
#[derive(Debug, Clone)]
pub struct Competitor<'a> {
    pub user_id: &'a str,
    pub username: &'a str,
    pub squad: &'a Squad,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub username: String,
    pub team_points: i64,
    pub team_size: usize,
}

/// Rank users with complete squads by team points, highest first. Equal
/// points keep input order and still get distinct ranks.
pub fn leaderboard<'a>(competitors: impl IntoIterator<Item = Competitor<'a>>) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = competitors
        .into_iter()
        .filter(|c| c.squad.is_complete())
        .map(|c| LeaderboardEntry {
            rank: 0,
            user_id: c.user_id.to_string(),
            username: c.username.to_string(),
            team_points: c.squad.team_points(),
            team_size: c.squad.players.len(),
        })
        .collect();

    entries.sort_by(|a, b| b.team_points.cmp(&a.team_points));
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    entries
}
