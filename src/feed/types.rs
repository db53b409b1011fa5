use serde::{Deserialize, Serialize};

/// Normalized internal types used by the merge engine and store (provider-agnostic).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Pregame,
    Live,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pregame => "pregame",
            MatchStatus::Live => "live",
        }
    }

    /// Anything that is not literally "live" collapses to pregame.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("live") {
            MatchStatus::Live
        } else {
            MatchStatus::Pregame
        }
    }

    pub fn is_live(&self) -> bool {
        *self == MatchStatus::Live
    }
}

/// Which provider(s) contributed to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    /// Provider A: the 1xBet-style line feed.
    Xbet,
    /// Provider B: the ISCJXXQGMB line hierarchy.
    Iscj,
    Both,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Xbet => "xbet",
            DataSource::Iscj => "iscjxxqgmb",
            DataSource::Both => "both",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "xbet" => Some(DataSource::Xbet),
            "iscjxxqgmb" => Some(DataSource::Iscj),
            "both" => Some(DataSource::Both),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A home/away pair of counters, e.g. corners or cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub home: u32,
    pub away: u32,
}

/// Sport-family specific statistics. Only the family of the match's sport
/// is ever populated; sports outside the catalog get `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum SportStats {
    #[default]
    None,
    Football {
        corners: Option<Pair>,
        yellow_cards: Option<Pair>,
        red_cards: Option<Pair>,
    },
    Cricket {
        overs: Option<String>,
        wickets: Option<u32>,
        runs: Option<String>,
    },
    Quarters {
        quarter: Option<u8>,
    },
    Racket {
        set_number: Option<u8>,
        games: Option<String>,
    },
    Innings {
        inning: Option<u8>,
    },
    Periods {
        period: Option<u8>,
    },
    Combat {
        round: Option<u8>,
    },
    Frames {
        frame: Option<u8>,
    },
    Darts {
        leg: Option<u8>,
        set_number: Option<u8>,
    },
    Chess {
        move_number: Option<u32>,
    },
    Esports {
        round: Option<u8>,
    },
}

impl SportStats {
    /// True when no counter of any family is populated.
    pub fn is_empty(&self) -> bool {
        match self {
            SportStats::None => true,
            SportStats::Football { corners, yellow_cards, red_cards } => {
                corners.is_none() && yellow_cards.is_none() && red_cards.is_none()
            }
            SportStats::Cricket { overs, wickets, runs } => {
                overs.is_none() && wickets.is_none() && runs.is_none()
            }
            SportStats::Quarters { quarter } => quarter.is_none(),
            SportStats::Racket { set_number, games } => set_number.is_none() && games.is_none(),
            SportStats::Innings { inning } => inning.is_none(),
            SportStats::Periods { period } => period.is_none(),
            SportStats::Combat { round } => round.is_none(),
            SportStats::Frames { frame } => frame.is_none(),
            SportStats::Darts { leg, set_number } => leg.is_none() && set_number.is_none(),
            SportStats::Chess { move_number } => move_number.is_none(),
            SportStats::Esports { round } => round.is_none(),
        }
    }
}

/// Canonical Match Record: the unit every provider payload is normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Provider-assigned; unique within a provider only.
    pub match_id: String,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub tournament: String,
    /// Unix seconds; 0 means unknown.
    pub start_time: i64,
    pub status: MatchStatus,
    pub period: u8,
    /// "H:A" or empty.
    pub score: String,
    pub odds_home: Option<f64>,
    pub odds_away: Option<f64>,
    pub odds_draw: Option<f64>,
    pub odds_total_over: Option<f64>,
    pub odds_total_under: Option<f64>,
    pub total_title: Option<String>,
    pub odds_handicap_home: Option<f64>,
    pub odds_handicap_away: Option<f64>,
    pub handicap_title: Option<String>,
    pub event_count: u32,
    pub home_team_id: Option<i64>,
    pub away_team_id: Option<i64>,
    pub stoppage_time: bool,
    pub half_time: bool,
    pub stats: SportStats,
    pub data_source: DataSource,
}

impl MatchRecord {
    /// A record with every optional field empty. Adapters fill in the rest.
    pub fn new(
        source: DataSource,
        sport: &str,
        match_id: String,
        home_team: String,
        away_team: String,
    ) -> Self {
        Self {
            match_id,
            sport: sport.to_string(),
            home_team,
            away_team,
            tournament: String::new(),
            start_time: 0,
            status: MatchStatus::Pregame,
            period: 1,
            score: String::new(),
            odds_home: None,
            odds_away: None,
            odds_draw: None,
            odds_total_over: None,
            odds_total_under: None,
            total_title: None,
            odds_handicap_home: None,
            odds_handicap_away: None,
            handicap_title: None,
            event_count: 0,
            home_team_id: None,
            away_team_id: None,
            stoppage_time: false,
            half_time: false,
            stats: SportStats::None,
            data_source: source,
        }
    }

    /// Parse the score into (home, away) goals. Returns None for empty or
    /// malformed scores.
    pub fn goals(&self) -> Option<(u32, u32)> {
        let (h, a) = self.score.split_once(':')?;
        Some((h.trim().parse().ok()?, a.trim().parse().ok()?))
    }
}
