use crate::feed::types::MatchRecord;

/// Cross-provider identity of a real-world match.
///
/// Providers never share match ids, so identity is derived from content.
/// `start_time` must match exactly: a one-second disagreement between
/// providers yields two distinct keys and the records will not merge.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct IdentityKey {
    pub home: String,
    pub away: String,
    pub tournament: String,
    pub start_time: i64,
}

impl IdentityKey {
    pub fn new(home: &str, away: &str, tournament: &str, start_time: i64) -> Self {
        Self {
            home: norm(home),
            away: norm(away),
            tournament: norm(tournament),
            start_time,
        }
    }

    pub fn from_record(rec: &MatchRecord) -> Self {
        Self::new(&rec.home_team, &rec.away_team, &rec.tournament, rec.start_time)
    }
}

/// Lowercase and trim.
pub fn norm(s: &str) -> String {
    s.trim().to_lowercase()
}
