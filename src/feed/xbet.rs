//! Provider A: 1xBet-style `LineFeed/Get1x2_VZip` line feed.
//!
//! Matches arrive as a flat `Value` array of terse, single-letter keyed
//! objects. Odds are positional: each entry of `E` carries a market group
//! `G` and an outcome type `T`.

use super::http::FeedHttp;
use super::normalize::{
    as_counter, as_int, as_odds, as_text, clean_name, derive_period, is_half_time_phase,
    is_stoppage_phase, truthy, unix_seconds,
};
use super::sports::{self, Sport, SportFamily};
use super::types::*;
use super::{FeedStats, MatchFeed, SportListing};
use crate::config::ProviderConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct XbetEnvelope {
    #[serde(rename = "Success", default)]
    success: Option<bool>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(rename = "Value", default)]
    value: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct XbetGame {
    #[serde(rename = "I", default)]
    id: Option<Value>,
    #[serde(rename = "O1", default)]
    home: Option<XbetTeam>,
    #[serde(rename = "O2", default)]
    away: Option<XbetTeam>,
    #[serde(rename = "O1I", default)]
    home_id: Option<Value>,
    #[serde(rename = "O2I", default)]
    away_id: Option<Value>,
    #[serde(rename = "LE", default)]
    league_en: Option<String>,
    #[serde(rename = "L", default)]
    league: Option<String>,
    #[serde(rename = "S", default)]
    start: Option<Value>,
    #[serde(rename = "IsLive", default)]
    is_live: Option<Value>,
    #[serde(rename = "SC", default)]
    scoreboard: Option<XbetScoreboard>,
    #[serde(rename = "E", default)]
    events: Option<Vec<XbetEvent>>,
}

/// Team names come either as a bare string or as `{ "N": name, "I": id }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum XbetTeam {
    Name(String),
    Detailed {
        #[serde(rename = "N", default)]
        name: Option<String>,
        #[serde(rename = "I", default)]
        id: Option<Value>,
    },
}

impl XbetTeam {
    fn name(&self) -> Option<&str> {
        match self {
            XbetTeam::Name(n) => Some(n),
            XbetTeam::Detailed { name, .. } => name.as_deref(),
        }
    }

    fn id(&self) -> Option<i64> {
        match self {
            XbetTeam::Name(_) => None,
            XbetTeam::Detailed { id, .. } => id.as_ref().and_then(as_int),
        }
    }
}

#[derive(Debug, Deserialize)]
struct XbetScoreboard {
    #[serde(rename = "CP", default)]
    period: Option<Value>,
    #[serde(rename = "CPS", default)]
    phase: Option<String>,
    #[serde(rename = "FS", default)]
    full_score: Option<XbetSides>,
    #[serde(rename = "PS", default)]
    period_scores: Option<Vec<XbetPeriodScore>>,
    #[serde(rename = "S", default)]
    stats: Option<Vec<XbetStat>>,
}

#[derive(Debug, Default, Deserialize)]
struct XbetSides {
    #[serde(rename = "S1", default)]
    home: Option<Value>,
    #[serde(rename = "S2", default)]
    away: Option<Value>,
}

impl XbetSides {
    /// A side the provider omits counts as 0 once the other side is present.
    fn pair(&self) -> Option<(i64, i64)> {
        let home = self.home.as_ref().and_then(as_int);
        let away = self.away.as_ref().and_then(as_int);
        if home.is_none() && away.is_none() {
            return None;
        }
        Some((home.unwrap_or(0), away.unwrap_or(0)))
    }
}

/// Per-period score, either flat `{S1, S2}` or keyed `{Key, Value: {S1, S2}}`.
#[derive(Debug, Deserialize)]
struct XbetPeriodScore {
    #[serde(rename = "S1", default)]
    home: Option<Value>,
    #[serde(rename = "S2", default)]
    away: Option<Value>,
    #[serde(rename = "Value", default)]
    value: Option<XbetSides>,
}

impl XbetPeriodScore {
    fn pair(&self) -> Option<(i64, i64)> {
        match &self.value {
            Some(sides) => sides.pair(),
            None => XbetSides {
                home: self.home.clone(),
                away: self.away.clone(),
            }
            .pair(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct XbetStat {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value", default)]
    value: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct XbetEvent {
    #[serde(rename = "C", default)]
    coef: Option<Value>,
    #[serde(rename = "G", default)]
    group: Option<i64>,
    #[serde(rename = "T", default)]
    kind: Option<i64>,
    #[serde(rename = "B", default)]
    blocked: Option<Value>,
    #[serde(rename = "P", default)]
    param: Option<XbetParam>,
}

/// `P` is a market line for handicaps/totals, or a nested participant list
/// on some payload variants.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum XbetParam {
    Line(f64),
    Outcomes(Vec<XbetEvent>),
}

#[derive(Debug, Deserialize)]
struct XbetSport {
    #[serde(rename = "I")]
    id: u32,
    #[serde(rename = "N", default)]
    name: String,
    #[serde(rename = "C1", default)]
    count: Option<u32>,
}

// ── Odds ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Outcome {
    Home,
    Away,
    Draw,
    /// Paired markets: first quotable value goes home, the next away.
    Either,
}

/// Market group / outcome type table.
fn outcome_for(group: i64, kind: i64) -> Option<Outcome> {
    match (group, kind) {
        (1, 1) | (2, 7) => Some(Outcome::Home),
        (1, 2) | (2, 8) | (17, 10) => Some(Outcome::Away),
        (1, 3) | (2, 9) | (17, 9) => Some(Outcome::Draw),
        (15, 11 | 12) | (62, 13 | 14) => Some(Outcome::Either),
        _ => None,
    }
}

/// Participant lists carry only a type code.
fn nested_outcome(kind: i64) -> Option<Outcome> {
    match kind {
        1 | 7 => Some(Outcome::Home),
        2 | 8 => Some(Outcome::Away),
        3 | 9 => Some(Outcome::Draw),
        _ => None,
    }
}

#[derive(Debug, Default, PartialEq)]
struct Moneyline {
    home: Option<f64>,
    away: Option<f64>,
    draw: Option<f64>,
}

impl Moneyline {
    /// First quotable value per outcome wins.
    fn offer(&mut self, outcome: Outcome, coef: f64) {
        let slot = match outcome {
            Outcome::Home => &mut self.home,
            Outcome::Away => &mut self.away,
            Outcome::Draw => &mut self.draw,
            Outcome::Either if self.home.is_none() => &mut self.home,
            Outcome::Either => &mut self.away,
        };
        if slot.is_none() {
            *slot = Some(coef);
        }
    }

    fn collect(events: &[XbetEvent]) -> Self {
        let mut line = Moneyline::default();
        for event in events {
            if truthy(event.blocked.as_ref()) {
                continue;
            }
            match &event.param {
                Some(XbetParam::Outcomes(participants)) => {
                    for p in participants {
                        if truthy(p.blocked.as_ref()) {
                            continue;
                        }
                        let outcome = p.kind.and_then(nested_outcome);
                        if let (Some(o), Some(c)) = (outcome, as_odds(p.coef.as_ref())) {
                            line.offer(o, c);
                        }
                    }
                }
                _ => {
                    let outcome = match (event.group, event.kind) {
                        (Some(g), Some(t)) => outcome_for(g, t),
                        _ => None,
                    };
                    if let (Some(o), Some(c)) = (outcome, as_odds(event.coef.as_ref())) {
                        line.offer(o, c);
                    }
                }
            }
        }
        line
    }
}

// ── Adapter ─────────────────────────────────────────────────────────────

fn stat_pair(stats: &[XbetStat], home_key: &str, away_key: &str) -> Option<Pair> {
    let find = |key: &str| {
        stats
            .iter()
            .find(|s| s.key == key)
            .and_then(|s| s.value.as_ref())
            .and_then(as_int)
            .and_then(|n| u32::try_from(n).ok())
    };
    match (find(home_key), find(away_key)) {
        (None, None) => None,
        (h, a) => Some(Pair {
            home: h.unwrap_or(0),
            away: a.unwrap_or(0),
        }),
    }
}

fn family_stats(family: SportFamily, sc: &XbetScoreboard) -> SportStats {
    let counter = as_counter(sc.period.as_ref());
    match family {
        SportFamily::Halves => {
            let stats = sc.stats.as_deref().unwrap_or_default();
            SportStats::Football {
                corners: stat_pair(stats, "ICorner1", "ICorner2"),
                yellow_cards: stat_pair(stats, "IYellowCard1", "IYellowCard2"),
                red_cards: stat_pair(stats, "IRedCard1", "IRedCard2"),
            }
        }
        SportFamily::Quarters => SportStats::Quarters { quarter: counter },
        SportFamily::Racket => SportStats::Racket {
            set_number: counter,
            games: sc
                .period_scores
                .as_deref()
                .and_then(|ps| ps.last())
                .and_then(XbetPeriodScore::pair)
                .map(|(h, a)| format!("{}:{}", h, a)),
        },
        SportFamily::Innings => SportStats::Innings { inning: counter },
        SportFamily::Periods => SportStats::Periods { period: counter },
        SportFamily::Combat => SportStats::Combat { round: counter },
        SportFamily::Frames => SportStats::Frames { frame: counter },
        SportFamily::Darts => SportStats::Darts {
            leg: None,
            set_number: counter,
        },
        SportFamily::Esports => SportStats::Esports { round: counter },
        SportFamily::Cricket => SportStats::Cricket {
            overs: None,
            wickets: None,
            runs: None,
        },
        SportFamily::Chess => SportStats::Chess { move_number: None },
        SportFamily::Other => SportStats::None,
    }
}

/// Map one raw Provider A match object into a record, or reject it.
///
/// Rejects when either team name or the match id is missing, or when any
/// nested structure has an unexpected shape.
pub fn parse_game(raw: &Value, sport: &Sport) -> Option<MatchRecord> {
    if !raw.is_object() {
        return None;
    }
    let game = XbetGame::deserialize(raw).ok()?;

    let home_team = clean_name(game.home.as_ref().and_then(XbetTeam::name))?;
    let away_team = clean_name(game.away.as_ref().and_then(XbetTeam::name))?;
    let match_id = as_text(game.id.as_ref())?;

    let mut rec = MatchRecord::new(DataSource::Xbet, sport.key, match_id, home_team, away_team);
    rec.tournament = clean_name(game.league_en.as_deref())
        .or_else(|| clean_name(game.league.as_deref()))
        .unwrap_or_default();
    rec.start_time = unix_seconds(game.start.as_ref());
    if truthy(game.is_live.as_ref()) {
        rec.status = MatchStatus::Live;
    }
    rec.home_team_id = game
        .home_id
        .as_ref()
        .and_then(as_int)
        .or_else(|| game.home.as_ref().and_then(XbetTeam::id));
    rec.away_team_id = game
        .away_id
        .as_ref()
        .and_then(as_int)
        .or_else(|| game.away.as_ref().and_then(XbetTeam::id));

    if let Some(sc) = &game.scoreboard {
        let phase = sc.phase.as_deref();
        rec.period = derive_period(sc.period.as_ref().and_then(as_int), phase, sport.family);
        rec.half_time = phase.is_some_and(is_half_time_phase);
        rec.stoppage_time = phase.is_some_and(is_stoppage_phase);
        if let Some((h, a)) = sc.full_score.as_ref().and_then(XbetSides::pair) {
            rec.score = format!("{}:{}", h, a);
        }
        rec.stats = family_stats(sport.family, sc);
    }

    let events = game.events.as_deref().unwrap_or_default();
    rec.event_count = events.len() as u32;
    let line = Moneyline::collect(events);
    rec.odds_home = line.home;
    rec.odds_away = line.away;
    if sport.has_draw {
        rec.odds_draw = line.draw;
    }

    Some(rec)
}

/// Decode a full `Get1x2_VZip` response body.
///
/// An undecodable body or `Success: false` is an upstream failure (Err);
/// individual malformed matches are dropped.
pub fn parse_line_feed(json: &str, sport: &Sport) -> Result<Vec<MatchRecord>> {
    let envelope: XbetEnvelope =
        serde_json::from_str(json).context("failed to parse xbet line feed")?;
    if envelope.success == Some(false) {
        anyhow::bail!(
            "xbet returned Success=false: {}",
            envelope.error.as_deref().unwrap_or("no error message")
        );
    }

    let items = match envelope.value {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(other) => anyhow::bail!("xbet Value is not a list: {}", type_name(&other)),
    };

    let mut records = Vec::with_capacity(items.len());
    let mut rejected = 0usize;
    for item in &items {
        match parse_game(item, sport) {
            Some(rec) => records.push(rec),
            None => rejected += 1,
        }
    }
    if rejected > 0 {
        tracing::debug!(sport = sport.key, rejected, kept = records.len(), "xbet matches rejected");
    }
    Ok(records)
}

fn parse_sports_list(json: &str) -> Result<Vec<SportListing>> {
    let envelope: XbetEnvelope =
        serde_json::from_str(json).context("failed to parse xbet sports list")?;
    let raw = match envelope.value {
        Some(v @ Value::Array(_)) => v,
        _ => return Ok(Vec::new()),
    };
    let list: Vec<XbetSport> =
        serde_json::from_value(raw).context("unexpected xbet sports list shape")?;
    Ok(list
        .into_iter()
        .map(|s| SportListing {
            provider_id: s.id,
            key: sports::by_xbet_id(s.id).map(|sp| sp.key),
            name: s.name,
            match_count: s.count,
        })
        .collect())
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Client ──────────────────────────────────────────────────────────────

pub struct XbetFeed {
    http: FeedHttp,
    base_url: String,
    count: u32,
}

impl XbetFeed {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            http: FeedHttp::new("xbet", config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            count: config.count,
        })
    }

    fn line_url(&self, sport_id: u32) -> String {
        format!(
            "{}/LineFeed/Get1x2_VZip?sports={}&count={}&lng=en&mode=4&country=19",
            self.base_url, sport_id, self.count
        )
    }

    fn sports_url(&self) -> String {
        format!("{}/LiveFeed/GetSportsShortZip?lng=en&country=19", self.base_url)
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        let origin = self
            .base_url
            .strip_suffix("/service-api")
            .unwrap_or(&self.base_url)
            .to_string();
        vec![
            ("User-Agent", USER_AGENT.to_string()),
            ("Accept", "application/json, text/plain, */*".to_string()),
            ("Accept-Language", "en-US,en;q=0.9".to_string()),
            ("Referer", format!("{}/", origin)),
            ("Origin", origin),
        ]
    }
}

#[async_trait]
impl MatchFeed for XbetFeed {
    fn source(&self) -> DataSource {
        DataSource::Xbet
    }

    async fn fetch_matches(&self, sport: &'static Sport) -> Result<Vec<MatchRecord>> {
        let Some(sport_id) = sport.xbet_id else {
            tracing::debug!(sport = sport.key, "xbet does not carry sport");
            return Ok(Vec::new());
        };
        let body = self.http.get_text(&self.line_url(sport_id), &self.headers()).await?;
        let records = parse_line_feed(&body, sport)?;
        self.http.record_matches(records.len());
        Ok(records)
    }

    async fn list_sports(&self) -> Result<Vec<SportListing>> {
        let body = self.http.get_text(&self.sports_url(), &self.headers()).await?;
        parse_sports_list(&body)
    }

    fn stats(&self) -> FeedStats {
        self.http.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn soccer() -> &'static Sport {
        sports::lookup("soccer").unwrap()
    }

    fn fixture_json() -> &'static str {
        r#"{
            "Success": true,
            "Error": "",
            "Value": [
                {
                    "I": 501234567,
                    "O1": "Manchester City",
                    "O2": {"N": "Arsenal", "I": 2002},
                    "O1I": 1001,
                    "LE": "England. Premier League",
                    "L": "Англия. Премьер-лига",
                    "S": 1700000000000,
                    "IsLive": true,
                    "SC": {
                        "CP": 2,
                        "CPS": "2nd half",
                        "FS": {"S1": 1},
                        "S": [
                            {"Key": "ICorner1", "Value": "5"},
                            {"Key": "ICorner2", "Value": "3"},
                            {"Key": "IYellowCard2", "Value": "2"}
                        ]
                    },
                    "E": [
                        {"C": 1.85, "G": 1, "T": 1},
                        {"C": 4.1, "G": 1, "T": 2},
                        {"C": 3.6, "G": 1, "T": 3},
                        {"C": 1.7, "G": 2, "T": 7, "P": -1.5},
                        {"C": 1.95, "G": 17, "T": 9, "P": 2.5}
                    ]
                },
                {
                    "I": 501234568,
                    "O2": "Chelsea",
                    "S": 1700003600,
                    "E": [{"C": 2.0, "G": 1, "T": 1}]
                },
                {
                    "I": 501234569,
                    "O1": "Liverpool",
                    "O2": "Everton",
                    "LE": "England. Premier League",
                    "S": 1700007200,
                    "E": []
                }
            ]
        }"#
    }

    #[test]
    fn test_parse_line_feed_drops_rejected() {
        let recs = parse_line_feed(fixture_json(), soccer()).unwrap();
        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| !r.home_team.is_empty()));
    }

    #[test]
    fn test_parse_line_feed_teams_and_ids() {
        let recs = parse_line_feed(fixture_json(), soccer()).unwrap();
        let r = &recs[0];
        assert_eq!(r.match_id, "501234567");
        assert_eq!(r.home_team, "Manchester City");
        assert_eq!(r.away_team, "Arsenal");
        assert_eq!(r.home_team_id, Some(1001));
        assert_eq!(r.away_team_id, Some(2002));
        assert_eq!(r.tournament, "England. Premier League");
        assert_eq!(r.data_source, DataSource::Xbet);
        assert_eq!(r.sport, "soccer");
    }

    #[test]
    fn test_parse_line_feed_millis_start_time() {
        let recs = parse_line_feed(fixture_json(), soccer()).unwrap();
        assert_eq!(recs[0].start_time, 1700000000);
        assert_eq!(recs[1].start_time, 1700007200);
    }

    #[test]
    fn test_parse_line_feed_live_scoreboard() {
        let recs = parse_line_feed(fixture_json(), soccer()).unwrap();
        let r = &recs[0];
        assert_eq!(r.status, MatchStatus::Live);
        assert_eq!(r.period, 2);
        assert_eq!(r.score, "1:0");
        assert!(!r.half_time);
        assert_eq!(
            r.stats,
            SportStats::Football {
                corners: Some(Pair { home: 5, away: 3 }),
                yellow_cards: Some(Pair { home: 0, away: 2 }),
                red_cards: None,
            }
        );
    }

    #[test]
    fn test_parse_line_feed_odds_first_value_wins() {
        let recs = parse_line_feed(fixture_json(), soccer()).unwrap();
        let r = &recs[0];
        assert_eq!(r.odds_home, Some(1.85));
        assert_eq!(r.odds_away, Some(4.1));
        assert_eq!(r.odds_draw, Some(3.6));
        assert_eq!(r.event_count, 5);
    }

    #[test]
    fn test_pregame_defaults() {
        let recs = parse_line_feed(fixture_json(), soccer()).unwrap();
        let r = &recs[1];
        assert_eq!(r.home_team, "Liverpool");
        assert_eq!(r.status, MatchStatus::Pregame);
        assert_eq!(r.period, 1);
        assert_eq!(r.score, "");
        assert_eq!(r.odds_home, None);
        assert_eq!(r.event_count, 0);
        assert_eq!(r.stats, SportStats::None);
    }

    #[test]
    fn test_blocked_and_sub_one_odds_not_quotable() {
        let raw = json!({
            "I": 1, "O1": "A", "O2": "B",
            "E": [
                {"C": 1.5, "G": 1, "T": 1, "B": true},
                {"C": 0.9, "G": 1, "T": 2},
                {"C": 2.2, "G": 2, "T": 7},
                {"C": 2.8, "G": 2, "T": 8}
            ]
        });
        let r = parse_game(&raw, soccer()).unwrap();
        assert_eq!(r.odds_home, Some(2.2));
        assert_eq!(r.odds_away, Some(2.8));
    }

    #[test]
    fn test_paired_markets_fill_home_then_away() {
        let raw = json!({
            "I": 1, "O1": "A", "O2": "B",
            "E": [{"C": 1.4, "G": 15, "T": 11}, {"C": 2.9, "G": 15, "T": 12}]
        });
        let r = parse_game(&raw, soccer()).unwrap();
        assert_eq!(r.odds_home, Some(1.4));
        assert_eq!(r.odds_away, Some(2.9));
    }

    #[test]
    fn test_participant_list_variant() {
        let raw = json!({
            "I": 1, "O1": "A", "O2": "B",
            "E": [{"G": 1, "P": [{"T": 1, "C": 1.6}, {"T": 2, "C": 2.4}, {"T": 3, "C": 3.3}]}]
        });
        let r = parse_game(&raw, soccer()).unwrap();
        assert_eq!(r.odds_home, Some(1.6));
        assert_eq!(r.odds_away, Some(2.4));
        assert_eq!(r.odds_draw, Some(3.3));
    }

    #[test]
    fn test_draw_odds_dropped_for_non_draw_sport() {
        let tennis = sports::lookup("tennis").unwrap();
        let raw = json!({
            "I": 1, "O1": "A", "O2": "B",
            "E": [{"C": 1.6, "G": 1, "T": 1}, {"C": 9.0, "G": 1, "T": 3}]
        });
        let r = parse_game(&raw, tennis).unwrap();
        assert_eq!(r.odds_home, Some(1.6));
        assert_eq!(r.odds_draw, None);
    }

    #[test]
    fn test_racket_stats_from_scoreboard() {
        let tennis = sports::lookup("tennis").unwrap();
        let raw = json!({
            "I": 9, "O1": "Player One", "O2": "Player Two", "IsLive": 1,
            "SC": {"CP": 3, "FS": {"S1": 1, "S2": 1}, "PS": [
                {"Key": 1, "Value": {"S1": 6, "S2": 4}},
                {"Key": 2, "Value": {"S1": 3, "S2": 6}},
                {"Key": 3, "Value": {"S1": 2}}
            ]}
        });
        let r = parse_game(&raw, tennis).unwrap();
        assert_eq!(r.status, MatchStatus::Live);
        assert_eq!(r.period, 3);
        assert_eq!(r.score, "1:1");
        assert_eq!(
            r.stats,
            SportStats::Racket {
                set_number: Some(3),
                games: Some("2:0".into()),
            }
        );
    }

    #[test]
    fn test_out_of_range_period_uses_phase_text() {
        let raw = json!({
            "I": 1, "O1": "A", "O2": "B",
            "SC": {"CP": 45, "CPS": "Half time"}
        });
        let r = parse_game(&raw, soccer()).unwrap();
        assert_eq!(r.period, 1);
        assert!(r.half_time);
    }

    #[test]
    fn test_malformed_nested_structure_rejects_single_match() {
        let raw = json!({"I": 1, "O1": "A", "O2": "B", "E": [{"C": 1.5, "G": "one"}]});
        assert!(parse_game(&raw, soccer()).is_none());
        let raw = json!({"I": 1, "O1": 42, "O2": "B"});
        assert!(parse_game(&raw, soccer()).is_none());
        let raw = json!(["not", "a", "map"]);
        assert!(parse_game(&raw, soccer()).is_none());
    }

    #[test]
    fn test_whitespace_team_name_rejected() {
        let raw = json!({"I": 1, "O1": "   ", "O2": "B"});
        assert!(parse_game(&raw, soccer()).is_none());
    }

    #[test]
    fn test_unsuccessful_envelope_is_error() {
        let err = parse_line_feed(r#"{"Success": false, "Error": "blocked", "Value": null}"#, soccer())
            .unwrap_err();
        assert!(err.to_string().contains("blocked"));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(parse_line_feed("<html>", soccer()).is_err());
    }

    #[test]
    fn test_null_value_is_empty() {
        let recs = parse_line_feed(r#"{"Success": true, "Value": null}"#, soccer()).unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_parse_sports_list() {
        let json = r#"{"Success": true, "Value": [
            {"I": 1, "N": "Football", "C1": 812},
            {"I": 4, "N": "Tennis"},
            {"I": 999, "N": "Virtual Curling", "C1": 3}
        ]}"#;
        let list = parse_sports_list(json).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].key, Some("soccer"));
        assert_eq!(list[0].match_count, Some(812));
        assert_eq!(list[1].key, Some("tennis"));
        assert_eq!(list[2].key, None);
    }

    #[test]
    fn test_line_url() {
        let feed = XbetFeed::new(&ProviderConfig::xbet_default()).unwrap();
        let url = feed.line_url(1);
        assert!(url.ends_with("/LineFeed/Get1x2_VZip?sports=1&count=50&lng=en&mode=4&country=19"));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn xbet_live_fetch() {
        let feed = XbetFeed::new(&ProviderConfig::xbet_default()).unwrap();
        let recs = feed.fetch_matches(soccer()).await.unwrap();
        println!("xbet returned {} soccer matches", recs.len());
    }
}
