//! Provider B: ISCJXXQGMB `v3/user/line/list` hierarchy.
//!
//! Lines sit four levels deep (category → supercategory → subcategory →
//! line). Liveness is a phase string checked against the sport's live-phase
//! vocabulary; odds are keyed by outcome alias.

use super::http::FeedHttp;
use super::normalize::{
    as_counter, as_int, as_odds, as_text, clean_name, derive_period, is_half_time_phase,
    is_stoppage_phase, normalize_score, truthy, unix_seconds,
};
use super::sports::{self, Sport, SportFamily};
use super::types::*;
use super::{FeedStats, MatchFeed, SportListing};
use crate::config::ProviderConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Outcome status meaning "currently quotable".
const QUOTABLE: i64 = 100;

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LineList {
    #[serde(default)]
    lines_hierarchy: Option<Value>,
}

// Wrapper collections stay raw and are decoded element by element, so a
// malformed wrapper only drops the lines beneath it.

#[derive(Debug, Deserialize)]
struct Hierarchy {
    #[serde(default)]
    line_category_dto_collection: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    line_supercategory_dto_collection: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SuperCategory {
    #[serde(default)]
    line_subcategory_dto_collection: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SubCategory {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    line_dto_collection: Option<Value>,
}

/// Decode every element of a wrapper collection on its own. Entries that are
/// not objects or do not fit `T` are skipped and counted.
fn nodes<T: DeserializeOwned>(raw: Option<&Value>, skipped: &mut usize) -> Vec<T> {
    let items = match raw {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            *skipped += 1;
            return Vec::new();
        }
    };
    items
        .iter()
        .filter_map(|item| {
            let node = if item.is_object() { T::deserialize(item).ok() } else { None };
            if node.is_none() {
                *skipped += 1;
            }
            node
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct IscjLine {
    #[serde(default)]
    id: Option<Value>,
    #[serde(rename = "match", default)]
    game: Option<IscjMatch>,
    #[serde(default)]
    outcomes: Option<Vec<IscjOutcome>>,
}

#[derive(Debug, Deserialize)]
struct IscjMatch {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    begin_at: Option<Value>,
    #[serde(default)]
    team1: Option<IscjTeam>,
    #[serde(default)]
    team2: Option<IscjTeam>,
    #[serde(default)]
    stat: Option<IscjStat>,
}

#[derive(Debug, Deserialize)]
struct IscjTeam {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    id: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct IscjStat {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    match_status: Option<String>,
    #[serde(default)]
    score: Option<Value>,
    #[serde(default)]
    half_time: Option<Value>,
    #[serde(default)]
    stoppage_time: Option<Value>,
    #[serde(default)]
    added_time: Option<Value>,
    #[serde(default)]
    overs: Option<Value>,
    #[serde(default)]
    wickets: Option<Value>,
    #[serde(default)]
    runs: Option<Value>,
    #[serde(default)]
    quarter: Option<Value>,
    #[serde(default)]
    set_number: Option<Value>,
    #[serde(default)]
    games: Option<Value>,
    #[serde(default)]
    inning: Option<Value>,
    #[serde(default)]
    period: Option<Value>,
    #[serde(default)]
    round: Option<Value>,
    #[serde(default)]
    frame: Option<Value>,
    #[serde(default)]
    leg: Option<Value>,
    #[serde(rename = "move", default)]
    move_number: Option<Value>,
    #[serde(default)]
    game: Option<Value>,
}

impl IscjStat {
    fn phase(&self) -> Option<&str> {
        [&self.status, &self.state, &self.match_status]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    /// The explicit phase counter for this sport family, if the provider sent one.
    fn phase_counter(&self, family: SportFamily) -> Option<&Value> {
        match family {
            SportFamily::Quarters => self.quarter.as_ref(),
            SportFamily::Racket => self.set_number.as_ref(),
            SportFamily::Innings => self.inning.as_ref(),
            SportFamily::Combat => self.round.as_ref(),
            SportFamily::Frames => self.frame.as_ref(),
            SportFamily::Darts => self.set_number.as_ref().or(self.leg.as_ref()),
            SportFamily::Esports => self.round.as_ref().or(self.game.as_ref()),
            _ => self.period.as_ref(),
        }
    }

    fn sport_stats(&self, family: SportFamily) -> SportStats {
        match family {
            SportFamily::Halves => SportStats::Football {
                corners: None,
                yellow_cards: None,
                red_cards: None,
            },
            SportFamily::Cricket => SportStats::Cricket {
                overs: as_text(self.overs.as_ref()),
                wickets: self
                    .wickets
                    .as_ref()
                    .and_then(as_int)
                    .and_then(|w| u32::try_from(w).ok()),
                runs: as_text(self.runs.as_ref()).or_else(|| as_text(self.score.as_ref())),
            },
            SportFamily::Quarters => SportStats::Quarters {
                quarter: as_counter(self.quarter.as_ref()),
            },
            SportFamily::Racket => SportStats::Racket {
                set_number: as_counter(self.set_number.as_ref()),
                games: as_text(self.games.as_ref()),
            },
            SportFamily::Innings => SportStats::Innings {
                inning: as_counter(self.inning.as_ref()),
            },
            SportFamily::Periods => SportStats::Periods {
                period: as_counter(self.period.as_ref()),
            },
            SportFamily::Combat => SportStats::Combat {
                round: as_counter(self.round.as_ref()),
            },
            SportFamily::Frames => SportStats::Frames {
                frame: as_counter(self.frame.as_ref()),
            },
            SportFamily::Darts => SportStats::Darts {
                leg: as_counter(self.leg.as_ref()),
                set_number: as_counter(self.set_number.as_ref()),
            },
            SportFamily::Chess => SportStats::Chess {
                move_number: self
                    .move_number
                    .as_ref()
                    .and_then(as_int)
                    .and_then(|m| u32::try_from(m).ok())
                    .filter(|&m| m > 0),
            },
            SportFamily::Esports => SportStats::Esports {
                round: as_counter(self.round.as_ref()).or_else(|| as_counter(self.game.as_ref())),
            },
            SportFamily::Other => SportStats::None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IscjOutcome {
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    odd: Option<Value>,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IscjSport {
    id: u32,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    count_pregame: Option<u32>,
    #[serde(default)]
    count_live: Option<u32>,
}

// ── Odds ────────────────────────────────────────────────────────────────

struct OutcomeBook<'a> {
    outcomes: &'a [IscjOutcome],
}

impl<'a> OutcomeBook<'a> {
    /// First quotable odd for an alias.
    fn odds(&self, alias: &str) -> Option<f64> {
        self.outcomes
            .iter()
            .filter(|o| o.alias.as_deref() == Some(alias))
            .filter(|o| o.status.as_ref().and_then(as_int) == Some(QUOTABLE))
            .find_map(|o| as_odds(o.odd.as_ref()))
    }

    /// Market line title: a dedicated title outcome, else the first leg's title.
    fn title(&self, title_alias: &str, leg_alias: &str) -> Option<String> {
        let lookup = |alias: &str| {
            self.outcomes
                .iter()
                .filter(|o| o.alias.as_deref() == Some(alias))
                .find_map(|o| clean_name(o.title.as_deref()))
        };
        lookup(title_alias).or_else(|| lookup(leg_alias))
    }
}

// ── Adapter ─────────────────────────────────────────────────────────────

/// Map one raw Provider B line into a record, or reject it.
///
/// `tournament` is the enclosing subcategory title; the match title is used
/// when it is blank.
pub fn parse_line(raw: &Value, tournament: &str, sport: &Sport) -> Option<MatchRecord> {
    if !raw.is_object() {
        return None;
    }
    let line = IscjLine::deserialize(raw).ok()?;
    let game = line.game.as_ref()?;

    let home_team = clean_name(game.team1.as_ref().and_then(|t| t.title.as_deref()))?;
    let away_team = clean_name(game.team2.as_ref().and_then(|t| t.title.as_deref()))?;
    let match_id = as_text(line.id.as_ref())?;

    let mut rec = MatchRecord::new(DataSource::Iscj, sport.key, match_id, home_team, away_team);
    rec.tournament = clean_name(Some(tournament))
        .or_else(|| clean_name(game.title.as_deref()))
        .unwrap_or_default();
    rec.start_time = unix_seconds(game.begin_at.as_ref());
    rec.home_team_id = game.team1.as_ref().and_then(|t| t.id.as_ref()).and_then(as_int);
    rec.away_team_id = game.team2.as_ref().and_then(|t| t.id.as_ref()).and_then(as_int);

    let default_stat = IscjStat::default();
    let stat = game.stat.as_ref().unwrap_or(&default_stat);
    let phase = stat.phase();
    if phase.is_some_and(|p| sport.is_live_phase(p)) {
        rec.status = MatchStatus::Live;
    }
    rec.period = derive_period(
        stat.phase_counter(sport.family).and_then(as_int),
        phase,
        sport.family,
    );
    rec.half_time = truthy(stat.half_time.as_ref()) || phase.is_some_and(is_half_time_phase);
    rec.stoppage_time = truthy(stat.stoppage_time.as_ref())
        || truthy(stat.added_time.as_ref())
        || phase.is_some_and(is_stoppage_phase);
    if let Some(score) = as_text(stat.score.as_ref()) {
        rec.score = normalize_score(&score);
    }
    rec.stats = stat.sport_stats(sport.family);

    let outcomes = line.outcomes.as_deref().unwrap_or_default();
    rec.event_count = outcomes.len() as u32;
    let book = OutcomeBook { outcomes };
    rec.odds_home = book.odds("1");
    rec.odds_away = book.odds("2");
    if sport.has_draw {
        rec.odds_draw = book.odds("x");
    }
    rec.odds_total_over = book.odds("total_over");
    rec.odds_total_under = book.odds("total_under");
    rec.total_title = book.title("total_title", "total_over");
    rec.odds_handicap_home = book.odds("fora_one");
    rec.odds_handicap_away = book.odds("fora_two");
    rec.handicap_title = book.title("fora_title", "fora_one");

    Some(rec)
}

/// Decode a full `line/list` response and keep the lines of `sport`.
///
/// Pregame lines starting more than `horizon_days` after `now` are skipped.
pub fn parse_line_list(
    json: &str,
    sport: &Sport,
    now: i64,
    horizon_days: u32,
) -> Result<Vec<MatchRecord>> {
    let list: LineList = serde_json::from_str(json).context("failed to parse iscj line list")?;
    let horizon = now.saturating_add(i64::from(horizon_days) * 86_400);

    let mut records = Vec::new();
    let mut rejected = 0usize;
    let mut beyond_horizon = 0usize;
    let mut malformed = 0usize;

    let hierarchies: Vec<Hierarchy> = nodes(list.lines_hierarchy.as_ref(), &mut malformed);
    for hierarchy in &hierarchies {
        let categories: Vec<Category> =
            nodes(hierarchy.line_category_dto_collection.as_ref(), &mut malformed);
        let categories = categories
            .iter()
            .filter(|c| c.code.as_deref().is_some_and(|code| sport.matches_category_code(code)));
        for category in categories {
            let supers: Vec<SuperCategory> =
                nodes(category.line_supercategory_dto_collection.as_ref(), &mut malformed);
            for sup in &supers {
                let subs: Vec<SubCategory> =
                    nodes(sup.line_subcategory_dto_collection.as_ref(), &mut malformed);
                for sub in &subs {
                    let tournament = sub.title.as_deref().unwrap_or("");
                    let lines = sub.line_dto_collection.as_ref().and_then(Value::as_array);
                    for raw in lines.into_iter().flatten() {
                        let Some(rec) = parse_line(raw, tournament, sport) else {
                            rejected += 1;
                            continue;
                        };
                        if !rec.status.is_live() && rec.start_time > horizon {
                            beyond_horizon += 1;
                            continue;
                        }
                        records.push(rec);
                    }
                }
            }
        }
    }

    if rejected > 0 || beyond_horizon > 0 || malformed > 0 {
        tracing::debug!(
            sport = sport.key,
            rejected,
            beyond_horizon,
            malformed,
            kept = records.len(),
            "iscj lines skipped"
        );
    }
    Ok(records)
}

fn parse_sports_list(json: &str) -> Result<Vec<SportListing>> {
    let list: Vec<IscjSport> =
        serde_json::from_str(json).context("failed to parse iscj sports list")?;
    Ok(list
        .into_iter()
        .map(|s| {
            let match_count = match (s.count_pregame, s.count_live) {
                (None, None) => None,
                (p, l) => Some(p.unwrap_or(0) + l.unwrap_or(0)),
            };
            SportListing {
                provider_id: s.id,
                key: sports::by_iscj_id(s.id).map(|sp| sp.key),
                name: s.title.or(s.code).unwrap_or_default(),
                match_count,
            }
        })
        .collect())
}

// ── Client ──────────────────────────────────────────────────────────────

pub struct IscjFeed {
    http: FeedHttp,
    base_url: String,
    count: u32,
    horizon_days: u32,
}

impl IscjFeed {
    pub fn new(config: &ProviderConfig, horizon_days: u32) -> Result<Self> {
        Ok(Self {
            http: FeedHttp::new("iscj", config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            count: config.count,
            horizon_days,
        })
    }

    fn line_url(&self, sport_id: u32) -> String {
        format!(
            "{}/v3/user/line/list?lc[]={}&ss=all&l={}&ltr=0",
            self.base_url, sport_id, self.count
        )
    }

    fn sports_url(&self) -> String {
        format!("{}/v1/allsports/sports?ss=all", self.base_url)
    }

    /// Static headers with a rotated User-Agent.
    fn headers(&self) -> Vec<(&'static str, String)> {
        let ua = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);
        let origin = self
            .base_url
            .strip_suffix("/api")
            .unwrap_or(&self.base_url)
            .to_string();
        vec![
            ("User-Agent", ua.to_string()),
            ("Accept", "application/json".to_string()),
            ("Referer", format!("{}/", origin)),
            ("Origin", origin),
        ]
    }
}

#[async_trait]
impl MatchFeed for IscjFeed {
    fn source(&self) -> DataSource {
        DataSource::Iscj
    }

    async fn fetch_matches(&self, sport: &'static Sport) -> Result<Vec<MatchRecord>> {
        let Some(sport_id) = sport.iscj_id else {
            tracing::debug!(sport = sport.key, "iscj does not carry sport");
            return Ok(Vec::new());
        };
        let body = self.http.get_text(&self.line_url(sport_id), &self.headers()).await?;
        let now = chrono::Utc::now().timestamp();
        let records = parse_line_list(&body, sport, now, self.horizon_days)?;
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
