//! Outcome prediction from stored match history.
//!
//! Team form and head-to-head rates come from finished scores in the store;
//! a fixed linear weighting with a home-advantage constant picks the outcome.

use super::cache::TtlCache;
use super::identity::norm;
use crate::feed::types::MatchRecord;
use anyhow::Result;
use std::time::Duration;

pub const FORM_WINDOW_DAYS: u32 = 30;
pub const H2H_WINDOW_DAYS: u32 = 365;
pub const FORM_CACHE_TTL: Duration = Duration::from_secs(3600);

const HOME_FORM_WEIGHT: f64 = 0.3;
const AWAY_FORM_WEIGHT: f64 = 0.3;
const H2H_WEIGHT: f64 = 0.4;
const HOME_ADVANTAGE: f64 = 0.55;
const DRAW_WEIGHT: f64 = 0.5;
const SCORE_CONFIDENCE_CAP: f64 = 70.0;

/// Read access to stored matches.
pub trait MatchHistory {
    /// Matches of `sport` across the last `days` day-partitions.
    fn recent_matches(&self, sport: &str, days: u32) -> Result<Vec<MatchRecord>>;
}

impl<T: MatchHistory + ?Sized> MatchHistory for &T {
    fn recent_matches(&self, sport: &str, days: u32) -> Result<Vec<MatchRecord>> {
        (**self).recent_matches(sport, days)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamForm {
    pub team: String,
    /// Matches with a parsable score.
    pub total_matches: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goals_per_game: f64,
    pub clean_sheets: u32,
    pub clean_sheet_rate: f64,
}

impl TeamForm {
    /// Assumed form for a team with no usable history.
    pub fn neutral(team: &str) -> Self {
        Self {
            team: team.to_string(),
            total_matches: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            win_rate: 0.5,
            draw_rate: 0.2,
            loss_rate: 0.3,
            goals_for: 0,
            goals_against: 0,
            goals_per_game: 0.0,
            clean_sheets: 0,
            clean_sheet_rate: 0.0,
        }
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }

    fn goals_against_per_game(&self) -> f64 {
        f64::from(self.goals_against) / f64::from(self.total_matches.max(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadToHead {
    pub total_matches: u32,
    pub home_wins: u32,
    pub away_wins: u32,
    pub draws: u32,
}

impl HeadToHead {
    fn rate(&self, n: u32, fallback: f64) -> f64 {
        if self.total_matches == 0 {
            fallback
        } else {
            f64::from(n) / f64::from(self.total_matches)
        }
    }

    pub fn home_win_rate(&self) -> f64 {
        self.rate(self.home_wins, 0.5)
    }

    pub fn away_win_rate(&self) -> f64 {
        self.rate(self.away_wins, 0.5)
    }

    pub fn draw_rate(&self) -> f64 {
        self.rate(self.draws, 0.3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    HomeWin,
    AwayWin,
    Draw,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::HomeWin => "home_win",
            Outcome::AwayWin => "away_win",
            Outcome::Draw => "draw",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub home_team: String,
    pub away_team: String,
    pub outcome: Outcome,
    /// 0..=100, one decimal.
    pub confidence: f64,
    pub home_form: f64,
    pub away_form: f64,
    pub head_to_head: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScorePrediction {
    pub home_team: String,
    pub away_team: String,
    /// "H:A"
    pub predicted_score: String,
    pub expected_home_goals: f64,
    pub expected_away_goals: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FormKey {
    pub team: String,
    pub sport: String,
    pub days: u32,
}

pub type FormCache = TtlCache<FormKey, TeamForm>;

pub fn form_cache() -> FormCache {
    TtlCache::new(FORM_CACHE_TTL)
}

// ── Pure computations ───────────────────────────────────────────────────

/// Form of `team` over `matches`. Matches without a parsable score are skipped.
pub fn compute_form(matches: &[MatchRecord], team: &str) -> TeamForm {
    let team_norm = norm(team);
    let mut form = TeamForm::neutral(team);
    form.win_rate = 0.0;
    form.draw_rate = 0.0;
    form.loss_rate = 0.0;

    for m in matches {
        let is_home = norm(&m.home_team) == team_norm;
        if !is_home && norm(&m.away_team) != team_norm {
            continue;
        }
        let Some((home_goals, away_goals)) = m.goals() else {
            continue;
        };
        let (scored, conceded) = if is_home {
            (home_goals, away_goals)
        } else {
            (away_goals, home_goals)
        };
        form.total_matches += 1;
        form.goals_for += scored;
        form.goals_against += conceded;
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => form.wins += 1,
            std::cmp::Ordering::Equal => form.draws += 1,
            std::cmp::Ordering::Less => form.losses += 1,
        }
        if conceded == 0 {
            form.clean_sheets += 1;
        }
    }

    if form.total_matches == 0 {
        return TeamForm::neutral(team);
    }
    let n = f64::from(form.total_matches);
    form.win_rate = f64::from(form.wins) / n;
    form.draw_rate = f64::from(form.draws) / n;
    form.loss_rate = f64::from(form.losses) / n;
    form.goals_per_game = f64::from(form.goals_for) / n;
    form.clean_sheet_rate = f64::from(form.clean_sheets) / n;
    form
}

/// Meetings with `home` at home against `away`.
pub fn compute_head_to_head(matches: &[MatchRecord], home: &str, away: &str) -> HeadToHead {
    let (home, away) = (norm(home), norm(away));
    let mut h2h = HeadToHead::default();
    for m in matches {
        if norm(&m.home_team) != home || norm(&m.away_team) != away {
            continue;
        }
        let Some((h, a)) = m.goals() else { continue };
        h2h.total_matches += 1;
        match h.cmp(&a) {
            std::cmp::Ordering::Greater => h2h.home_wins += 1,
            std::cmp::Ordering::Less => h2h.away_wins += 1,
            std::cmp::Ordering::Equal => h2h.draws += 1,
        }
    }
    h2h
}

/// Weighted outcome. Ties resolve home win, then away win, then draw.
pub fn pick_outcome(home: &TeamForm, away: &TeamForm, h2h: &HeadToHead) -> Outcome {
    let home_score = home.win_rate * HOME_FORM_WEIGHT * HOME_ADVANTAGE
        + (1.0 - away.win_rate) * AWAY_FORM_WEIGHT
        + h2h.home_win_rate() * H2H_WEIGHT;
    let away_score = away.win_rate * AWAY_FORM_WEIGHT * (1.0 - HOME_ADVANTAGE)
        + (1.0 - home.win_rate) * HOME_FORM_WEIGHT
        + h2h.away_win_rate() * H2H_WEIGHT;
    let draw_score = h2h.draw_rate() * DRAW_WEIGHT;

    let best = home_score.max(away_score).max(draw_score);
    if home_score == best {
        Outcome::HomeWin
    } else if away_score == best {
        Outcome::AwayWin
    } else {
        Outcome::Draw
    }
}

/// Confidence in 0..=100: data volume, form spread and head-to-head depth.
pub fn confidence(home: &TeamForm, away: &TeamForm, h2h: &HeadToHead) -> f64 {
    let total = f64::from(home.total_matches + away.total_matches + h2h.total_matches);
    let data = (total / 20.0).min(1.0);
    let consistency = 1.0 - (home.win_rate - away.win_rate).abs().min(0.5);
    let depth = (f64::from(h2h.total_matches) / 10.0).min(1.0);
    let c = 0.4 * data + 0.4 * consistency + 0.2 * depth;
    (c * 1000.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ── Predictor ───────────────────────────────────────────────────────────

pub struct Predictor<H> {
    history: H,
}

impl<H: MatchHistory> Predictor<H> {
    pub fn new(history: H) -> Self {
        Self { history }
    }

    pub fn team_form(
        &self,
        cache: &mut FormCache,
        team: &str,
        sport: &str,
        days: u32,
    ) -> Result<TeamForm> {
        let key = FormKey {
            team: norm(team),
            sport: sport.to_string(),
            days,
        };
        if let Some(form) = cache.get(&key) {
            return Ok(form);
        }
        let matches = self.history.recent_matches(sport, days)?;
        let form = compute_form(&matches, team);
        cache.insert(key, form.clone());
        Ok(form)
    }

    pub fn head_to_head(&self, home: &str, away: &str, sport: &str, days: u32) -> Result<HeadToHead> {
        let matches = self.history.recent_matches(sport, days)?;
        Ok(compute_head_to_head(&matches, home, away))
    }

    pub fn predict(
        &self,
        cache: &mut FormCache,
        home: &str,
        away: &str,
        sport: &str,
    ) -> Result<Prediction> {
        let home_form = self.team_form(cache, home, sport, FORM_WINDOW_DAYS)?;
        let away_form = self.team_form(cache, away, sport, FORM_WINDOW_DAYS)?;
        let h2h = self.head_to_head(home, away, sport, H2H_WINDOW_DAYS)?;

        Ok(Prediction {
            home_team: home.to_string(),
            away_team: away.to_string(),
            outcome: pick_outcome(&home_form, &away_form, &h2h),
            confidence: confidence(&home_form, &away_form, &h2h),
            home_form: home_form.win_rate,
            away_form: away_form.win_rate,
            head_to_head: h2h.home_win_rate(),
        })
    }

    /// Most likely score from attack and defence averages.
    pub fn predict_score(
        &self,
        cache: &mut FormCache,
        home: &str,
        away: &str,
        sport: &str,
    ) -> Result<ScorePrediction> {
        let home_form = self.team_form(cache, home, sport, FORM_WINDOW_DAYS)?;
        let away_form = self.team_form(cache, away, sport, FORM_WINDOW_DAYS)?;

        let expected_home = (home_form.goals_per_game + away_form.goals_against_per_game()) / 2.0;
        let expected_away = (away_form.goals_per_game + home_form.goals_against_per_game()) / 2.0;

        Ok(ScorePrediction {
            home_team: home.to_string(),
            away_team: away.to_string(),
            predicted_score: format!("{}:{}", expected_home.round() as u32, expected_away.round() as u32),
            expected_home_goals: round2(expected_home),
            expected_away_goals: round2(expected_away),
            confidence: confidence(&home_form, &away_form, &HeadToHead::default())
                .min(SCORE_CONFIDENCE_CAP),
        })
    }
}
