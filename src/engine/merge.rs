//! Cross-provider merge: one record per identity key, gaps in the
//! Provider A record filled from Provider B.

use super::identity::IdentityKey;
use crate::feed::types::{DataSource, MatchRecord, SportStats};
use std::collections::HashMap;

/// Values that count as "nothing recorded" for merge precedence.
///
/// Zero is blank on purpose: a true "0:0" score or a zero id cannot be told
/// apart from a missing one.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for Option<String> {
    fn is_blank(&self) -> bool {
        self.as_ref().map_or(true, |s| s.is_blank())
    }
}

impl Blank for Option<f64> {
    fn is_blank(&self) -> bool {
        match self {
            Some(v) => *v == 0.0 || v.is_nan(),
            None => true,
        }
    }
}

impl Blank for Option<i64> {
    fn is_blank(&self) -> bool {
        matches!(self, None | Some(0))
    }
}

impl Blank for i64 {
    fn is_blank(&self) -> bool {
        *self == 0
    }
}

impl Blank for bool {
    fn is_blank(&self) -> bool {
        !*self
    }
}

impl Blank for SportStats {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

/// Replace `dst` with `src` only when `dst` is blank and `src` is not.
fn fill<T: Blank>(dst: &mut T, src: T) {
    if dst.is_blank() && !src.is_blank() {
        *dst = src;
    }
}

/// Fold `other` into `base` field by field. `base` keeps every non-blank
/// value; `event_count` takes the larger of the two.
pub fn merge_fields(base: &mut MatchRecord, other: MatchRecord) {
    fill(&mut base.tournament, other.tournament);
    fill(&mut base.start_time, other.start_time);
    fill(&mut base.score, other.score);
    fill(&mut base.odds_home, other.odds_home);
    fill(&mut base.odds_away, other.odds_away);
    fill(&mut base.odds_draw, other.odds_draw);
    fill(&mut base.odds_total_over, other.odds_total_over);
    fill(&mut base.odds_total_under, other.odds_total_under);
    fill(&mut base.total_title, other.total_title);
    fill(&mut base.odds_handicap_home, other.odds_handicap_home);
    fill(&mut base.odds_handicap_away, other.odds_handicap_away);
    fill(&mut base.handicap_title, other.handicap_title);
    fill(&mut base.home_team_id, other.home_team_id);
    fill(&mut base.away_team_id, other.away_team_id);
    fill(&mut base.stoppage_time, other.stoppage_time);
    fill(&mut base.half_time, other.half_time);
    fill(&mut base.stats, other.stats);
    base.event_count = base.event_count.max(other.event_count);
    base.data_source = DataSource::Both;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub only_a: usize,
    pub only_b: usize,
    pub merged: usize,
    /// Records replaced by a later duplicate from the same provider.
    pub duplicates: usize,
}

#[derive(Default)]
struct Slot {
    a: Option<MatchRecord>,
    b: Option<MatchRecord>,
}

/// Merge the Provider A and Provider B lists.
///
/// Output order: A's identities in A's order, then B-only identities in B's
/// order. A duplicate identity within one list replaces the earlier record
/// but keeps its position.
pub fn merge(list_a: Vec<MatchRecord>, list_b: Vec<MatchRecord>) -> (Vec<MatchRecord>, MergeStats) {
    let mut index: HashMap<IdentityKey, usize> = HashMap::with_capacity(list_a.len() + list_b.len());
    let mut slots: Vec<Slot> = Vec::with_capacity(list_a.len() + list_b.len());
    let mut stats = MergeStats::default();

    let mut place = |rec: MatchRecord, from_a: bool, stats: &mut MergeStats| {
        let key = IdentityKey::from_record(&rec);
        let idx = *index.entry(key).or_insert_with(|| {
            slots.push(Slot::default());
            slots.len() - 1
        });
        let side = if from_a { &mut slots[idx].a } else { &mut slots[idx].b };
        if side.replace(rec).is_some() {
            stats.duplicates += 1;
        }
    };

    for rec in list_a {
        place(rec, true, &mut stats);
    }
    for rec in list_b {
        place(rec, false, &mut stats);
    }

    let merged = slots
        .into_iter()
        .filter_map(|slot| match (slot.a, slot.b) {
            (Some(mut a), Some(b)) => {
                stats.merged += 1;
                merge_fields(&mut a, b);
                Some(a)
            }
            (Some(mut a), None) => {
                stats.only_a += 1;
                a.data_source = DataSource::Xbet;
                Some(a)
            }
            (None, Some(mut b)) => {
                stats.only_b += 1;
                b.data_source = DataSource::Iscj;
                Some(b)
            }
            (None, None) => None,
        })
        .collect();

    (merged, stats)
}
