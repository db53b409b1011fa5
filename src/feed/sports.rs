//! Read-only sport catalog shared by both provider adapters.
//!
//! Every lookup table the adapters need (provider ids, live-phase vocabulary,
//! draw markets, statistics family) lives here as static data.

/// Groups sports by how their phases and statistics are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SportFamily {
    /// Two halves: soccer, futsal, handball, rugby, ...
    Halves,
    Quarters,
    /// Three periods: ice hockey, floorball.
    Periods,
    /// Sets and games: tennis, table tennis, padel, volleyball.
    Racket,
    Innings,
    Cricket,
    /// Rounds: boxing, MMA, kickboxing.
    Combat,
    Frames,
    Darts,
    Chess,
    Esports,
    /// Racing and anything without phase counters.
    Other,
}

impl SportFamily {
    /// Number of regulation phases; "extra"/"overtime" is one past this.
    pub fn regulation_phases(&self) -> u8 {
        match self {
            SportFamily::Halves => 2,
            SportFamily::Quarters => 4,
            SportFamily::Periods => 3,
            SportFamily::Racket => 5,
            SportFamily::Innings => 9,
            SportFamily::Cricket => 2,
            SportFamily::Combat => 3,
            SportFamily::Frames | SportFamily::Darts | SportFamily::Esports => 2,
            SportFamily::Chess | SportFamily::Other => 1,
        }
    }
}

#[derive(Debug)]
pub struct Sport {
    /// Internal key, also the store partition prefix.
    pub key: &'static str,
    /// Provider A (`sports=` query parameter).
    pub xbet_id: Option<u32>,
    /// Provider B (`lc[]=` query parameter).
    pub iscj_id: Option<u32>,
    pub family: SportFamily,
    /// Provider B `stat.status` values meaning "in play", lowercase.
    pub live_phases: &'static [&'static str],
    pub has_draw: bool,
}

impl Sport {
    /// Case-insensitive membership test against the live-phase vocabulary.
    pub fn is_live_phase(&self, phase: &str) -> bool {
        let phase = phase.trim().to_lowercase();
        self.live_phases.contains(&phase.as_str())
    }

    /// Provider B category codes that belong to this sport ("football" is soccer).
    pub fn matches_category_code(&self, code: &str) -> bool {
        let code = code.to_lowercase().replace('-', "_");
        code == self.key || (self.key == "soccer" && code == "football")
    }
}

const HALVES: &[&str] = &["1st_half", "2nd_half", "extra_time", "in_play", "live"];
const QUARTERS: &[&str] = &[
    "1st_quarter", "2nd_quarter", "3rd_quarter", "4th_quarter", "overtime", "in_play", "live",
];
const QUARTERS_NO_OT: &[&str] = &[
    "1st_quarter", "2nd_quarter", "3rd_quarter", "4th_quarter", "in_play", "live",
];
const SETS: &[&str] = &["set_1", "set_2", "set_3", "set_4", "set_5", "in_play", "live"];
const ROUNDS: &[&str] = &["round_1", "round_2", "round_3", "in_play", "live"];
const RACE: &[&str] = &["race", "in_play", "live"];

pub static SPORTS: &[Sport] = &[
    Sport {
        key: "soccer",
        xbet_id: Some(1),
        iscj_id: Some(1),
        family: SportFamily::Halves,
        live_phases: &["1st_half", "2nd_half", "extra_time", "break", "in_play", "live"],
        has_draw: true,
    },
    Sport {
        key: "cricket",
        xbet_id: Some(66),
        iscj_id: Some(45),
        family: SportFamily::Cricket,
        live_phases: &[
            "live", "in_play", "break", "innings", "bowling", "batting", "1st_innings",
            "2nd_innings",
        ],
        has_draw: false,
    },
    Sport {
        key: "basketball",
        xbet_id: Some(3),
        iscj_id: Some(7),
        family: SportFamily::Quarters,
        live_phases: QUARTERS,
        has_draw: false,
    },
    Sport {
        key: "tennis",
        xbet_id: Some(4),
        iscj_id: Some(3),
        family: SportFamily::Racket,
        live_phases: SETS,
        has_draw: false,
    },
    Sport {
        key: "volleyball",
        xbet_id: Some(6),
        iscj_id: Some(13),
        family: SportFamily::Racket,
        live_phases: SETS,
        has_draw: true,
    },
    Sport {
        key: "baseball",
        xbet_id: Some(5),
        iscj_id: Some(19),
        family: SportFamily::Innings,
        live_phases: &[
            "inning_1", "inning_2", "inning_3", "inning_4", "inning_5", "inning_6", "inning_7",
            "inning_8", "inning_9", "extra_innings", "in_play", "live",
        ],
        has_draw: false,
    },
    Sport {
        key: "handball",
        xbet_id: Some(8),
        iscj_id: Some(17),
        family: SportFamily::Halves,
        live_phases: HALVES,
        has_draw: true,
    },
    Sport {
        key: "ice_hockey",
        xbet_id: Some(2),
        iscj_id: Some(5),
        family: SportFamily::Periods,
        live_phases: &[
            "1st_period", "2nd_period", "3rd_period", "overtime", "shootout", "in_play", "live",
        ],
        has_draw: true,
    },
    Sport {
        key: "futsal",
        xbet_id: Some(14),
        iscj_id: Some(21),
        family: SportFamily::Halves,
        live_phases: HALVES,
        has_draw: true,
    },
    Sport {
        key: "table_tennis",
        xbet_id: Some(10),
        iscj_id: Some(57),
        family: SportFamily::Racket,
        live_phases: SETS,
        has_draw: false,
    },
    Sport {
        key: "kabaddi",
        xbet_id: None,
        iscj_id: Some(161),
        family: SportFamily::Halves,
        live_phases: &["1st_half", "2nd_half", "in_play", "live"],
        has_draw: false,
    },
    Sport {
        key: "padel_tennis",
        xbet_id: None,
        iscj_id: Some(211),
        family: SportFamily::Racket,
        live_phases: SETS,
        has_draw: false,
    },
    Sport {
        key: "basketball_3x3",
        xbet_id: None,
        iscj_id: Some(144),
        family: SportFamily::Halves,
        live_phases: &["1st_half", "2nd_half", "overtime", "in_play", "live"],
        has_draw: false,
    },
    Sport {
        key: "martial_arts",
        xbet_id: Some(56),
        iscj_id: Some(23),
        family: SportFamily::Combat,
        live_phases: ROUNDS,
        has_draw: false,
    },
    Sport {
        key: "boxing",
        xbet_id: Some(9),
        iscj_id: Some(9),
        family: SportFamily::Combat,
        live_phases: ROUNDS,
        has_draw: false,
    },
    Sport {
        key: "bare_knuckle_boxing",
        xbet_id: None,
        iscj_id: Some(215),
        family: SportFamily::Combat,
        live_phases: ROUNDS,
        has_draw: false,
    },
    Sport {
        key: "t_basket",
        xbet_id: None,
        iscj_id: Some(197),
        family: SportFamily::Quarters,
        live_phases: QUARTERS_NO_OT,
        has_draw: false,
    },
    Sport {
        key: "t_kick",
        xbet_id: None,
        iscj_id: Some(201),
        family: SportFamily::Combat,
        live_phases: ROUNDS,
        has_draw: false,
    },
    Sport {
        key: "american_football",
        xbet_id: Some(13),
        iscj_id: Some(35),
        family: SportFamily::Quarters,
        live_phases: QUARTERS,
        has_draw: false,
    },
    Sport {
        key: "aussie_rules",
        xbet_id: None,
        iscj_id: Some(51),
        family: SportFamily::Quarters,
        live_phases: QUARTERS_NO_OT,
        has_draw: false,
    },
    Sport {
        key: "snooker",
        xbet_id: Some(30),
        iscj_id: Some(31),
        family: SportFamily::Frames,
        live_phases: &["frame_1", "frame_2", "in_play", "live"],
        has_draw: false,
    },
    Sport {
        key: "chess",
        xbet_id: None,
        iscj_id: Some(27),
        family: SportFamily::Chess,
        live_phases: &["move_1", "move_2", "in_play", "live"],
        has_draw: false,
    },
    Sport {
        key: "darts",
        xbet_id: Some(21),
        iscj_id: Some(39),
        family: SportFamily::Darts,
        live_phases: &["leg_1", "leg_2", "set_1", "set_2", "in_play", "live"],
        has_draw: false,
    },
    Sport {
        key: "formula_1",
        xbet_id: None,
        iscj_id: Some(15),
        family: SportFamily::Other,
        live_phases: &["race", "qualifying", "in_play", "live"],
        has_draw: false,
    },
    Sport {
        key: "floorball",
        xbet_id: None,
        iscj_id: Some(61),
        family: SportFamily::Periods,
        live_phases: &["1st_period", "2nd_period", "3rd_period", "in_play", "live"],
        has_draw: true,
    },
    Sport {
        key: "gaelic_football",
        xbet_id: None,
        iscj_id: Some(169),
        family: SportFamily::Halves,
        live_phases: &["1st_half", "2nd_half", "in_play", "live"],
        has_draw: true,
    },
    Sport {
        key: "rugby",
        xbet_id: Some(7),
        iscj_id: Some(49),
        family: SportFamily::Halves,
        live_phases: &["1st_half", "2nd_half", "in_play", "live"],
        has_draw: true,
    },
    Sport {
        key: "lacrosse",
        xbet_id: None,
        iscj_id: Some(181),
        family: SportFamily::Quarters,
        live_phases: QUARTERS_NO_OT,
        has_draw: false,
    },
    Sport {
        key: "water_polo",
        xbet_id: None,
        iscj_id: Some(69),
        family: SportFamily::Quarters,
        live_phases: QUARTERS_NO_OT,
        has_draw: false,
    },
    Sport {
        key: "bandy",
        xbet_id: None,
        iscj_id: Some(73),
        family: SportFamily::Halves,
        live_phases: &["1st_half", "2nd_half", "in_play", "live"],
        has_draw: true,
    },
    Sport {
        key: "ski_jumping",
        xbet_id: None,
        iscj_id: Some(189),
        family: SportFamily::Other,
        live_phases: &["jump_1", "jump_2", "in_play", "live"],
        has_draw: false,
    },
    Sport {
        key: "horse_racing",
        xbet_id: None,
        iscj_id: Some(191),
        family: SportFamily::Other,
        live_phases: RACE,
        has_draw: false,
    },
    Sport {
        key: "dog_racing",
        xbet_id: None,
        iscj_id: Some(193),
        family: SportFamily::Other,
        live_phases: RACE,
        has_draw: false,
    },
    Sport {
        key: "chariot_racing",
        xbet_id: None,
        iscj_id: Some(195),
        family: SportFamily::Other,
        live_phases: RACE,
        has_draw: false,
    },
    Sport {
        key: "counter_strike",
        xbet_id: None,
        iscj_id: Some(75),
        family: SportFamily::Esports,
        live_phases: &["round_1", "round_2", "in_play", "live"],
        has_draw: false,
    },
    Sport {
        key: "esports",
        xbet_id: Some(40),
        iscj_id: Some(11),
        family: SportFamily::Esports,
        live_phases: &["game_1", "game_2", "in_play", "live"],
        has_draw: false,
    },
    Sport {
        key: "league_of_legends",
        xbet_id: None,
        iscj_id: Some(77),
        family: SportFamily::Esports,
        live_phases: &["game_1", "game_2", "in_play", "live"],
        has_draw: false,
    },
    Sport {
        key: "valorant",
        xbet_id: None,
        iscj_id: Some(154),
        family: SportFamily::Esports,
        live_phases: &["round_1", "round_2", "in_play", "live"],
        has_draw: false,
    },
];

/// Look up a sport by internal key. Hyphenated keys are accepted.
pub fn lookup(key: &str) -> Option<&'static Sport> {
    let key = key.trim().to_lowercase().replace('-', "_");
    SPORTS.iter().find(|s| s.key == key)
}

/// Reverse lookup from a Provider B numeric id.
pub fn by_iscj_id(id: u32) -> Option<&'static Sport> {
    SPORTS.iter().find(|s| s.iscj_id == Some(id))
}

/// Reverse lookup from a Provider A numeric id.
pub fn by_xbet_id(id: u32) -> Option<&'static Sport> {
    SPORTS.iter().find(|s| s.xbet_id == Some(id))
}
