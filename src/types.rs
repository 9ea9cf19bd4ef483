//! Shared types for the pitchside service.
//!
//! These types form the data model used across all modules. They mirror
//! the flat rows persisted in Postgres; the nested JSON contract served
//! to the frontend lives in `api::routes`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Leagues and teams
// ---------------------------------------------------------------------------

/// A football competition: a domestic division or a tournament.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct League {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub logo_url: String,
    pub current_season: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub logo_url: String,
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

/// Lifecycle of a match, condensed from the upstream short codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InPlay,
    HalfTime,
    Finished,
    Postponed,
    Cancelled,
}

impl MatchStatus {
    /// Map an upstream short status code to our closed set.
    /// Unknown codes are treated as scheduled.
    pub fn from_short_code(code: &str) -> Self {
        match code {
            "NS" | "TBD" => MatchStatus::Scheduled,
            "1H" | "2H" | "ET" | "P" | "LIVE" | "BT" => MatchStatus::InPlay,
            "HT" => MatchStatus::HalfTime,
            "FT" | "AET" | "PEN" => MatchStatus::Finished,
            "PST" | "SUSP" | "INT" => MatchStatus::Postponed,
            "CANC" | "ABD" | "AWD" | "WO" => MatchStatus::Cancelled,
            _ => MatchStatus::Scheduled,
        }
    }

    /// Stable string form used for the `matches.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InPlay => "in_play",
            MatchStatus::HalfTime => "half_time",
            MatchStatus::Finished => "finished",
            MatchStatus::Postponed => "postponed",
            MatchStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the column form back. Unknown values fall back to scheduled,
    /// matching the ingest behaviour for unknown upstream codes.
    pub fn parse(s: &str) -> Self {
        match s {
            "in_play" => MatchStatus::InPlay,
            "half_time" => MatchStatus::HalfTime,
            "finished" => MatchStatus::Finished,
            "postponed" => MatchStatus::Postponed,
            "cancelled" => MatchStatus::Cancelled,
            _ => MatchStatus::Scheduled,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, MatchStatus::Finished)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single scheduled or completed game between two teams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub league_id: i64,
    pub season: i32,
    pub round: String,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub kickoff: DateTime<Utc>,
    pub status: MatchStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.home_score, self.away_score) {
            (Some(h), Some(a)) => write!(
                f,
                "match {} [{}] {}–{} ({})",
                self.id, self.status, h, a, self.kickoff
            ),
            _ => write!(f, "match {} [{}] ({})", self.id, self.status, self.kickoff),
        }
    }
}

// ---------------------------------------------------------------------------
// Highlights
// ---------------------------------------------------------------------------

/// A short video clip associated with a finished match.
/// `match_id` is None until the clip has been linked to a fixture.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Highlight {
    pub id: String,
    pub match_id: Option<i64>,
    pub title: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Match detail rows
// ---------------------------------------------------------------------------

/// One player slot inside a lineup's `players` JSON column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineupPlayer {
    pub name: String,
    pub number: Option<i32>,
    pub position: String,
    pub starter: bool,
}

/// The starting/substitute list and formation for one team in a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lineup {
    pub match_id: i64,
    pub team_id: i64,
    pub formation: String,
    pub coach: String,
    pub players: Vec<LineupPlayer>,
}

/// An in-match event (goal, card, substitution, ...).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchEvent {
    pub match_id: i64,
    pub team_id: i64,
    pub minute: i32,
    pub kind: String,
    pub player: String,
    pub detail: String,
}

/// Aggregate statistics for one team in a match, kept as the raw
/// upstream key/value map.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchStatistics {
    pub match_id: i64,
    pub team_id: i64,
    pub stats: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

/// One row of a league table for a season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingRow {
    pub league_id: i64,
    pub season: i32,
    pub team_id: i64,
    pub rank: i32,
    pub points: i32,
    pub played: i32,
    pub win: i32,
    pub draw: i32,
    pub lose: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    /// Last five results, most recent first, e.g. "WWDLW".
    pub form: String,
}

impl StandingRow {
    pub fn goal_difference(&self) -> i32 {
        self.goals_for - self.goals_against
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_short_code() {
        assert_eq!(MatchStatus::from_short_code("NS"), MatchStatus::Scheduled);
        assert_eq!(MatchStatus::from_short_code("1H"), MatchStatus::InPlay);
        assert_eq!(MatchStatus::from_short_code("HT"), MatchStatus::HalfTime);
        assert_eq!(MatchStatus::from_short_code("FT"), MatchStatus::Finished);
        assert_eq!(MatchStatus::from_short_code("AET"), MatchStatus::Finished);
        assert_eq!(MatchStatus::from_short_code("PEN"), MatchStatus::Finished);
        assert_eq!(MatchStatus::from_short_code("PST"), MatchStatus::Postponed);
        assert_eq!(MatchStatus::from_short_code("CANC"), MatchStatus::Cancelled);
    }

    #[test]
    fn test_status_unknown_code_is_scheduled() {
        assert_eq!(MatchStatus::from_short_code("???"), MatchStatus::Scheduled);
        assert_eq!(MatchStatus::from_short_code(""), MatchStatus::Scheduled);
    }

    #[test]
    fn test_status_column_roundtrip() {
        for status in [
            MatchStatus::Scheduled,
            MatchStatus::InPlay,
            MatchStatus::HalfTime,
            MatchStatus::Finished,
            MatchStatus::Postponed,
            MatchStatus::Cancelled,
        ] {
            assert_eq!(MatchStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_status_parse_unknown() {
        assert_eq!(MatchStatus::parse("garbage"), MatchStatus::Scheduled);
    }

    #[test]
    fn test_goal_difference() {
        let row = StandingRow {
            league_id: 39,
            season: 2025,
            team_id: 50,
            rank: 1,
            points: 30,
            played: 12,
            win: 9,
            draw: 3,
            lose: 0,
            goals_for: 28,
            goals_against: 9,
            form: "WWWDW".into(),
        };
        assert_eq!(row.goal_difference(), 19);
    }
}
