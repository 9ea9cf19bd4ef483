//! Frontend API route handlers.
//!
//! All endpoints return JSON shaped for the React client: matches come
//! back nested (league + both teams + score) rather than as the flat
//! rows the store returns. The reshaping functions are pure so the
//! contract can be pinned down in unit tests.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;

use crate::error::ApiError;
use crate::store::queries::{self, JoinedMatchRow, LineupRow, StandingWithTeam};
use crate::types::{Highlight, League, LineupPlayer, MatchEvent, MatchStatistics, MatchStatus};
use crate::window::{parse_date, DateWindow};

/// Default and maximum page size for the highlights feed.
const DEFAULT_HIGHLIGHT_LIMIT: i64 = 20;
const MAX_HIGHLIGHT_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct AppContext {
    pub pool: PgPool,
    pub window_days: u32,
    pub default_season: i32,
}

pub type ApiState = Arc<AppContext>;

// ---------------------------------------------------------------------------
// Response types (the frontend JSON contract)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LeagueRef {
    pub id: i64,
    pub name: String,
    pub logo: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSide {
    pub id: i64,
    pub name: String,
    pub logo: String,
    pub score: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchJson {
    pub id: i64,
    pub kickoff: DateTime<Utc>,
    pub status: MatchStatus,
    pub season: i32,
    pub round: String,
    pub league: LeagueRef,
    pub home: MatchSide,
    pub away: MatchSide,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySchedule {
    pub date: String,
    pub matches: Vec<MatchJson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineupJson {
    pub team_id: i64,
    pub team_name: String,
    pub formation: String,
    pub coach: String,
    pub players: Vec<LineupPlayer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchDetail {
    #[serde(flatten)]
    pub summary: MatchJson,
    pub lineups: Vec<LineupJson>,
    pub events: Vec<MatchEvent>,
    pub statistics: Vec<MatchStatistics>,
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StandingJson {
    pub rank: i32,
    pub team: LeagueTeamRef,
    pub points: i32,
    pub played: i32,
    pub win: i32,
    pub draw: i32,
    pub lose: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub form: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeagueTeamRef {
    pub id: i64,
    pub name: String,
    pub logo: String,
}

// ---------------------------------------------------------------------------
// Row → JSON reshaping (pure)
// ---------------------------------------------------------------------------

pub fn to_match_json(row: &JoinedMatchRow) -> MatchJson {
    MatchJson {
        id: row.id,
        kickoff: row.kickoff,
        status: MatchStatus::parse(&row.status),
        season: row.season,
        round: row.round.clone(),
        league: LeagueRef {
            id: row.league_id,
            name: row.league_name.clone(),
            logo: row.league_logo.clone(),
        },
        home: MatchSide {
            id: row.home_team_id,
            name: row.home_team_name.clone(),
            logo: row.home_team_logo.clone(),
            score: row.home_score,
        },
        away: MatchSide {
            id: row.away_team_id,
            name: row.away_team_name.clone(),
            logo: row.away_team_logo.clone(),
            score: row.away_score,
        },
    }
}

/// Bucket window rows per calendar date. Every date in the window gets
/// an entry, empty days included, so the client renders a stable grid.
pub fn group_by_day(window: DateWindow, rows: &[JoinedMatchRow]) -> Vec<DaySchedule> {
    window
        .days()
        .into_iter()
        .map(|date| DaySchedule {
            date: crate::window::fmt_date(date),
            matches: rows
                .iter()
                .filter(|r| r.kickoff.date_naive() == date)
                .map(to_match_json)
                .collect(),
        })
        .collect()
}

fn to_standing_json(row: &StandingWithTeam) -> StandingJson {
    StandingJson {
        rank: row.rank,
        team: LeagueTeamRef {
            id: row.team_id,
            name: row.team_name.clone(),
            logo: row.team_logo.clone(),
        },
        points: row.points,
        played: row.played,
        win: row.win,
        draw: row.draw,
        lose: row.lose,
        goals_for: row.goals_for,
        goals_against: row.goals_against,
        goal_difference: row.goals_for - row.goals_against,
        form: row.form.clone(),
    }
}

fn to_lineup_json(row: LineupRow) -> LineupJson {
    LineupJson {
        team_id: row.team_id,
        team_name: row.team_name,
        formation: row.formation,
        coach: row.coach,
        players: row.players.0,
    }
}

fn clamp_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_HIGHLIGHT_LIMIT)
        .clamp(1, MAX_HIGHLIGHT_LIMIT)
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MatchesParams {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StandingsParams {
    season: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct HighlightsParams {
    limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /api/leagues
pub async fn get_leagues(State(state): State<ApiState>) -> Result<Json<Vec<League>>, ApiError> {
    let leagues = queries::list_leagues(&state.pool).await?;
    Ok(Json(leagues))
}

/// GET /api/matches?date=YYYY-MM-DD
pub async fn get_matches(
    State(state): State<ApiState>,
    Query(params): Query<MatchesParams>,
) -> Result<Json<Vec<MatchJson>>, ApiError> {
    let raw = params
        .date
        .ok_or_else(|| ApiError::BadRequest("missing required query param: date".into()))?;
    let date = parse_date(&raw)
        .ok_or_else(|| ApiError::BadRequest(format!("date must be YYYY-MM-DD, got: {raw}")))?;

    let rows = queries::matches_on_date(&state.pool, date).await?;
    Ok(Json(rows.iter().map(to_match_json).collect()))
}

/// GET /api/matches/upcoming — the 14-day schedule window from today.
pub async fn get_upcoming(
    State(state): State<ApiState>,
) -> Result<Json<Vec<DaySchedule>>, ApiError> {
    let window = DateWindow::upcoming(state.window_days);
    let rows = queries::matches_in_window(&state.pool, window).await?;
    Ok(Json(group_by_day(window, &rows)))
}

/// GET /api/matches/:id — full detail for one match.
pub async fn get_match(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<MatchDetail>, ApiError> {
    let row = queries::match_by_id(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let lineups = queries::lineups_for_match(&state.pool, id).await?;
    let events = queries::events_for_match(&state.pool, id).await?;
    let statistics = queries::statistics_for_match(&state.pool, id).await?;
    let highlights = queries::highlights_for_match(&state.pool, id).await?;

    Ok(Json(MatchDetail {
        summary: to_match_json(&row),
        lineups: lineups.into_iter().map(to_lineup_json).collect(),
        events,
        statistics,
        highlights,
    }))
}

/// GET /api/standings/:league_id?season=
pub async fn get_standings(
    State(state): State<ApiState>,
    Path(league_id): Path<i64>,
    Query(params): Query<StandingsParams>,
) -> Result<Json<Vec<StandingJson>>, ApiError> {
    let season = params.season.unwrap_or(state.default_season);
    let rows = queries::standings_for(&state.pool, league_id, season).await?;
    Ok(Json(rows.iter().map(to_standing_json).collect()))
}

/// GET /api/highlights?limit=
pub async fn get_highlights(
    State(state): State<ApiState>,
    Query(params): Query<HighlightsParams>,
) -> Result<Json<Vec<Highlight>>, ApiError> {
    let limit = clamp_limit(params.limit);
    let highlights = queries::recent_highlights(&state.pool, limit).await?;
    Ok(Json(highlights))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn sample_row(id: i64, kickoff: DateTime<Utc>) -> JoinedMatchRow {
        JoinedMatchRow {
            id,
            season: 2025,
            round: "Regular Season - 28".into(),
            kickoff,
            status: "finished".into(),
            home_score: Some(2),
            away_score: Some(1),
            league_id: 39,
            league_name: "Premier League".into(),
            league_logo: "https://media.example.com/leagues/39.png".into(),
            home_team_id: 50,
            home_team_name: "Manchester City".into(),
            home_team_logo: "https://media.example.com/teams/50.png".into(),
            away_team_id: 40,
            away_team_name: "Liverpool".into(),
            away_team_logo: "https://media.example.com/teams/40.png".into(),
        }
    }

    fn kickoff_at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_match_json_shape() {
        let row = sample_row(1035045, kickoff_at(2026, 3, 7, 15));
        let json = to_match_json(&row);

        assert_eq!(json.id, 1035045);
        assert_eq!(json.status, MatchStatus::Finished);
        assert_eq!(json.league.name, "Premier League");
        assert_eq!(json.home.name, "Manchester City");
        assert_eq!(json.home.score, Some(2));
        assert_eq!(json.away.score, Some(1));
    }

    #[test]
    fn test_match_json_serialized_fields() {
        let row = sample_row(7, kickoff_at(2026, 3, 7, 15));
        let value = serde_json::to_value(to_match_json(&row)).unwrap();

        assert_eq!(value["status"], "finished");
        assert_eq!(value["league"]["id"], 39);
        assert_eq!(value["home"]["score"], 2);
        assert_eq!(value["away"]["name"], "Liverpool");
    }

    #[test]
    fn test_scheduled_match_has_null_scores() {
        let mut row = sample_row(8, kickoff_at(2026, 3, 9, 20));
        row.status = "scheduled".into();
        row.home_score = None;
        row.away_score = None;

        let value = serde_json::to_value(to_match_json(&row)).unwrap();
        assert_eq!(value["status"], "scheduled");
        assert!(value["home"]["score"].is_null());
    }

    #[test]
    fn test_group_by_day_covers_whole_window() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let window = DateWindow::starting_at(start, 14);
        let rows = vec![
            sample_row(1, kickoff_at(2026, 3, 1, 12)),
            sample_row(2, kickoff_at(2026, 3, 1, 17)),
            sample_row(3, kickoff_at(2026, 3, 5, 20)),
        ];

        let days = group_by_day(window, &rows);
        assert_eq!(days.len(), 14);
        assert_eq!(days[0].date, "2026-03-01");
        assert_eq!(days[0].matches.len(), 2);
        assert_eq!(days[4].matches.len(), 1);
        assert!(days[1].matches.is_empty());
        assert_eq!(days[13].date, "2026-03-14");
    }

    #[test]
    fn test_group_by_day_drops_out_of_window_rows() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let window = DateWindow::starting_at(start, 14);
        let rows = vec![sample_row(1, kickoff_at(2026, 4, 2, 12))];

        let days = group_by_day(window, &rows);
        assert!(days.iter().all(|d| d.matches.is_empty()));
    }

    #[test]
    fn test_standing_json_goal_difference() {
        let row = StandingWithTeam {
            rank: 1,
            points: 64,
            played: 28,
            win: 20,
            draw: 4,
            lose: 4,
            goals_for: 62,
            goals_against: 25,
            form: "WWDWW".into(),
            team_id: 50,
            team_name: "Manchester City".into(),
            team_logo: String::new(),
        };
        let json = to_standing_json(&row);
        assert_eq!(json.goal_difference, 37);
        assert_eq!(json.team.id, 50);
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_HIGHLIGHT_LIMIT);
        assert_eq!(clamp_limit(Some(5)), 5);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-3)), 1);
        assert_eq!(clamp_limit(Some(10_000)), MAX_HIGHLIGHT_LIMIT);
    }
}
