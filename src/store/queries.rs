//! Read path: queries shaped for the frontend endpoints.
//!
//! Match listings come back as one flat joined row per match; the
//! reshaping into the nested JSON contract happens in `api::routes`.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::types::{Highlight, League, LineupPlayer, MatchEvent, MatchStatistics};
use crate::window::DateWindow;

// ---------------------------------------------------------------------------
// Row shapes
// ---------------------------------------------------------------------------

/// One match with its league and both team rows flattened in.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JoinedMatchRow {
    pub id: i64,
    pub season: i32,
    pub round: String,
    pub kickoff: DateTime<Utc>,
    pub status: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub league_id: i64,
    pub league_name: String,
    pub league_logo: String,
    pub home_team_id: i64,
    pub home_team_name: String,
    pub home_team_logo: String,
    pub away_team_id: i64,
    pub away_team_name: String,
    pub away_team_logo: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StandingWithTeam {
    pub rank: i32,
    pub points: i32,
    pub played: i32,
    pub win: i32,
    pub draw: i32,
    pub lose: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub form: String,
    pub team_id: i64,
    pub team_name: String,
    pub team_logo: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LineupRow {
    pub match_id: i64,
    pub team_id: i64,
    pub team_name: String,
    pub formation: String,
    pub coach: String,
    pub players: Json<Vec<LineupPlayer>>,
}

/// A finished match reduced to the fields form derivation needs.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct FinishedResult {
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub home_score: i32,
    pub away_score: i32,
}

const MATCH_SELECT: &str = r#"
    SELECT m.id, m.season, m.round, m.kickoff, m.status, m.home_score, m.away_score,
           l.id AS league_id, l.name AS league_name, l.logo_url AS league_logo,
           h.id AS home_team_id, h.name AS home_team_name, h.logo_url AS home_team_logo,
           a.id AS away_team_id, a.name AS away_team_name, a.logo_url AS away_team_logo
    FROM matches m
    JOIN leagues l ON l.id = m.league_id
    JOIN teams h ON h.id = m.home_team_id
    JOIN teams a ON a.id = m.away_team_id
"#;

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

pub async fn list_leagues(pool: &PgPool) -> Result<Vec<League>> {
    let rows = sqlx::query_as::<_, League>(
        "SELECT id, name, country, logo_url, current_season FROM leagues ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Matches kicking off on one calendar date (UTC).
pub async fn matches_on_date(pool: &PgPool, date: NaiveDate) -> Result<Vec<JoinedMatchRow>> {
    let sql = format!("{MATCH_SELECT} WHERE m.kickoff >= $1 AND m.kickoff < $2 ORDER BY m.kickoff");
    let rows = sqlx::query_as::<_, JoinedMatchRow>(&sql)
        .bind(day_start(date))
        .bind(day_start(date) + Duration::days(1))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Matches kicking off inside an inclusive date window.
pub async fn matches_in_window(pool: &PgPool, window: DateWindow) -> Result<Vec<JoinedMatchRow>> {
    let sql = format!("{MATCH_SELECT} WHERE m.kickoff >= $1 AND m.kickoff < $2 ORDER BY m.kickoff");
    let rows = sqlx::query_as::<_, JoinedMatchRow>(&sql)
        .bind(day_start(window.start))
        .bind(day_start(window.end) + Duration::days(1))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn match_by_id(pool: &PgPool, id: i64) -> Result<Option<JoinedMatchRow>> {
    let sql = format!("{MATCH_SELECT} WHERE m.id = $1");
    let row = sqlx::query_as::<_, JoinedMatchRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn standings_for(
    pool: &PgPool,
    league_id: i64,
    season: i32,
) -> Result<Vec<StandingWithTeam>> {
    let rows = sqlx::query_as::<_, StandingWithTeam>(
        r#"
        SELECT s.rank, s.points, s.played, s.win, s.draw, s.lose,
               s.goals_for, s.goals_against, s.form,
               t.id AS team_id, t.name AS team_name, t.logo_url AS team_logo
        FROM standings s
        JOIN teams t ON t.id = s.team_id
        WHERE s.league_id = $1 AND s.season = $2
        ORDER BY s.rank
        "#,
    )
    .bind(league_id)
    .bind(season)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn highlights_for_match(pool: &PgPool, match_id: i64) -> Result<Vec<Highlight>> {
    let rows = sqlx::query_as::<_, Highlight>(
        r#"
        SELECT id, match_id, title, video_url, thumbnail_url, source, published_at
        FROM highlights WHERE match_id = $1 ORDER BY published_at DESC
        "#,
    )
    .bind(match_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Most recent highlights that have been linked to a match.
pub async fn recent_highlights(pool: &PgPool, limit: i64) -> Result<Vec<Highlight>> {
    let rows = sqlx::query_as::<_, Highlight>(
        r#"
        SELECT id, match_id, title, video_url, thumbnail_url, source, published_at
        FROM highlights WHERE match_id IS NOT NULL
        ORDER BY published_at DESC LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Highlights still waiting to be linked to a fixture.
pub async fn unlinked_highlights(pool: &PgPool, limit: i64) -> Result<Vec<Highlight>> {
    let rows = sqlx::query_as::<_, Highlight>(
        r#"
        SELECT id, match_id, title, video_url, thumbnail_url, source, published_at
        FROM highlights WHERE match_id IS NULL
        ORDER BY published_at DESC LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn lineups_for_match(pool: &PgPool, match_id: i64) -> Result<Vec<LineupRow>> {
    let rows = sqlx::query_as::<_, LineupRow>(
        r#"
        SELECT lu.match_id, lu.team_id, t.name AS team_name,
               lu.formation, lu.coach, lu.players
        FROM lineups lu
        JOIN teams t ON t.id = lu.team_id
        WHERE lu.match_id = $1
        "#,
    )
    .bind(match_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn events_for_match(pool: &PgPool, match_id: i64) -> Result<Vec<MatchEvent>> {
    let rows = sqlx::query_as::<_, MatchEvent>(
        r#"
        SELECT match_id, team_id, minute, kind, player, detail
        FROM match_events WHERE match_id = $1 ORDER BY minute
        "#,
    )
    .bind(match_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn statistics_for_match(pool: &PgPool, match_id: i64) -> Result<Vec<MatchStatistics>> {
    let rows = sqlx::query_as::<_, MatchStatistics>(
        "SELECT match_id, team_id, stats FROM match_statistics WHERE match_id = $1",
    )
    .bind(match_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Resolve a highlight to a fixture by the team names the feed reports.
/// Searches kickoffs in the three days before publication; clips are
/// published after full time.
pub async fn find_match_for_highlight(
    pool: &PgPool,
    home_team: &str,
    away_team: &str,
    published_at: DateTime<Utc>,
) -> Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT m.id FROM matches m
        JOIN teams h ON h.id = m.home_team_id
        JOIN teams a ON a.id = m.away_team_id
        WHERE LOWER(h.name) = LOWER($1)
          AND LOWER(a.name) = LOWER($2)
          AND m.kickoff BETWEEN $3 AND $4
        ORDER BY m.kickoff DESC
        LIMIT 1
        "#,
    )
    .bind(home_team)
    .bind(away_team)
    .bind(published_at - Duration::days(3))
    .bind(published_at)
    .fetch_optional(pool)
    .await?;
    Ok(id)
}

/// Last `limit` finished results involving a team, most recent first.
pub async fn recent_results(pool: &PgPool, team_id: i64, limit: i64) -> Result<Vec<FinishedResult>> {
    let rows = sqlx::query_as::<_, FinishedResult>(
        r#"
        SELECT home_team_id, away_team_id, home_score, away_score
        FROM matches
        WHERE status = 'finished'
          AND home_score IS NOT NULL AND away_score IS NOT NULL
          AND (home_team_id = $1 OR away_team_id = $1)
        ORDER BY kickoff DESC
        LIMIT $2
        "#,
    )
    .bind(team_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Team ids present in one season's standings table.
pub async fn standings_team_ids(pool: &PgPool, league_id: i64, season: i32) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT team_id FROM standings WHERE league_id = $1 AND season = $2",
    )
    .bind(league_id)
    .bind(season)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
