//! Write path: upsert-by-primary-key statements.
//!
//! Every entity is written with `ON CONFLICT ... DO UPDATE` so repeated
//! ingest cycles converge on the latest upstream state. Match events
//! have no stable upstream id, so they are replaced wholesale per match.

use anyhow::Result;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::types::{
    Highlight, League, Lineup, Match, MatchEvent, MatchStatistics, StandingRow, Team,
};

pub async fn upsert_league(pool: &PgPool, league: &League) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO leagues (id, name, country, logo_url, current_season)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            country = EXCLUDED.country,
            logo_url = EXCLUDED.logo_url,
            current_season = EXCLUDED.current_season
        "#,
    )
    .bind(league.id)
    .bind(&league.name)
    .bind(&league.country)
    .bind(&league.logo_url)
    .bind(league.current_season)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert_team(pool: &PgPool, team: &Team) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO teams (id, name, country, logo_url)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            country = EXCLUDED.country,
            logo_url = EXCLUDED.logo_url
        "#,
    )
    .bind(team.id)
    .bind(&team.name)
    .bind(&team.country)
    .bind(&team.logo_url)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert_match(pool: &PgPool, m: &Match) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO matches
            (id, league_id, season, round, home_team_id, away_team_id,
             kickoff, status, home_score, away_score)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO UPDATE SET
            league_id = EXCLUDED.league_id,
            season = EXCLUDED.season,
            round = EXCLUDED.round,
            home_team_id = EXCLUDED.home_team_id,
            away_team_id = EXCLUDED.away_team_id,
            kickoff = EXCLUDED.kickoff,
            status = EXCLUDED.status,
            home_score = EXCLUDED.home_score,
            away_score = EXCLUDED.away_score
        "#,
    )
    .bind(m.id)
    .bind(m.league_id)
    .bind(m.season)
    .bind(&m.round)
    .bind(m.home_team_id)
    .bind(m.away_team_id)
    .bind(m.kickoff)
    .bind(m.status.as_str())
    .bind(m.home_score)
    .bind(m.away_score)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert_highlight(pool: &PgPool, h: &Highlight) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO highlights
            (id, match_id, title, video_url, thumbnail_url, source, published_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE SET
            match_id = COALESCE(EXCLUDED.match_id, highlights.match_id),
            title = EXCLUDED.title,
            video_url = EXCLUDED.video_url,
            thumbnail_url = EXCLUDED.thumbnail_url,
            source = EXCLUDED.source,
            published_at = EXCLUDED.published_at
        "#,
    )
    .bind(&h.id)
    .bind(h.match_id)
    .bind(&h.title)
    .bind(&h.video_url)
    .bind(&h.thumbnail_url)
    .bind(&h.source)
    .bind(h.published_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Point an already-stored highlight at a match.
pub async fn set_highlight_match(pool: &PgPool, highlight_id: &str, match_id: i64) -> Result<()> {
    sqlx::query("UPDATE highlights SET match_id = $2 WHERE id = $1")
        .bind(highlight_id)
        .bind(match_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn upsert_lineup(pool: &PgPool, lineup: &Lineup) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO lineups (match_id, team_id, formation, coach, players)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (match_id, team_id) DO UPDATE SET
            formation = EXCLUDED.formation,
            coach = EXCLUDED.coach,
            players = EXCLUDED.players
        "#,
    )
    .bind(lineup.match_id)
    .bind(lineup.team_id)
    .bind(&lineup.formation)
    .bind(&lineup.coach)
    .bind(Json(&lineup.players))
    .execute(pool)
    .await?;
    Ok(())
}

/// Replace all events for a match. Events have no upstream id, so the
/// full set is rewritten inside one transaction.
pub async fn replace_events(pool: &PgPool, match_id: i64, events: &[MatchEvent]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM match_events WHERE match_id = $1")
        .bind(match_id)
        .execute(&mut *tx)
        .await?;

    for e in events {
        sqlx::query(
            r#"
            INSERT INTO match_events (match_id, team_id, minute, kind, player, detail)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(e.match_id)
        .bind(e.team_id)
        .bind(e.minute)
        .bind(&e.kind)
        .bind(&e.player)
        .bind(&e.detail)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn upsert_statistics(pool: &PgPool, stats: &MatchStatistics) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO match_statistics (match_id, team_id, stats)
        VALUES ($1, $2, $3)
        ON CONFLICT (match_id, team_id) DO UPDATE SET
            stats = EXCLUDED.stats
        "#,
    )
    .bind(stats.match_id)
    .bind(stats.team_id)
    .bind(&stats.stats)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert_standing(pool: &PgPool, row: &StandingRow) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO standings
            (league_id, season, team_id, rank, points, played, win, draw, lose,
             goals_for, goals_against, form)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (league_id, season, team_id) DO UPDATE SET
            rank = EXCLUDED.rank,
            points = EXCLUDED.points,
            played = EXCLUDED.played,
            win = EXCLUDED.win,
            draw = EXCLUDED.draw,
            lose = EXCLUDED.lose,
            goals_for = EXCLUDED.goals_for,
            goals_against = EXCLUDED.goals_against,
            form = EXCLUDED.form
        "#,
    )
    .bind(row.league_id)
    .bind(row.season)
    .bind(row.team_id)
    .bind(row.rank)
    .bind(row.points)
    .bind(row.played)
    .bind(row.win)
    .bind(row.draw)
    .bind(row.lose)
    .bind(row.goals_for)
    .bind(row.goals_against)
    .bind(&row.form)
    .execute(pool)
    .await?;
    Ok(())
}

/// Overwrite the derived form string for one team in one table.
pub async fn update_form(
    pool: &PgPool,
    league_id: i64,
    season: i32,
    team_id: i64,
    form: &str,
) -> Result<()> {
    sqlx::query(
        "UPDATE standings SET form = $4 WHERE league_id = $1 AND season = $2 AND team_id = $3",
    )
    .bind(league_id)
    .bind(season)
    .bind(team_id)
    .bind(form)
    .execute(pool)
    .await?;
    Ok(())
}
