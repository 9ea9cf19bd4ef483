//! Upstream sports-data integration.
//!
//! Defines the `SportsApi` trait the sync engine talks to, and the
//! API-Sports-style HTTP client implementing it. The trait seam keeps
//! ingest logic testable without network access.

pub mod api_football;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{League, Lineup, Match, MatchEvent, MatchStatistics, StandingRow, Team};

/// One fixture as returned by the schedule endpoint: the match row plus
/// the league and team rows it references, so the store can satisfy
/// foreign keys in a single pass.
#[derive(Debug, Clone)]
pub struct FixtureRecord {
    pub league: League,
    pub home_team: Team,
    pub away_team: Team,
    pub fixture: Match,
}

/// One standings row plus the team it references.
#[derive(Debug, Clone)]
pub struct StandingRecord {
    pub team: Team,
    pub row: StandingRow,
}

/// A highlight clip as fetched from the video feed. Carries the team
/// names the feed reports so the sync engine can link it to a fixture.
#[derive(Debug, Clone)]
pub struct FetchedHighlight {
    pub id: String,
    pub title: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
}

/// Abstraction over the third-party sports-data API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SportsApi: Send + Sync {
    /// All fixtures scheduled on a calendar date.
    async fn fetch_fixtures(&self, date: NaiveDate) -> Result<Vec<FixtureRecord>>;

    /// The league table for a season.
    async fn fetch_standings(&self, league_id: i64, season: i32) -> Result<Vec<StandingRecord>>;

    /// In-match events for a fixture.
    async fn fetch_events(&self, fixture_id: i64) -> Result<Vec<MatchEvent>>;

    /// Team lineups for a fixture.
    async fn fetch_lineups(&self, fixture_id: i64) -> Result<Vec<Lineup>>;

    /// Per-team statistics for a fixture.
    async fn fetch_statistics(&self, fixture_id: i64) -> Result<Vec<MatchStatistics>>;

    /// Most recent highlight clips from the video feed.
    async fn fetch_highlights(&self, limit: u32) -> Result<Vec<FetchedHighlight>>;

    /// Upstream name for logging.
    fn name(&self) -> &str;
}
