//! Periodic ingest from the upstream API into Postgres.
//!
//! Each cycle walks the schedule window one date at a time, upserts
//! leagues/teams/matches, pulls details (events, lineups, statistics)
//! for started fixtures in fixed-size chunks with a sleep between
//! chunks, refreshes standings for the tracked leagues, links highlight
//! clips to fixtures, and recomputes team form. Everything runs
//! sequentially on one task; a failed cycle is logged and the loop
//! moves on to the next tick.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{LeaguesConfig, SyncConfig};
use crate::store::queries::{self, FinishedResult};
use crate::store::upserts;
use crate::types::{Highlight, MatchStatus};
use crate::upstream::{FixtureRecord, SportsApi};
use crate::window::DateWindow;

/// How many results feed the form string.
const FORM_LENGTH: i64 = 5;

/// Summary of one ingest cycle, for the cycle log line.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub fixtures_upserted: usize,
    pub details_fetched: usize,
    pub standings_rows: usize,
    pub highlights_fetched: usize,
    pub highlights_linked: usize,
}

pub struct Syncer {
    api: Arc<dyn SportsApi>,
    pool: PgPool,
    cfg: SyncConfig,
    leagues: LeaguesConfig,
}

impl Syncer {
    pub fn new(api: Arc<dyn SportsApi>, pool: PgPool, cfg: SyncConfig, leagues: LeaguesConfig) -> Self {
        Self {
            api,
            pool,
            cfg,
            leagues,
        }
    }

    /// Run the ingest loop until shutdown. Interval plus a clock-derived
    /// jitter so multiple instances don't tick in lockstep.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.cfg.interval_secs));
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!(
            interval_secs = self.cfg.interval_secs,
            window_days = self.cfg.window_days,
            upstream = self.api.name(),
            "Sync loop starting"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    tokio::time::sleep(jitter(self.cfg.jitter_secs)).await;
                    match self.run_cycle().await {
                        Ok(report) => log_report(&report),
                        Err(e) => error!(error = %e, "Sync cycle failed — continuing to next"),
                    }
                }
                _ = &mut shutdown => {
                    info!("Sync loop shutting down");
                    break;
                }
            }
        }
    }

    /// One full ingest pass.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::default();
        let window = DateWindow::upcoming(self.cfg.window_days);
        info!(start = %window.start, end = %window.end, "Starting sync cycle");

        // 1. Schedule window: fixtures + the league/team rows they reference.
        let fixtures = fetch_window(self.api.as_ref(), window).await;
        for rec in &fixtures {
            self.upsert_fixture(rec)
                .await
                .with_context(|| format!("Failed to store fixture {}", rec.fixture.id))?;
            report.fixtures_upserted += 1;
        }

        // 2. Details for fixtures that have started, in rate-limited chunks.
        let candidates = detail_candidates(&fixtures);
        for chunk in candidates.chunks(self.cfg.batch_size.max(1)) {
            for &fixture_id in chunk {
                if let Err(e) = self.sync_details(fixture_id).await {
                    warn!(fixture_id, error = %e, "Detail sync failed, skipping fixture");
                } else {
                    report.details_fetched += 1;
                }
            }
            tokio::time::sleep(Duration::from_millis(self.cfg.batch_delay_ms)).await;
        }

        // 3. Standings for tracked leagues.
        for &league_id in &self.leagues.tracked {
            match self.api.fetch_standings(league_id, self.leagues.season).await {
                Ok(records) => {
                    for rec in records {
                        upserts::upsert_team(&self.pool, &rec.team).await?;
                        upserts::upsert_standing(&self.pool, &rec.row).await?;
                        report.standings_rows += 1;
                    }
                }
                Err(e) => warn!(league_id, error = %e, "Standings fetch failed, skipping league"),
            }
        }

        // 4. Highlights: store new clips, then link whatever can be linked.
        report.highlights_fetched = self.sync_highlights().await?;
        report.highlights_linked = self.link_pending_highlights().await?;

        // 5. Derived team form.
        self.refresh_form().await?;

        Ok(report)
    }

    async fn upsert_fixture(&self, rec: &FixtureRecord) -> Result<()> {
        upserts::upsert_league(&self.pool, &rec.league).await?;
        upserts::upsert_team(&self.pool, &rec.home_team).await?;
        upserts::upsert_team(&self.pool, &rec.away_team).await?;
        upserts::upsert_match(&self.pool, &rec.fixture).await?;
        Ok(())
    }

    /// Events, lineups, and statistics for one fixture.
    async fn sync_details(&self, fixture_id: i64) -> Result<()> {
        let events = self.api.fetch_events(fixture_id).await?;
        upserts::replace_events(&self.pool, fixture_id, &events).await?;

        for lineup in self.api.fetch_lineups(fixture_id).await? {
            upserts::upsert_lineup(&self.pool, &lineup).await?;
        }

        for stats in self.api.fetch_statistics(fixture_id).await? {
            upserts::upsert_statistics(&self.pool, &stats).await?;
        }

        debug!(fixture_id, events = events.len(), "Fixture details stored");
        Ok(())
    }

    /// Pull the recent clip feed and store each clip, linked if the
    /// teams+date resolve to a known fixture.
    async fn sync_highlights(&self) -> Result<usize> {
        let clips = self
            .api
            .fetch_highlights(self.cfg.highlight_limit)
            .await
            .context("Highlight feed fetch failed")?;

        let count = clips.len();
        for clip in clips {
            let match_id = queries::find_match_for_highlight(
                &self.pool,
                &clip.home_team,
                &clip.away_team,
                clip.published_at,
            )
            .await?;

            let highlight = Highlight {
                id: clip.id,
                match_id,
                title: clip.title,
                video_url: clip.video_url,
                thumbnail_url: clip.thumbnail_url,
                source: clip.source,
                published_at: clip.published_at,
            };
            upserts::upsert_highlight(&self.pool, &highlight).await?;
        }
        Ok(count)
    }

    /// Retry linking clips that arrived before their fixture did.
    /// The stored title keeps the feed's "Home X-Y Away" prefix, so a
    /// clip with no linkable fixture simply stays unlinked.
    async fn link_pending_highlights(&self) -> Result<usize> {
        let pending =
            queries::unlinked_highlights(&self.pool, i64::from(self.cfg.highlight_limit)).await?;

        let mut linked = 0;
        for h in pending {
            let Some((home, away)) = teams_from_title(&h.title) else {
                continue;
            };
            if let Some(match_id) =
                queries::find_match_for_highlight(&self.pool, &home, &away, h.published_at).await?
            {
                upserts::set_highlight_match(&self.pool, &h.id, match_id).await?;
                linked += 1;
            }
        }
        Ok(linked)
    }

    /// Recompute the form string for every team in the tracked tables.
    async fn refresh_form(&self) -> Result<()> {
        for &league_id in &self.leagues.tracked {
            let team_ids =
                queries::standings_team_ids(&self.pool, league_id, self.leagues.season).await?;
            for team_id in team_ids {
                let results = queries::recent_results(&self.pool, team_id, FORM_LENGTH).await?;
                let form = form_string(team_id, &results);
                upserts::update_form(&self.pool, league_id, self.leagues.season, team_id, &form)
                    .await?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Fetch fixtures for every date in the window, sequentially. A failed
/// date is logged and skipped; the rest of the window still loads.
pub async fn fetch_window(api: &dyn SportsApi, window: DateWindow) -> Vec<FixtureRecord> {
    let mut out = Vec::new();
    for date in window.days() {
        match api.fetch_fixtures(date).await {
            Ok(mut recs) => out.append(&mut recs),
            Err(e) => warn!(date = %date, error = %e, "Fixture fetch failed for date"),
        }
    }
    out
}

/// Fixtures worth a detail fetch: anything that has started.
pub fn detail_candidates(fixtures: &[FixtureRecord]) -> Vec<i64> {
    fixtures
        .iter()
        .filter(|r| {
            matches!(
                r.fixture.status,
                MatchStatus::InPlay | MatchStatus::HalfTime | MatchStatus::Finished
            )
        })
        .map(|r| r.fixture.id)
        .collect()
}

/// Build the "WWDLW" form string, most recent result first.
pub fn form_string(team_id: i64, results: &[FinishedResult]) -> String {
    results
        .iter()
        .map(|r| {
            let (ours, theirs) = if r.home_team_id == team_id {
                (r.home_score, r.away_score)
            } else {
                (r.away_score, r.home_score)
            };
            match ours.cmp(&theirs) {
                std::cmp::Ordering::Greater => 'W',
                std::cmp::Ordering::Equal => 'D',
                std::cmp::Ordering::Less => 'L',
            }
        })
        .collect()
}

/// Best-effort "Home 2-1 Away | ..." title parse for relinking clips
/// stored before their fixture existed.
pub fn teams_from_title(title: &str) -> Option<(String, String)> {
    let head = title.split('|').next()?.trim();
    // "Home 2-1 Away" or "Home vs Away"
    if let Some((left, right)) = head.split_once(" vs ") {
        return Some((left.trim().to_string(), right.trim().to_string()));
    }
    let mut parts = head.split_whitespace().collect::<Vec<_>>();
    let score_pos = parts.iter().position(|w| {
        let mut it = w.split('-');
        matches!(
            (it.next(), it.next(), it.next()),
            (Some(a), Some(b), None)
                if a.parse::<u32>().is_ok() && b.parse::<u32>().is_ok()
        )
    })?;
    if score_pos == 0 || score_pos == parts.len() - 1 {
        return None;
    }
    let away = parts.split_off(score_pos + 1).join(" ");
    parts.truncate(score_pos);
    Some((parts.join(" "), away))
}

/// Clock-derived tick offset. Only needs to de-synchronise instances,
/// not be uniform.
fn jitter(max_secs: u64) -> Duration {
    if max_secs == 0 {
        return Duration::ZERO;
    }
    let nanos = u64::from(Utc::now().timestamp_subsec_nanos());
    Duration::from_secs(nanos % (max_secs + 1))
}

fn log_report(report: &CycleReport) {
    info!(
        fixtures = report.fixtures_upserted,
        details = report.details_fetched,
        standings = report.standings_rows,
        highlights = report.highlights_fetched,
        linked = report.highlights_linked,
        "Sync cycle complete"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
