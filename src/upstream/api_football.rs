//! API-Sports football client.
//!
//! Talks to the v3 football API (`https://v3.football.api-sports.io`)
//! plus its highlights feed. Auth is a single `x-apisports-key` header.
//! Every endpoint wraps its payload in a `{ "response": [...] }`
//! envelope; we only deserialize the fields we need.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{FetchedHighlight, FixtureRecord, SportsApi, StandingRecord};
use crate::types::{
    League, Lineup, LineupPlayer, Match, MatchEvent, MatchStatistics, MatchStatus, StandingRow,
    Team,
};
use crate::window::fmt_date;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Header carrying the API key, forwarded verbatim by the proxy too.
pub const API_KEY_HEADER: &str = "x-apisports-key";

const UPSTREAM_NAME: &str = "api-football";

// ---------------------------------------------------------------------------
// Wire types (upstream JSON → Rust)
// ---------------------------------------------------------------------------

/// Every endpoint wraps its rows in this envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "Vec::new")]
    response: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ApiFixture {
    fixture: ApiFixtureCore,
    league: ApiLeague,
    teams: ApiTeamPair,
    goals: ApiGoals,
}

#[derive(Debug, Deserialize)]
struct ApiFixtureCore {
    id: i64,
    /// RFC 3339 kickoff timestamp.
    date: String,
    status: ApiStatusBlock,
}

#[derive(Debug, Deserialize)]
struct ApiStatusBlock {
    #[serde(default)]
    short: String,
}

#[derive(Debug, Deserialize)]
struct ApiLeague {
    id: i64,
    name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    logo: String,
    season: i32,
    #[serde(default)]
    round: String,
}

#[derive(Debug, Deserialize)]
struct ApiTeamPair {
    home: ApiTeam,
    away: ApiTeam,
}

#[derive(Debug, Deserialize)]
struct ApiTeam {
    id: i64,
    name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    logo: String,
}

#[derive(Debug, Deserialize)]
struct ApiGoals {
    #[serde(default)]
    home: Option<i32>,
    #[serde(default)]
    away: Option<i32>,
}

/// `/standings` rows arrive nested: one league object holding groups of
/// table rows (`standings` is a list of lists — one per group/stage).
#[derive(Debug, Deserialize)]
struct ApiStandingsEntry {
    league: ApiStandingsLeague,
}

#[derive(Debug, Deserialize)]
struct ApiStandingsLeague {
    id: i64,
    season: i32,
    #[serde(default)]
    standings: Vec<Vec<ApiStandingRow>>,
}

#[derive(Debug, Deserialize)]
struct ApiStandingRow {
    rank: i32,
    team: ApiTeam,
    points: i32,
    #[serde(default)]
    form: Option<String>,
    all: ApiRecord,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    played: i32,
    win: i32,
    draw: i32,
    lose: i32,
    goals: ApiRecordGoals,
}

#[derive(Debug, Deserialize)]
struct ApiRecordGoals {
    #[serde(rename = "for")]
    goals_for: i32,
    against: i32,
}

#[derive(Debug, Deserialize)]
struct ApiEvent {
    time: ApiEventTime,
    team: ApiTeam,
    player: ApiEventPlayer,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    detail: String,
}

#[derive(Debug, Deserialize)]
struct ApiEventTime {
    elapsed: i32,
    #[serde(default)]
    extra: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ApiEventPlayer {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiLineup {
    team: ApiTeam,
    #[serde(default)]
    formation: Option<String>,
    #[serde(default)]
    coach: ApiCoach,
    #[serde(rename = "startXI", default)]
    start_xi: Vec<ApiLineupSlot>,
    #[serde(default)]
    substitutes: Vec<ApiLineupSlot>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiCoach {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiLineupSlot {
    player: ApiLineupPlayer,
}

#[derive(Debug, Deserialize)]
struct ApiLineupPlayer {
    name: String,
    #[serde(default)]
    number: Option<i32>,
    #[serde(default)]
    pos: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiStatistics {
    team: ApiTeam,
    #[serde(default)]
    statistics: Vec<ApiStatItem>,
}

#[derive(Debug, Deserialize)]
struct ApiStatItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiHighlight {
    id: String,
    title: String,
    url: String,
    #[serde(default)]
    thumbnail: String,
    #[serde(default)]
    source: String,
    /// RFC 3339 publication timestamp.
    published_at: String,
    teams: ApiHighlightTeams,
}

#[derive(Debug, Deserialize)]
struct ApiHighlightTeams {
    home: String,
    away: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the football API.
pub struct ApiFootballClient {
    http: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl ApiFootballClient {
    pub fn new(base_url: &str, api_key: Secret<String>, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent("pitchside/0.1.0")
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// GET an enveloped endpoint and return its `response` rows.
    async fn get_rows<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<Vec<T>> {
        let url = format!("{}/{}", self.base_url, path_and_query);
        debug!(url = %url, "Fetching upstream rows");

        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .with_context(|| format!("Upstream request failed: {path_and_query}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Upstream error {status} on {path_and_query}: {body}");
        }

        let envelope: Envelope<T> = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse upstream response: {path_and_query}"))?;

        Ok(envelope.response)
    }

    // -- Conversions -----------------------------------------------------

    /// Parse an RFC 3339 kickoff timestamp.
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("Bad upstream timestamp: {s}"))
    }

    fn to_team(t: ApiTeam) -> Team {
        Team {
            id: t.id,
            name: t.name,
            country: t.country,
            logo_url: t.logo,
        }
    }

    fn to_fixture_record(f: ApiFixture) -> Result<FixtureRecord> {
        let kickoff = Self::parse_timestamp(&f.fixture.date)?;
        let league = League {
            id: f.league.id,
            name: f.league.name,
            country: f.league.country,
            logo_url: f.league.logo,
            current_season: f.league.season,
        };
        let home_team = Self::to_team(f.teams.home);
        let away_team = Self::to_team(f.teams.away);

        let fixture = Match {
            id: f.fixture.id,
            league_id: league.id,
            season: f.league.season,
            round: f.league.round,
            home_team_id: home_team.id,
            away_team_id: away_team.id,
            kickoff,
            status: MatchStatus::from_short_code(&f.fixture.status.short),
            home_score: f.goals.home,
            away_score: f.goals.away,
        };

        Ok(FixtureRecord {
            league,
            home_team,
            away_team,
            fixture,
        })
    }

    fn to_standing_record(league_id: i64, season: i32, row: ApiStandingRow) -> StandingRecord {
        let team = Self::to_team(row.team);
        StandingRecord {
            row: StandingRow {
                league_id,
                season,
                team_id: team.id,
                rank: row.rank,
                points: row.points,
                played: row.all.played,
                win: row.all.win,
                draw: row.all.draw,
                lose: row.all.lose,
                goals_for: row.all.goals.goals_for,
                goals_against: row.all.goals.against,
                form: row.form.unwrap_or_default(),
            },
            team,
        }
    }

    fn to_event(fixture_id: i64, e: ApiEvent) -> MatchEvent {
        MatchEvent {
            match_id: fixture_id,
            team_id: e.team.id,
            minute: e.time.elapsed + e.time.extra.unwrap_or(0),
            kind: e.kind,
            player: e.player.name.unwrap_or_default(),
            detail: e.detail,
        }
    }

    fn to_lineup(fixture_id: i64, l: ApiLineup) -> Lineup {
        let slot = |s: ApiLineupSlot, starter: bool| LineupPlayer {
            name: s.player.name,
            number: s.player.number,
            position: s.player.pos.unwrap_or_default(),
            starter,
        };

        let mut players: Vec<LineupPlayer> =
            l.start_xi.into_iter().map(|s| slot(s, true)).collect();
        players.extend(l.substitutes.into_iter().map(|s| slot(s, false)));

        Lineup {
            match_id: fixture_id,
            team_id: l.team.id,
            formation: l.formation.unwrap_or_default(),
            coach: l.coach.name.unwrap_or_default(),
            players,
        }
    }

    /// Fold the upstream `[{type, value}]` list into one JSON object.
    fn to_statistics(fixture_id: i64, s: ApiStatistics) -> MatchStatistics {
        let mut map = serde_json::Map::new();
        for item in s.statistics {
            map.insert(item.kind, item.value);
        }
        MatchStatistics {
            match_id: fixture_id,
            team_id: s.team.id,
            stats: serde_json::Value::Object(map),
        }
    }

    fn to_highlight(h: ApiHighlight) -> Result<FetchedHighlight> {
        let published_at = Self::parse_timestamp(&h.published_at)?;
        Ok(FetchedHighlight {
            id: h.id,
            title: h.title,
            video_url: h.url,
            thumbnail_url: h.thumbnail,
            source: h.source,
            published_at,
            home_team: h.teams.home,
            away_team: h.teams.away,
        })
    }
}

// ---------------------------------------------------------------------------
// SportsApi trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl SportsApi for ApiFootballClient {
    async fn fetch_fixtures(&self, date: NaiveDate) -> Result<Vec<FixtureRecord>> {
        let rows: Vec<ApiFixture> = self
            .get_rows(&format!("fixtures?date={}", fmt_date(date)))
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.fixture.id;
            match Self::to_fixture_record(row) {
                Ok(rec) => out.push(rec),
                Err(e) => warn!(fixture_id = id, error = %e, "Skipping unparseable fixture"),
            }
        }
        Ok(out)
    }

    async fn fetch_standings(&self, league_id: i64, season: i32) -> Result<Vec<StandingRecord>> {
        let entries: Vec<ApiStandingsEntry> = self
            .get_rows(&format!("standings?league={league_id}&season={season}"))
            .await?;

        let mut out = Vec::new();
        for entry in entries {
            let (lid, lseason) = (entry.league.id, entry.league.season);
            for group in entry.league.standings {
                out.extend(
                    group
                        .into_iter()
                        .map(|row| Self::to_standing_record(lid, lseason, row)),
                );
            }
        }
        Ok(out)
    }

    async fn fetch_events(&self, fixture_id: i64) -> Result<Vec<MatchEvent>> {
        let rows: Vec<ApiEvent> = self
            .get_rows(&format!("fixtures/events?fixture={fixture_id}"))
            .await?;
        Ok(rows
            .into_iter()
            .map(|e| Self::to_event(fixture_id, e))
            .collect())
    }

    async fn fetch_lineups(&self, fixture_id: i64) -> Result<Vec<Lineup>> {
        let rows: Vec<ApiLineup> = self
            .get_rows(&format!("fixtures/lineups?fixture={fixture_id}"))
            .await?;
        Ok(rows
            .into_iter()
            .map(|l| Self::to_lineup(fixture_id, l))
            .collect())
    }

    async fn fetch_statistics(&self, fixture_id: i64) -> Result<Vec<MatchStatistics>> {
        let rows: Vec<ApiStatistics> = self
            .get_rows(&format!("fixtures/statistics?fixture={fixture_id}"))
            .await?;
        Ok(rows
            .into_iter()
            .map(|s| Self::to_statistics(fixture_id, s))
            .collect())
    }

    async fn fetch_highlights(&self, limit: u32) -> Result<Vec<FetchedHighlight>> {
        let rows: Vec<ApiHighlight> = self.get_rows(&format!("highlights?limit={limit}")).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match Self::to_highlight(row) {
                Ok(h) => out.push(h),
                Err(e) => warn!(highlight_id = %id, error = %e, "Skipping unparseable highlight"),
            }
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        UPSTREAM_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_fixture_json() -> serde_json::Value {
        json!({
            "fixture": {
                "id": 1035045,
                "date": "2026-03-07T15:00:00+00:00",
                "status": { "short": "FT" }
            },
            "league": {
                "id": 39,
                "name": "Premier League",
                "country": "England",
                "logo": "https://media.example.com/leagues/39.png",
                "season": 2025,
                "round": "Regular Season - 28"
            },
            "teams": {
                "home": { "id": 50, "name": "Manchester City", "logo": "https://media.example.com/teams/50.png" },
                "away": { "id": 40, "name": "Liverpool", "logo": "https://media.example.com/teams/40.png" }
            },
            "goals": { "home": 2, "away": 1 }
        })
    }

    #[test]
    fn test_fixture_conversion() {
        let wire: ApiFixture = serde_json::from_value(sample_fixture_json()).unwrap();
        let rec = ApiFootballClient::to_fixture_record(wire).unwrap();

        assert_eq!(rec.fixture.id, 1035045);
        assert_eq!(rec.league.id, 39);
        assert_eq!(rec.home_team.name, "Manchester City");
        assert_eq!(rec.away_team.id, 40);
        assert_eq!(rec.fixture.status, MatchStatus::Finished);
        assert_eq!(rec.fixture.home_score, Some(2));
        assert_eq!(rec.fixture.away_score, Some(1));
        assert_eq!(fmt_date(rec.fixture.kickoff.date_naive()), "2026-03-07");
    }

    #[test]
    fn test_fixture_without_scores() {
        let mut v = sample_fixture_json();
        v["goals"] = json!({ "home": null, "away": null });
        v["fixture"]["status"]["short"] = json!("NS");
        let wire: ApiFixture = serde_json::from_value(v).unwrap();
        let rec = ApiFootballClient::to_fixture_record(wire).unwrap();

        assert_eq!(rec.fixture.status, MatchStatus::Scheduled);
        assert_eq!(rec.fixture.home_score, None);
        assert_eq!(rec.fixture.away_score, None);
    }

    #[test]
    fn test_fixture_bad_timestamp_rejected() {
        let mut v = sample_fixture_json();
        v["fixture"]["date"] = json!("not-a-date");
        let wire: ApiFixture = serde_json::from_value(v).unwrap();
        assert!(ApiFootballClient::to_fixture_record(wire).is_err());
    }

    #[test]
    fn test_standing_conversion() {
        let wire: ApiStandingRow = serde_json::from_value(json!({
            "rank": 1,
            "team": { "id": 50, "name": "Manchester City", "logo": "" },
            "points": 64,
            "form": "WWDWW",
            "all": {
                "played": 28, "win": 20, "draw": 4, "lose": 4,
                "goals": { "for": 62, "against": 25 }
            }
        }))
        .unwrap();

        let rec = ApiFootballClient::to_standing_record(39, 2025, wire);
        assert_eq!(rec.row.league_id, 39);
        assert_eq!(rec.row.season, 2025);
        assert_eq!(rec.row.rank, 1);
        assert_eq!(rec.row.goals_for, 62);
        assert_eq!(rec.row.goals_against, 25);
        assert_eq!(rec.row.form, "WWDWW");
        assert_eq!(rec.team.id, 50);
    }

    #[test]
    fn test_standing_missing_form_defaults_empty() {
        let wire: ApiStandingRow = serde_json::from_value(json!({
            "rank": 7,
            "team": { "id": 66, "name": "Aston Villa" },
            "points": 41,
            "all": {
                "played": 28, "win": 12, "draw": 5, "lose": 11,
                "goals": { "for": 40, "against": 38 }
            }
        }))
        .unwrap();

        let rec = ApiFootballClient::to_standing_record(39, 2025, wire);
        assert_eq!(rec.row.form, "");
    }

    #[test]
    fn test_event_minute_includes_stoppage_time() {
        let wire: ApiEvent = serde_json::from_value(json!({
            "time": { "elapsed": 90, "extra": 4 },
            "team": { "id": 40, "name": "Liverpool" },
            "player": { "name": "Mohamed Salah" },
            "type": "Goal",
            "detail": "Normal Goal"
        }))
        .unwrap();

        let event = ApiFootballClient::to_event(1035045, wire);
        assert_eq!(event.minute, 94);
        assert_eq!(event.kind, "Goal");
        assert_eq!(event.player, "Mohamed Salah");
        assert_eq!(event.match_id, 1035045);
    }

    #[test]
    fn test_lineup_starters_and_subs() {
        let wire: ApiLineup = serde_json::from_value(json!({
            "team": { "id": 50, "name": "Manchester City" },
            "formation": "4-3-3",
            "coach": { "name": "Pep Guardiola" },
            "startXI": [
                { "player": { "name": "Ederson", "number": 31, "pos": "G" } },
                { "player": { "name": "Rúben Dias", "number": 3, "pos": "D" } }
            ],
            "substitutes": [
                { "player": { "name": "Stefan Ortega", "number": 18, "pos": "G" } }
            ]
        }))
        .unwrap();

        let lineup = ApiFootballClient::to_lineup(1035045, wire);
        assert_eq!(lineup.formation, "4-3-3");
        assert_eq!(lineup.coach, "Pep Guardiola");
        assert_eq!(lineup.players.len(), 3);
        assert!(lineup.players[0].starter);
        assert!(lineup.players[1].starter);
        assert!(!lineup.players[2].starter);
        assert_eq!(lineup.players[2].name, "Stefan Ortega");
    }

    #[test]
    fn test_statistics_folded_into_object() {
        let wire: ApiStatistics = serde_json::from_value(json!({
            "team": { "id": 50, "name": "Manchester City" },
            "statistics": [
                { "type": "Ball Possession", "value": "68%" },
                { "type": "Total Shots", "value": 17 },
                { "type": "Corner Kicks", "value": null }
            ]
        }))
        .unwrap();

        let stats = ApiFootballClient::to_statistics(1035045, wire);
        assert_eq!(stats.team_id, 50);
        assert_eq!(stats.stats["Ball Possession"], json!("68%"));
        assert_eq!(stats.stats["Total Shots"], json!(17));
        assert!(stats.stats["Corner Kicks"].is_null());
    }

    #[test]
    fn test_highlight_conversion() {
        let wire: ApiHighlight = serde_json::from_value(json!({
            "id": "hl-9341",
            "title": "Manchester City 2-1 Liverpool | Extended Highlights",
            "url": "https://videos.example.com/hl-9341.mp4",
            "thumbnail": "https://videos.example.com/hl-9341.jpg",
            "source": "feed",
            "published_at": "2026-03-07T19:30:00+00:00",
            "teams": { "home": "Manchester City", "away": "Liverpool" }
        }))
        .unwrap();

        let h = ApiFootballClient::to_highlight(wire).unwrap();
        assert_eq!(h.id, "hl-9341");
        assert_eq!(h.home_team, "Manchester City");
        assert_eq!(h.away_team, "Liverpool");
    }

    #[test]
    fn test_envelope_missing_response_defaults_empty() {
        let env: Envelope<ApiFixture> = serde_json::from_value(json!({ "results": 0 })).unwrap();
        assert!(env.response.is_empty());
    }

    #[test]
    fn test_client_construction() {
        let client =
            ApiFootballClient::new("https://v3.football.api-sports.io/", Secret::new("k".into()), 15);
        assert!(client.is_ok());
        let client = client.unwrap();
        assert_eq!(client.name(), "api-football");
        // Trailing slash trimmed so joined paths have a single separator.
        assert_eq!(client.base_url, "https://v3.football.api-sports.io");
    }
}
