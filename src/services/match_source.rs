use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::models::{GameResult, MatchData, MatchOdds, Sport, TeamStats};
use crate::services::gemini::{MatchIntelligence, SearchRequest};
use crate::utils::{
    clamp_unit, is_valid_decimal_odd, lenient_f64, lenient_strings, strip_code_fences, string_or_number,
    validate_team_name,
};

/// Low temperature keeps the grounded search answer close to what it actually found.
const SEARCH_TEMPERATURE: f32 = 0.1;

const LEAGUES: &[&str] = &["NBA", "Premier League", "La Liga", "Champions League", "NFL"];

// ── Loose reply shapes ────────────────────────────────────────────────────────
// Everything optional and loosely typed: the search call has no schema, so a wrong type on
// one field reads as absent and each record is checked by hand.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMatch {
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    sport: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    league: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    date: Option<String>,
    home_team: Option<RawTeam>,
    away_team: Option<RawTeam>,
    odds: Option<RawOdds>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTeam {
    #[serde(default, deserialize_with = "string_or_number")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    win_streak: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    home_away_performance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_strings")]
    key_injuries: Option<Vec<String>>,
    #[serde(default, rename = "last5Games", deserialize_with = "lenient_strings")]
    last5_games: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOdds {
    #[serde(default, deserialize_with = "lenient_f64")]
    home_win: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    away_win: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    draw: Option<f64>,
}

pub struct MatchSource {
    intelligence: Arc<dyn MatchIntelligence>,
}

impl MatchSource {
    pub fn new(intelligence: Arc<dyn MatchIntelligence>) -> Self {
        Self { intelligence }
    }

    /// Fetch the upcoming fixture batch. Never fails: any service or parse problem is logged
    /// and collapses to an empty list.
    pub async fn fetch_upcoming_matches(&self) -> Vec<MatchData> {
        let request = SearchRequest {
            prompt: match_search_prompt(),
            temperature: SEARCH_TEMPERATURE,
        };

        tracing::info!("Searching for upcoming fixtures…");

        let reply = match self.intelligence.retrieve_matches(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Error fetching live matches: {}", e);
                return Vec::new();
            }
        };

        match parse_match_batch(&reply) {
            Ok(matches) => {
                tracing::info!("Fixture search returned {} usable matches", matches.len());
                matches
            }
            Err(e) => {
                tracing::error!("Fixture search reply was not a JSON array: {}", e);
                Vec::new()
            }
        }
    }
}

pub fn match_search_prompt() -> String {
    format!(
        r#"Search for 5 to 6 upcoming major sports matches scheduled for TODAY or TOMORROW.
Focus on high profile leagues: {leagues}.

For each match found, extract the following details using the search results:
1. Teams (Home vs Away)
2. Date and Time (Convert to ISO string if possible)
3. Current estimated Moneyline Odds (Decimal format, e.g., 1.95). If exact odds aren't found, estimate based on standings.
4. Recent Form (Last 5 games W/L/D) - Search for this.
5. Key Injuries - Search for real recent injury news.
6. Win Streak.

RETURN A STRICT JSON ARRAY. Do not include markdown formatting like ```json.
The JSON objects must match this structure:
{{
  "id": "string (unique)",
  "sport": "Fútbol" | "Baloncesto",
  "league": "string",
  "date": "ISO string",
  "homeTeam": {{
    "name": "string",
    "winStreak": number,
    "homeAwayPerformance": number (0.0 to 1.0 estimate),
    "keyInjuries": ["string"],
    "last5Games": ["W","L","D"...]
  }},
  "awayTeam": {{ same shape as homeTeam }},
  "odds": {{
    "homeWin": number,
    "awayWin": number,
    "draw": number (optional)
  }}
}}"#,
        leagues = LEAGUES.join(", ")
    )
}

/// Parse a search reply into validated fixtures.
///
/// The reply must be a JSON array once code fences are stripped, otherwise the whole batch is
/// rejected. Inside the array each record stands alone: incomplete records and repeated ids
/// are dropped with a warning and the rest of the batch is kept.
pub fn parse_match_batch(reply: &str) -> Result<Vec<MatchData>> {
    let records: Vec<Value> = serde_json::from_str(&strip_code_fences(reply))?;
    let mut seen = HashSet::new();
    let mut matches = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let raw: RawMatch = match serde_json::from_value(record) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Dropping fixture #{}: unreadable record ({})", index, e);
                continue;
            }
        };

        let m = match validate_match(raw) {
            Ok(m) => m,
            Err(reason) => {
                tracing::warn!("Dropping fixture #{}: {}", index, reason);
                continue;
            }
        };

        if !seen.insert(m.id.clone()) {
            tracing::warn!("Dropping fixture #{}: duplicate id '{}'", index, m.id);
            continue;
        }

        matches.push(m);
    }

    Ok(matches)
}

fn validate_match(raw: RawMatch) -> std::result::Result<MatchData, String> {
    let id = raw.id.ok_or("missing id")?;

    let sport_label = raw.sport.unwrap_or_default();
    let sport = Sport::from_label(&sport_label)
        .ok_or_else(|| format!("unknown sport '{}' for {}", sport_label, id))?;

    let home_team = validate_team(raw.home_team, &id, "homeTeam")?;
    let away_team = validate_team(raw.away_team, &id, "awayTeam")?;

    let odds = raw.odds.ok_or_else(|| format!("missing odds for {}", id))?;
    let home_win = odds
        .home_win
        .filter(|o| is_valid_decimal_odd(*o))
        .ok_or_else(|| format!("missing or invalid odds.homeWin for {}", id))?;
    let away_win = odds
        .away_win
        .filter(|o| is_valid_decimal_odd(*o))
        .ok_or_else(|| format!("missing or invalid odds.awayWin for {}", id))?;
    let draw = odds.draw.filter(|o| is_valid_decimal_odd(*o));

    Ok(MatchData {
        id,
        sport,
        league: raw.league.unwrap_or_default().trim().to_string(),
        date: raw.date.unwrap_or_default(),
        home_team,
        away_team,
        odds: MatchOdds {
            home_win,
            away_win,
            draw,
        },
    })
}

fn validate_team(raw: Option<RawTeam>, id: &str, side: &str) -> std::result::Result<TeamStats, String> {
    let raw = raw.ok_or_else(|| format!("missing {} for {}", side, id))?;
    let name = raw
        .name
        .filter(|n| validate_team_name(n))
        .ok_or_else(|| format!("missing {}.name for {}", side, id))?;

    let win_streak = raw
        .win_streak
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(|s| s.floor() as u32)
        .unwrap_or(0);

    let mut form: Vec<GameResult> = raw
        .last5_games
        .unwrap_or_default()
        .iter()
        .filter_map(|tag| {
            let result = GameResult::from_tag(tag);
            if result.is_none() {
                tracing::debug!("Ignoring form tag '{}' for {} ({})", tag, name, id);
            }
            result
        })
        .collect();
    if form.len() > 5 {
        form.drain(..form.len() - 5);
    }

    Ok(TeamStats {
        name: name.trim().to_string(),
        win_streak,
        home_away_performance: clamp_unit(raw.home_away_performance.unwrap_or(0.0)),
        key_injuries: raw
            .key_injuries
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        last5_games: form,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gemini::fake::ScriptedIntelligence;

    const TWO_MATCHES: &str = r#"[
      {
        "id": "m1", "sport": "Fútbol", "league": "La Liga", "date": "2023-10-28T20:00:00",
        "homeTeam": {"name": "Barcelona", "winStreak": 4, "homeAwayPerformance": 0.85,
                     "keyInjuries": ["Pedri"], "last5Games": ["W","W","W","D","W"]},
        "awayTeam": {"name": "Real Madrid", "winStreak": 3, "homeAwayPerformance": 0.70,
                     "keyInjuries": ["Courtois", "Alaba"], "last5Games": ["W","W","W","L","W"]},
        "odds": {"homeWin": 2.35, "awayWin": 2.80, "draw": 3.50}
      },
      {
        "id": 2, "sport": "Baloncesto", "league": "NBA", "date": "2023-10-30T19:30:00",
        "homeTeam": {"name": "Boston Celtics", "winStreak": 5, "homeAwayPerformance": 0.80,
                     "keyInjuries": [], "last5Games": ["W","W","W","W","W"]},
        "awayTeam": {"name": "Miami Heat", "winStreak": 1, "homeAwayPerformance": 0.45,
                     "keyInjuries": ["Herro"], "last5Games": ["L","L","W","L","W"]},
        "odds": {"homeWin": 1.25, "awayWin": 4.10}
      }
    ]"#;

    fn source(reply: Option<&str>) -> (MatchSource, Arc<ScriptedIntelligence>) {
        let fake = Arc::new(ScriptedIntelligence::new(reply, None));
        (MatchSource::new(fake.clone()), fake)
    }

    #[test]
    fn test_parses_clean_batch() {
        let matches = parse_match_batch(TWO_MATCHES).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "m1");
        assert_eq!(matches[0].sport, Sport::Football);
        assert_eq!(matches[0].odds.draw, Some(3.5));
        assert_eq!(matches[0].away_team.key_injuries, vec!["Courtois", "Alaba"]);
        assert_eq!(matches[1].id, "2");
        assert_eq!(matches[1].sport, Sport::Basketball);
        assert_eq!(matches[1].odds.draw, None);
        assert_eq!(matches[1].away_team.form(), "LLWLW");
    }

    #[test]
    fn test_strips_code_fences_before_parsing() {
        let fenced = format!("```json\n{}\n```", TWO_MATCHES);
        assert_eq!(parse_match_batch(&fenced).unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_non_json() {
        assert!(parse_match_batch("```json\nHere are the matches you asked for\n```").is_err());
        assert!(parse_match_batch("").is_err());
        assert!(parse_match_batch(r#"{"id": "m1"}"#).is_err());
    }

    #[test]
    fn test_drops_incomplete_records_and_keeps_the_rest() {
        let reply = r#"[
          {"id": "ok", "sport": "Football", "league": "EPL", "date": "soon",
           "homeTeam": {"name": "Arsenal"}, "awayTeam": {"name": "Chelsea"},
           "odds": {"homeWin": 1.9, "awayWin": 3.8}},
          {"sport": "Football", "homeTeam": {"name": "A"}, "awayTeam": {"name": "B"},
           "odds": {"homeWin": 1.9, "awayWin": 3.8}},
          {"id": "no-away-name", "sport": "Football", "homeTeam": {"name": "A"}, "awayTeam": {},
           "odds": {"homeWin": 1.9, "awayWin": 3.8}},
          {"id": "no-home-odds", "sport": "Football", "homeTeam": {"name": "A"}, "awayTeam": {"name": "B"},
           "odds": {"awayWin": 3.8}},
          {"id": "bad-odds", "sport": "Football", "homeTeam": {"name": "A"}, "awayTeam": {"name": "B"},
           "odds": {"homeWin": 0.9, "awayWin": 3.8}},
          {"id": "hockey", "sport": "Hockey", "homeTeam": {"name": "A"}, "awayTeam": {"name": "B"},
           "odds": {"homeWin": 1.9, "awayWin": 3.8}},
          {"id": "wrong-types", "sport": "Football", "homeTeam": "A", "awayTeam": {"name": "B"},
           "odds": {"homeWin": 1.9, "awayWin": 3.8}},
          "not an object"
        ]"#;
        let matches = parse_match_batch(reply).unwrap();
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.id, "ok");
        assert_eq!(m.home_team.win_streak, 0);
        assert!(m.home_team.last5_games.is_empty());
        assert_eq!(m.date, "soon");
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let reply = r#"[
          {"id": "m1", "sport": "Baloncesto", "homeTeam": {"name": "Lakers"}, "awayTeam": {"name": "Suns"},
           "odds": {"homeWin": 1.8, "awayWin": 2.05}},
          {"id": "m1", "sport": "Baloncesto", "homeTeam": {"name": "Knicks"}, "awayTeam": {"name": "Nets"},
           "odds": {"homeWin": 1.5, "awayWin": 2.6}}
        ]"#;
        let matches = parse_match_batch(reply).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].home_team.name, "Lakers");
    }

    #[test]
    fn test_coerces_team_fields() {
        let reply = r#"[
          {"id": "m9", "sport": "Fútbol", "homeTeam": {"name": " Napoli ", "winStreak": -2,
             "homeAwayPerformance": 1.7, "last5Games": ["W","x","L","L","W","D","w"]},
           "awayTeam": {"name": "AC Milan", "winStreak": 3.0, "homeAwayPerformance": -0.1,
             "keyInjuries": ["", " Leao "]},
           "odds": {"homeWin": 2.5, "awayWin": 2.9, "draw": 1.0}}
        ]"#;
        let m = &parse_match_batch(reply).unwrap()[0];
        assert_eq!(m.home_team.name, "Napoli");
        assert_eq!(m.home_team.win_streak, 0);
        assert_eq!(m.home_team.home_away_performance, 1.0);
        assert_eq!(m.home_team.form(), "LLWDW");
        assert_eq!(m.away_team.win_streak, 3);
        assert_eq!(m.away_team.home_away_performance, 0.0);
        assert_eq!(m.away_team.key_injuries, vec!["Leao"]);
        assert_eq!(m.odds.draw, None);
    }

    #[test]
    fn test_optional_field_type_drift_keeps_the_fixture() {
        let reply = r#"[
          {"id": "m1", "sport": "Baloncesto", "league": "NBA", "date": "2023-10-30T19:30:00",
           "homeTeam": {"name": "Boston Celtics", "winStreak": "4", "homeAwayPerformance": "0.70",
             "keyInjuries": [null, "Tatum"], "last5Games": ["W", null, 3, "L"]},
           "awayTeam": {"name": "Miami Heat", "winStreak": null, "homeAwayPerformance": "n/a",
             "keyInjuries": "Herro"},
           "odds": {"homeWin": "1.25", "awayWin": 4.10}},
          {"id": "m2", "sport": "Fútbol", "league": 39, "date": null,
           "homeTeam": {"name": "Arsenal", "winStreak": {"current": 2}, "keyInjuries": null},
           "awayTeam": {"name": "Chelsea", "last5Games": "W"},
           "odds": {"homeWin": 1.9, "awayWin": 3.8, "draw": "x"}}
        ]"#;
        let matches = parse_match_batch(reply).unwrap();
        assert_eq!(matches.len(), 2);

        let celtics = &matches[0].home_team;
        assert_eq!(celtics.win_streak, 4);
        assert!((celtics.home_away_performance - 0.70).abs() < 1e-9);
        assert_eq!(celtics.key_injuries, vec!["Tatum"]);
        assert_eq!(celtics.form(), "WL");
        assert_eq!(matches[0].away_team.win_streak, 0);
        assert_eq!(matches[0].away_team.home_away_performance, 0.0);
        assert_eq!(matches[0].away_team.key_injuries, vec!["Herro"]);
        assert_eq!(matches[0].odds.home_win, 1.25);

        assert_eq!(matches[1].league, "39");
        assert_eq!(matches[1].date, "");
        assert_eq!(matches[1].home_team.win_streak, 0);
        assert!(matches[1].home_team.key_injuries.is_empty());
        assert_eq!(matches[1].away_team.form(), "W");
        assert_eq!(matches[1].odds.draw, None);
    }

    #[test]
    fn test_prompt_demands_strict_json() {
        let prompt = match_search_prompt();
        assert!(prompt.contains("STRICT JSON ARRAY"));
        assert!(prompt.contains("Champions League"));
        assert!(prompt.contains("\"last5Games\""));
    }

    #[tokio::test]
    async fn test_fetch_soft_fails_on_service_error() {
        let (source, fake) = source(None);
        assert!(source.fetch_upcoming_matches().await.is_empty());
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_soft_fails_on_garbage() {
        let (source, _) = source(Some("```json\n[{\"id\": \n```"));
        assert!(source.fetch_upcoming_matches().await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_parses_fenced_reply() {
        let fenced = format!("```json\n{}\n```", TWO_MATCHES);
        let (source, _) = source(Some(&fenced));
        let matches = source.fetch_upcoming_matches().await;
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].home_team.name, "Boston Celtics");
    }
}
