use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sport {
    #[serde(rename = "Fútbol", alias = "Futbol", alias = "Football", alias = "Soccer")]
    Football,
    #[serde(rename = "Baloncesto", alias = "Basketball")]
    Basketball,
}

impl Sport {
    /// Accepts the Spanish labels the search prompt asks for, plus the English ones models drift to.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "fútbol" | "futbol" | "football" | "soccer" => Some(Sport::Football),
            "baloncesto" | "basketball" => Some(Sport::Basketball),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sport::Football => "Fútbol",
            Sport::Basketball => "Baloncesto",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of a team's recent form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
    #[serde(rename = "D")]
    Draw,
}

impl GameResult {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_uppercase().as_str() {
            "W" | "WIN" => Some(GameResult::Win),
            "L" | "LOSS" => Some(GameResult::Loss),
            "D" | "DRAW" => Some(GameResult::Draw),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            GameResult::Win => 'W',
            GameResult::Loss => 'L',
            GameResult::Draw => 'D',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub name: String,
    pub win_streak: u32,
    pub home_away_performance: f64, // win rate in the current home/away context, 0.0..=1.0
    pub key_injuries: Vec<String>,
    /// At most 5 entries. Ordering is whatever the source reported; assumed most-recent-last.
    #[serde(rename = "last5Games")]
    pub last5_games: Vec<GameResult>,
}

impl TeamStats {
    /// Form string such as "WWDLW"
    pub fn form(&self) -> String {
        self.last5_games.iter().map(GameResult::as_char).collect()
    }

    pub fn recent_wins(&self) -> usize {
        self.last5_games
            .iter()
            .filter(|r| **r == GameResult::Win)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOdds {
    pub home_win: f64,
    pub away_win: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw: Option<f64>, // Only for fixtures that can end level
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchData {
    pub id: String,
    pub sport: Sport,
    pub league: String,
    pub date: String, // ISO-8601 when the source cooperates, passed through untouched otherwise
    pub home_team: TeamStats,
    pub away_team: TeamStats,
    pub odds: MatchOdds,
}

impl MatchData {
    /// Best-effort kick-off time. `None` when the source date is not a recognisable timestamp.
    pub fn kickoff(&self) -> Option<DateTime<Utc>> {
        let raw = self.date.trim();
        if let Ok(d) = DateTime::parse_from_rfc3339(raw) {
            return Some(d.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn title(&self) -> String {
        format!("{} vs {}", self.home_team.name, self.away_team.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Bajo", alias = "Low")]
    Low,
    #[serde(rename = "Medio", alias = "Medium")]
    Medium,
    #[serde(rename = "Alto", alias = "High")]
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Bajo",
            RiskLevel::Medium => "Medio",
            RiskLevel::High => "Alto",
        }
    }
}

/// One scored outcome returned by the scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub match_id: String,
    pub predicted_winner: String,
    pub confidence_score: f64, // 0-100
    pub reasoning: String,
    pub suggested_bet: String, // e.g. "Real Madrid ML" or "Over 2.5 Goals"
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParlayLeg {
    pub match_id: String,
    /// `None` when the prediction references a fixture outside the current batch.
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub predicted_winner: String,
    pub suggested_bet: String,
    pub confidence_score: f64,
    pub odd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParlaySuggestion {
    pub legs: Vec<ParlayLeg>,
    pub combined_odds: f64,
    pub stake: f64,
    pub potential_payout: f64,
    pub explanation: String,
    pub disclaimer: String,
}

// API Response types
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(name: &str) -> TeamStats {
        TeamStats {
            name: name.to_string(),
            win_streak: 2,
            home_away_performance: 0.6,
            key_injuries: vec![],
            last5_games: vec![GameResult::Win, GameResult::Draw, GameResult::Win],
        }
    }

    #[test]
    fn test_sport_labels() {
        assert_eq!(Sport::from_label("Fútbol"), Some(Sport::Football));
        assert_eq!(Sport::from_label(" basketball "), Some(Sport::Basketball));
        assert_eq!(Sport::from_label("Hockey"), None);
        assert_eq!(serde_json::to_string(&Sport::Basketball).unwrap(), "\"Baloncesto\"");
    }

    #[test]
    fn test_match_serializes_camel_case() {
        let m = MatchData {
            id: "m1".to_string(),
            sport: Sport::Football,
            league: "La Liga".to_string(),
            date: "2023-10-28T20:00:00".to_string(),
            home_team: team("Barcelona"),
            away_team: team("Real Madrid"),
            odds: MatchOdds { home_win: 2.35, away_win: 2.8, draw: None },
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["homeTeam"]["last5Games"][1], "D");
        assert_eq!(json["homeTeam"]["homeAwayPerformance"], 0.6);
        assert!(json["odds"].get("draw").is_none());
        assert_eq!(m.home_team.form(), "WDW");
        assert_eq!(m.home_team.recent_wins(), 2);
    }

    #[test]
    fn test_kickoff_is_lenient() {
        let mut m = MatchData {
            id: "m1".to_string(),
            sport: Sport::Basketball,
            league: "NBA".to_string(),
            date: "2023-10-30T19:30:00Z".to_string(),
            home_team: team("Boston Celtics"),
            away_team: team("Miami Heat"),
            odds: MatchOdds { home_win: 1.25, away_win: 4.1, draw: None },
        };
        assert!(m.kickoff().is_some());
        m.date = "2023-10-30T19:30:00".to_string();
        assert!(m.kickoff().is_some());
        m.date = "tomorrow night".to_string();
        assert!(m.kickoff().is_none());
    }

    #[test]
    fn test_risk_level_accepts_english_aliases() {
        let r: RiskLevel = serde_json::from_str("\"Medium\"").unwrap();
        assert_eq!(r, RiskLevel::Medium);
        let r: RiskLevel = serde_json::from_str("\"Alto\"").unwrap();
        assert_eq!(r.label(), "Alto");
    }
}
