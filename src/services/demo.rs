//! Offline stand-in for the generative service.
//!
//! Serves a fixed slate of five fixtures and scores them with a small deterministic
//! heuristic that follows the same 35/25/25/15 weighting the real model is asked to use.
//! Lets the CLI and API run end to end without a credential.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{GameResult, MatchData, MatchOdds, Prediction, RiskLevel, Sport, TeamStats};
use crate::services::gemini::{MatchIntelligence, ScoringRequest, SearchRequest};
use crate::utils::odds_to_probability;

pub struct DemoIntelligence {
    matches: Vec<MatchData>,
}

impl DemoIntelligence {
    pub fn new() -> Self {
        Self {
            matches: demo_matches(),
        }
    }
}

impl Default for DemoIntelligence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MatchIntelligence for DemoIntelligence {
    async fn retrieve_matches(&self, _request: &SearchRequest) -> Result<String> {
        // fenced, like most real replies
        Ok(format!(
            "```json\n{}\n```",
            serde_json::to_string_pretty(&self.matches)?
        ))
    }

    async fn score_predictions(&self, request: &ScoringRequest<'_>) -> Result<String> {
        let predictions: Vec<Prediction> = request.matches.iter().map(score_fixture).collect();
        Ok(serde_json::to_string(&predictions)?)
    }
}

fn team_strength(team: &TeamStats, side_odds: f64) -> f64 {
    let form = team.recent_wins() as f64 / 5.0 * 0.7 + team.win_streak.min(5) as f64 / 5.0 * 0.3;
    let venue = team.home_away_performance;
    let health = 1.0 - team.key_injuries.len().min(4) as f64 / 4.0;
    let value = odds_to_probability(side_odds);

    0.35 * form + 0.25 * venue + 0.25 * health + 0.15 * value
}

fn score_fixture(m: &MatchData) -> Prediction {
    let home = team_strength(&m.home_team, m.odds.home_win);
    let away = team_strength(&m.away_team, m.odds.away_win);
    let gap = home - away;

    let confidence = (50.0 + gap.abs() * 90.0).min(99.0).round();

    let (winner, bet) = if m.sport == Sport::Football && gap.abs() < 0.03 && m.odds.draw.is_some() {
        ("Draw".to_string(), "Draw".to_string())
    } else if gap >= 0.0 {
        (m.home_team.name.clone(), format!("{} ML", m.home_team.name))
    } else {
        (m.away_team.name.clone(), format!("{} ML", m.away_team.name))
    };

    let risk_level = if confidence >= 75.0 {
        RiskLevel::Low
    } else if confidence >= 60.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    };

    Prediction {
        match_id: m.id.clone(),
        predicted_winner: winner,
        confidence_score: confidence,
        reasoning: format!(
            "Form {} vs {}, venue win rate {:.0}% vs {:.0}%, {} vs {} key injuries.",
            m.home_team.form(),
            m.away_team.form(),
            m.home_team.home_away_performance * 100.0,
            m.away_team.home_away_performance * 100.0,
            m.home_team.key_injuries.len(),
            m.away_team.key_injuries.len()
        ),
        suggested_bet: bet,
        risk_level,
    }
}

fn team(name: &str, win_streak: u32, venue: f64, injuries: &[&str], form: &str) -> TeamStats {
    TeamStats {
        name: name.to_string(),
        win_streak,
        home_away_performance: venue,
        key_injuries: injuries.iter().map(|s| s.to_string()).collect(),
        last5_games: form
            .chars()
            .filter_map(|c| GameResult::from_tag(&c.to_string()))
            .collect(),
    }
}

/// The fixed demo slate.
pub fn demo_matches() -> Vec<MatchData> {
    vec![
        MatchData {
            id: "m1".to_string(),
            sport: Sport::Football,
            league: "La Liga".to_string(),
            date: "2023-10-28T20:00:00".to_string(),
            home_team: team("Barcelona", 4, 0.85, &["Pedri"], "WWWDW"),
            away_team: team("Real Madrid", 3, 0.70, &["Courtois", "Alaba"], "WWWLW"),
            odds: MatchOdds { home_win: 2.35, away_win: 2.80, draw: Some(3.50) },
        },
        MatchData {
            id: "m2".to_string(),
            sport: Sport::Football,
            league: "Premier League".to_string(),
            date: "2023-10-29T16:30:00".to_string(),
            home_team: team("Man City", 2, 0.90, &["De Bruyne"], "WLWWW"),
            away_team: team("Man United", 2, 0.40, &["Martinez", "Shaw"], "WWLLW"),
            odds: MatchOdds { home_win: 1.30, away_win: 8.50, draw: Some(5.50) },
        },
        MatchData {
            id: "m3".to_string(),
            sport: Sport::Basketball,
            league: "NBA".to_string(),
            date: "2023-10-30T19:30:00".to_string(),
            home_team: team("Boston Celtics", 5, 0.80, &[], "WWWWW"),
            away_team: team("Miami Heat", 1, 0.45, &["Herro"], "LLWLW"),
            odds: MatchOdds { home_win: 1.25, away_win: 4.10, draw: None },
        },
        MatchData {
            id: "m4".to_string(),
            sport: Sport::Football,
            league: "Serie A".to_string(),
            date: "2023-10-29T20:45:00".to_string(),
            home_team: team("Napoli", 1, 0.60, &["Osimhen"], "WLLWD"),
            away_team: team("AC Milan", 3, 0.75, &[], "WWLWW"),
            odds: MatchOdds { home_win: 2.50, away_win: 2.90, draw: Some(3.20) },
        },
        MatchData {
            id: "m5".to_string(),
            sport: Sport::Basketball,
            league: "NBA".to_string(),
            date: "2023-10-31T20:00:00".to_string(),
            home_team: team("Lakers", 0, 0.65, &["Vanderbilt"], "LWLWL"),
            away_team: team("Suns", 2, 0.60, &["Booker", "Beal"], "WWLWL"),
            odds: MatchOdds { home_win: 1.80, away_win: 2.05, draw: None },
        },
    ]
}
