use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Result;
use crate::models::{MatchData, Prediction, RiskLevel};
use crate::services::gemini::{MatchIntelligence, ScoringRequest};
use crate::utils::{names_match, strip_code_fences, string_or_number};

const SCORING_TEMPERATURE: f32 = 0.2;

/// Rubric the model is told to weigh. The pipeline never computes with these itself.
pub const RUBRIC: &[(&str, u32)] = &[
    ("Current streak (winStreak) and form (last5Games)", 35),
    ("Home/away performance (homeAwayPerformance)", 25),
    ("Impact of key injuries (keyInjuries), judged by how important the listed players are", 25),
    ("Mathematical value in the odds (look for value bets)", 15),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPrediction {
    #[serde(default, deserialize_with = "string_or_number")]
    match_id: Option<String>,
    predicted_winner: Option<String>,
    confidence_score: Option<f64>,
    reasoning: Option<String>,
    suggested_bet: Option<String>,
    risk_level: Option<RiskLevel>,
}

pub struct PredictionEngine {
    intelligence: Arc<dyn MatchIntelligence>,
}

impl PredictionEngine {
    pub fn new(intelligence: Arc<dyn MatchIntelligence>) -> Self {
        Self { intelligence }
    }

    /// Score a fixture batch in a single call. Never fails: service and parse problems are
    /// logged and come back as an empty list, which callers read as "analysis not available".
    pub async fn score_matches(&self, matches: &[MatchData]) -> Vec<Prediction> {
        if matches.is_empty() {
            tracing::debug!("Nothing to score");
            return Vec::new();
        }

        let prompt = match scoring_prompt(matches) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("Could not serialise matches for scoring: {}", e);
                return Vec::new();
            }
        };

        let request = ScoringRequest {
            prompt,
            schema: prediction_schema(),
            temperature: SCORING_TEMPERATURE,
            matches,
        };

        tracing::info!("Scoring {} matches…", matches.len());

        let reply = match self.intelligence.score_predictions(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Error analyzing matches: {}", e);
                return Vec::new();
            }
        };

        match parse_predictions(&reply, matches) {
            Ok(predictions) => {
                tracing::info!("Scoring returned {} predictions", predictions.len());
                predictions
            }
            Err(e) => {
                tracing::error!("Scoring reply did not match the prediction schema: {}", e);
                Vec::new()
            }
        }
    }
}

pub fn scoring_prompt(matches: &[MatchData]) -> Result<String> {
    let rubric = RUBRIC
        .iter()
        .enumerate()
        .map(|(i, (factor, weight))| format!("{}. {}: {}%", i + 1, factor, weight))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "Act as a Sports Data Scientist.\n\n\
         Analyze the following REAL match data.\n\n\
         Your prediction algorithm must weigh:\n{}\n\n\
         For each match, compute a confidence score (0-100), name the predicted winner, \
         suggest a bet and rate its risk as Bajo, Medio or Alto.\n\n\
         Input data:\n{}",
        rubric,
        serde_json::to_string_pretty(matches)?
    ))
}

/// Output schema for the scoring call: an array of predictions with every field required.
pub fn prediction_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "matchId": { "type": "STRING" },
                "predictedWinner": { "type": "STRING" },
                "confidenceScore": { "type": "NUMBER", "description": "Confidence score between 0 and 100" },
                "reasoning": { "type": "STRING" },
                "suggestedBet": { "type": "STRING" },
                "riskLevel": { "type": "STRING", "enum": ["Bajo", "Medio", "Alto"] }
            },
            "required": ["matchId", "predictedWinner", "confidenceScore", "reasoning", "suggestedBet", "riskLevel"]
        }
    })
}

/// Parse a scoring reply. A reply that isn't a JSON array fails the whole batch; individual
/// predictions with missing fields, a confidence outside 0..=100 or blank reasoning are dropped.
pub fn parse_predictions(reply: &str, matches: &[MatchData]) -> Result<Vec<Prediction>> {
    let records: Vec<Value> = serde_json::from_str(&strip_code_fences(reply))?;
    let mut predictions = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let raw: RawPrediction = match serde_json::from_value(record) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Dropping prediction #{}: unreadable record ({})", index, e);
                continue;
            }
        };

        match validate_prediction(raw) {
            Ok(p) => {
                check_winner(&p, matches);
                predictions.push(p);
            }
            Err(reason) => tracing::warn!("Dropping prediction #{}: {}", index, reason),
        }
    }

    Ok(predictions)
}

fn validate_prediction(raw: RawPrediction) -> std::result::Result<Prediction, String> {
    let match_id = raw.match_id.ok_or("missing matchId")?;
    let confidence_score = raw
        .confidence_score
        .filter(|c| c.is_finite() && (0.0..=100.0).contains(c))
        .ok_or_else(|| format!("confidenceScore missing or outside 0-100 for {}", match_id))?;
    let reasoning = raw
        .reasoning
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| format!("empty reasoning for {}", match_id))?;
    let predicted_winner = raw
        .predicted_winner
        .ok_or_else(|| format!("missing predictedWinner for {}", match_id))?;
    let suggested_bet = raw
        .suggested_bet
        .ok_or_else(|| format!("missing suggestedBet for {}", match_id))?;
    let risk_level = raw
        .risk_level
        .ok_or_else(|| format!("missing riskLevel for {}", match_id))?;

    Ok(Prediction {
        match_id,
        predicted_winner: predicted_winner.trim().to_string(),
        confidence_score,
        reasoning,
        suggested_bet: suggested_bet.trim().to_string(),
        risk_level,
    })
}

/// Warn when the predicted winner isn't one of the fixture's sides. The prediction is kept either way.
fn check_winner(prediction: &Prediction, matches: &[MatchData]) {
    let Some(m) = matches.iter().find(|m| m.id == prediction.match_id) else {
        tracing::warn!(
            "Prediction references unknown match '{}'",
            prediction.match_id
        );
        return;
    };

    let winner = prediction.predicted_winner.as_str();
    let is_draw = matches!(winner.to_lowercase().as_str(), "draw" | "empate");
    if !is_draw && !names_match(winner, &m.home_team.name) && !names_match(winner, &m.away_team.name) {
        tracing::warn!(
            "Predicted winner '{}' is neither side of {} ({})",
            winner,
            m.title(),
            m.id
        );
    }
}
