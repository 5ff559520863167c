use std::collections::HashSet;

use crate::config::{DEFAULT_LEG_COUNT, DEFAULT_STAKE};
use crate::models::{MatchData, ParlayLeg, ParlaySuggestion, Prediction};
use crate::utils::round_to_cents;

/// Lowest synthetic odd a leg can carry. Keeps a 100-confidence pick from pricing at 1.00.
pub const MIN_LEG_ODD: f64 = 1.10;

pub const BANKROLL_DISCLAIMER: &str = "Bankroll management: stake no more than 1-3% of your total \
    bankroll on this parlay, combined bets carry high variance. Odds are synthetic estimates derived \
    from model confidence, not market prices.";

/// Decimal odd implied by a confidence score: higher confidence, shorter odd.
pub fn synthetic_odd(confidence_score: f64) -> f64 {
    (1.0 + (100.0 - confidence_score) / 20.0).max(MIN_LEG_ODD)
}

/// Build the top-`leg_count` parlay from a prediction batch.
///
/// Predictions are ranked by confidence with ties kept in input order. Each leg's odd is
/// synthetic (see [`synthetic_odd`]) and the legs are treated as independent, so the combined
/// odd is a plain product. A fixture contributes at most one leg, its most confident pick.
/// Legs whose match id isn't in `matches` are kept with no team names.
/// Returns `None` for an empty prediction list or a zero leg count.
pub fn build_parlay(
    predictions: &[Prediction],
    matches: &[MatchData],
    leg_count: usize,
    stake: f64,
) -> Option<ParlaySuggestion> {
    if predictions.is_empty() || leg_count == 0 {
        return None;
    }

    let mut ranked: Vec<&Prediction> = predictions.iter().collect();
    // stable: equal confidence keeps input order
    ranked.sort_by(|a, b| {
        b.confidence_score
            .partial_cmp(&a.confidence_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut seen = HashSet::new();
    let legs: Vec<ParlayLeg> = ranked
        .into_iter()
        .filter(|pick| {
            let pick: &Prediction = pick;
            let first = seen.insert(pick.match_id.clone());
            if !first {
                tracing::debug!("Skipping repeat pick for {}", pick.match_id);
            }
            first
        })
        .take(leg_count)
        .map(|pick| {
            let fixture = matches.iter().find(|m| m.id == pick.match_id);
            if fixture.is_none() {
                tracing::debug!("Parlay leg {} has no fixture in this batch", pick.match_id);
            }
            ParlayLeg {
                match_id: pick.match_id.clone(),
                home_team: fixture.map(|m| m.home_team.name.clone()),
                away_team: fixture.map(|m| m.away_team.name.clone()),
                predicted_winner: pick.predicted_winner.clone(),
                suggested_bet: pick.suggested_bet.clone(),
                confidence_score: pick.confidence_score,
                odd: synthetic_odd(pick.confidence_score),
            }
        })
        .collect();

    let combined_odds: f64 = legs.iter().map(|leg| leg.odd).product();
    let potential_payout = round_to_cents(stake * combined_odds);

    Some(ParlaySuggestion {
        explanation: explain(&legs, combined_odds),
        legs,
        combined_odds,
        stake,
        potential_payout,
        disclaimer: BANKROLL_DISCLAIMER.to_string(),
    })
}

/// Three legs at a 100 stake.
pub fn build_default_parlay(predictions: &[Prediction], matches: &[MatchData]) -> Option<ParlaySuggestion> {
    build_parlay(predictions, matches, DEFAULT_LEG_COUNT, DEFAULT_STAKE)
}

fn explain(legs: &[ParlayLeg], combined_odds: f64) -> String {
    let picks = legs
        .iter()
        .map(|leg| format!("{} ({:.0}%)", leg.suggested_bet, leg.confidence_score))
        .collect::<Vec<_>>()
        .join(" + ");
    format!(
        "Top {} picks by model confidence: {}. Combined odds {:.2}.",
        legs.len(),
        picks,
        combined_odds
    )
}
