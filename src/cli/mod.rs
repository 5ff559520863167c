use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{MatchData, ParlaySuggestion, Prediction};
use crate::services::DemoIntelligence;
use crate::session::{Dashboard, Phase};
use crate::utils::format_kickoff;

pub async fn fetch_matches(config: &Config) -> Result<()> {
    let dashboard = Dashboard::from_config(config)?;

    println!("🛰️  Searching for upcoming fixtures...");

    let state = dashboard.refresh().await?;

    if state.is_empty_result() {
        println!("📭 No upcoming headline matches found. Try again later.");
        return Ok(());
    }

    println!("✅ Found {} matches:\n", state.matches.len());
    for (i, m) in state.matches.iter().enumerate() {
        print_match(i + 1, m, None);
    }

    Ok(())
}

pub async fn generate_predictions(config: &Config) -> Result<()> {
    let dashboard = Dashboard::from_config(config)?;
    run_cycle(&dashboard).await
}

pub async fn run_demo(config: &Config) -> Result<()> {
    println!("🧪 Demo mode: offline fixtures, heuristic scoring\n");
    let dashboard = Dashboard::with_intelligence(Arc::new(DemoIntelligence::new()))
        .with_parlay_settings(config.leg_count, config.stake);
    run_cycle(&dashboard).await
}

async fn run_cycle(dashboard: &Dashboard) -> Result<()> {
    println!("🛰️  Searching for upcoming fixtures...");
    let state = dashboard.refresh().await?;

    if state.is_empty_result() {
        println!("📭 No upcoming headline matches found. Try again later.");
        return Ok(());
    }

    println!("🔮 Analyzing {} matches...", state.matches.len());
    let state = dashboard.analyze().await?;

    if state.phase != Phase::Analyzed {
        println!("⚠️  Analysis not available right now. Run the command again to retry.");
        for (i, m) in state.matches.iter().enumerate() {
            print_match(i + 1, m, None);
        }
        return Ok(());
    }

    println!("✅ Scored {} of {} matches!\n", state.predictions.len(), state.matches.len());
    for (i, m) in state.matches.iter().enumerate() {
        let prediction = state.predictions.iter().find(|p| p.match_id == m.id);
        print_match(i + 1, m, prediction);
    }

    match dashboard.parlay().await {
        Some(parlay) => print_parlay(&parlay),
        None => println!("📭 No parlay could be built from these predictions."),
    }

    Ok(())
}

fn print_match(index: usize, m: &MatchData, prediction: Option<&Prediction>) {
    println!("{}. {} ({} · {} · {}):", index, m.title(), m.league, m.sport, format_kickoff(m));
    println!(
        "   Odds: {:.2} | {:.2}{}",
        m.odds.home_win,
        m.odds.away_win,
        m.odds.draw.map_or(String::new(), |d| format!(" | Draw {:.2}", d))
    );
    println!(
        "   Form: {} {} | {} {}",
        m.home_team.name,
        m.home_team.form(),
        m.away_team.name,
        m.away_team.form()
    );
    if !m.home_team.key_injuries.is_empty() || !m.away_team.key_injuries.is_empty() {
        println!(
            "   Injuries: {} / {}",
            m.home_team.key_injuries.join(", "),
            m.away_team.key_injuries.join(", ")
        );
    }
    if let Some(p) = prediction {
        println!(
            "   🎯 {} ({:.0}% confidence, risk {}) → {}",
            p.predicted_winner,
            p.confidence_score,
            p.risk_level.label(),
            p.suggested_bet
        );
        println!("   {}", p.reasoning);
    }
    println!();
}

fn print_parlay(parlay: &ParlaySuggestion) {
    println!("🏆 Parlay of the day:\n");
    for (i, leg) in parlay.legs.iter().enumerate() {
        let fixture = match (&leg.home_team, &leg.away_team) {
            (Some(home), Some(away)) => format!("{} vs {}", home, away),
            _ => format!("(unknown match {})", leg.match_id),
        };
        println!(
            "   PICK #{} {} → {} ({:.0}%) @{:.2}",
            i + 1,
            fixture,
            leg.suggested_bet,
            leg.confidence_score,
            leg.odd
        );
    }
    println!("\n   Total odds: {:.2}", parlay.combined_odds);
    println!("   Stake: ${:.2}", parlay.stake);
    println!("   Potential payout: ${:.2}", parlay.potential_payout);
    println!("\n⚠️  {}", parlay.disclaimer);
}
