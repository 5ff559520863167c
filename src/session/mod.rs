use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::{Config, DEFAULT_LEG_COUNT, DEFAULT_STAKE, MISSING_API_KEY};
use crate::error::{AppError, Result};
use crate::models::{MatchData, ParlaySuggestion, Prediction};
use crate::services::{build_parlay, GeminiClient, MatchIntelligence, MatchSource, PredictionEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing fetched yet, or the credential is missing.
    Idle,
    Loading,
    /// Fixtures loaded (possibly zero), not scored.
    Ready,
    Analyzing,
    Analyzed,
}

/// One immutable snapshot of the dashboard. Every transition builds a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub cycle_id: Option<Uuid>,
    pub phase: Phase,
    pub matches: Vec<MatchData>,
    pub predictions: Vec<Prediction>,
    /// Set only for configuration failures; service failures surface as empty lists.
    pub error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            cycle_id: None,
            phase: Phase::Idle,
            matches: Vec::new(),
            predictions: Vec::new(),
            error: None,
        }
    }
}

impl SessionState {
    pub fn begin_refresh(&self) -> Result<Self> {
        if matches!(self.phase, Phase::Loading | Phase::Analyzing) {
            return Err(AppError::InFlight(if self.phase == Phase::Loading {
                "Refresh"
            } else {
                "Analysis"
            }));
        }
        Ok(Self {
            cycle_id: Some(Uuid::new_v4()),
            phase: Phase::Loading,
            matches: Vec::new(),
            predictions: Vec::new(),
            error: None,
        })
    }

    pub fn finish_refresh(&self, matches: Vec<MatchData>) -> Self {
        Self {
            cycle_id: self.cycle_id,
            phase: Phase::Ready,
            matches,
            predictions: Vec::new(),
            error: None,
        }
    }

    pub fn fail_configuration(&self, message: &str) -> Self {
        Self {
            cycle_id: self.cycle_id,
            phase: Phase::Idle,
            matches: self.matches.clone(),
            predictions: self.predictions.clone(),
            error: Some(message.to_string()),
        }
    }

    pub fn begin_analysis(&self) -> Result<Self> {
        match self.phase {
            Phase::Loading => return Err(AppError::InFlight("Refresh")),
            Phase::Analyzing => return Err(AppError::InFlight("Analysis")),
            Phase::Analyzed => return Err(AppError::AlreadyAnalyzed),
            Phase::Idle | Phase::Ready => {}
        }
        if self.matches.is_empty() {
            return Err(AppError::NoMatches);
        }
        Ok(Self {
            phase: Phase::Analyzing,
            ..self.clone()
        })
    }

    /// An empty prediction list drops back to `Ready` so the scoring can be triggered again.
    pub fn finish_analysis(&self, predictions: Vec<Prediction>) -> Self {
        let phase = if predictions.is_empty() {
            Phase::Ready
        } else {
            Phase::Analyzed
        };
        Self {
            cycle_id: self.cycle_id,
            phase,
            matches: self.matches.clone(),
            predictions,
            error: None,
        }
    }

    /// Refresh finished and turned up nothing, as opposed to still loading or misconfigured.
    pub fn is_empty_result(&self) -> bool {
        self.phase == Phase::Ready && self.matches.is_empty() && self.error.is_none()
    }
}

/// Drives the fetch and score cycles over a shared, wholesale-replaced [`SessionState`].
pub struct Dashboard {
    intelligence: Option<Arc<dyn MatchIntelligence>>,
    state: RwLock<SessionState>,
    leg_count: usize,
    stake: f64,
}

impl Dashboard {
    /// Live dashboard backed by Gemini. A missing credential is not an error here; it is
    /// reported on the first refresh, before any network call.
    pub fn from_config(config: &Config) -> Result<Self> {
        let intelligence: Option<Arc<dyn MatchIntelligence>> = match config.api_key {
            Some(_) => {
                let client = GeminiClient::new(config)?;
                tracing::info!("Using generative model {}", client.model());
                Some(Arc::new(client))
            }
            None => {
                tracing::warn!("{}", MISSING_API_KEY);
                None
            }
        };
        Ok(Self {
            intelligence,
            state: RwLock::new(SessionState::default()),
            leg_count: config.leg_count,
            stake: config.stake,
        })
    }

    pub fn with_intelligence(intelligence: Arc<dyn MatchIntelligence>) -> Self {
        Self {
            intelligence: Some(intelligence),
            state: RwLock::new(SessionState::default()),
            leg_count: DEFAULT_LEG_COUNT,
            stake: DEFAULT_STAKE,
        }
    }

    pub fn with_parlay_settings(mut self, leg_count: usize, stake: f64) -> Self {
        self.leg_count = leg_count;
        self.stake = stake;
        self
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Fetch a fresh fixture batch, replacing matches and clearing predictions.
    pub async fn refresh(&self) -> Result<SessionState> {
        let Some(intelligence) = self.intelligence.clone() else {
            let mut state = self.state.write().await;
            *state = state.fail_configuration(MISSING_API_KEY);
            return Err(AppError::Config(MISSING_API_KEY.to_string()));
        };

        let cycle_id = {
            let mut state = self.state.write().await;
            let next = state.begin_refresh()?;
            let cycle_id = next.cycle_id;
            *state = next;
            cycle_id
        };

        let matches = MatchSource::new(intelligence).fetch_upcoming_matches().await;

        let mut state = self.state.write().await;
        if state.cycle_id != cycle_id {
            tracing::warn!("Discarding fixtures from superseded cycle");
            return Ok(state.clone());
        }
        *state = state.finish_refresh(matches);
        tracing::info!("Loaded {} matches", state.matches.len());
        Ok(state.clone())
    }

    /// Score the current batch. Refused while another cycle is in flight.
    pub async fn analyze(&self) -> Result<SessionState> {
        let Some(intelligence) = self.intelligence.clone() else {
            let mut state = self.state.write().await;
            *state = state.fail_configuration(MISSING_API_KEY);
            return Err(AppError::Config(MISSING_API_KEY.to_string()));
        };

        let (cycle_id, matches) = {
            let mut state = self.state.write().await;
            let next = state.begin_analysis()?;
            let snapshot = (next.cycle_id, next.matches.clone());
            *state = next;
            snapshot
        };

        let predictions = PredictionEngine::new(intelligence).score_matches(&matches).await;

        let mut state = self.state.write().await;
        if state.cycle_id != cycle_id {
            tracing::warn!("Discarding predictions from superseded cycle");
            return Ok(state.clone());
        }
        *state = state.finish_analysis(predictions);
        Ok(state.clone())
    }

    pub async fn parlay(&self) -> Option<ParlaySuggestion> {
        self.parlay_with(self.leg_count, self.stake).await
    }

    pub async fn parlay_with(&self, leg_count: usize, stake: f64) -> Option<ParlaySuggestion> {
        let state = self.state.read().await;
        build_parlay(&state.predictions, &state.matches, leg_count, stake)
    }
}
