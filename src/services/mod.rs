pub mod demo;
pub mod gemini;
pub mod match_source;
pub mod parlay;
pub mod predictor;

pub use demo::*;
pub use gemini::*;
pub use match_source::*;
pub use parlay::*;
pub use predictor::*;
