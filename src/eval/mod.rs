//! Position evaluation: score table and memoized heuristic

pub mod heuristic;
pub mod patterns;

pub use heuristic::Evaluator;
pub use patterns::PatternScore;
