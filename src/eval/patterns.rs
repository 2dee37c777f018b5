//! Pattern scores for position evaluation
//!
//! These constants define the scoring weights for board patterns and the
//! smaller positional terms. A completed five dominates everything else;
//! below it the weights drop steeply so a single stronger pattern always
//! outweighs a pile of weaker ones.

/// Score weights for evaluation
pub struct PatternScore;

impl PatternScore {
    /// Five in a row - decided game
    pub const FIVE: i32 = 100_000;
    /// Open four: _OOOO_ (both ends free)
    pub const OPEN_FOUR: i32 = 15_000;
    /// Blocked four: XOOOO_ or _OOOOX (one end free)
    pub const BLOCKED_FOUR: i32 = 4_000;
    /// Open three: _OOO_
    pub const OPEN_THREE: i32 = 3_000;
    /// Blocked three: XOOO_ or _OOOX
    pub const BLOCKED_THREE: i32 = 1_000;
    /// Open two: _OO_
    pub const OPEN_TWO: i32 = 500;

    /// Weight per stone of material difference
    pub const MATERIAL: i32 = 10;
    /// Maximum per-stone center-control bonus (scaled down with distance)
    pub const CENTER: i32 = 50;
    /// Bonus per opponent stone adjacent to an empty cell
    pub const CONTACT: i32 = 5;
}
