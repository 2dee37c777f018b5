//! Main AI engine integrating all move-selection components
//!
//! One move request flows through a fixed pipeline, cheapest answer first:
//!
//! 1. **Draw check**: no legal moves means no move (not an error)
//! 2. **Opening book**: on large, nearly-empty boards a fixed center cluster
//!    skips the search entirely (tier-gated)
//! 3. **Deliberate weakening**: the Easy tier sometimes plays a random legal
//!    move
//! 4. **Threat scan**: a forcing move always pre-empts deep search
//! 5. **Alpha-beta**: time-boxed iterative deepening over a filtered
//!    candidate set
//!
//! All randomness (opening-book choice, Easy-tier weakening) flows through an
//! injected, seedable RNG so games can be reproduced exactly.
//!
//! # Example
//!
//! ```
//! use gomoku_ai::{AiEngine, Board, BoardLike, Difficulty, Pos};
//!
//! let mut engine = AiEngine::with_seed(Difficulty::Medium.params(), 7);
//! let mut board = Board::new(19);
//!
//! board.apply(Pos::new(9, 9));
//! if let Some(reply) = engine.select_move(&board) {
//!     board.apply(reply);
//! }
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::board::{BoardLike, Pos};
use crate::eval::Evaluator;
use crate::search::{Searcher, TacticalCategory, ThreatScanner};

/// Fixed preferred early moves; used on large boards before the position has
/// any shape worth searching.
const OPENING_MOVES: [(u8, u8); 7] = [
    (7, 7),
    (7, 8),
    (8, 7),
    (8, 8),
    (6, 6),
    (6, 7),
    (7, 6),
];

/// The opening book only applies to boards at least this large ...
const OPENING_MIN_SIZE: usize = 15;
/// ... with at most this many stones already placed.
const OPENING_MAX_STONES: usize = 3;

/// Difficulty tiers. The tier fixes every policy parameter at construction
/// and cannot change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// The parameter row for this tier.
    #[must_use]
    pub fn params(self) -> EngineParams {
        EngineParams::for_difficulty(self)
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ConfigError::UnknownTier(s.to_string())),
        }
    }
}

/// Configuration rejected at engine construction.
///
/// An unrecognized tier never falls back to a default silently.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The requested difficulty tier is not one of easy/medium/hard.
    UnknownTier(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownTier(name) => {
                write!(f, "unknown difficulty tier: {name:?} (expected easy, medium or hard)")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Per-tier policy parameters.
#[derive(Debug, Clone, Copy)]
pub struct EngineParams {
    /// Iterative-deepening depth limit
    pub max_depth: u8,
    /// Wall-clock budget per move
    pub time_budget: Duration,
    /// Candidate breadth at the search root
    pub breadth_cap: usize,
    /// Whether the opening-book shortcut is allowed
    pub opening_book: bool,
    /// Probability of a deliberate random move (Easy-tier weakening)
    pub random_move_chance: f64,
}

impl EngineParams {
    /// Static policy table, one row per tier.
    #[must_use]
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                max_depth: 2,
                time_budget: Duration::from_secs(1),
                breadth_cap: 8,
                opening_book: false,
                random_move_chance: 0.3,
            },
            Difficulty::Medium => Self {
                max_depth: 4,
                time_budget: Duration::from_secs(3),
                breadth_cap: 12,
                opening_book: true,
                random_move_chance: 0.0,
            },
            Difficulty::Hard => Self {
                max_depth: 6,
                time_budget: Duration::from_secs(5),
                breadth_cap: 16,
                opening_book: true,
                random_move_chance: 0.0,
            },
        }
    }
}

/// What produced the selected move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Fixed early-game move set
    OpeningBook,
    /// Deliberate random weakening (Easy tier)
    Randomized,
    /// Forcing move from the threat scanner
    Tactical(TacticalCategory),
    /// One-ply evaluation over very few candidates
    Shallow,
    /// Full iterative-deepening alpha-beta
    AlphaBeta,
}

/// Result of a move selection with search statistics.
#[derive(Debug, Clone)]
pub struct MoveResult {
    /// Best move found; `None` signals a draw (no legal moves)
    pub best_move: Option<Pos>,
    /// Score from the mover's perspective (0 for shortcut moves)
    pub score: i32,
    /// Which pipeline stage decided
    pub kind: SearchKind,
    /// Deepest completed search iteration (search moves only)
    pub depth: u8,
    /// Nodes visited (search moves only)
    pub nodes: u64,
    /// Wall-clock time spent, in milliseconds
    pub time_ms: u64,
}

/// Move-selection engine for one game.
///
/// Owns the evaluator cache, the searcher and the RNG; concurrent games must
/// use independent engines — nothing here is shared or locked.
#[derive(Debug)]
pub struct AiEngine {
    params: EngineParams,
    evaluator: Evaluator,
    scanner: ThreatScanner,
    searcher: Searcher,
    rng: SmallRng,
}

impl AiEngine {
    /// Create an engine with explicit parameters and an entropy-seeded RNG.
    #[must_use]
    pub fn new(params: EngineParams) -> Self {
        Self::build(params, SmallRng::from_entropy())
    }

    /// Create an engine with a fixed RNG seed, for reproducible games.
    #[must_use]
    pub fn with_seed(params: EngineParams, seed: u64) -> Self {
        Self::build(params, SmallRng::seed_from_u64(seed))
    }

    /// Create an engine for a difficulty tier.
    #[must_use]
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self::new(difficulty.params())
    }

    /// Create an engine from a tier name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTier`] when the name is not a known
    /// tier; there is no silent default.
    pub fn from_tier_name(name: &str) -> Result<Self, ConfigError> {
        let difficulty = Difficulty::from_str(name)?;
        Ok(Self::for_difficulty(difficulty))
    }

    fn build(params: EngineParams, rng: SmallRng) -> Self {
        Self {
            params,
            evaluator: Evaluator::new(),
            scanner: ThreatScanner::new(),
            searcher: Searcher::new(params.max_depth, params.time_budget, params.breadth_cap),
            rng,
        }
    }

    /// The engine's policy parameters.
    #[must_use]
    pub fn params(&self) -> EngineParams {
        self.params
    }

    /// Pick a move for the side to move, or `None` when the board is full.
    ///
    /// Convenience wrapper around [`Self::select_move_with_stats`].
    #[must_use]
    pub fn select_move<B: BoardLike>(&mut self, board: &B) -> Option<Pos> {
        self.select_move_with_stats(board).best_move
    }

    /// Pick a move and report which pipeline stage decided, how deep the
    /// search went and how long it took.
    ///
    /// The caller's board is never mutated; speculation happens on private
    /// clones inside the search.
    pub fn select_move_with_stats<B: BoardLike>(&mut self, board: &B) -> MoveResult {
        let start = Instant::now();
        let legal = board.legal_moves();

        // 1. No legal moves: a draw, reported as the absence of a move.
        if legal.is_empty() {
            return MoveResult {
                best_move: None,
                score: 0,
                kind: SearchKind::AlphaBeta,
                depth: 0,
                nodes: 0,
                time_ms: elapsed_ms(start),
            };
        }

        let size = board.size();

        // 2. Opening book on large, nearly-empty boards.
        if self.params.opening_book
            && size >= OPENING_MIN_SIZE
            && legal.len() > size * size - (OPENING_MAX_STONES + 1)
        {
            let book: Vec<Pos> = OPENING_MOVES
                .iter()
                .map(|&(row, col)| Pos::new(row, col))
                .filter(|pos| legal.contains(pos))
                .collect();
            if let Some(&mov) = book.choose(&mut self.rng) {
                info!("opening book: playing ({}, {})", mov.row, mov.col);
                return MoveResult {
                    best_move: Some(mov),
                    score: 0,
                    kind: SearchKind::OpeningBook,
                    depth: 0,
                    nodes: 0,
                    time_ms: elapsed_ms(start),
                };
            }
        }

        // 3. Easy-tier weakening: sometimes just play anything legal.
        if self.params.random_move_chance > 0.0
            && self.rng.gen::<f64>() < self.params.random_move_chance
        {
            if let Some(&mov) = legal.choose(&mut self.rng) {
                info!("weakened move: playing ({}, {}) at random", mov.row, mov.col);
                return MoveResult {
                    best_move: Some(mov),
                    score: 0,
                    kind: SearchKind::Randomized,
                    depth: 0,
                    nodes: 0,
                    time_ms: elapsed_ms(start),
                };
            }
        }

        // 4. Tactical necessity always pre-empts deep search.
        if let Some(forcing) = self.scanner.find_forcing_move(board) {
            info!(
                "forcing move {:?}: playing ({}, {})",
                forcing.category, forcing.pos.row, forcing.pos.col
            );
            return MoveResult {
                best_move: Some(forcing.pos),
                score: 0,
                kind: SearchKind::Tactical(forcing.category),
                depth: 0,
                nodes: 0,
                time_ms: elapsed_ms(start),
            };
        }

        // 5. Time-boxed deepening search.
        let outcome = self.searcher.search(board, &mut self.evaluator);
        debug!(
            "search done: {:?} score {} at depth {} ({} nodes)",
            outcome.best_move, outcome.score, outcome.depth, outcome.nodes
        );
        MoveResult {
            best_move: outcome.best_move,
            score: outcome.score,
            kind: if outcome.shallow {
                SearchKind::Shallow
            } else {
                SearchKind::AlphaBeta
            },
            depth: outcome.depth,
            nodes: outcome.nodes,
            time_ms: elapsed_ms(start),
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
