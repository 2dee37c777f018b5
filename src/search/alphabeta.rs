//! Iterative-deepening alpha-beta search over a filtered candidate set
//!
//! The search is single-threaded, synchronous and recursive. Depth limits
//! come from the difficulty tier; wall-clock control is cooperative: the
//! deepening loop stops once 80% of the budget is spent, and every recursive
//! call checks the clock at its top. A node that runs over budget returns the
//! evaluator's value for its position instead of searching deeper, so time
//! pressure degrades the answer to a heuristic one rather than erroring.
//!
//! Scores inside the search are normalized to the root mover's perspective
//! (`root_sign * evaluate`): the root always maximizes and plies alternate
//! strictly below it, which keeps the alternation consistent with the
//! evaluator's absolute sign convention.

use std::time::{Duration, Instant};

use log::debug;

use crate::board::{center, BoardLike, Pos, Stone};
use crate::eval::Evaluator;

/// Window bound safely above any evaluation magnitude.
const INF: i32 = 1_000_000_000;

/// Candidate breadth at interior nodes (root breadth is per tier).
const INTERIOR_BREADTH: usize = 12;

/// Chebyshev radius around the center / existing stones that makes a move
/// relevant on large boards.
const RELEVANCE_RADIUS: i32 = 2;

/// Boards up to this size search every legal move.
const EXHAUSTIVE_BOARD: usize = 10;

/// With this few candidates a one-ply evaluation replaces the deep search.
const SHALLOW_CANDIDATES: usize = 3;

/// Result of one move selection, from the root mover's perspective.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best move found, if any
    pub best_move: Option<Pos>,
    /// Score of the best move (positive favors the root mover)
    pub score: i32,
    /// Deepest iteration that produced a decision
    pub depth: u8,
    /// Nodes visited
    pub nodes: u64,
    /// True when the shallow one-ply path decided instead of deepening
    pub shallow: bool,
}

/// Mutable state threaded through one search: the evaluator, the clock and
/// the node counter.
struct SearchCtx<'a> {
    evaluator: &'a mut Evaluator,
    start: Instant,
    budget: Duration,
    root_sign: i32,
    nodes: u64,
}

impl<'a> SearchCtx<'a> {
    fn new(evaluator: &'a mut Evaluator, start: Instant, budget: Duration, root_sign: i32) -> Self {
        Self {
            evaluator,
            start,
            budget,
            root_sign,
            nodes: 0,
        }
    }

    #[inline]
    fn over_budget(&self) -> bool {
        self.start.elapsed() >= self.budget
    }

    /// Heuristic value of the position, root mover's perspective.
    #[inline]
    fn leaf_value<B: BoardLike>(&mut self, board: &B) -> i32 {
        self.root_sign * self.evaluator.evaluate(board)
    }
}

/// Time-boxed iterative-deepening alpha-beta searcher.
///
/// One instance per engine; holds the tier parameters and no per-game state.
#[derive(Debug, Clone, Copy)]
pub struct Searcher {
    max_depth: u8,
    time_budget: Duration,
    breadth_cap: usize,
}

impl Searcher {
    #[must_use]
    pub fn new(max_depth: u8, time_budget: Duration, breadth_cap: usize) -> Self {
        Self {
            max_depth,
            time_budget,
            breadth_cap,
        }
    }

    /// Pick a move for the side to move. Returns an empty outcome when the
    /// board has no legal moves (a draw, not an error).
    ///
    /// All speculative lines run on a private clone of `board` and are
    /// unwound with `undo`; the caller's board is never mutated.
    pub fn search<B: BoardLike>(&self, board: &B, evaluator: &mut Evaluator) -> SearchOutcome {
        let legal = board.legal_moves();
        if legal.is_empty() {
            return SearchOutcome {
                best_move: None,
                score: 0,
                depth: 0,
                nodes: 0,
                shallow: false,
            };
        }

        let root_sign = board.current_mover().sign();
        let mut candidates: Vec<Pos> = legal
            .iter()
            .copied()
            .filter(|&mov| is_relevant(board, mov))
            .collect();
        if candidates.is_empty() {
            candidates = legal;
        }

        let mut work = board.clone();

        if candidates.len() <= SHALLOW_CANDIDATES {
            return shallow_pick(&mut work, &candidates, root_sign, evaluator);
        }

        let center_pos = center(board.size());
        candidates.sort_by_key(|mov| mov.manhattan(center_pos));
        candidates.truncate(self.breadth_cap);

        let start = Instant::now();
        let soft_limit = self.time_budget * 4 / 5;
        let mut ctx = SearchCtx::new(evaluator, start, self.time_budget, root_sign);
        let mut best: Option<(Pos, i32)> = None;
        let mut reached_depth = 0u8;

        for depth in 1..=self.max_depth {
            if start.elapsed() >= soft_limit {
                debug!("stopping before depth {depth}: soft time limit reached");
                break;
            }

            // Fresh window and fresh decision per iteration; a deeper scan,
            // even a partial one, overwrites the previous depth's choice.
            let mut depth_best: Option<(Pos, i32)> = None;
            let mut alpha = -INF;
            let beta = INF;

            for &mov in &candidates {
                work.apply(mov);
                let score = self.minimax(&mut work, depth - 1, alpha, beta, false, &mut ctx);
                work.undo();

                if depth_best.map_or(true, |(_, s)| score > s) {
                    depth_best = Some((mov, score));
                }
                alpha = alpha.max(score);

                if start.elapsed() >= soft_limit {
                    break;
                }
            }

            if let Some((mov, score)) = depth_best {
                debug!(
                    "depth {depth}: best ({}, {}) score {score}, {} nodes, {:?} elapsed",
                    mov.row,
                    mov.col,
                    ctx.nodes,
                    start.elapsed()
                );
                best = Some((mov, score));
                reached_depth = depth;
            }
        }

        let (best_move, score) = match best {
            Some((mov, score)) => (Some(mov), score),
            None => {
                // Time expired before the first depth decided anything: fall
                // back to the first candidate still matching the relevance
                // filter, else the one nearest the center.
                let fallback = candidates
                    .iter()
                    .copied()
                    .find(|&mov| is_relevant(board, mov))
                    .or_else(|| candidates.first().copied());
                (fallback, 0)
            }
        };

        SearchOutcome {
            best_move,
            score,
            depth: reached_depth,
            nodes: ctx.nodes,
            shallow: false,
        }
    }

    /// Fail-hard alpha-beta minimax, values in the root mover's perspective.
    fn minimax<B: BoardLike>(
        &self,
        board: &mut B,
        depth: u8,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
        ctx: &mut SearchCtx<'_>,
    ) -> i32 {
        ctx.nodes += 1;

        // The wall-clock check is the sole cancellation mechanism: over
        // budget, the node's heuristic value stands in for its subtree.
        if ctx.over_budget() {
            return ctx.leaf_value(board);
        }
        if depth == 0 || board.just_won() {
            return ctx.leaf_value(board);
        }

        let moves = node_moves(board);
        if moves.is_empty() {
            return 0;
        }

        if maximizing {
            let mut best = -INF;
            for mov in moves {
                board.apply(mov);
                let score = self.minimax(board, depth - 1, alpha, beta, false, ctx);
                board.undo();
                best = best.max(score);
                alpha = alpha.max(score);
                if beta <= alpha {
                    break;
                }
            }
            best
        } else {
            let mut best = INF;
            for mov in moves {
                board.apply(mov);
                let score = self.minimax(board, depth - 1, alpha, beta, true, ctx);
                board.undo();
                best = best.min(score);
                beta = beta.min(score);
                if beta <= alpha {
                    break;
                }
            }
            best
        }
    }
}

/// One-ply evaluation of each candidate; used when almost nothing is left to
/// choose from. Best by the mover's sign.
fn shallow_pick<B: BoardLike>(
    work: &mut B,
    candidates: &[Pos],
    root_sign: i32,
    evaluator: &mut Evaluator,
) -> SearchOutcome {
    let mut best: Option<(Pos, i32)> = None;
    for &mov in candidates {
        work.apply(mov);
        let score = root_sign * evaluator.evaluate(work);
        work.undo();
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((mov, score));
        }
    }

    SearchOutcome {
        best_move: best.map(|(mov, _)| mov),
        score: best.map_or(0, |(_, score)| score),
        depth: 1,
        nodes: candidates.len() as u64,
        shallow: true,
    }
}

/// Candidate set for an interior node: relevant legal moves, center-sorted
/// and capped so speculative breadth stays bounded off the root.
fn node_moves<B: BoardLike>(board: &B) -> Vec<Pos> {
    let legal = board.legal_moves();
    let mut moves: Vec<Pos> = legal
        .iter()
        .copied()
        .filter(|&mov| is_relevant(board, mov))
        .collect();
    if moves.is_empty() {
        moves = legal;
    }
    if moves.len() > INTERIOR_BREADTH {
        let center_pos = center(board.size());
        moves.sort_by_key(|mov| mov.manhattan(center_pos));
        moves.truncate(INTERIOR_BREADTH);
    }
    moves
}

/// A move is relevant when the board is small, when it sits in the central
/// area, or when it is near an existing stone.
fn is_relevant<B: BoardLike>(board: &B, mov: Pos) -> bool {
    let size = board.size();
    if size <= EXHAUSTIVE_BOARD {
        return true;
    }

    let center_pos = center(size);
    let center_dr = (i32::from(mov.row) - i32::from(center_pos.row)).abs();
    let center_dc = (i32::from(mov.col) - i32::from(center_pos.col)).abs();
    if center_dr <= RELEVANCE_RADIUS && center_dc <= RELEVANCE_RADIUS {
        return true;
    }

    for dr in -RELEVANCE_RADIUS..=RELEVANCE_RADIUS {
        for dc in -RELEVANCE_RADIUS..=RELEVANCE_RADIUS {
            if let Some(near) = mov.offset(dr, dc, size) {
                if board.cell(near) != Stone::Empty {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Stone};

    /// A budget long enough that no test ever degrades on time.
    const FOREVER: Duration = Duration::from_secs(3600);

    fn board_with(size: usize, moves: &[(u8, u8)]) -> Board {
        let mut board = Board::new(size);
        for &(row, col) in moves {
            assert!(board.apply(Pos::new(row, col)), "setup move ({row},{col})");
        }
        board
    }

    /// Full-width minimax twin: identical move generation and leaf values,
    /// no cutoffs. Pruning must change the node count, never the result.
    fn plain_minimax<B: BoardLike>(
        board: &mut B,
        depth: u8,
        maximizing: bool,
        ctx: &mut SearchCtx<'_>,
    ) -> i32 {
        ctx.nodes += 1;
        if depth == 0 || board.just_won() {
            return ctx.leaf_value(board);
        }
        let moves = node_moves(board);
        if moves.is_empty() {
            return 0;
        }

        let mut best = if maximizing { -INF } else { INF };
        for mov in moves {
            board.apply(mov);
            let score = plain_minimax(board, depth - 1, !maximizing, ctx);
            board.undo();
            if maximizing {
                best = best.max(score);
            } else {
                best = best.min(score);
            }
        }
        best
    }

    /// Root scan without pruning, mirroring the searcher's root loop.
    fn plain_root(board: &Board, depth: u8, breadth_cap: usize) -> (Pos, i32, u64) {
        let legal = board.legal_moves();
        let root_sign = board.current_mover().sign();
        let mut candidates: Vec<Pos> = legal
            .iter()
            .copied()
            .filter(|&mov| is_relevant(board, mov))
            .collect();
        if candidates.is_empty() {
            candidates = legal;
        }
        let center_pos = center(board.size());
        candidates.sort_by_key(|mov| mov.manhattan(center_pos));
        candidates.truncate(breadth_cap);

        let mut evaluator = Evaluator::new();
        let mut ctx = SearchCtx::new(&mut evaluator, Instant::now(), FOREVER, root_sign);
        let mut work = board.clone();
        let mut best: Option<(Pos, i32)> = None;
        for &mov in &candidates {
            work.apply(mov);
            let score = plain_minimax(&mut work, depth - 1, false, &mut ctx);
            work.undo();
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((mov, score));
            }
        }
        let (mov, score) = best.expect("candidates are non-empty");
        (mov, score, ctx.nodes)
    }

    /// Root scan *with* pruning at a single fixed depth, for node counting.
    fn pruned_root(board: &Board, depth: u8, breadth_cap: usize) -> (Pos, i32, u64) {
        let searcher = Searcher::new(depth, FOREVER, breadth_cap);
        let legal = board.legal_moves();
        let root_sign = board.current_mover().sign();
        let mut candidates: Vec<Pos> = legal
            .iter()
            .copied()
            .filter(|&mov| is_relevant(board, mov))
            .collect();
        if candidates.is_empty() {
            candidates = legal;
        }
        let center_pos = center(board.size());
        candidates.sort_by_key(|mov| mov.manhattan(center_pos));
        candidates.truncate(breadth_cap);

        let mut evaluator = Evaluator::new();
        let mut ctx = SearchCtx::new(&mut evaluator, Instant::now(), FOREVER, root_sign);
        let mut work = board.clone();
        let mut best: Option<(Pos, i32)> = None;
        let mut alpha = -INF;
        for &mov in &candidates {
            work.apply(mov);
            let score = searcher.minimax(&mut work, depth - 1, alpha, INF, false, &mut ctx);
            work.undo();
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((mov, score));
            }
            alpha = alpha.max(score);
        }
        let (mov, score) = best.expect("candidates are non-empty");
        (mov, score, ctx.nodes)
    }

    #[test]
    fn test_pruning_never_changes_the_result() {
        let board = board_with(6, &[(2, 2), (3, 3), (2, 3), (3, 2)]);
        assert_eq!(board.current_mover(), Stone::Black);

        let searcher = Searcher::new(3, FOREVER, 16);
        let mut evaluator = Evaluator::new();
        let deepened = searcher.search(&board, &mut evaluator);

        let (plain_move, plain_score, plain_nodes) = plain_root(&board, 3, 16);
        let (pruned_move, pruned_score, pruned_nodes) = pruned_root(&board, 3, 16);

        assert_eq!(pruned_move, plain_move, "pruning changed the chosen move");
        assert_eq!(pruned_score, plain_score, "pruning changed the root score");
        assert!(
            pruned_nodes < plain_nodes,
            "pruning should cut nodes: pruned={pruned_nodes}, plain={plain_nodes}"
        );
        // The deepened search's final iteration is the same fixed-depth scan.
        assert_eq!(deepened.best_move, Some(plain_move));
        assert_eq!(deepened.score, plain_score);
        assert_eq!(deepened.depth, 3);
    }

    #[test]
    fn test_pruning_equivalence_for_second_player() {
        // Same property with White at the root: "maximizing" must follow the
        // root mover's favorable sign, not Black's.
        let board = board_with(6, &[(2, 2), (3, 3), (2, 3)]);
        assert_eq!(board.current_mover(), Stone::White);

        let searcher = Searcher::new(2, FOREVER, 16);
        let mut evaluator = Evaluator::new();
        let pruned = searcher.search(&board, &mut evaluator);

        let (plain_move, plain_score, _) = plain_root(&board, 2, 16);
        assert_eq!(pruned.best_move, Some(plain_move));
        assert_eq!(pruned.score, plain_score);
    }

    #[test]
    fn test_zero_budget_falls_back_to_nearest_center_candidate() {
        let board = board_with(15, &[(7, 7), (8, 8)]);
        let searcher = Searcher::new(6, Duration::ZERO, 16);
        let mut evaluator = Evaluator::new();

        let outcome = searcher.search(&board, &mut evaluator);
        assert_eq!(outcome.depth, 0, "no iteration may run on a zero budget");
        let mov = outcome.best_move.expect("fallback must still pick a move");
        assert!(board.is_legal(mov));
        // Candidates are center-sorted; the fallback is the nearest relevant
        // one, here a cell right next to the occupied center.
        assert!(mov.manhattan(center(15)) <= 1);
    }

    #[test]
    fn test_shallow_path_picks_best_by_mover_sign() {
        // Stop the draw layout three stones early: 11 black + 11 white
        // applied, Black to move, three empty cells left.
        let (blacks, whites) = draw_layout();
        let mut board = Board::new(5);
        for i in 0..11 {
            assert!(board.apply(blacks[i]));
            assert!(board.apply(whites[i]));
        }
        assert_eq!(board.current_mover(), Stone::Black);
        assert_eq!(board.legal_moves().len(), 3);

        let searcher = Searcher::new(4, FOREVER, 16);
        let mut evaluator = Evaluator::new();
        let outcome = searcher.search(&board, &mut evaluator);
        assert!(outcome.shallow, "three candidates must take the one-ply path");
        let mov = outcome.best_move.expect("a move exists");
        assert!(board.is_legal(mov));

        // The pick must be the argmax of mover_sign * one-ply evaluation.
        let sign = board.current_mover().sign();
        let mut check = board.clone();
        let mut fresh = Evaluator::new();
        let mut best_seen = i32::MIN;
        for cell in board.legal_moves() {
            check.apply(cell);
            best_seen = best_seen.max(sign * fresh.evaluate(&check));
            check.undo();
        }
        assert_eq!(outcome.score, best_seen, "shallow path must maximize the mover's sign");
    }

    #[test]
    fn test_search_empty_legal_moves_reports_draw() {
        // A full 5x5 board with no five anywhere.
        let board = full_draw_board();
        let searcher = Searcher::new(2, FOREVER, 8);
        let mut evaluator = Evaluator::new();
        let outcome = searcher.search(&board, &mut evaluator);
        assert_eq!(outcome.best_move, None, "no legal moves means a draw, not an error");
    }

    #[test]
    fn test_deeper_search_finds_the_winning_line() {
        // Black has an open four on a 9x9 board; any sensible depth-2 search
        // must complete it.
        let board = board_with(
            9,
            &[(4, 2), (0, 0), (4, 3), (0, 2), (4, 4), (0, 4), (4, 5), (0, 6)],
        );
        assert_eq!(board.current_mover(), Stone::Black);
        let searcher = Searcher::new(2, FOREVER, 16);
        let mut evaluator = Evaluator::new();
        let outcome = searcher.search(&board, &mut evaluator);
        let mov = outcome.best_move.expect("a move exists");
        assert!(
            mov == Pos::new(4, 1) || mov == Pos::new(4, 6),
            "search must complete the open four, got {mov:?}"
        );
    }

    #[test]
    fn test_relevance_filter_keeps_center_and_contact_moves() {
        let board = board_with(19, &[(9, 9)]);
        assert!(is_relevant(&board, Pos::new(9, 10)), "contact move");
        assert!(is_relevant(&board, Pos::new(8, 8)), "center area move");
        assert!(!is_relevant(&board, Pos::new(0, 0)), "far corner is noise");
        // Small boards are searched exhaustively.
        let small = board_with(9, &[(4, 4)]);
        assert!(is_relevant(&small, Pos::new(0, 0)));
    }

    /// Stone lists (13 black, 12 white) of an alternating full 5x5 layout
    /// that contains no five-in-a-row for either side.
    fn draw_layout() -> (Vec<Pos>, Vec<Pos>) {
        let rows: [[Stone; 5]; 5] = {
            use Stone::{Black as B, White as W};
            [
                [B, W, B, W, B],
                [B, W, B, W, B],
                [W, B, W, B, W],
                [W, B, W, B, W],
                [B, W, B, W, B],
            ]
        };
        let mut blacks = Vec::new();
        let mut whites = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, stone) in row.iter().enumerate() {
                let pos = Pos::new(r as u8, c as u8);
                match stone {
                    Stone::Black => blacks.push(pos),
                    Stone::White => whites.push(pos),
                    Stone::Empty => {}
                }
            }
        }
        assert_eq!(blacks.len(), 13);
        assert_eq!(whites.len(), 12);
        (blacks, whites)
    }

    /// Full 5x5 board built from [`draw_layout`]: no legal moves, no winner.
    fn full_draw_board() -> Board {
        let mut board = Board::new(5);
        let (blacks, whites) = draw_layout();
        for i in 0..13 {
            assert!(board.apply(blacks[i]));
            if i < 12 {
                assert!(board.apply(whites[i]));
            }
        }
        assert!(!board.just_won(), "the layout must not contain a five");
        board
    }
}
