//! Concrete board with move history and last-move win detection

use std::fmt;

use super::{BoardLike, Pos, Stone};

/// Direction vectors for line checking (4 directions)
/// Each direction only needs to be checked once (we scan both ways from the
/// last-placed stone).
const DIRECTIONS: [(i32, i32); 4] = [
    (0, 1),  // Horizontal
    (1, 0),  // Vertical
    (1, 1),  // Diagonal SE
    (1, -1), // Diagonal SW
];

/// Game board backed by a flat `size * size` grid.
///
/// The grid is mutated only through [`BoardLike::apply`] and
/// [`BoardLike::undo`]; the history stack makes undo exact, restoring the
/// mover-to-act and the last-move marker along with the cell.
#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    cells: Vec<Stone>,
    mover: Stone,
    last_move: Option<Pos>,
    history: Vec<HistoryEntry>,
}

/// Record of one applied move, sufficient for exact undo.
#[derive(Debug, Clone, Copy)]
struct HistoryEntry {
    pos: Pos,
    mover: Stone,
}

impl Board {
    /// Create an empty board. Black moves first.
    #[must_use]
    pub fn new(size: usize) -> Self {
        debug_assert!(size >= 5, "board too small for five-in-a-row");
        debug_assert!(size <= u8::MAX as usize, "coordinates are u8");
        Self {
            size,
            cells: vec![Stone::Empty; size * size],
            mover: Stone::Black,
            last_move: None,
            history: Vec::with_capacity(size * size),
        }
    }

    /// The most recently applied move, if any.
    #[inline]
    #[must_use]
    pub fn last_move(&self) -> Option<Pos> {
        self.last_move
    }

    /// Number of stones on the board.
    #[inline]
    #[must_use]
    pub fn stone_count(&self) -> usize {
        self.history.len()
    }
}

impl BoardLike for Board {
    #[inline]
    fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn cell(&self, pos: Pos) -> Stone {
        self.cells[pos.to_index(self.size)]
    }

    #[inline]
    fn current_mover(&self) -> Stone {
        self.mover
    }

    #[inline]
    fn is_legal(&self, pos: Pos) -> bool {
        (pos.row as usize) < self.size
            && (pos.col as usize) < self.size
            && self.cells[pos.to_index(self.size)] == Stone::Empty
    }

    fn apply(&mut self, pos: Pos) -> bool {
        if !self.is_legal(pos) {
            return false;
        }
        self.cells[pos.to_index(self.size)] = self.mover;
        self.history.push(HistoryEntry {
            pos,
            mover: self.mover,
        });
        self.last_move = Some(pos);
        self.mover = self.mover.opponent();
        true
    }

    fn legal_moves(&self) -> Vec<Pos> {
        let mut moves = Vec::new();
        for row in 0..self.size as u8 {
            for col in 0..self.size as u8 {
                if self.cells[Pos::new(row, col).to_index(self.size)] == Stone::Empty {
                    moves.push(Pos::new(row, col));
                }
            }
        }
        moves
    }

    fn just_won(&self) -> bool {
        let Some(pos) = self.last_move else {
            return false;
        };
        let owner = self.cell(pos);
        if owner == Stone::Empty {
            return false;
        }

        for &(dr, dc) in &DIRECTIONS {
            let mut count = 1;
            // Positive direction
            let mut cursor = pos;
            while let Some(next) = cursor.offset(dr, dc, self.size) {
                if self.cell(next) != owner {
                    break;
                }
                count += 1;
                cursor = next;
            }
            // Negative direction
            cursor = pos;
            while let Some(next) = cursor.offset(-dr, -dc, self.size) {
                if self.cell(next) != owner {
                    break;
                }
                count += 1;
                cursor = next;
            }
            if count >= 5 {
                return true;
            }
        }
        false
    }

    fn undo(&mut self) -> bool {
        let Some(entry) = self.history.pop() else {
            return false;
        };
        self.cells[entry.pos.to_index(self.size)] = Stone::Empty;
        self.mover = entry.mover;
        self.last_move = self.history.last().map(|prev| prev.pos);
        true
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size as u8 {
            for col in 0..self.size as u8 {
                let symbol = match self.cell(Pos::new(row, col)) {
                    Stone::Empty => '.',
                    Stone::Black => 'X',
                    Stone::White => 'O',
                };
                if col > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
