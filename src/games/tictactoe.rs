//! Tic-tac-toe on the classic 3x3 grid.
//!
//! Cells are numbered 0 through 8, row by row from the top left. Player 1
//! renders as `X`, player 2 as `O`.

use std::fmt;
use std::str::FromStr;

use crate::{GameState, Outcome, PlayerId};

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A cell index, 0 through 8.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CellMove(pub u8);

impl fmt::Display for CellMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure to read a [`CellMove`] from user input.
#[derive(Debug, thiserror::Error)]
pub enum ParseMoveError {
    #[error("move must be a number")]
    NotANumber(#[from] std::num::ParseIntError),
    #[error("cell {0} is out of range (0-8)")]
    OutOfRange(u8),
}

impl FromStr for CellMove {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cell: u8 = s.trim().parse()?;
        if cell > 8 {
            return Err(ParseMoveError::OutOfRange(cell));
        }
        Ok(CellMove(cell))
    }
}

#[derive(Clone, Debug)]
pub struct TicTacToe {
    cells: [u8; 9],
    current_player: u8,
    winner: u8,
    filled: u8,
}

impl TicTacToe {
    pub fn new() -> Self {
        TicTacToe {
            cells: [0; 9],
            current_player: 1,
            winner: 0,
            filled: 0,
        }
    }

    /// Builds a mid-game position. `cells` holds 0 for empty, 1, or 2;
    /// `mover` is the player whose turn it is.
    pub fn from_cells(cells: [u8; 9], mover: u8) -> Self {
        let filled = cells.iter().filter(|&&c| c != 0).count() as u8;
        TicTacToe {
            cells,
            current_player: mover,
            winner: 0,
            filled,
        }
    }

    fn completes_line(&self, player: u8) -> bool {
        LINES
            .iter()
            .any(|line| line.iter().all(|&c| self.cells[c] == player))
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState for TicTacToe {
    type Move = CellMove;
    const MAX_MOVES: usize = 9;

    fn generate_moves(&self, out: &mut [Self::Move]) -> usize {
        let mut n = 0;
        for (cell, &owner) in self.cells.iter().enumerate() {
            if owner == 0 {
                out[n] = CellMove(cell as u8);
                n += 1;
            }
        }
        n
    }

    fn apply_move(&mut self, mv: Self::Move) -> Outcome {
        let cell = mv.0 as usize;
        if cell >= 9 || self.cells[cell] != 0 {
            return Outcome::Invalid;
        }
        self.cells[cell] = self.current_player;
        self.filled += 1;
        if self.completes_line(self.current_player) {
            self.winner = self.current_player;
            Outcome::Fin
        } else if self.filled == 9 {
            Outcome::Draw
        } else {
            Outcome::Running
        }
    }

    fn switch_player(&mut self) {
        self.current_player = 3 - self.current_player;
    }

    fn current_player(&self) -> PlayerId {
        self.current_player
    }

    fn winner(&self) -> PlayerId {
        self.winner
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            for col in 0..3 {
                let glyph = match self.cells[row * 3 + col] {
                    1 => 'X',
                    2 => 'O',
                    _ => '.',
                };
                write!(f, " {glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_board_offers_nine_moves() {
        let t = TicTacToe::new();
        let mut moves = [CellMove::default(); 9];
        assert_eq!(t.generate_moves(&mut moves), 9);
        assert_eq!(t.current_player(), 1);
        assert_eq!(t.winner(), 0);
    }

    #[test]
    fn completing_a_row_wins() {
        let mut t = TicTacToe::from_cells([1, 1, 0, 2, 2, 0, 0, 0, 0], 1);
        assert_eq!(t.apply_move(CellMove(2)), Outcome::Fin);
        assert_eq!(t.winner(), 1);
    }

    #[test]
    fn completing_a_diagonal_wins() {
        let mut t = TicTacToe::from_cells([2, 1, 1, 0, 2, 0, 0, 0, 0], 2);
        assert_eq!(t.apply_move(CellMove(8)), Outcome::Fin);
        assert_eq!(t.winner(), 2);
    }

    #[test]
    fn filling_the_board_without_a_line_draws() {
        let mut t = TicTacToe::from_cells([2, 1, 2, 1, 1, 2, 0, 2, 1], 2);
        assert_eq!(t.apply_move(CellMove(6)), Outcome::Draw);
        assert_eq!(t.winner(), 0);
    }

    #[test]
    fn occupied_cells_are_rejected() {
        let mut t = TicTacToe::new();
        assert_eq!(t.apply_move(CellMove(4)), Outcome::Running);
        assert_eq!(t.apply_move(CellMove(4)), Outcome::Invalid);
    }

    #[test]
    fn move_parsing_validates_the_range() {
        assert_eq!("4".parse::<CellMove>().ok(), Some(CellMove(4)));
        assert!(" 8 ".parse::<CellMove>().is_ok());
        assert!("9".parse::<CellMove>().is_err());
        assert!("x".parse::<CellMove>().is_err());
    }
}
