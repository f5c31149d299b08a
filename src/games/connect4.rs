//! Connect Four on the standard 7x6 board.
//!
//! A move drops a piece into one of the seven columns; it settles on the
//! lowest free row. Four in a row horizontally, vertically, or diagonally
//! wins. Player 1 renders as `X`, player 2 as `O`.

use std::fmt;
use std::str::FromStr;

use crate::{GameState, Outcome, PlayerId};

const WIDTH: usize = 7;
const HEIGHT: usize = 6;
const LINE_LEN: usize = 4;

/// A column index, 0 through 6.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ColumnMove(pub u8);

impl fmt::Display for ColumnMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure to read a [`ColumnMove`] from user input.
#[derive(Debug, thiserror::Error)]
pub enum ParseMoveError {
    #[error("move must be a number")]
    NotANumber(#[from] std::num::ParseIntError),
    #[error("column {0} is out of range (0-6)")]
    OutOfRange(u8),
}

impl FromStr for ColumnMove {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let col: u8 = s.trim().parse()?;
        if col as usize >= WIDTH {
            return Err(ParseMoveError::OutOfRange(col));
        }
        Ok(ColumnMove(col))
    }
}

#[derive(Clone, Debug)]
pub struct Connect4 {
    /// Row-major, row 0 at the top. 0 is empty.
    board: [u8; WIDTH * HEIGHT],
    current_player: u8,
    winner: u8,
    filled: u8,
}

impl Connect4 {
    pub fn new() -> Self {
        Connect4 {
            board: [0; WIDTH * HEIGHT],
            current_player: 1,
            winner: 0,
            filled: 0,
        }
    }

    fn cell(&self, row: usize, col: usize) -> u8 {
        self.board[row * WIDTH + col]
    }

    /// Scans the four line directions through the landing cell.
    fn wins_at(&self, row: usize, col: usize, player: u8) -> bool {
        const DIRS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];
        for (dr, dc) in DIRS {
            let mut run = 1;
            for sign in [-1isize, 1] {
                let mut r = row as isize + sign * dr;
                let mut c = col as isize + sign * dc;
                while r >= 0
                    && (r as usize) < HEIGHT
                    && c >= 0
                    && (c as usize) < WIDTH
                    && self.cell(r as usize, c as usize) == player
                {
                    run += 1;
                    r += sign * dr;
                    c += sign * dc;
                }
            }
            if run >= LINE_LEN {
                return true;
            }
        }
        false
    }
}

impl Default for Connect4 {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState for Connect4 {
    type Move = ColumnMove;
    const MAX_MOVES: usize = WIDTH;

    fn generate_moves(&self, out: &mut [Self::Move]) -> usize {
        let mut n = 0;
        for col in 0..WIDTH {
            if self.cell(0, col) == 0 {
                out[n] = ColumnMove(col as u8);
                n += 1;
            }
        }
        n
    }

    fn apply_move(&mut self, mv: Self::Move) -> Outcome {
        let col = mv.0 as usize;
        if col >= WIDTH || self.cell(0, col) != 0 {
            return Outcome::Invalid;
        }
        let row = (0..HEIGHT)
            .rev()
            .find(|&r| self.cell(r, col) == 0)
            .expect("column with a free top cell has a free row");
        self.board[row * WIDTH + col] = self.current_player;
        self.filled += 1;
        if self.wins_at(row, col, self.current_player) {
            self.winner = self.current_player;
            Outcome::Fin
        } else if self.filled as usize == WIDTH * HEIGHT {
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

impl fmt::Display for Connect4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for col in 0..WIDTH {
            write!(f, " {col}")?;
        }
        writeln!(f)?;
        for row in 0..HEIGHT {
            for col in 0..WIDTH {
                let glyph = match self.cell(row, col) {
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

    fn drop_all(game: &mut Connect4, cols: &[u8]) -> Outcome {
        let mut last = Outcome::Running;
        for &col in cols {
            last = game.apply_move(ColumnMove(col));
            if last == Outcome::Running {
                game.switch_player();
            }
        }
        last
    }

    #[test]
    fn pieces_stack_from_the_bottom() {
        let mut g = Connect4::new();
        assert_eq!(g.apply_move(ColumnMove(3)), Outcome::Running);
        assert_eq!(g.cell(HEIGHT - 1, 3), 1);
        g.switch_player();
        assert_eq!(g.apply_move(ColumnMove(3)), Outcome::Running);
        assert_eq!(g.cell(HEIGHT - 2, 3), 2);
    }

    #[test]
    fn vertical_four_wins() {
        let mut g = Connect4::new();
        // Player 1 stacks column 0; player 2 answers in column 1.
        let last = drop_all(&mut g, &[0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(last, Outcome::Fin);
        assert_eq!(g.winner(), 1);
    }

    #[test]
    fn horizontal_four_wins() {
        let mut g = Connect4::new();
        let last = drop_all(&mut g, &[0, 0, 1, 1, 2, 2, 3]);
        assert_eq!(last, Outcome::Fin);
        assert_eq!(g.winner(), 1);
    }

    #[test]
    fn rising_diagonal_wins() {
        let mut g = Connect4::new();
        // Player 1 lands on rows 5,4,3,2 across columns 0..=3.
        let last = drop_all(&mut g, &[0, 1, 1, 2, 2, 3, 2, 3, 3, 6, 3]);
        assert_eq!(last, Outcome::Fin);
        assert_eq!(g.winner(), 1);
    }

    #[test]
    fn full_column_is_rejected_and_excluded() {
        let mut g = Connect4::new();
        for _ in 0..HEIGHT {
            assert_eq!(g.apply_move(ColumnMove(6)), Outcome::Running);
            g.switch_player();
        }
        assert_eq!(g.apply_move(ColumnMove(6)), Outcome::Invalid);
        let mut moves = [ColumnMove::default(); WIDTH];
        assert_eq!(g.generate_moves(&mut moves), WIDTH - 1);
        assert!(moves[..WIDTH - 1].iter().all(|m| m.0 != 6));
    }

    #[test]
    fn move_parsing_validates_the_range() {
        assert_eq!("3".parse::<ColumnMove>().ok(), Some(ColumnMove(3)));
        assert!("7".parse::<ColumnMove>().is_err());
        assert!("abc".parse::<ColumnMove>().is_err());
    }
}
