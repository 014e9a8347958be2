use anyhow::{anyhow, Result};

use std::fmt;

use crate::{HEIGHT, WIDTH};

/// Bitmask operations shared by the board model and the tactic scorer.
///
/// Cell `(x, y)` lives at bit `x * (HEIGHT + 1) + y`, so every column owns a
/// contiguous 7-bit range with one padding bit on top. The padding row keeps
/// shifted alignment checks from bleeding between columns and is cleared
/// after every shift.
pub(crate) mod ops {
    use crate::{HEIGHT, WIDTH};

    pub const fn cell_at(x: usize, y: usize) -> u64 {
        1 << (x * (HEIGHT + 1) + y)
    }

    pub const fn bottom_row_mask() -> u64 {
        let mut mask = 0;
        let mut column = 0;
        while column < WIDTH {
            mask |= cell_at(column, 0);
            column += 1;
        }
        mask
    }

    pub const fn padding_row_mask() -> u64 {
        bottom_row_mask() << HEIGHT
    }

    /// Translates every cell by `(dx, dy)`, `dx` in [-6, 6], `dy` in [-5, 5].
    /// Cells shifted off the playable area are dropped.
    pub fn offset(cells: u64, dx: i32, dy: i32) -> u64 {
        let mut result = cells;
        if dx >= 0 {
            result <<= dx as u32 * (HEIGHT as u32 + 1);
        } else {
            result >>= (-dx) as u32 * (HEIGHT as u32 + 1);
        }
        if dy >= 0 {
            result <<= dy as u32;
        } else {
            result >>= (-dy) as u32;
        }
        result & !padding_row_mask()
    }

    /// Empty cells orthogonally adjacent to at least one filled cell
    pub fn surround(filled: u64) -> u64 {
        (offset(filled, 1, 0) | offset(filled, 0, 1) | offset(filled, -1, 0) | offset(filled, 0, -1))
            & !filled
    }

    /// A run of 4 exists iff a cell coincides with itself shifted 1, 2 and 3
    /// steps along one of the four directions
    pub fn check_win(cells: u64) -> bool {
        // vertical
        if cells & offset(cells, 0, 1) & offset(cells, 0, 2) & offset(cells, 0, 3) != 0 {
            return true;
        }
        // horizontal
        if cells & offset(cells, 1, 0) & offset(cells, 2, 0) & offset(cells, 3, 0) != 0 {
            return true;
        }
        // diagonal up-right
        if cells & offset(cells, 1, 1) & offset(cells, 2, 2) & offset(cells, 3, 3) != 0 {
            return true;
        }
        // diagonal down-right
        if cells & offset(cells, 1, -1) & offset(cells, 2, -2) & offset(cells, 3, -3) != 0 {
            return true;
        }
        false
    }

    /// Empty cells that would complete a run of 4 for `player`, including
    /// spaced patterns like `O O _ O` that cover delayed threats
    pub fn win_positions(filled: u64, player: u64) -> u64 {
        let mut result = 0;

        // vertical
        result |= offset(player, 0, 1) & offset(player, 0, 2) & offset(player, 0, 3);

        // horizontal
        // 3 in a row, right and left ends
        result |= offset(player, 1, 0) & offset(player, 2, 0) & offset(player, 3, 0);
        result |= offset(player, -1, 0) & offset(player, -2, 0) & offset(player, -3, 0);
        // 2 in a row plus 1 spaced out, both orientations
        result |= offset(player, 1, 0) & offset(player, 2, 0) & offset(player, -1, 0);
        result |= offset(player, -1, 0) & offset(player, -2, 0) & offset(player, 1, 0);

        // diagonal up-right
        result |= offset(player, 1, 1) & offset(player, 2, 2) & offset(player, 3, 3);
        result |= offset(player, -1, -1) & offset(player, -2, -2) & offset(player, -3, -3);
        result |= offset(player, 1, 1) & offset(player, 2, 2) & offset(player, -1, -1);
        result |= offset(player, -1, -1) & offset(player, -2, -2) & offset(player, 1, 1);

        // diagonal down-right
        result |= offset(player, 1, -1) & offset(player, 2, -2) & offset(player, 3, -3);
        result |= offset(player, -1, 1) & offset(player, -2, 2) & offset(player, -3, 3);
        result |= offset(player, 1, -1) & offset(player, 2, -2) & offset(player, -1, 1);
        result |= offset(player, -1, 1) & offset(player, -2, 2) & offset(player, 1, -1);

        result & !filled
    }

    /// The lowest empty cell of every non-full column
    pub fn placeable_positions(filled: u64) -> u64 {
        (filled + bottom_row_mask()) & !padding_row_mask()
    }

    /// Cells where dropping a token immediately completes a run of 4
    pub fn placeable_win_positions(filled: u64, player: u64) -> u64 {
        win_positions(filled, player) & placeable_positions(filled)
    }

    /// The cell a token dropped in `column` would land in. For a full column
    /// this is the (never matched) padding bit.
    pub fn column_drop_position(filled: u64, column: usize) -> u64 {
        (filled + cell_at(column, 0)) & !filled
    }

    /// Checks if dropping in `column` lands on one of `cells`
    pub fn column_reaches(filled: u64, cells: u64, column: usize) -> bool {
        column_drop_position(filled, column) & cells != 0
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Cell {
    Empty,
    PlayerOne,
    PlayerTwo,
}

/// Game state as seen by the board model. `Invalid` is a sentinel for boards
/// that violate the token-parity or no-floating-token invariants, which can
/// only come from manual edits or a bad vision readout.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BoardStatus {
    Playing,
    PlayerOneWin,
    PlayerTwoWin,
    Draw,
    Invalid,
}

impl BoardStatus {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            BoardStatus::PlayerOneWin | BoardStatus::PlayerTwoWin | BoardStatus::Draw
        )
    }
}

/// Packed board model: one mask for all filled cells, one for the cells held
/// by player one, plus the number of tokens placed. Turn parity follows the
/// move counter (even means player one to move).
#[derive(Copy, Clone, Debug)]
pub struct BitBoard {
    first_player_mask: u64,
    board_mask: u64,
    num_moves: usize,
}

impl BitBoard {
    pub fn new() -> Self {
        Self {
            first_player_mask: 0,
            board_mask: 0,
            num_moves: 0,
        }
    }

    /// Builds a board from a string of 1-indexed column digits, e.g. "4433".
    /// Finished games are allowed, full columns and bad characters are not.
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let mut board = Self::new();

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=WIDTH) => {
                    let column = column - 1;
                    if !board.can_drop_column(column) {
                        return Err(anyhow!("Invalid move, column {} full", column + 1));
                    }
                    board.drop_column(column);
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", column_char)),
            }
        }
        Ok(board)
    }

    pub fn cell_at(&self, x: usize, y: usize) -> Cell {
        let mask = ops::cell_at(x, y);
        if self.board_mask & mask == 0 {
            Cell::Empty
        } else if self.first_player_mask & mask != 0 {
            Cell::PlayerOne
        } else {
            Cell::PlayerTwo
        }
    }

    pub fn can_drop_column(&self, column: usize) -> bool {
        self.cell_at(column, HEIGHT - 1) == Cell::Empty
    }

    /// Drops the current mover's token in `column`. A drop into a full
    /// column is a silent no-op; callers commit human moves through
    /// `can_drop_column` first.
    pub fn drop_column(&mut self, column: usize) {
        if !self.can_drop_column(column) {
            return;
        }

        let drop = ops::column_drop_position(self.board_mask, column);
        if self.first_player_to_move() {
            self.first_player_mask |= drop;
        }
        self.board_mask |= drop;
        self.num_moves += 1;
    }

    /// Checks invariants first, then win conditions, then the draw case.
    pub fn status(&self) -> BoardStatus {
        let second_player_mask = self.board_mask & !self.first_player_mask;
        let p1_count = self.first_player_mask.count_ones();
        let p2_count = second_player_mask.count_ones();

        // token parity: counts may only differ by player one leading with one
        if p2_count > p1_count || p1_count > p2_count + 1 {
            return BoardStatus::Invalid;
        }

        // no floating tokens: every filled cell is fully supported below
        for x in 0..WIDTH {
            for y in 1..HEIGHT {
                if self.board_mask & ops::cell_at(x, y) != 0
                    && self.board_mask & ops::cell_at(x, y - 1) == 0
                {
                    return BoardStatus::Invalid;
                }
            }
        }

        if ops::check_win(self.first_player_mask) {
            BoardStatus::PlayerOneWin
        } else if ops::check_win(second_player_mask) {
            BoardStatus::PlayerTwoWin
        } else if p1_count + p2_count == (WIDTH * HEIGHT) as u32 {
            BoardStatus::Draw
        } else {
            BoardStatus::Playing
        }
    }

    /// Score of a finished game from the perspective of the player about to
    /// move. A win always belongs to the player who just placed, so the
    /// result is negative, and earlier wins (more turns remaining) score
    /// further from zero. A draw scores 0.
    ///
    /// Only meaningful for a finished status; unfinished boards return a
    /// placeholder well outside the terminal range.
    pub fn terminal_score(&self) -> i32 {
        match self.status() {
            BoardStatus::PlayerOneWin | BoardStatus::PlayerTwoWin => {
                -((self.turns_left() / 2) as i32 + 1)
            }
            BoardStatus::Draw => 0,
            _ => -55,
        }
    }

    /// Key for the position cache: `first_player_mask + board_mask`.
    ///
    /// Plain addition, not a hash. Each filled column occupies a disjoint
    /// contiguous bit range and the player mask is a subset of the board
    /// mask, so the sum is a bijection over reachable states.
    pub fn key(&self) -> u64 {
        self.first_player_mask + self.board_mask
    }

    /// Checks if `toggle_cell` would leave the board in a usable state
    pub fn can_toggle_cell(&self, x: usize, y: usize) -> bool {
        let mut copy = *self;
        copy.toggle_cell(x, y);
        if copy.status() == BoardStatus::Invalid {
            return false;
        }
        // a finished game can only be edited back towards a live one
        if self.status() != BoardStatus::Playing && copy.status() != BoardStatus::Playing {
            return false;
        }
        true
    }

    /// Manual board editing: an empty cell is played by the current mover,
    /// a filled cell is emptied and the move counter rewound. Never used by
    /// the search; callers gate on `can_toggle_cell`.
    pub fn toggle_cell(&mut self, x: usize, y: usize) {
        let cell = ops::cell_at(x, y);
        if self.board_mask & cell == 0 {
            if self.num_moves % 2 == 0 {
                self.first_player_mask |= cell;
            }
            self.board_mask |= cell;
            self.num_moves += 1;
        } else {
            self.first_player_mask &= !cell;
            self.board_mask &= !cell;
            self.num_moves = self.num_moves.saturating_sub(1);
        }
    }

    /// Checks if a token dropped in `column` would land next to any token
    pub fn drop_is_neighboring(&self, column: usize) -> bool {
        let neighbors = ops::surround(self.board_mask);
        ops::column_reaches(self.board_mask, neighbors, column)
    }

    /// Checks if a token dropped in `column` would land next to a token of
    /// the current mover
    pub fn drop_is_neighboring_friendly(&self, column: usize) -> bool {
        let self_mask = if self.first_player_to_move() {
            self.first_player_mask
        } else {
            self.board_mask & !self.first_player_mask
        };
        let neighbors = ops::surround(self_mask) & !self.board_mask;
        ops::column_reaches(self.board_mask, neighbors, column)
    }

    pub fn first_player_to_move(&self) -> bool {
        self.num_moves % 2 == 0
    }

    pub fn turns_played(&self) -> usize {
        self.num_moves
    }

    pub fn turns_left(&self) -> usize {
        WIDTH * HEIGHT - self.num_moves
    }

    pub(crate) fn masks(&self) -> (u64, u64) {
        (self.first_player_mask, self.board_mask)
    }
}

impl Default for BitBoard {
    fn default() -> Self {
        Self::new()
    }
}

// boards compare by position, the move counter follows from the masks on
// any legal board
impl PartialEq for BitBoard {
    fn eq(&self, other: &Self) -> bool {
        self.board_mask == other.board_mask && self.first_player_mask == other.first_player_mask
    }
}
impl Eq for BitBoard {}

impl fmt::Display for BitBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..HEIGHT).rev() {
            for x in 0..WIDTH {
                let tile = match self.cell_at(x, y) {
                    Cell::PlayerOne => '1',
                    Cell::PlayerTwo => '2',
                    Cell::Empty => '_',
                };
                write!(f, "{}", tile)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
