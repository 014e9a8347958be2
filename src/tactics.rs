//! Per-column tactical classification used to order and prune search
//! branches. The scores are categories, only meaningful relative to each
//! other on the same board; exact outcomes stay the search's job.

use crate::bitboard::{ops, BitBoard, Cell};
use crate::{HEIGHT, WIDTH};

/// Columns in center-out preference order. Inserting candidates in this
/// order makes the move sorter's stable ties favour central columns, which
/// cut off more of the tree on average.
pub const CENTER_OUT: [usize; WIDTH] = [3, 2, 4, 1, 5, 0, 6];

impl BitBoard {
    /// Scores dropping in `column` for the current mover:
    /// `100` wins on the spot, `50` addresses an opponent threat, `0` fails
    /// to address one (or hands one over), `1` is a neutral safe move and
    /// `-1` marks a full column.
    pub fn column_score(&self, column: usize) -> i32 {
        if self.cell_at(column, HEIGHT - 1) != Cell::Empty {
            return -1;
        }

        let (first_mask, filled) = self.masks();
        let (self_mask, enemy_mask) = if self.first_player_to_move() {
            (first_mask, filled & !first_mask)
        } else {
            (filled & !first_mask, first_mask)
        };
        let placeable = ops::placeable_positions(filled);

        // immediate win: the winning columns stand alone, everything else
        // is pointless this turn
        let immediate_wins = ops::placeable_win_positions(filled, self_mask);
        if immediate_wins != 0 {
            return if ops::column_reaches(filled, immediate_wins, column) {
                100
            } else {
                0
            };
        }

        // immediate loss: not blocking here is fatal
        let immediate_losses = ops::placeable_win_positions(filled, enemy_mask);
        if immediate_losses != 0 {
            return if ops::column_reaches(filled, immediate_losses, column) {
                50
            } else {
                0
            };
        }

        // two live extensions of an opponent 2-in-a-row
        let doubles_right = ops::offset(enemy_mask, 1, 0) & ops::offset(enemy_mask, 2, 0) & placeable;
        let doubles_left = ops::offset(enemy_mask, -1, 0) & ops::offset(enemy_mask, -2, 0) & placeable;
        if doubles_right != 0 && doubles_left != 0 {
            return if ops::column_reaches(filled, doubles_right | doubles_left, column) {
                50
            } else {
                0
            };
        }

        // gapped pair `O _ O` with both outer extensions live
        let gap_mid = ops::offset(enemy_mask, 1, 0) & ops::offset(enemy_mask, -1, 0) & placeable;
        let gap_left = ops::offset(gap_mid, -2, 0) & placeable;
        let gap_right = ops::offset(gap_mid, 2, 0) & placeable;
        if gap_mid != 0 && gap_left != 0 && gap_right != 0 {
            return if ops::column_reaches(filled, gap_mid | gap_left | gap_right, column) {
                50
            } else {
                0
            };
        }

        // dropping directly beneath a delayed opponent win hands it over
        let delayed_losses = ops::win_positions(filled, enemy_mask);
        if delayed_losses != 0
            && ops::column_reaches(filled, ops::offset(delayed_losses, 0, -1), column)
        {
            return 0;
        }

        1
    }
}

/// Fixed-capacity move-order buffer: columns sorted descending by tactic
/// score, ties kept in insertion order
pub struct ColumnOrder {
    size: usize,
    // column and tactic score
    columns: [(usize, i32); WIDTH],
}

impl ColumnOrder {
    pub fn new() -> Self {
        Self {
            size: 0,
            columns: [(0, 0); WIDTH],
        }
    }

    /// Insertion sort, stable on equal scores. Adding to a full buffer is a
    /// no-op.
    pub fn add(&mut self, column: usize, score: i32) {
        if self.size >= WIDTH {
            return;
        }

        let mut pos = self.size;
        while pos > 0 && self.columns[pos - 1].1 < score {
            self.columns[pos] = self.columns[pos - 1];
            pos -= 1;
        }
        self.columns[pos] = (column, score);
        self.size += 1;
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn as_slice(&self) -> &[(usize, i32)] {
        &self.columns[..self.size]
    }
}

impl Default for ColumnOrder {
    fn default() -> Self {
        Self::new()
    }
}
