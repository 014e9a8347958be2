//! Time-boxed negamax search with alpha-beta pruning.
//!
//! The driver is built to be called once per external tick with a budget of
//! tens of milliseconds. Running out of time is not an error: the call
//! returns an aborted evaluation carrying the best partial recommendation,
//! exhaustive subtree results stay in the position cache, and the next call
//! on the same board picks up from there instead of starting over.

use std::time::{Duration, Instant};

use crate::bitboard::{BitBoard, BoardStatus};
use crate::evaluation::{Completeness, Evaluation};
use crate::position_cache::PositionCache;
use crate::tactics::{ColumnOrder, CENTER_OUT};
use crate::WIDTH;

/// Best score reachable from the opening, used as the root window's upper
/// bound in place of the turns-remaining formula
const OPENING_BEST_SCORE: i32 = 18;

/// Relative depth recorded for terminal positions found at the root, deep
/// enough to satisfy any later depth query
const TERMINAL_DEPTH: u32 = 50;

/// Half-open alpha-beta score window `[start, end)`
#[derive(Copy, Clone)]
struct Window {
    start: i32,
    end: i32,
}

impl Window {
    fn full() -> Self {
        Self { start: -100, end: 101 }
    }

    /// Lowers the end so that `value` is the largest value still inside
    fn shrink_end_to_fit(&mut self, value: i32) {
        if value < self.end {
            self.end = value + 1;
        }
    }

    /// Raises the start to `value` if that tightens the window
    fn shrink_start_to_fit(&mut self, value: i32) {
        if value > self.start {
            self.start = value;
        }
    }

    fn max_value(&self) -> i32 {
        self.end - 1
    }

    fn is_empty(&self) -> bool {
        self.end - self.start <= 0
    }

    /// The window seen by the opponent one ply down
    fn flipped(&self) -> Self {
        Self {
            start: -self.end,
            end: -self.start,
        }
    }
}

/// The search engine: recursion plus the position cache that persists
/// between calls. Construct once and keep it alive for the whole game so
/// repeated ticks can resume each other's work.
pub struct SearchEngine {
    cache: PositionCache,

    /// The number of nodes visited by this engine so far (for diagnostics only)
    pub node_count: usize,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self {
            cache: PositionCache::new(),
            node_count: 0,
        }
    }

    /// Searches `board` to `wanted_depth` plies within `timeout_ms`
    /// milliseconds of wall-clock time.
    ///
    /// Safe to call every tick with the same board. Callers must check
    /// `completeness` before treating the score as proven, and
    /// `is_playable` before committing the column to a physical move.
    pub fn search(&mut self, board: BitBoard, wanted_depth: u32, timeout_ms: u64) -> Evaluation {
        self.node_count += 1;

        let status = board.status();
        // an invalid board is never explored, the caller has to resync
        // from the authoritative source
        if status == BoardStatus::Invalid {
            return Evaluation::aborted();
        }
        if status.is_finished() {
            let eval = Evaluation::exhaustive(board.terminal_score(), TERMINAL_DEPTH);
            self.cache.set(board.key(), eval);
            return eval;
        }

        let mut window = Window::full();
        window.shrink_end_to_fit(OPENING_BEST_SCORE);

        let columns = order_columns(&board);
        let mut eval = Evaluation::new();
        if columns.is_empty() {
            // unreachable for a live board, every open column scores >= 0
            return eval;
        }
        // split the budget evenly so one slow branch cannot starve the rest
        let child_budget = Duration::from_millis(timeout_ms / columns.len() as u64);

        for &(column, _score) in columns.as_slice() {
            // beta cutoff: a proven score at the window's edge ends the scan
            if eval.completeness != Completeness::Aborted
                && eval.score.map_or(false, |best| best >= window.max_value())
            {
                continue;
            }

            let mut child_board = board;
            child_board.drop_column(column);

            let cached = self.lookup(child_board.key(), wanted_depth);
            let child_eval = match cached {
                Some(hit) => hit,
                None => {
                    let deadline = Instant::now() + child_budget;
                    self.negamax(child_board, window.flipped(), wanted_depth, 1, deadline)
                }
            };

            if eval.update_with_child(child_eval, column) {
                if let Some(best) = eval.score {
                    window.shrink_start_to_fit(best + 1);
                }
            }
        }

        if eval.completeness == Completeness::Exhaustive {
            self.cache.set(board.key(), eval);
        }
        eval
    }

    fn negamax(
        &mut self,
        board: BitBoard,
        mut window: Window,
        max_depth: u32,
        depth: u32,
        deadline: Instant,
    ) -> Evaluation {
        self.node_count += 1;

        let status = board.status();
        if status == BoardStatus::Invalid {
            return Evaluation::aborted();
        }
        if status.is_finished() {
            let eval = Evaluation::exhaustive(board.terminal_score(), max_depth - depth);
            self.cache.set(board.key(), eval);
            return eval;
        }

        // the budget is only checked at node entry, a node's own move
        // ordering work is never interrupted
        if Instant::now() > deadline {
            return Evaluation::aborted();
        }
        if depth >= max_depth {
            // flat cutoff, no static evaluation beyond "unknown"
            return Evaluation::exhaustive(0, 0);
        }

        // cap the window at the best score still reachable with the turns
        // remaining; an empty window proves a forced-non-loss bound
        let best_possible = (board.turns_left() / 2) as i32;
        window.shrink_end_to_fit(best_possible);
        if window.is_empty() {
            return Evaluation::exhaustive((max_depth - depth) as i32, max_depth - depth);
        }

        let columns = order_columns(&board);
        let mut eval = Evaluation::new();

        for &(column, _score) in columns.as_slice() {
            if eval.completeness != Completeness::Aborted
                && eval.score.map_or(false, |best| best >= window.max_value())
            {
                continue;
            }

            let mut child_board = board;
            child_board.drop_column(column);

            let cached = self.lookup(child_board.key(), max_depth - depth);
            let child_eval = match cached {
                Some(hit) => hit,
                None => self.negamax(child_board, window.flipped(), max_depth, depth + 1, deadline),
            };

            if eval.update_with_child(child_eval, column) {
                if let Some(best) = eval.score {
                    window.shrink_start_to_fit(best + 1);
                }
            }
        }

        if eval.completeness == Completeness::Exhaustive {
            self.cache.set(board.key(), eval);
        }
        eval
    }

    /// Fetches a cached evaluation, trusted only if it is exhaustive and
    /// proves at least the depth still needed here
    fn lookup(&self, key: u64, needed_depth: u32) -> Option<Evaluation> {
        self.cache
            .get(key)
            .filter(|hit| {
                hit.completeness == Completeness::Exhaustive
                    && hit.relative_depth + 1 >= needed_depth
            })
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Scores all seven columns and queues the candidates center-out, best
/// tactic score first. When any column offers a real move (score >= 1) the
/// merely-tolerable ones (score 0) are pruned outright; full columns are
/// never candidates.
fn order_columns(board: &BitBoard) -> ColumnOrder {
    let mut scores = [0; WIDTH];
    for (column, score) in scores.iter_mut().enumerate() {
        *score = board.column_score(column);
    }

    let threshold = if scores.iter().any(|&s| s >= 1) { 0 } else { -1 };

    let mut columns = ColumnOrder::new();
    for &column in CENTER_OUT.iter() {
        if scores[column] <= threshold {
            continue;
        }
        columns.add(column, scores[column]);
    }
    columns
}
