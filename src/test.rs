#[cfg(test)]
pub mod test {
    use anyhow::Result;
    use std::collections::HashMap;

    use crate::bitboard::{BitBoard, BoardStatus, Cell};
    use crate::evaluation::{Completeness, Evaluation};
    use crate::position_cache::{PositionCache, TABLE_SIZE};
    use crate::search::SearchEngine;
    use crate::tactics::{ColumnOrder, CENTER_OUT};
    use crate::{HEIGHT, WIDTH};

    /// Builds a board from rows listed top-down ('1', '2' or '_'), placing
    /// tokens for the two players alternately so the move counter and turn
    /// parity stay consistent
    fn board_from_rows(rows: [&str; HEIGHT]) -> BitBoard {
        let mut first = Vec::new();
        let mut second = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let y = HEIGHT - 1 - i;
            for (x, tile) in row.chars().enumerate() {
                match tile {
                    '1' => first.push((x, y)),
                    '2' => second.push((x, y)),
                    _ => {}
                }
            }
        }

        let mut board = BitBoard::new();
        let mut first = first.into_iter();
        let mut second = second.into_iter();
        loop {
            match (first.next(), second.next()) {
                (Some((x1, y1)), Some((x2, y2))) => {
                    board.toggle_cell(x1, y1);
                    board.toggle_cell(x2, y2);
                }
                (Some((x1, y1)), None) => board.toggle_cell(x1, y1),
                (None, Some((x2, y2))) => board.toggle_cell(x2, y2),
                (None, None) => break,
            }
        }
        board
    }

    #[test]
    pub fn key_bijectivity() {
        // every drop sequence of 6 plies; too early for any win, so all of
        // them are legal positions
        let mut seen: HashMap<u64, (u64, u64)> = HashMap::new();
        for sequence in 0..7usize.pow(6) {
            let mut board = BitBoard::new();
            let mut rest = sequence;
            for _ in 0..6 {
                board.drop_column(rest % WIDTH);
                rest /= WIDTH;

                let masks = board.masks();
                match seen.get(&board.key()) {
                    // equal keys must mean the identical position
                    Some(&stored) => assert_eq!(stored, masks),
                    None => {
                        seen.insert(board.key(), masks);
                    }
                }
            }
        }
    }

    #[test]
    pub fn parity_violation_is_invalid() {
        let mut board = BitBoard::new();
        board.toggle_cell(0, 0); // player 1
        board.toggle_cell(1, 0); // player 2
        board.toggle_cell(2, 0); // player 1
        board.toggle_cell(1, 0); // remove the only player 2 token
        assert_eq!(board.status(), BoardStatus::Invalid);
    }

    #[test]
    pub fn floating_token_is_invalid() {
        let mut board = BitBoard::new();
        board.toggle_cell(3, 2); // nothing beneath it
        assert_eq!(board.status(), BoardStatus::Invalid);

        // and the edit gate refuses to create it
        assert!(!BitBoard::new().can_toggle_cell(3, 2));
    }

    #[test]
    pub fn win_detection_all_directions() -> Result<()> {
        // horizontal along the bottom edge
        let board = BitBoard::from_moves("1122334")?;
        assert_eq!(board.status(), BoardStatus::PlayerOneWin);

        // one cell short must not trigger
        let board = BitBoard::from_moves("112233")?;
        assert_eq!(board.status(), BoardStatus::Playing);

        // vertical, first player
        let board = BitBoard::from_moves("1212121")?;
        assert_eq!(board.status(), BoardStatus::PlayerOneWin);

        // vertical, second player
        let board = BitBoard::from_moves("12121272")?;
        assert_eq!(board.status(), BoardStatus::PlayerTwoWin);

        // diagonal up-right from the corner
        let board = BitBoard::from_moves("12234334744")?;
        assert_eq!(board.status(), BoardStatus::PlayerOneWin);

        // diagonal down-right, mirrored construction
        let board = BitBoard::from_moves("76654554144")?;
        assert_eq!(board.status(), BoardStatus::PlayerOneWin);

        Ok(())
    }

    #[test]
    pub fn terminal_score_prefers_earlier_wins() -> Result<()> {
        let early_win = BitBoard::from_moves("1122334")?; // won on move 7
        let later_win = BitBoard::from_moves("12234334744")?; // won on move 11

        // both scored from the loser's perspective, the earlier win is
        // strictly worse for them
        assert!(early_win.terminal_score() < later_win.terminal_score());
        assert_eq!(early_win.terminal_score(), -18);
        assert_eq!(later_win.terminal_score(), -16);
        Ok(())
    }

    #[test]
    pub fn winning_column_scores_100_and_is_unique() -> Result<()> {
        // player 1 has three tokens stacked in column 3, player 2 in column 6
        let board = BitBoard::from_moves("474747")?;

        assert_eq!(board.column_score(3), 100);
        for column in (0..WIDTH).filter(|&c| c != 3) {
            assert_eq!(board.column_score(column), 0);
        }
        Ok(())
    }

    #[test]
    pub fn threatened_column_scores_50() -> Result<()> {
        // player 2 has a vertical threat in column 5, player 1's tokens are
        // spread too thin to threaten anything
        let board = BitBoard::from_moves("163656")?;

        assert_eq!(board.column_score(5), 50);
        for column in (0..WIDTH).filter(|&c| c != 5) {
            assert_eq!(board.column_score(column), 0);
        }
        Ok(())
    }

    #[test]
    pub fn gapped_threat_scores_50() -> Result<()> {
        // player 2 holds O O _ O along the bottom, win cell at (2, 0)
        let board = BitBoard::from_moves("716254")?;

        assert_eq!(board.column_score(2), 50);
        for column in (0..WIDTH).filter(|&c| c != 2) {
            assert_eq!(board.column_score(column), 0);
        }
        Ok(())
    }

    #[test]
    pub fn dropping_beneath_a_threat_scores_0() {
        // player 2 has three in a row at height 1 with open, unplaceable
        // win cells at (0, 1) and (4, 1)
        let board = board_from_rows([
            "_______",
            "_______",
            "_______",
            "_______",
            "_222__1",
            "_121__1",
        ]);
        assert_eq!(board.status(), BoardStatus::Playing);
        assert!(board.first_player_to_move());

        // columns 0 and 4 would hand over the winning cell
        assert_eq!(board.column_score(0), 0);
        assert_eq!(board.column_score(4), 0);
        // the rest are neutral
        for &column in &[1, 2, 3, 5, 6] {
            assert_eq!(board.column_score(column), 1);
        }
    }

    #[test]
    pub fn full_column_drop_is_noop() -> Result<()> {
        let mut board = BitBoard::from_moves("111111")?;
        assert!(!board.can_drop_column(0));
        assert_eq!(board.column_score(0), -1);

        let before = board;
        board.drop_column(0);
        assert_eq!(board, before);
        assert_eq!(board.turns_played(), 6);

        assert!(BitBoard::from_moves("1111111").is_err());
        Ok(())
    }

    #[test]
    pub fn toggle_cell_edits_and_rewinds() {
        let mut board = BitBoard::new();
        assert!(board.can_toggle_cell(3, 0));
        board.toggle_cell(3, 0);
        assert_eq!(board.cell_at(3, 0), Cell::PlayerOne);
        assert_eq!(board.turns_played(), 1);
        assert!(!board.first_player_to_move());

        board.toggle_cell(3, 0);
        assert_eq!(board.cell_at(3, 0), Cell::Empty);
        assert_eq!(board.turns_played(), 0);
        assert!(board.first_player_to_move());
    }

    #[test]
    pub fn drop_neighbor_queries() -> Result<()> {
        let board = BitBoard::from_moves("4")?;

        assert!(board.drop_is_neighboring(2));
        assert!(board.drop_is_neighboring(3)); // lands on top of the token
        assert!(!board.drop_is_neighboring(0));

        // the only token on the board belongs to the opponent
        assert!(!board.drop_is_neighboring_friendly(2));
        Ok(())
    }

    #[test]
    pub fn column_order_sorts_descending_and_stable() {
        let mut order = ColumnOrder::new();
        order.add(1, 0);
        order.add(2, 50);
        order.add(3, 50);
        order.add(4, 100);
        let columns: Vec<usize> = order.as_slice().iter().map(|&(c, _)| c).collect();
        assert_eq!(columns, vec![4, 2, 3, 1]);

        // equal scores keep center-out insertion order
        let mut order = ColumnOrder::new();
        for &column in CENTER_OUT.iter() {
            order.add(column, 1);
        }
        let columns: Vec<usize> = order.as_slice().iter().map(|&(c, _)| c).collect();
        assert_eq!(columns, CENTER_OUT.to_vec());

        // adding to a full buffer is a no-op
        order.add(0, 100);
        assert_eq!(order.len(), WIDTH);
        assert_eq!(order.as_slice()[0], (3, 1));
    }

    #[test]
    pub fn merge_rule_is_idempotent() {
        let child = Evaluation::exhaustive(5, 2);
        let mut parent = Evaluation::new();

        assert!(parent.update_with_child(child, 3));
        assert_eq!((parent.score, parent.column), (Some(-5), Some(3)));
        assert_eq!(parent.relative_depth, 3);

        // an equal, non-strictly-greater score must not "improve" the parent
        assert!(!parent.update_with_child(child, 4));
        assert_eq!((parent.score, parent.column), (Some(-5), Some(3)));
        assert_eq!(parent.relative_depth, 3);
    }

    #[test]
    pub fn abort_is_contagious_but_keeps_partial_best() {
        let mut parent = Evaluation::new();
        assert!(parent.update_with_child(Evaluation::exhaustive(-7, 1), 2));
        assert_eq!(parent.score, Some(7));

        parent.update_with_child(Evaluation::aborted(), 5);
        assert_eq!(parent.completeness, Completeness::Aborted);
        assert_eq!((parent.score, parent.column), (Some(7), Some(2)));
        assert!(parent.is_playable());
    }

    #[test]
    pub fn search_finds_forced_win() -> Result<()> {
        // player 1 wins on the spot by completing the stack in column 4
        let board = BitBoard::from_moves("575757")?;
        let mut engine = SearchEngine::new();

        let eval = engine.search(board, 4, 1_000);
        assert_eq!(eval.completeness, Completeness::Exhaustive);
        assert_eq!(eval.column, Some(4));
        assert!(eval.score.unwrap() > 0);
        assert!(eval.is_playable());
        Ok(())
    }

    #[test]
    pub fn search_one_ply_from_draw() {
        // 41 tokens, no winner, only (0, 5) open
        let board = board_from_rows([
            "_212121",
            "1212121",
            "2121212",
            "2121212",
            "1212121",
            "1212121",
        ]);
        assert_eq!(board.status(), BoardStatus::Playing);
        assert_eq!(board.turns_played(), 41);

        let mut engine = SearchEngine::new();
        let eval = engine.search(board, 4, 1_000);
        assert_eq!(eval.completeness, Completeness::Exhaustive);
        assert_eq!(eval.score, Some(0));
        assert_eq!(eval.column, Some(0));
    }

    #[test]
    pub fn search_reports_terminal_positions() -> Result<()> {
        let board = BitBoard::from_moves("1122334")?;
        let mut engine = SearchEngine::new();

        let eval = engine.search(board, 4, 1_000);
        assert_eq!(eval.completeness, Completeness::Exhaustive);
        // the player to move has already lost, no column to suggest
        assert_eq!(eval.score, Some(-18));
        assert_eq!(eval.column, None);
        assert!(!eval.is_playable());
        Ok(())
    }

    #[test]
    pub fn search_refuses_invalid_board() {
        let mut board = BitBoard::new();
        board.toggle_cell(3, 2); // floating token
        let mut engine = SearchEngine::new();

        let eval = engine.search(board, 4, 1_000);
        assert_eq!(eval.completeness, Completeness::Aborted);
        assert!(!eval.is_playable());
    }

    #[test]
    pub fn aborted_search_resumes_across_ticks() -> Result<()> {
        // player 1 must block the vertical threat in column 5
        let board = BitBoard::from_moves("163656")?;
        let mut engine = SearchEngine::new();

        let mut eval = engine.search(board, 6, 0);
        assert_eq!(eval.completeness, Completeness::Aborted);
        assert!(!eval.is_playable());

        // grant short budgets until the cached progress adds up
        for _ in 0..10_000 {
            if eval.is_playable() {
                break;
            }
            eval = engine.search(board, 6, 10);
        }
        assert!(eval.is_playable());
        assert_eq!(eval.column, Some(5));
        Ok(())
    }

    #[test]
    pub fn cache_collisions_never_leak_evaluations() {
        let mut cache = PositionCache::new();
        let key_a = 12_345u64;
        let key_b = key_a + TABLE_SIZE as u64; // same slot by construction

        cache.set(key_a, Evaluation::exhaustive(3, 5));
        // a colliding key never returns the alias' evaluation
        assert!(cache.get(key_b).is_none());

        // a shallower alias cannot evict the deeper entry
        cache.set(key_b, Evaluation::exhaustive(-2, 2));
        assert!(cache.get(key_b).is_none());
        assert_eq!(cache.get(key_a).and_then(|e| e.score), Some(3));

        // a deeper result takes the slot over
        cache.set(key_b, Evaluation::exhaustive(-2, 9));
        assert!(cache.get(key_a).is_none());
        assert_eq!(cache.get(key_b).and_then(|e| e.score), Some(-2));

        // aborted evaluations are never stored
        cache.set(key_a, Evaluation::aborted());
        assert!(cache.get(key_b).is_some());
    }
}
