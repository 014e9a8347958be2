use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::io::{stdin, stdout, Write};

use connect4_engine::bitboard::{BitBoard, BoardStatus, Cell};
use connect4_engine::search::SearchEngine;
use connect4_engine::{HEIGHT, WIDTH};

/// Plies the AI looks ahead
const SEARCH_DEPTH: u32 = 8;
/// Wall-clock budget of a single search tick in milliseconds
const TICK_BUDGET_MS: u64 = 10;

fn main() -> Result<()> {
    let mut board = BitBoard::new();
    // keep the engine out here so its position cache persists across moves
    let mut engine = SearchEngine::new();

    let stdin = stdin();

    println!("Welcome to Connect 4\n");

    let mut ai_players = (false, false);

    // choose AI control of player 1
    loop {
        let mut buffer = String::new();
        print!("Is player 1 AI controlled? y/n: ");
        stdout().flush().expect("failed to flush to stdout!");
        stdin.read_line(&mut buffer)?;
        match buffer.to_lowercase().chars().next() {
            Some('y') => {
                ai_players.0 = true;
                break;
            }
            Some('n') => break,
            _ => println!("Unknown answer given"),
        }
    }

    // choose AI control of player 2
    loop {
        let mut buffer = String::new();
        print!("Is player 2 AI controlled? y/n: ");
        stdout().flush().expect("failed to flush to stdout!");
        stdin.read_line(&mut buffer)?;
        match buffer.to_lowercase().chars().next() {
            Some('y') => {
                ai_players.1 = true;
                break;
            }
            Some('n') => break,
            _ => println!("Unknown answer given"),
        }
    }

    // game loop
    loop {
        display(&board).expect("Failed to draw board!");

        match board.status() {
            BoardStatus::Playing => {
                let first_to_move = board.first_player_to_move();
                let next_move = if (first_to_move && ai_players.0)
                    || (!first_to_move && ai_players.1)
                {
                    println!("AI is thinking...");
                    stdout().flush().expect("Failed to flush to stdout!");

                    // slow down play if both players are AI
                    if ai_players == (true, true) {
                        std::thread::sleep(std::time::Duration::new(3, 0));
                    }

                    // tick loop: keep granting short budgets until the
                    // anytime search produces a playable column, progress
                    // carries over in the engine's cache
                    let mut eval = engine.search(board, SEARCH_DEPTH, TICK_BUDGET_MS);
                    while !eval.is_playable() {
                        eval = engine.search(board, SEARCH_DEPTH, TICK_BUDGET_MS);
                    }
                    println!("AI evaluation: {}", eval);

                    let best_move = eval.column.expect("playable evaluation without column");
                    println!("Best move: {}", best_move + 1);
                    best_move
                } else {
                    print!("Move input > ");
                    stdout().flush().expect("Failed to flush to stdout!");
                    let mut input_str = String::new();
                    stdin.read_line(&mut input_str)?;

                    let column_one_indexed = match input_str.trim().parse::<usize>() {
                        Err(_) => {
                            println!("Invalid number: {}", input_str);
                            continue;
                        }
                        Ok(column @ 1..=WIDTH) => column,
                        Ok(column) => {
                            println!(
                                "Invalid move, column {} out of range. Columns must be between 1 and {}",
                                column, WIDTH
                            );
                            continue;
                        }
                    };
                    column_one_indexed - 1
                };

                if !board.can_drop_column(next_move) {
                    println!("Invalid move, column {} full", next_move + 1);
                    // try the move again
                    continue;
                }
                board.drop_column(next_move);
            }

            // end states
            BoardStatus::PlayerOneWin => {
                println!("Player 1 wins!");
                break;
            }
            BoardStatus::PlayerTwoWin => {
                println!("Player 2 wins!");
                break;
            }
            BoardStatus::Draw => {
                println!("Draw!");
                break;
            }
            BoardStatus::Invalid => {
                // cannot happen through column drops alone
                println!("Board state is invalid, aborting");
                break;
            }
        }
    }
    Ok(())
}

fn display(board: &BitBoard) -> Result<()> {
    let mut stdout = stdout();

    let cols: String = (1..=WIDTH).map(|x| x.to_string()).collect();
    stdout.queue(PrintStyledContent(style(cols + "\n")))?;
    for _ in 0..HEIGHT {
        stdout.queue(PrintStyledContent(style("\n")))?;
    }
    stdout.flush()?;

    let (origin_x, origin_y) = crossterm::cursor::position()?;

    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let (pos_x, pos_y) = (origin_x + x as u16, origin_y - y as u16);

            stdout
                .queue(MoveTo(pos_x, pos_y))?
                .queue(PrintStyledContent(
                    style("O")
                        .attribute(Attribute::Bold)
                        .on(Color::DarkBlue)
                        .with(match board.cell_at(x, y) {
                            Cell::PlayerOne => Color::Red,
                            Cell::PlayerTwo => Color::Yellow,
                            Cell::Empty => Color::DarkBlue,
                        }),
                ))?;
        }
    }
    stdout
        .queue(MoveTo(origin_x + WIDTH as u16, origin_y))?
        .queue(PrintStyledContent(style("\n")))?;
    stdout.flush()?;
    Ok(())
}
