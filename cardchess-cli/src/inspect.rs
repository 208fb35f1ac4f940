//! Inspect command - validate a position record and summarize it
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_position(), analyze(), report()
//! - Level 3: print_text_report(), print_json_report()

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use cardchess_core::movegen::{self, GameStatus};
use cardchess_core::{Color, Position, STARTING_RECORD};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct InspectArgs {
    /// Position record; the starting position when omitted
    pub record: Option<String>,

    /// Read the record from a file instead
    #[arg(long, value_name = "FILE", conflicts_with = "record")]
    pub file: Option<PathBuf>,

    /// List every legal move
    #[arg(long)]
    pub moves: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Summary of one position
#[derive(Debug, Serialize)]
struct Report {
    record: String,
    side_to_move: Color,
    in_check: bool,
    status: GameStatus,
    legal_moves: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    moves: Option<Vec<String>>,
    /// Own pieces currently attacked, per color
    threatened: [usize; 2],
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run inspect command
///
/// 1. Load and validate the record
/// 2. Analyze the position
/// 3. Report
pub fn run(args: InspectArgs) -> Result<()> {
    let position = load_position(&args)?;
    let report = analyze(&position, args.moves);
    print_report(&report, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_position(args: &InspectArgs) -> Result<Position> {
    let text = match (&args.file, &args.record) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, Some(record)) => record.clone(),
        (None, None) => STARTING_RECORD.to_string(),
    };
    Position::parse(text.trim()).with_context(|| format!("Invalid position record: {}", text.trim()))
}

fn analyze(position: &Position, list_moves: bool) -> Report {
    let legal = movegen::legal_moves(position);
    let side = position.side_to_move();

    Report {
        record: position.to_record(),
        side_to_move: side,
        in_check: movegen::is_in_check(position, side),
        status: movegen::status(position),
        legal_moves: legal.len(),
        moves: list_moves.then(|| {
            let mut moves: Vec<String> = legal.iter().map(|mv| mv.to_uci()).collect();
            moves.sort();
            moves
        }),
        threatened: [
            movegen::threatened_count(position, Color::White),
            movegen::threatened_count(position, Color::Black),
        ],
    }
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        print_json_report(report)
    } else {
        print_text_report(report);
        Ok(())
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn print_text_report(report: &Report) {
    println!("Record:       {}", report.record);
    println!("Side to move: {}", report.side_to_move);
    println!("In check:     {}", if report.in_check { "yes" } else { "no" });
    let status = match report.status {
        GameStatus::Ongoing => "ongoing".to_string(),
        GameStatus::Checkmate { winner } => format!("checkmate, {winner} wins"),
        GameStatus::Stalemate => "stalemate".to_string(),
    };
    println!("Status:       {}", status);
    println!("Legal moves:  {}", report.legal_moves);
    println!(
        "Threatened:   white {}, black {}",
        report.threatened[0], report.threatened[1]
    );

    if let Some(moves) = &report.moves {
        for chunk in moves.chunks(10) {
            println!("  {}", chunk.join(" "));
        }
    }
}

fn print_json_report(report: &Report) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
