//! Operator console over stdin/stdout.
//!
//! One command per line. Replies are queued on a channel and printed by a
//! single writer task, so a move waiting on the arm never blocks `status`,
//! `abort` or any other command typed meanwhile.

use std::io;
use std::sync::Arc;

use chrono::TimeDelta;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;

use crate::controllers::controller_registry::ControllerRegistry;
use crate::coordinator::game_session::GameSession;
use crate::coordinator::turn_coordinator::MoveReport;
use crate::game_state::chess_types::Color;
use crate::move_generation::perft::perft;
use crate::utils::long_algebraic::parse_move_text;
use crate::utils::render_game_state::render_position;

const MAX_PERFT_DEPTH: u8 = 5;

const HELP: &str = "\
commands:
  move <lan|O-O|O-O-O>        submit a move for the side to move
  sensed <side> <lan>         submit a move reported by the vision system
  status | board | fen | pgn | legal | clock
  newgame [fen]               start a new game
  resign <side>
  draw offer <side> | draw accept <side> | draw decline <side>
  abort | reset | undo
  save | load
  register <board> <version> | heartbeat <board> | assign <board> [game] | boards
  perft <depth>
  quit";

pub async fn run_stdio_loop(session: Arc<GameSession>, registry: ControllerRegistry) -> io::Result<()> {
    let (out, mut replies) = mpsc::unbounded_channel::<String>();
    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(reply) = replies.recv().await {
            stdout.write_all(reply.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<(), io::Error>(())
    });

    let mut console = ConsoleState::new(session, registry, out);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if console.handle_command(&line).await {
            break;
        }
    }

    drop(console);
    printer.await.map_err(io::Error::other)?
}

pub struct ConsoleState {
    session: Arc<GameSession>,
    registry: ControllerRegistry,
    out: UnboundedSender<String>,
}

impl ConsoleState {
    pub fn new(session: Arc<GameSession>, registry: ControllerRegistry, out: UnboundedSender<String>) -> Self {
        Self {
            session,
            registry,
            out,
        }
    }

    /// Handle one input line. Returns `true` when the console should exit.
    pub async fn handle_command(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return false;
        }
        debug!(command = trimmed, "console command");

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        let args = &parts[1..];

        match parts[0] {
            "help" => self.reply(HELP),
            "quit" | "exit" => return true,
            "move" => match args {
                [text] => self.submit(None, text),
                _ => self.reply("usage: move <lan>"),
            },
            "sensed" => match args {
                [side, text] => match parse_side(side) {
                    Some(side) => self.submit(Some(side), text),
                    None => self.reply(format!("error: unknown side '{side}'")),
                },
                _ => self.reply("usage: sensed <side> <lan>"),
            },
            "status" => {
                let status = self.session.status();
                match serde_json::to_string_pretty(&status) {
                    Ok(json) => self.reply(json),
                    Err(err) => self.reply(format!("error: {err}")),
                }
            }
            "board" => {
                let board = self.session.board().await;
                self.reply(format!("{}\n{}", render_position(&board.position), board.to_fen()));
            }
            "fen" => self.reply(self.session.status().fen),
            "pgn" => {
                let pgn = self.session.pgn().await;
                self.reply(pgn.trim_end());
            }
            "legal" => {
                let moves = self.session.legal_moves().await;
                let text: Vec<String> = moves.iter().map(ToString::to_string).collect();
                self.reply(format!("{} legal moves: {}", moves.len(), text.join(" ")));
            }
            "clock" => self.handle_clock().await,
            "newgame" => {
                let fen = (!args.is_empty()).then(|| args.join(" "));
                let reply = match self.session.new_game(fen.as_deref()).await {
                    Ok(()) => format!("ok new game {}", self.session.status().fen),
                    Err(err) => format!("error: {err}"),
                };
                self.reply(reply);
            }
            "resign" => match args.first().and_then(|side| parse_side(side)) {
                Some(side) => {
                    let reply = match self.session.resign(side).await {
                        Ok(result) => format!("ok {result}"),
                        Err(err) => format!("error: {err}"),
                    };
                    self.reply(reply);
                }
                None => self.reply("usage: resign <side>"),
            },
            "draw" => self.handle_draw(args).await,
            "abort" => {
                let reply = match self.session.abort().await {
                    Ok(()) => "ok abort requested".to_owned(),
                    Err(err) => format!("error: {err}"),
                };
                self.reply(reply);
            }
            "reset" => {
                let reply = match self.session.operator_reset().await {
                    Ok(()) => format!("ok {}", self.session.status().phase),
                    Err(err) => format!("error: {err}"),
                };
                self.reply(reply);
            }
            "undo" => {
                let reply = match self.session.take_back().await {
                    Ok(mv) => format!("ok took back {mv}"),
                    Err(err) => format!("error: {err}"),
                };
                self.reply(reply);
            }
            "save" => {
                let reply = match self.session.save_snapshot().await {
                    Ok(()) => "ok saved".to_owned(),
                    Err(err) => format!("error: {err}"),
                };
                self.reply(reply);
            }
            "load" => {
                let reply = match self.session.load_snapshot().await {
                    Ok(true) => format!("ok loaded {}", self.session.status().fen),
                    Ok(false) => "error: no snapshot saved yet".to_owned(),
                    Err(err) => format!("error: {err}"),
                };
                self.reply(reply);
            }
            "register" | "heartbeat" | "assign" | "boards" => self.handle_controller(parts[0], args),
            "perft" => self.handle_perft(args).await,
            other => self.reply(format!("error: unknown command '{other}', try 'help'")),
        }
        false
    }

    /// Moves run on their own task; the reply arrives once the turn is done.
    fn submit(&self, side: Option<Color>, text: &str) {
        let side_to_move = self.session.status().side_to_move;
        let mv = match parse_move_text(text, side.unwrap_or(side_to_move)) {
            Ok(mv) => mv,
            Err(err) => return self.reply(format!("error: {err}")),
        };

        let session = Arc::clone(&self.session);
        let out = self.out.clone();
        tokio::spawn(async move {
            let result = match side {
                Some(side) => session.submit_move_for(side, mv).await,
                None => session.submit_move(mv).await,
            };
            let reply = match result {
                Ok(report) => format_report(&report),
                Err(err) => format!("error: {err}"),
            };
            let _ = out.send(reply);
        });
    }

    async fn handle_clock(&self) {
        if let Some(result) = self.session.check_clock().await {
            self.reply(format!("ok {result}"));
        }
        let reply = match self.session.clock().await {
            Some(clock) => format!(
                "white {} black {}{}",
                format_remaining(clock.remaining(Color::Light)),
                format_remaining(clock.remaining(Color::Dark)),
                if clock.is_running() { "" } else { " (stopped)" },
            ),
            None => "untimed game".to_owned(),
        };
        self.reply(reply);
    }

    async fn handle_draw(&self, args: &[&str]) {
        let (action, side) = match args {
            [action, side] => match parse_side(side) {
                Some(side) => (*action, side),
                None => return self.reply(format!("error: unknown side '{side}'")),
            },
            _ => return self.reply("usage: draw offer|accept|decline <side>"),
        };

        let result = match action {
            "offer" => self.session.offer_draw(side).await,
            "accept" => self.session.respond_draw(side, true).await,
            "decline" => self.session.respond_draw(side, false).await,
            _ => return self.reply("usage: draw offer|accept|decline <side>"),
        };
        let reply = match result {
            Ok(Some(result)) => format!("ok {result}"),
            Ok(None) => format!("ok draw {action} by {side}"),
            Err(err) => format!("error: {err}"),
        };
        self.reply(reply);
    }

    fn handle_controller(&mut self, command: &str, args: &[&str]) {
        let reply = match (command, args) {
            ("register", [board, version]) => match self.registry.register(board, version) {
                Ok(record) => format!("ok registered {} v{}", record.board_id, record.board_version),
                Err(err) => format!("error: {err}"),
            },
            ("heartbeat", [board]) => match self.registry.heartbeat(board) {
                Ok(()) => format!("ok {board} alive"),
                Err(err) => format!("error: {err}"),
            },
            ("assign", [board, rest @ ..]) if rest.len() <= 1 => {
                let game = rest.first().map(|game| (*game).to_owned());
                match self.registry.assign_game(board, game) {
                    Ok(()) => format!("ok {board} assigned"),
                    Err(err) => format!("error: {err}"),
                }
            }
            ("boards", []) => {
                let lines: Vec<String> = self
                    .registry
                    .list()
                    .map(|record| {
                        format!(
                            "{} v{} {} game={} last_seen={}",
                            record.board_id,
                            record.board_version,
                            if self.registry.is_active(&record.board_id) { "active" } else { "inactive" },
                            record.game_id.as_deref().unwrap_or("-"),
                            record.last_seen.to_rfc3339(),
                        )
                    })
                    .collect();
                if lines.is_empty() {
                    "no boards registered".to_owned()
                } else {
                    lines.join("\n")
                }
            }
            _ => format!("error: bad arguments for '{command}', try 'help'"),
        };
        self.reply(reply);
    }

    async fn handle_perft(&self, args: &[&str]) {
        let depth = match args.first().map(|depth| depth.parse::<u8>()) {
            Some(Ok(depth)) if (1..=MAX_PERFT_DEPTH).contains(&depth) => depth,
            _ => return self.reply(format!("usage: perft <1..={MAX_PERFT_DEPTH}>")),
        };

        let board = self.session.board().await;
        let reply = match tokio::task::spawn_blocking(move || perft(&board, depth)).await {
            Ok(counts) => format!(
                "perft {depth}: nodes={} captures={} ep={} castles={} promotions={} checks={}",
                counts.nodes, counts.captures, counts.en_passant, counts.castles, counts.promotions, counts.checks
            ),
            Err(err) => format!("error: {err}"),
        };
        self.reply(reply);
    }

    fn reply(&self, text: impl Into<String>) {
        let _ = self.out.send(text.into());
    }
}

fn parse_side(text: &str) -> Option<Color> {
    match text.to_ascii_lowercase().as_str() {
        "white" | "w" | "light" => Some(Color::Light),
        "black" | "b" | "dark" => Some(Color::Dark),
        _ => None,
    }
}

fn format_report(report: &MoveReport) -> String {
    let mut reply = format!("ok {} played {}", report.side, report.lan);
    if let Some(piece) = report.captured {
        reply.push_str(&format!(" capturing {}", piece.kind));
    }
    if report.gives_check {
        reply.push_str(" check");
    }
    if report.status.is_over() {
        reply.push_str(&format!(", {}", report.status));
    }
    reply
}

/// `m:ss` with tenths below ten seconds.
fn format_remaining(left: TimeDelta) -> String {
    let ms = left.num_milliseconds().max(0);
    if ms < 10_000 {
        return format!("0:0{}.{}", ms / 1000, (ms % 1000) / 100);
    }
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}
