//! Interactive command-line client: `crosswire-cli <host:port> <name>`.
//!
//! Deliberately sequential, like a turn-based game is: on your turn it
//! prompts for a command, otherwise it waits for the server. Commands:
//!
//! ```text
//! move <row> <col>   place your mark (1-based coordinates)
//! draw               suggest a draw
//! resign             give up
//! ```
//!
//! When the opponent suggests a draw you are prompted to `accept` or
//! `reject`.

use crosswire_protocol::{
    ClientMessage, DrawAction, Frame, FrameError, FrameReader, Role,
    ServerMessage,
};
use crosswire_transport::{Connection, TcpConnection};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

struct Client {
    conn: TcpConnection,
    reader: FrameReader,
    lines: Lines<BufReader<Stdin>>,
}

impl Client {
    async fn recv(&mut self) -> Result<ServerMessage, FrameError> {
        let frame: Frame = self.reader.next_frame(&mut self.conn).await?;
        ServerMessage::parse(&frame).map_err(|e| {
            eprintln!("unintelligible server message {frame}: {e}");
            FrameError::Closed
        })
    }

    async fn send(
        &mut self,
        msg: &ClientMessage,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.conn.send(&msg.to_wire()).await?;
        Ok(())
    }

    async fn prompt(&mut self, text: &str) -> Option<String> {
        println!("{text}");
        match self.lines.next_line().await {
            Ok(Some(line)) => Some(line.trim().to_string()),
            _ => None,
        }
    }
}

fn print_board(board: &str) {
    for row in 0..3 {
        let cells: Vec<String> = (0..3)
            .map(|col| board[row * 3 + col..row * 3 + col + 1].to_string())
            .collect();
        println!("  {}", cells.join(" "));
    }
}

fn parse_move(line: &str, role: Role) -> Option<ClientMessage> {
    let mut words = line.split_whitespace();
    if words.next()? != "move" {
        return None;
    }
    let row: u8 = words.next()?.parse().ok()?;
    let col: u8 = words.next()?.parse().ok()?;
    if !(1..=3).contains(&row) || !(1..=3).contains(&col) {
        return None;
    }
    Some(ClientMessage::Move {
        role,
        row: row - 1,
        col: col - 1,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(addr), Some(name)) = (args.next(), args.next()) else {
        eprintln!("Usage: crosswire-cli <host:port> <name>");
        std::process::exit(1);
    };

    let conn = TcpConnection::connect(&addr).await?;
    let mut client = Client {
        conn,
        reader: FrameReader::default(),
        lines: BufReader::new(tokio::io::stdin()).lines(),
    };

    client
        .send(&ClientMessage::Play { name: name.clone() })
        .await?;

    // Seat negotiation: the server answers WAIT once the name is
    // accepted, or INVL if it is not.
    let my_role = loop {
        match client.recv().await? {
            ServerMessage::Wait => {
                println!("seated as {name}, waiting for an opponent...");
            }
            ServerMessage::Begin { role, opponent } => {
                println!("match started: you are {role}, playing {opponent}");
                break role;
            }
            ServerMessage::Invalid { reason } => {
                eprintln!("rejected: {reason}");
                let Some(line) =
                    client.prompt("enter a different name:").await
                else {
                    return Ok(());
                };
                client.send(&ClientMessage::Play { name: line }).await?;
            }
            other => {
                eprintln!("unexpected message before match: {other:?}");
                return Ok(());
            }
        }
    };

    let mut turn = Role::X;
    loop {
        if turn == my_role {
            if !my_turn(&mut client, my_role, &mut turn).await? {
                break;
            }
        } else if !their_turn(&mut client, &mut turn).await? {
            break;
        }
    }
    Ok(())
}

/// Prompts for and executes one of our commands. Returns `false` once
/// the match is over.
async fn my_turn(
    client: &mut Client,
    my_role: Role,
    turn: &mut Role,
) -> Result<bool, Box<dyn std::error::Error>> {
    let Some(line) = client
        .prompt("your turn (move <row> <col> | draw | resign):")
        .await
    else {
        return Ok(false);
    };

    if line == "resign" {
        client.send(&ClientMessage::Resign).await?;
        // The server answers with the final OVER.
        if let ServerMessage::Over { outcome, reason } = client.recv().await?
        {
            println!("game over ({}): {reason}", outcome.as_str());
        }
        return Ok(false);
    }

    if line == "draw" {
        client
            .send(&ClientMessage::Draw {
                action: DrawAction::Suggest,
            })
            .await?;
        match client.recv().await? {
            ServerMessage::Over { outcome, reason } => {
                println!("game over ({}): {reason}", outcome.as_str());
                return Ok(false);
            }
            ServerMessage::Draw {
                action: DrawAction::Reject,
            } => {
                println!("draw rejected, still your turn");
                return Ok(true);
            }
            other => {
                eprintln!("unexpected draw reply: {other:?}");
                return Ok(true);
            }
        }
    }

    let Some(msg) = parse_move(&line, my_role) else {
        println!("commands: move <row> <col> | draw | resign");
        return Ok(true);
    };
    client.send(&msg).await?;
    match client.recv().await? {
        ServerMessage::Moved { board, .. } => {
            print_board(&board);
            *turn = turn.opponent();
        }
        ServerMessage::Invalid { reason } => {
            println!("rejected: {reason}");
        }
        ServerMessage::Over { outcome, reason } => {
            println!("game over ({}): {reason}", outcome.as_str());
            return Ok(false);
        }
        other => eprintln!("unexpected reply: {other:?}"),
    }
    Ok(true)
}

/// Waits out the opponent's turn. Returns `false` once the match is
/// over.
async fn their_turn(
    client: &mut Client,
    turn: &mut Role,
) -> Result<bool, Box<dyn std::error::Error>> {
    println!("waiting for the opponent...");
    match client.recv().await? {
        ServerMessage::Moved { board, .. } => {
            print_board(&board);
            *turn = turn.opponent();
            Ok(true)
        }
        ServerMessage::Draw {
            action: DrawAction::Suggest,
        } => {
            let answer = loop {
                let Some(line) = client
                    .prompt("opponent suggests a draw (accept | reject):")
                    .await
                else {
                    return Ok(false);
                };
                match line.as_str() {
                    "accept" => break DrawAction::Accept,
                    "reject" => break DrawAction::Reject,
                    _ => continue,
                }
            };
            client
                .send(&ClientMessage::Draw { action: answer })
                .await?;
            if answer == DrawAction::Accept {
                if let ServerMessage::Over { outcome, reason } =
                    client.recv().await?
                {
                    println!("game over ({}): {reason}", outcome.as_str());
                }
                return Ok(false);
            }
            // Rejected: the proposer is still on turn.
            Ok(true)
        }
        ServerMessage::Over { outcome, reason } => {
            println!("game over ({}): {reason}", outcome.as_str());
            Ok(false)
        }
        other => {
            eprintln!("unexpected message: {other:?}");
            Ok(true)
        }
    }
}
