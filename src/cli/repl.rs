//! Interactive chat loop.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::{ParleyError, Result};
use crate::session::ChatSession;
use crate::types::Role;

const HELP: &str = "Commands: /clear  /history  /trace  /quit";

/// Read lines from stdin until EOF or `/quit`, sending each to `session`.
pub async fn run(mut session: ChatSession) -> Result<()> {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear_history();
                println!("History cleared.");
            }
            "/history" => print_history(&session),
            "/trace" => match session.context().tracer.last_run_tracing() {
                Some(trace) => println!("{}", serde_json::to_string_pretty(&trace)?),
                None => println!("No run traced yet."),
            },
            "/help" => println!("{HELP}"),
            text => match session.send_message(text).await {
                Ok(reply) => println!("{reply}"),
                Err(ParleyError::Turn(turn)) => eprintln!("error: {turn}"),
                Err(err @ ParleyError::ConfigIncomplete { .. }) => {
                    eprintln!("error: {err}; run `parley config set` first");
                }
                Err(err) => return Err(err),
            },
        }
    }
    Ok(())
}

fn print_history(session: &ChatSession) {
    for message in session.transcript() {
        let who = match (message.role, &message.name) {
            (Role::Assistant, Some(name)) => name.as_str(),
            (Role::Assistant, None) => "assistant",
            (Role::User, _) => "you",
            (Role::Tool, _) => "tool",
            (Role::System, _) => "system",
        };
        let text = message.text();
        if text.is_empty() {
            let calls: Vec<&str> = message.tool_calls().iter().map(|c| c.name.as_str()).collect();
            if !calls.is_empty() {
                println!("[{who}] calls {}", calls.join(", "));
            }
        } else {
            println!("[{who}] {text}");
        }
    }
}
