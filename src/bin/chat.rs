// src/bin/chat.rs
//
// Terminal front-end for the chat widget: reads a line, streams the reply.

use std::env;
use std::io::{self, BufRead, Write};

use portfolio_chat::client::{ChatWidget, SubmitOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let endpoint = env::var("CHAT_ENDPOINT")
        .unwrap_or_else(|_| "http://127.0.0.1:3000/api/chat".to_string());
    let mut widget = ChatWidget::new(&endpoint);

    let stdin = io::stdin();
    print_prompt()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let outcome = widget
            .submit(&line, |fragment, _state| {
                print!("{fragment}");
                let _ = io::stdout().flush();
            })
            .await;

        match outcome {
            SubmitOutcome::Ignored => {}
            SubmitOutcome::Completed => println!(),
            SubmitOutcome::Failed => println!("{}", widget.state().status),
        }
        print_prompt()?;
    }

    Ok(())
}

fn print_prompt() -> io::Result<()> {
    print!("> ");
    io::stdout().flush()
}
