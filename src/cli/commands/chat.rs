//! Interactive research session on a single thread.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::driver::Outcome;
use crate::session::Researcher;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Research, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.assistant.model = model;
    }

    let researcher = Researcher::from_settings(&settings)?;
    let mut conversation = researcher.conversation();

    Output::info(&format!("Tools: {}", researcher.tools().names().join(", ")));

    println!("\n{}", style("Scout").bold().cyan());
    println!(
        "{}\n",
        style("What do you want research about? Type 'exit' to quit, 'clear' to start a new thread.")
            .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            conversation.reset();
            Output::info("Started a new thread.");
            continue;
        }

        let spinner = Output::spinner("Researching...");
        let result = conversation.ask(input).await;
        spinner.finish_and_clear();

        match result {
            Ok(Outcome::Completed(transcript)) => {
                let reply = conversation.last_reply().unwrap_or(&transcript);
                println!("\n{} {}\n", style("Scout:").cyan().bold(), reply);
            }
            Ok(Outcome::Failed(status)) => Output::run_failed(status),
            Err(e) => Output::failure(&e),
        }
    }

    Ok(())
}
