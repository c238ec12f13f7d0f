//! Subcommand: `text2system repl` -- resolve messages interactively.

use std::io::{self, Write as _};

use anyhow::Result;
use tracing::{error, info};

use text2system_nlp::{CommandEngine, ResolvedCommand};

/// Read messages from stdin until EOF, `quit` or `exit`.
pub async fn cmd_repl(mut engine: CommandEngine) -> Result<()> {
    println!();
    println!("  text2system v{}", env!("CARGO_PKG_VERSION"));
    println!("  Type a command, or 'quit' to exit.");
    println!();

    let stdin = io::stdin();
    let mut line_buf = String::new();

    loop {
        print!("> ");
        io::stdout().flush().ok();

        line_buf.clear();
        match stdin.read_line(&mut line_buf) {
            Ok(0) => {
                println!();
                info!("EOF received, exiting");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("  Error reading input: {e}");
                continue;
            }
        }

        let trimmed = line_buf.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" || trimmed == "exit" {
            info!("user requested exit");
            break;
        }

        match engine.resolve_command(trimmed).await {
            Ok(command) => print_command(&command),
            Err(e) => {
                error!(error = %e, "resolution failed");
                println!("  Error: {e}");
            }
        }
    }

    Ok(())
}

fn print_command(command: &ResolvedCommand) {
    println!("  intent:       {} ({:?})", command.intent, command.source);
    match &command.entity_class {
        Some(class) => println!("  entity class: {class}"),
        None if command.intent.is_crud() => println!("  entity class: (not mentioned)"),
        None => {}
    }
    for pair in &command.attributes {
        println!("    {} = {}", pair.name, pair.value);
    }
    println!();
}
