//! The `accord` binary entry point.

use accord_cli::{execute, Command, EXIT_USAGE};

#[tokio::main]
async fn main() {
    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(EXIT_USAGE);
        }
    };

    let code = execute(command).await;
    std::process::exit(code);
}
