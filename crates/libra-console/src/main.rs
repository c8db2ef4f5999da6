use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use libra_core::api::Db;
use libra_core::types::Options;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

mod executor;
mod parser;

use executor::{Executor, Outcome};

/// LibraDB Console — interactive and scriptable CLI for LibraDB databases.
#[derive(Parser, Debug)]
#[command(name = "libra-console", version)]
struct Cli {
    /// Database file to open (created if it does not exist).
    #[arg(short, long, default_value = "libra.db")]
    db: PathBuf,

    /// Execute a command non-interactively (can be repeated).
    #[arg(short, long = "exec")]
    exec: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let db = match Db::open(&cli.db, Options::default()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Cannot open database at {}: {e}", cli.db.display());
            process::exit(1);
        }
    };
    let executor = Executor::new(db);

    if !cli.exec.is_empty() {
        process::exit(run_lines(&executor, cli.exec.iter().map(String::as_str)));
    } else if !std::io::stdin().is_terminal() {
        let stdin = std::io::stdin();
        let lines: Vec<String> = stdin.lock().lines().map_while(Result::ok).collect();
        process::exit(run_lines(&executor, lines.iter().map(String::as_str)));
    } else {
        run_repl(&executor);
    }
}

/// Execute a batch of lines, stopping at the first failure.
fn run_lines<'a>(executor: &Executor, lines: impl Iterator<Item = &'a str>) -> i32 {
    for line in lines {
        match parser::parse(line) {
            Ok(None) => {}
            Ok(Some(command)) => match executor.execute(command) {
                Ok(Outcome::Output(output)) => println!("{output}"),
                Ok(Outcome::Exit) => return 0,
                Err(e) => {
                    eprintln!("error: {e}");
                    return 1;
                }
            },
            Err(e) => {
                eprintln!("error: {e}");
                return 1;
            }
        }
    }
    0
}

fn run_repl(executor: &Executor) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Cannot start line editor: {e}");
            process::exit(1);
        }
    };

    println!("LibraDB console — type 'help' for commands.");
    loop {
        match editor.readline("libra> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(&line);
                match parser::parse(&line) {
                    Ok(None) => {}
                    Ok(Some(command)) => match executor.execute(command) {
                        Ok(Outcome::Output(output)) => println!("{output}"),
                        Ok(Outcome::Exit) => break,
                        Err(e) => eprintln!("error: {e}"),
                    },
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("read error: {e}");
                break;
            }
        }
    }
}
