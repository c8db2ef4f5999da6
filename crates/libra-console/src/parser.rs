//! Command-line parsing for the console's point operations.

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create { collection: String },
    Drop { collection: String },
    Put { collection: String, key: String, value: String },
    Get { collection: String, key: String },
    Del { collection: String, key: String },
    Help,
    Exit,
}

/// Parse one input line. Returns `Ok(None)` for blank lines and comments.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let command = match tokens[0].to_ascii_lowercase().as_str() {
        "create" => Command::Create {
            collection: arg(&tokens, 1, "create <collection>")?,
        },
        "drop" => Command::Drop {
            collection: arg(&tokens, 1, "drop <collection>")?,
        },
        "put" => Command::Put {
            collection: arg(&tokens, 1, "put <collection> <key> <value>")?,
            key: arg(&tokens, 2, "put <collection> <key> <value>")?,
            value: arg(&tokens, 3, "put <collection> <key> <value>")?,
        },
        "get" => Command::Get {
            collection: arg(&tokens, 1, "get <collection> <key>")?,
            key: arg(&tokens, 2, "get <collection> <key>")?,
        },
        "del" | "delete" => Command::Del {
            collection: arg(&tokens, 1, "del <collection> <key>")?,
            key: arg(&tokens, 2, "del <collection> <key>")?,
        },
        "help" => Command::Help,
        "exit" | "quit" => Command::Exit,
        other => return Err(format!("unknown command: {other} (try 'help')")),
    };

    Ok(Some(command))
}

fn arg(tokens: &[&str], index: usize, usage: &str) -> Result<String, String> {
    tokens
        .get(index)
        .map(|t| t.to_string())
        .ok_or_else(|| format!("usage: {usage}"))
}

pub const HELP: &str = "\
Commands:
  create <collection>              create a collection
  drop <collection>                delete a collection's record
  put <collection> <key> <value>   insert or replace a key
  get <collection> <key>           look up a key
  del <collection> <key>           remove a key
  help                             show this help
  exit                             leave the console";
