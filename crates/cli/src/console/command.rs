//! Console command parsing.

use std::str::FromStr;

use crate::error::CliError;

pub const HELP: &str = "\
Commands:
  list                 show programs (#n, key, name, state)
  select <key|#n>      select a program by key or list position
  announce <i>         announce result i (0-based) of the selected program
  status               show the current selection
  reload               fetch the program list again
  help                 show this help
  quit                 leave the console";

/// How the operator refers to a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramRef {
    Key(String),
    /// 1-based position in the last listing
    Position(usize),
}

/// One console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    List,
    Select(ProgramRef),
    Announce(usize),
    Status,
    Reload,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => Ok(Self::List),
            "status" => Ok(Self::Status),
            "reload" => Ok(Self::Reload),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            "select" | "s" => parse_program_ref(rest).map(Self::Select),
            "announce" | "a" => rest
                .parse()
                .map(Self::Announce)
                .map_err(|_| {
                    CliError::invalid_command(format!("expected a result index, got '{rest}'"))
                }),
            "" => Err(CliError::invalid_command("empty command")),
            other => Err(CliError::invalid_command(format!(
                "unknown command '{other}', type 'help'"
            ))),
        }
    }
}

fn parse_program_ref(rest: &str) -> Result<ProgramRef, CliError> {
    if rest.is_empty() {
        return Err(CliError::invalid_command("select needs a program key or #n"));
    }
    match rest.strip_prefix('#') {
        Some(n) => match n.parse::<usize>() {
            Ok(position) if position >= 1 => Ok(ProgramRef::Position(position)),
            _ => Err(CliError::invalid_command(format!("invalid position '{rest}'"))),
        },
        None => Ok(ProgramRef::Key(rest.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_verbs() {
        assert_eq!("list".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::List);
        assert_eq!("  STATUS ".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Status);
        assert_eq!("q".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Quit);
    }

    #[test]
    fn test_parse_select_key_with_spaces() {
        let cmd: ConsoleCommand = "select 101 - Dance Solo (Senior)".parse().unwrap();
        assert_eq!(
            cmd,
            ConsoleCommand::Select(ProgramRef::Key("101 - Dance Solo (Senior)".into()))
        );
    }

    #[test]
    fn test_parse_select_position() {
        let cmd: ConsoleCommand = "select #2".parse().unwrap();
        assert_eq!(cmd, ConsoleCommand::Select(ProgramRef::Position(2)));
        assert!("select #0".parse::<ConsoleCommand>().is_err());
        assert!("select".parse::<ConsoleCommand>().is_err());
    }

    #[test]
    fn test_parse_announce() {
        assert_eq!("announce 3".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Announce(3));
        assert!("announce x".parse::<ConsoleCommand>().is_err());
        assert!("dance".parse::<ConsoleCommand>().is_err());
    }
}
