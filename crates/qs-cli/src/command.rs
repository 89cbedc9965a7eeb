//! Player commands read from stdin

use std::str::FromStr;

/// One line of player input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pull the lever (empty line or `pull`)
    Pull,
    /// Switch provider
    Source(String),
    /// List ready providers
    Sources,
    /// Start over after game over
    NewSession,
    /// Show session statistics
    Stats,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = match words.next() {
            None | Some("pull") | Some("p") => Command::Pull,
            Some("source") => match words.next() {
                Some(selector) => Command::Source(selector.to_string()),
                None => return Err("usage: source <local-simulator|remote-device|external-rng>".into()),
            },
            Some("sources") => Command::Sources,
            Some("new") => Command::NewSession,
            Some("stats") => Command::Stats,
            Some("help") | Some("?") => Command::Help,
            Some("quit") | Some("exit") | Some("q") => Command::Quit,
            Some(other) => return Err(format!("unknown command '{}', try 'help'", other)),
        };
        if words.next().is_some() {
            return Err(format!("too many arguments: '{}'", line.trim()));
        }
        Ok(command)
    }
}

pub const HELP: &str = "\
  <enter> | pull       pull the lever (1 credit)
  source <name>        local-simulator | remote-device | external-rng
  sources              list providers ready to play
  stats                session statistics
  new                  new session after game over
  quit";
