//! Line commands read from stdin during a live session.

use std::str::FromStr;
use tryon_core::Category;

pub const HELP: &str = "\
commands:
  earrings | necklaces | mode <category>   switch jewelry type
  pick <n>                                 wear option n of the active type
  list                                     show options for the active type
  refresh                                  re-fetch the active type's folder
  snapshot                                 save a PNG of the current view
  help                                     this text
  quit                                     exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Mode(Category),
    /// 1-based option number as typed.
    Pick(usize),
    List,
    Refresh,
    Snapshot,
    Help,
    Quit,
}

impl FromStr for UserCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err("empty command".into());
        };
        let arg = words.next();

        match (verb.to_lowercase().as_str(), arg) {
            ("mode", Some(c)) => c.parse().map(Self::Mode).map_err(|e| e.to_string()),
            ("mode", None) => Err("usage: mode <earrings|necklaces>".into()),
            ("pick", Some(n)) => match n.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(Self::Pick(n)),
                _ => Err(format!("not an option number: {n}")),
            },
            ("pick", None) => Err("usage: pick <n>".into()),
            ("list" | "ls", _) => Ok(Self::List),
            ("refresh", _) => Ok(Self::Refresh),
            ("snapshot" | "snap", _) => Ok(Self::Snapshot),
            ("help" | "?", _) => Ok(Self::Help),
            ("quit" | "exit" | "q", _) => Ok(Self::Quit),
            (other, _) => other
                .parse::<Category>()
                .map(Self::Mode)
                .map_err(|_| format!("unknown command: {other} (try 'help')")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_shortcuts() {
        assert_eq!("earrings".parse(), Ok(UserCommand::Mode(Category::Earrings)));
        assert_eq!("mode necklaces".parse(), Ok(UserCommand::Mode(Category::Necklaces)));
        assert!("mode".parse::<UserCommand>().is_err());
    }

    #[test]
    fn test_pick() {
        assert_eq!("pick 2".parse(), Ok(UserCommand::Pick(2)));
        assert!("pick 0".parse::<UserCommand>().is_err());
        assert!("pick two".parse::<UserCommand>().is_err());
    }

    #[test]
    fn test_misc() {
        assert_eq!("  SNAPSHOT ".parse(), Ok(UserCommand::Snapshot));
        assert_eq!("q".parse(), Ok(UserCommand::Quit));
        assert!("".parse::<UserCommand>().is_err());
        assert!("dance".parse::<UserCommand>().is_err());
    }
}
