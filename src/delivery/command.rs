//! Chat command parsing.

use crate::matcher::ABSENT_TOKEN;

/// A recognised chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` or `/help`
    Start,
    /// `/generate <prefix> [suffix]`
    Generate { prefix: String, suffix: String },
    /// `/generate` without a pattern
    MissingArgument,
    /// Any other `/command`
    Unknown(String),
}

impl Command {
    /// Parses one line of chat text. Returns `None` for plain messages.
    ///
    /// A `@botname` mention on the command word is ignored, as group chats
    /// append it.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let head = words.next()?.strip_prefix('/')?;
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();

        let command = match name.as_str() {
            "start" | "help" => Command::Start,
            "generate" => match words.next() {
                Some(prefix) => Command::Generate {
                    prefix: prefix.to_string(),
                    suffix: words.next().unwrap_or(ABSENT_TOKEN).to_string(),
                },
                None => Command::MissingArgument,
            },
            _ => Command::Unknown(name),
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_prefix_only() {
        assert_eq!(
            Command::parse("/generate abc"),
            Some(Command::Generate {
                prefix: "abc".into(),
                suffix: "-".into()
            })
        );
    }

    #[test]
    fn test_generate_prefix_and_suffix() {
        assert_eq!(
            Command::parse("  /generate -   ff "),
            Some(Command::Generate {
                prefix: "-".into(),
                suffix: "ff".into()
            })
        );
    }

    #[test]
    fn test_bot_mention_stripped() {
        assert_eq!(Command::parse("/Start@vanity_bot"), Some(Command::Start));
        assert!(matches!(
            Command::parse("/generate@vanity_bot dead"),
            Some(Command::Generate { .. })
        ));
    }

    #[test]
    fn test_missing_and_unknown() {
        assert_eq!(Command::parse("/generate"), Some(Command::MissingArgument));
        assert_eq!(Command::parse("/help"), Some(Command::Start));
        assert_eq!(
            Command::parse("/balance 0x1"),
            Some(Command::Unknown("balance".into()))
        );
    }

    #[test]
    fn test_plain_text_ignored() {
        assert_eq!(Command::parse("hello there"), None);
        assert_eq!(Command::parse(""), None);
    }
}
