/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/connect [name]`; without a name the configured username is used.
    Connect(Option<String>),
    Disconnect,
    Quit,
    Say(String),
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "connect" if arg.is_empty() => Self::Connect(None),
            "connect" => Self::Connect(Some(arg.to_string())),
            "disconnect" => Self::Disconnect,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Command;

    #[test]
    fn parses_commands_and_chat() {
        assert_eq!(Command::parse("/connect"), Command::Connect(None));
        assert_eq!(
            Command::parse("/connect  Ann Lee "),
            Command::Connect(Some("Ann Lee".into()))
        );
        assert_eq!(Command::parse("/disconnect"), Command::Disconnect);
        assert_eq!(Command::parse(" /quit"), Command::Quit);
        assert_eq!(Command::parse("/dance"), Command::Unknown("dance".into()));
        assert_eq!(Command::parse("   "), Command::Empty);
        assert_eq!(Command::parse(" hello "), Command::Say(" hello ".into()));
    }
}
