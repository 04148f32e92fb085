pub const QUERY_COMMAND_NAME: &str = "query";
pub const PROMPT_OPTION_NAME: &str = "prompt";
pub const QUERY_ACCEPTED_REPLY: &str = "Your query has been sent for processing.";

pub const DEFAULT_COMMAND_PREFIX: &str = "!";
pub const PING_REPLY: &str = "Pong! 🏓";

/// Platform-neutral description of an application command, turned into the
/// gateway library's builder at registration time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
}

/// A string option on an application command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    pub required: bool,
}

pub fn query_command() -> CommandDefinition {
    CommandDefinition {
        name: QUERY_COMMAND_NAME.to_owned(),
        description: "Submit a query to the customer service AI.".to_owned(),
        options: vec![CommandOption {
            name: PROMPT_OPTION_NAME.to_owned(),
            description: "Your question, e.g., 'where is my order: #STG1063'".to_owned(),
            required: true,
        }],
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixCommand {
    pub name: String,
    pub args: String,
}

/// Splits `!name args...` into its parts. Whitespace right after the prefix
/// means no command, matching how prefix frameworks resolve invocations.
pub fn parse_prefix_command(prefix: &str, text: &str) -> Option<PrefixCommand> {
    let rest = text.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        return None;
    }

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    Some(PrefixCommand { name: name.to_owned(), args: args.to_owned() })
}

/// A prefix command the minimal bot answers, with its help line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinCommand {
    Ping,
    Help,
}

impl BuiltinCommand {
    pub const ALL: [Self; 2] = [Self::Help, Self::Ping];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ping" => Some(Self::Ping),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Help => "help",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Self::Ping => "Simple health check",
            Self::Help => "Shows this message",
        }
    }
}

pub fn help_text(prefix: &str) -> String {
    let width = BuiltinCommand::ALL.iter().map(|command| command.name().len()).max().unwrap_or(0);
    let mut lines = vec!["Commands:".to_owned()];
    for command in BuiltinCommand::ALL {
        lines.push(format!("  {prefix}{:<width$}  {}", command.name(), command.help()));
    }
    lines.join("\n")
}
