use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Clear the conversation history (asks first)
    Clear,
    /// Export the conversation history to a JSON file
    Export,
    /// Reload the history panel
    History,
    /// Ask one of the quick questions by number
    Quick,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Zero-based quick question index for `/quick <n>` (users count from 1)
    pub fn quick_index(&self) -> Option<usize> {
        if self.command != SlashCommand::Quick {
            return None;
        }

        let n: usize = self.argument()?.trim().parse().ok()?;
        n.checked_sub(1)
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Clear => "clear all conversation history",
            SlashCommand::Export => "export conversation history as JSON",
            SlashCommand::History => "reload the history panel",
            SlashCommand::Quick => "ask quick question <n>",
            SlashCommand::Help => "show available commands and keys",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }

    /// Whether this command can be run while a question is in flight.
    pub fn available_while_loading(self) -> bool {
        !matches!(self, SlashCommand::Quick)
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let rest = input.trim_start().strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let rest: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(head)
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "q" | "quit" | "exit" => Some(SlashCommand::Bye),
            "refresh" | "reload" => Some(SlashCommand::History),
            "h" | "?" => Some(SlashCommand::Help),
            _ => None,
        })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for entry in command_entries() {
        help.push_str(&format!("/{} - {}\n", entry.keyword, entry.description));
    }

    help.push_str("\nAliases: /q, /quit, /exit for /bye; /refresh for /history");
    help.push_str("\n\nKeys:");
    help.push_str("\n  Enter          send      Shift+Enter  new line");
    help.push_str("\n  F1..F8         ask a quick question");
    help.push_str("\n  Tab            switch between input and history");
    help.push_str("\n  Up/Down Enter  pick a history entry to ask again");
    help.push_str("\n  Ctrl+C         quit");

    help
}
