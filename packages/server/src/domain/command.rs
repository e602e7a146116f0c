//! Commands understood by the hub.
//!
//! [`InboundFrame`] is what a client asks for over its connection;
//! [`AdminCommand`] is what the operator types into the console.

use std::str::FromStr;

use thiserror::Error;

use super::BanReason;

/// Classified client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// `/clear`: wipe the requester's own view.
    Clear,
    /// `/users`: roster, to the requester only.
    ListUsers,
    /// `/nick <name>`: the raw, unvalidated name.
    Rename(String),
    /// Chat text, not yet sanitized.
    Chat(String),
    /// Well-formed but nothing to do (unknown command, no payload).
    Unrecognized,
}

impl InboundFrame {
    const NICK_PREFIX: &'static str = "/nick ";

    /// Classify a frame from its `command` and `message` fields.
    ///
    /// Known commands win over `message`; an unknown command falls through to
    /// `message` when one is present.
    pub fn classify(command: Option<&str>, message: Option<&str>) -> Self {
        match command {
            Some("/clear") => return InboundFrame::Clear,
            Some("/users") => return InboundFrame::ListUsers,
            Some(cmd) if cmd.starts_with(Self::NICK_PREFIX) => {
                return InboundFrame::Rename(cmd[Self::NICK_PREFIX.len()..].trim().to_string());
            }
            _ => {}
        }

        match message {
            Some(text) if !text.is_empty() => InboundFrame::Chat(text.to_string()),
            _ => InboundFrame::Unrecognized,
        }
    }
}

/// Operator console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Stop,
    Status,
    Users,
    Message(String),
    Announce(String),
    Kick(String),
    Ban { target: String, reason: BanReason },
    Unban(String),
    BanList,
    Clear,
    Save,
    Help,
    /// Blank line.
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminParseError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown command: {0}. Type 'help' for available commands.")]
    Unknown(String),
}

impl AdminCommand {
    pub const HELP: &'static str = "\
=== Terminal Commands ===
stop                    - Stop the server gracefully
status                  - Show server status and stats
users                   - List all connected users
msg <message>           - Send system message to all users
announce <message>      - Send announcement with special formatting
kick <username>         - Kick a specific user
ban <ip|username> [reason] - Ban an IP address or user with optional reason
unban <ip>              - Unban an IP address
banlist                 - Show all banned IPs
clear                   - Clear all user chat histories
save                    - Save current log to timestamped file
help                    - Show this help message
=========================";
}

impl FromStr for AdminCommand {
    type Err = AdminParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (cmd, args) = match line.split_once(' ') {
            Some((cmd, args)) => (cmd.to_lowercase(), args.trim()),
            None => (line.to_lowercase(), ""),
        };

        let required = |usage: &'static str| -> Result<String, AdminParseError> {
            if args.is_empty() {
                Err(AdminParseError::Usage(usage))
            } else {
                Ok(args.to_string())
            }
        };

        match cmd.as_str() {
            "" => Ok(AdminCommand::Noop),
            "stop" | "exit" | "quit" => Ok(AdminCommand::Stop),
            "status" => Ok(AdminCommand::Status),
            "users" => Ok(AdminCommand::Users),
            "msg" | "message" => required("msg <message>").map(AdminCommand::Message),
            "announce" => required("announce <message>").map(AdminCommand::Announce),
            "kick" => required("kick <username>").map(AdminCommand::Kick),
            "ban" => {
                let args = required("ban <ip|username> [reason]")?;
                let (target, reason) = match args.split_once(' ') {
                    Some((target, reason)) => (target.to_string(), BanReason::new(reason)),
                    None => (args, BanReason::default()),
                };
                Ok(AdminCommand::Ban { target, reason })
            }
            "unban" => required("unban <ip>").map(AdminCommand::Unban),
            "banlist" => Ok(AdminCommand::BanList),
            "clear" => Ok(AdminCommand::Clear),
            "save" => Ok(AdminCommand::Save),
            "help" | "?" => Ok(AdminCommand::Help),
            _ => Err(AdminParseError::Unknown(cmd)),
        }
    }
}
