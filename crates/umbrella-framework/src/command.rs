//! Slash-command payload parsing.
//!
//! Chat platforms deliver slash commands as `application/x-www-form-urlencoded`
//! bodies:
//!
//! ```text
//! command=%2Fumbrella&text=deploy+%22my+app%22+prod&user_id=U123&...
//! ```
//!
//! [`SlashCommand::parse`] turns such a body into the command name (without
//! its leading `/`) and the argument list, split with shell-like rules so
//! quoted arguments survive intact.

use serde::Deserialize;

use crate::error::CommandError;

/// A parsed slash-command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlashCommand {
    /// Command name without the leading `/`.
    pub command: String,
    /// Raw argument text as typed by the user.
    pub text: String,
    /// `text` split into arguments.
    pub arguments: Vec<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub channel_id: Option<String>,
    pub team_id: Option<String>,
    /// URL for delayed responses.
    pub response_url: Option<String>,
    pub trigger_id: Option<String>,
}

#[derive(Deserialize)]
struct Payload {
    command: Option<String>,
    #[serde(default)]
    text: String,
    user_id: Option<String>,
    user_name: Option<String>,
    channel_id: Option<String>,
    team_id: Option<String>,
    response_url: Option<String>,
    trigger_id: Option<String>,
}

impl SlashCommand {
    /// Parses a form-urlencoded slash-command body.
    pub fn parse(body: &str) -> Result<Self, CommandError> {
        let payload: Payload = serde_urlencoded::from_str(body)
            .map_err(|e| CommandError::Malformed(e.to_string()))?;

        let command = payload
            .command
            .as_deref()
            .map(|c| c.trim().trim_start_matches('/'))
            .filter(|c| !c.is_empty())
            .ok_or(CommandError::MissingCommand)?
            .to_string();

        Ok(Self {
            command,
            arguments: shell_split(&payload.text),
            text: payload.text,
            user_id: payload.user_id,
            user_name: payload.user_name,
            channel_id: payload.channel_id,
            team_id: payload.team_id,
            response_url: payload.response_url,
            trigger_id: payload.trigger_id,
        })
    }

    /// The first argument, which names the function to run.
    pub fn function(&self) -> Option<&str> {
        self.arguments.first().map(String::as_str)
    }
}

/// Splits command text into arguments the way a POSIX shell would, minus
/// expansions.
///
/// - Runs of whitespace separate arguments.
/// - `'...'` keeps everything literally, backslashes included.
/// - `"..."` keeps whitespace; a backslash escapes only `"` and `\`.
/// - Outside quotes a backslash makes the next character literal, so
///   `my\ app` is one argument. A trailing lone backslash is kept.
/// - Quotes may appear mid-argument (`--name="a b"`) and `""` yields an
///   empty argument.
/// - An unterminated quote runs to the end of the input.
pub fn shell_split(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current: Option<String> = None;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if let Some(arg) = current.take() {
                    args.push(arg);
                }
            }
            '\'' => {
                let arg = current.get_or_insert_with(String::new);
                for c in chars.by_ref() {
                    if c == '\'' {
                        break;
                    }
                    arg.push(c);
                }
            }
            '"' => {
                let arg = current.get_or_insert_with(String::new);
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' if matches!(chars.peek(), Some('"' | '\\')) => {
                            arg.extend(chars.next());
                        }
                        c => arg.push(c),
                    }
                }
            }
            '\\' => {
                let arg = current.get_or_insert_with(String::new);
                arg.push(chars.next().unwrap_or('\\'));
            }
            c => current.get_or_insert_with(String::new).push(c),
        }
    }

    args.extend(current);
    args
}
