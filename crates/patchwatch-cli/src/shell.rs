//! Line commands for the interactive `run` loop.

use thiserror::Error;

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// List the patch library.
    List,
    /// Splice an effect into a channel.
    Insert {
        /// Library patch name or 1-based number from `list`.
        target: PatchRef,
        /// Channel, 0-based.
        channel: usize,
    },
    /// Take an effect out of a channel.
    Remove {
        /// Library patch name or 1-based number from `list`.
        target: PatchRef,
        /// Channel, 0-based.
        channel: usize,
    },
    /// Print every channel's chain, or one library patch's widgets.
    Show(Option<PatchRef>),
    /// Remove every inserted effect.
    Stop,
    /// Print the command summary.
    Help,
    /// Stop everything and leave.
    Quit,
}

/// A patch named directly or by its position in the `list` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchRef {
    /// Patch name without extension.
    Name(String),
    /// 1-based number.
    Number(usize),
}

impl PatchRef {
    fn parse(token: &str) -> Self {
        match token.parse::<usize>() {
            Ok(n) if n > 0 => PatchRef::Number(n),
            _ => PatchRef::Name(token.trim_end_matches(".pd").to_string()),
        }
    }

    /// Resolves against the library listing.
    pub fn resolve<'a>(&'a self, available: &'a [String]) -> Result<&'a str, ShellError> {
        match self {
            PatchRef::Name(name) => Ok(name.as_str()),
            PatchRef::Number(n) => n
                .checked_sub(1)
                .and_then(|i| available.get(i))
                .map(String::as_str)
                .ok_or(ShellError::NoSuchNumber(*n)),
        }
    }
}

/// A line that could not be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellError {
    /// First word is not a command.
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    /// A required argument is absent.
    #[error("'{command}' needs a {argument}")]
    MissingArgument {
        /// Command name.
        command: &'static str,
        /// What was expected.
        argument: &'static str,
    },

    /// Channel is not a number.
    #[error("invalid channel '{0}'")]
    BadChannel(String),

    /// More words than the command takes.
    #[error("unexpected '{0}'")]
    TrailingInput(String),

    /// Number past the end of the listing.
    #[error("no patch numbered {0}")]
    NoSuchNumber(usize),
}

/// Command summary printed by `help`.
pub const HELP: &str = "\
Commands:
  list                        List available patches
  insert <patch> [channel]    Splice a patch into a channel (alias: start)
  remove <patch> [channel]    Take a patch out of a channel
  show [patch]                Show every chain, or a patch's GUI elements
  stop                        Remove every inserted patch (alias: kill)
  quit                        Stop everything and exit (alias: exit)
Patches are given by name or by number from 'list'. Channels start at 0.";

/// Parses one input line. Blank lines parse to `None`.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, ShellError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let command = match head {
        "list" | "ls" => ShellCommand::List,
        "insert" | "start" => {
            let (target, channel) = patch_and_channel("insert", &mut words)?;
            ShellCommand::Insert { target, channel }
        }
        "remove" | "rm" => {
            let (target, channel) = patch_and_channel("remove", &mut words)?;
            ShellCommand::Remove { target, channel }
        }
        "show" => ShellCommand::Show(words.next().map(PatchRef::parse)),
        "stop" | "kill" => ShellCommand::Stop,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(ShellError::UnknownCommand(other.to_string())),
    };

    match words.next() {
        Some(extra) => Err(ShellError::TrailingInput(extra.to_string())),
        None => Ok(Some(command)),
    }
}

fn patch_and_channel<'a>(
    command: &'static str,
    words: &mut impl Iterator<Item = &'a str>,
) -> Result<(PatchRef, usize), ShellError> {
    let target = words.next().map(PatchRef::parse).ok_or(ShellError::MissingArgument {
        command,
        argument: "patch name",
    })?;
    let channel = match words.next() {
        Some(word) => word
            .parse()
            .map_err(|_| ShellError::BadChannel(word.to_string()))?,
        None => 0,
    };
    Ok((target, channel))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> PatchRef {
        PatchRef::Name(n.to_string())
    }

    #[test]
    fn blank_line_is_nothing() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   \t"), Ok(None));
    }

    #[test]
    fn insert_defaults_to_channel_zero() {
        assert_eq!(
            parse_line("insert reverb"),
            Ok(Some(ShellCommand::Insert { target: name("reverb"), channel: 0 }))
        );
        assert_eq!(
            parse_line("start delay.pd 1"),
            Ok(Some(ShellCommand::Insert { target: name("delay"), channel: 1 }))
        );
    }

    #[test]
    fn numbers_refer_to_listing() {
        let cmd = parse_line("remove 2 1").unwrap().unwrap();
        let ShellCommand::Remove { target, channel } = cmd else {
            panic!("expected remove");
        };
        assert_eq!(channel, 1);
        let available = vec!["delay".to_string(), "reverb".to_string()];
        assert_eq!(target.resolve(&available), Ok("reverb"));
        assert_eq!(
            PatchRef::Number(3).resolve(&available),
            Err(ShellError::NoSuchNumber(3))
        );
    }

    #[test]
    fn zero_is_a_name_not_a_number() {
        assert_eq!(
            parse_line("insert 0"),
            Ok(Some(ShellCommand::Insert { target: name("0"), channel: 0 }))
        );
    }

    #[test]
    fn aliases() {
        assert_eq!(parse_line("kill"), Ok(Some(ShellCommand::Stop)));
        assert_eq!(parse_line("exit"), Ok(Some(ShellCommand::Quit)));
        assert_eq!(parse_line("ls"), Ok(Some(ShellCommand::List)));
        assert_eq!(parse_line("show"), Ok(Some(ShellCommand::Show(None))));
        assert_eq!(
            parse_line("show reverb"),
            Ok(Some(ShellCommand::Show(Some(name("reverb")))))
        );
    }

    #[test]
    fn errors() {
        assert_eq!(
            parse_line("frobnicate"),
            Err(ShellError::UnknownCommand("frobnicate".into()))
        );
        assert_eq!(
            parse_line("insert"),
            Err(ShellError::MissingArgument { command: "insert", argument: "patch name" })
        );
        assert_eq!(
            parse_line("insert reverb left"),
            Err(ShellError::BadChannel("left".into()))
        );
        assert_eq!(
            parse_line("stop now"),
            Err(ShellError::TrailingInput("now".into()))
        );
    }
}
