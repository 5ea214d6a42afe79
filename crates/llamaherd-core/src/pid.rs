//! Remote pid recovery from launch command output.
//!
//! The remote start script ends with `echo $!`, but login shells are free
//! to prepend banners or warnings to stdout. The contract is therefore:
//! the last non-empty line must be a positive integer, and nothing else
//! in the output is inspected.

use thiserror::Error;

/// The launch output did not contain a usable pid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PidParseError {
    /// Output had no non-empty lines at all.
    #[error("launch output was empty")]
    Empty,

    /// The last non-empty line was not a positive integer.
    #[error("last line of launch output is not a pid: '{0}'")]
    NotAPid(String),
}

/// Parse the remote worker's pid from launch command stdout.
pub fn parse_remote_pid(stdout: &str) -> Result<u32, PidParseError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .next_back()
        .ok_or(PidParseError::Empty)?;

    match line.parse::<u32>() {
        Ok(pid) if pid > 0 => Ok(pid),
        _ => Err(PidParseError::NotAPid(line.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_pid() {
        assert_eq!(parse_remote_pid("12345\n"), Ok(12345));
    }

    #[test]
    fn test_pid_after_shell_banner() {
        let out = "Welcome to host-a\nLast login: yesterday\n98765\n";
        assert_eq!(parse_remote_pid(out), Ok(98765));
    }

    #[test]
    fn test_surrounding_whitespace() {
        assert_eq!(parse_remote_pid("  777  \n\n"), Ok(777));
    }

    #[test]
    fn test_empty_output() {
        assert_eq!(parse_remote_pid(""), Err(PidParseError::Empty));
        assert_eq!(parse_remote_pid("\n  \n"), Err(PidParseError::Empty));
    }

    #[test]
    fn test_non_numeric_last_line() {
        assert_eq!(
            parse_remote_pid("12345\nbash: toolbox: command not found\n"),
            Err(PidParseError::NotAPid(
                "bash: toolbox: command not found".to_string()
            ))
        );
    }

    #[test]
    fn test_zero_is_not_a_pid() {
        assert_eq!(
            parse_remote_pid("0\n"),
            Err(PidParseError::NotAPid("0".to_string()))
        );
    }

    #[test]
    fn test_negative_is_not_a_pid() {
        assert_eq!(
            parse_remote_pid("-5\n"),
            Err(PidParseError::NotAPid("-5".to_string()))
        );
    }
}
