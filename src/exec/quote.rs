use crate::error::ExecError;

/// Join words into one string that a POSIX shell splits back into exactly those words.
///
/// Use it to embed arguments in a [`shell`](crate::Executor::shell) command line or to pass a
/// whole command as a single argument, e.g. to `ssh`.
pub fn join_for_shell<I, S>(words: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    shell_words::join(words)
}

/// Split a command line into words with shell quoting rules, without interpreting it.
pub fn split_command_line(line: &str) -> Result<Vec<String>, ExecError> {
    shell_words::split(line).map_err(|source| ExecError::Split {
        line: line.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_quotes_metacharacters() {
        let joined = join_for_shell(["a b", "c\"d", "$HOME", "x;y|z", "plain"]);
        assert!(joined.ends_with(" plain"));
        assert_eq!(
            split_command_line(&joined).unwrap(),
            ["a b", "c\"d", "$HOME", "x;y|z", "plain"]
        );
    }

    #[test]
    fn test_join_round_trips_empty_and_quotes() {
        let words = ["", "it's", "back\\slash", "tab\there"];
        assert_eq!(split_command_line(&join_for_shell(words)).unwrap(), words);
    }

    #[test]
    fn test_split_reports_unbalanced_quotes() {
        let err = split_command_line("echo 'open").unwrap_err();
        assert!(matches!(err, ExecError::Split { .. }));
    }
}
