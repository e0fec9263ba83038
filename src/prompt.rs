//! Interactive questions: free text, yes/no confirmation, numbered menus.

use crate::error::PromptError;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;
use std::fmt::Display;
use std::io::{self, Write};
use tracing::debug;

/// Where answers come from.
pub trait LineSource {
    /// Show `prompt` and read one line without its newline. `Ok(None)` means end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, PromptError>;
}

/// Reads answers from the terminal with line editing. The editor is created on first use.
#[derive(Default)]
pub struct Terminal {
    editor: Option<DefaultEditor>,
}

impl LineSource for Terminal {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, PromptError> {
        let editor = match self.editor.take() {
            Some(editor) => editor,
            None => DefaultEditor::new()?,
        };
        let editor = self.editor.insert(editor);
        match editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Interrupted) => Err(PromptError::Interrupted),
            Err(err) => Err(err.into()),
        }
    }
}

/// Answers given up front, e.g. for tests or non-interactive runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>, PromptError> {
        Ok(self.lines.pop_front())
    }
}

/// Asks questions on a [`LineSource`], writing menus to `out`.
pub struct Prompter {
    input: Box<dyn LineSource>,
    out: Box<dyn Write>,
}

impl Prompter {
    pub fn new(input: Box<dyn LineSource>, out: Box<dyn Write>) -> Self {
        Self { input, out }
    }

    /// Prompts on the terminal, menus on stdout.
    pub fn terminal() -> Self {
        Self::new(Box::new(Terminal::default()), Box::new(io::stdout()))
    }

    /// Ask for a line of text. End of input is [`PromptError::Closed`].
    pub fn ask(&mut self, prompt: &str) -> Result<String, PromptError> {
        let answer = self.input.read_line(prompt)?.ok_or(PromptError::Closed)?;
        debug!(prompt, "prompt answered");
        Ok(answer.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Ask until the answer is one of `y`, `yes`, `n`, `no` (any case).
    pub fn confirm(&mut self, prompt: &str) -> Result<bool, PromptError> {
        loop {
            match self.ask(prompt)?.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => continue,
            }
        }
    }

    /// Print `options` as a 1-based numbered list and return the one picked.
    pub fn choose<'a, T: Display>(
        &mut self,
        prompt: &str,
        options: &'a [T],
    ) -> Result<&'a T, PromptError> {
        for (i, option) in options.iter().enumerate() {
            writeln!(self.out, "  {}: {}", i + 1, option)?;
        }
        self.out.flush()?;

        let answer = self.ask(prompt)?;
        let picked = answer
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| options.get(i));
        picked.ok_or(PromptError::InvalidChoice(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompter(lines: &[&str]) -> Prompter {
        Prompter::new(
            Box::new(ScriptedInput::new(lines.iter().copied())),
            Box::new(io::sink()),
        )
    }

    #[test]
    fn test_confirm_repeats_until_clear_answer() {
        let mut p = prompter(&["maybe", "", "YES"]);
        assert!(p.confirm("continue? ").unwrap());

        let mut p = prompter(&["n"]);
        assert!(!p.confirm("continue? ").unwrap());
    }

    #[test]
    fn test_confirm_on_closed_input() {
        let mut p = prompter(&["what"]);
        assert!(matches!(p.confirm("continue? "), Err(PromptError::Closed)));
    }

    #[test]
    fn test_choose_is_one_based() {
        let options = ["alpha", "beta", "gamma"];
        let mut p = prompter(&["2"]);
        assert_eq!(*p.choose("pick: ", &options).unwrap(), "beta");
    }

    #[test]
    fn test_choose_rejects_out_of_range_and_text() {
        let options = ["alpha", "beta"];
        for answer in ["0", "3", "two"] {
            let mut p = prompter(&[answer]);
            match p.choose("pick: ", &options) {
                Err(PromptError::InvalidChoice(a)) => assert_eq!(a, answer),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_ask_returns_text() {
        let mut p = prompter(&["tower"]);
        assert_eq!(p.ask("host: ").unwrap(), "tower");
    }
}
