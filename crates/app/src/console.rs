//! Line-oriented rendering and input parsing for the interactive `take` command.

use std::fmt::Write as _;

use exam_core::model::{Answer, AnswerStatus, Question, QuestionKind};
use services::SessionSnapshot;
use thiserror::Error;

/// One line typed by the respondent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Next,
    Previous,
    /// Pick an option (by number or text) or enter a number.
    Answer(String),
    Finish,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("type a command, or `help`")]
    Empty,
    #[error("`answer` needs a value")]
    MissingValue,
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
}

/// Parse a prompt line. A bare value is shorthand for `answer <value>`.
pub fn parse_input(line: &str) -> Result<Input, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(InputError::Empty);
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_ascii_lowercase().as_str() {
        "n" | "next" => Ok(Input::Next),
        "p" | "prev" | "previous" => Ok(Input::Previous),
        "f" | "finish" => Ok(Input::Finish),
        "s" | "status" => Ok(Input::Status),
        "h" | "help" | "?" => Ok(Input::Help),
        "q" | "quit" => Ok(Input::Quit),
        "a" | "answer" => {
            if rest.is_empty() {
                Err(InputError::MissingValue)
            } else {
                Ok(Input::Answer(rest.to_string()))
            }
        }
        _ if head.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-')) => {
            Ok(Input::Answer(line.to_string()))
        }
        other => Err(InputError::Unknown(other.to_string())),
    }
}

/// Map a typed choice to option text: `2` means the second option; anything
/// else is taken literally.
#[must_use]
pub fn resolve_option(question: &Question, raw: &str) -> String {
    let options = question.options().unwrap_or_default();
    raw.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i))
        .cloned()
        .unwrap_or_else(|| raw.to_string())
}

/// Whether `option` is currently ticked on a multiple-choice answer.
#[must_use]
pub fn is_selected(status: AnswerStatus<'_>, option: &str) -> bool {
    match status.answer() {
        Some(Answer::Multiple(set)) => set.contains(option),
        Some(Answer::Single(chosen)) => chosen == option,
        _ => false,
    }
}

#[must_use]
pub fn render_question(question: &Question, snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\n[{}] Question {}/{} ({}% done)",
        snapshot.remaining_label(),
        snapshot.current_index + 1,
        snapshot.total_questions,
        snapshot.progress_percent,
    );
    let _ = writeln!(out, "{}", question.prompt());
    if let Some(image) = question.image() {
        let _ = writeln!(out, "  image: {image}");
    }

    let status = snapshot.answer_for(question.id());
    match question.kind() {
        QuestionKind::Single | QuestionKind::Multiple => {
            let (on, off) = if question.kind() == QuestionKind::Single {
                ("(*)", "( )")
            } else {
                ("[x]", "[ ]")
            };
            for (i, option) in question.options().unwrap_or_default().iter().enumerate() {
                let mark = if is_selected(status, option) { on } else { off };
                let _ = writeln!(out, "  {mark} {}. {option}", i + 1);
            }
        }
        QuestionKind::Number => {
            let current = match status.answer() {
                Some(Answer::Number(raw)) => raw.as_str(),
                _ => "-",
            };
            let _ = writeln!(out, "  your answer: {current}");
        }
    }

    let hint = if snapshot.is_last() {
        "next | prev | answer <value> | finish | quit"
    } else {
        "next | prev | answer <value> | quit"
    };
    let _ = write!(out, "{hint}> ");
    out
}

pub const HELP: &str = "\
Commands:
  n, next           go to the next question
  p, prev           go to the previous question
  a, answer <v>     choose option number/text, toggle it on multiple choice,
                    or enter a number
  f, finish         submit (only from the last question)
  s, status         show remaining time and progress
  q, quit           leave without submitting";
