//! Send confirmation
//!
//! The interactive policy asks once per reply and keeps asking until it
//! gets a yes or a no. The decision logic is a pure state transition so it
//! can be exercised without a console.

use std::io::{BufRead, Write};

use crate::error::InputError;

use super::dispatcher::ReplyPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmState {
    AwaitingInput,
    Confirmed,
    Rejected,
}

impl ConfirmState {
    /// Feed one line of console input. Only `AwaitingInput` reacts; the
    /// final states are absorbing.
    pub fn next(self, line: &str) -> ConfirmState {
        match self {
            ConfirmState::AwaitingInput => match line.trim() {
                "y" | "Y" => ConfirmState::Confirmed,
                "n" | "N" => ConfirmState::Rejected,
                _ => ConfirmState::AwaitingInput,
            },
            done => done,
        }
    }
}

/// Decides whether a built reply is actually sent.
pub trait Confirm {
    fn confirm(&mut self, payload: &ReplyPayload) -> Result<bool, InputError>;
}

/// Non-interactive policy: every reply is sent.
pub struct AlwaysSend;

impl Confirm for AlwaysSend {
    fn confirm(&mut self, payload: &ReplyPayload) -> Result<bool, InputError> {
        tracing::info!("Replying to {}: {}", payload.to, payload.subject);
        Ok(true)
    }
}

/// Interactive policy: ask y/n on a console.
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> Result<String, InputError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(InputError::Closed);
        }
        Ok(line)
    }
}

impl<R: BufRead, W: Write> Confirm for ConsolePrompt<R, W> {
    fn confirm(&mut self, payload: &ReplyPayload) -> Result<bool, InputError> {
        writeln!(
            self.output,
            "Reply to message from {}: {}",
            payload.to, payload.original_subject
        )?;

        let mut state = ConfirmState::AwaitingInput;
        while state == ConfirmState::AwaitingInput {
            write!(self.output, "Send response? (y/n)  ")?;
            self.output.flush()?;

            state = state.next(&self.read_line()?);
            if state == ConfirmState::AwaitingInput {
                writeln!(self.output, "Please enter 'y' or 'n'.")?;
            }
        }
        Ok(state == ConfirmState::Confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn payload() -> ReplyPayload {
        ReplyPayload {
            from: "me@example.com".to_string(),
            to: "a@x.com".to_string(),
            in_reply_to: "<1>".to_string(),
            subject: "Re: Hi".to_string(),
            original_subject: "Hi".to_string(),
            body: "Away".to_string(),
        }
    }

    fn ask(input: &str) -> (Result<bool, InputError>, String) {
        let mut output = Vec::new();
        let result = ConsolePrompt::new(Cursor::new(input), &mut output).confirm(&payload());
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_transitions() {
        let start = ConfirmState::AwaitingInput;
        assert_eq!(start.next("y"), ConfirmState::Confirmed);
        assert_eq!(start.next("Y\n"), ConfirmState::Confirmed);
        assert_eq!(start.next("n"), ConfirmState::Rejected);
        assert_eq!(start.next("  N \r\n"), ConfirmState::Rejected);
        assert_eq!(start.next("yes"), ConfirmState::AwaitingInput);
        assert_eq!(start.next(""), ConfirmState::AwaitingInput);
    }

    #[test]
    fn test_final_states_absorb_input() {
        assert_eq!(ConfirmState::Confirmed.next("n"), ConfirmState::Confirmed);
        assert_eq!(ConfirmState::Rejected.next("y"), ConfirmState::Rejected);
    }

    #[test]
    fn test_prompt_yes() {
        let (result, output) = ask("y\n");
        assert!(result.unwrap());
        assert!(output.starts_with("Reply to message from a@x.com: Hi\n"));
        assert!(output.contains("Send response? (y/n)"));
    }

    #[test]
    fn test_prompt_no() {
        let (result, _) = ask("n\n");
        assert!(!result.unwrap());
    }

    #[test]
    fn test_prompt_repeats_until_valid() {
        let (result, output) = ask("maybe\n\nN\n");
        assert!(!result.unwrap());
        assert_eq!(output.matches("Send response?").count(), 3);
        assert_eq!(output.matches("Please enter 'y' or 'n'.").count(), 2);
    }

    #[test]
    fn test_prompt_closed_input() {
        let (result, _) = ask("what\n");
        assert!(matches!(result, Err(InputError::Closed)));
    }

    #[test]
    fn test_always_send() {
        assert!(AlwaysSend.confirm(&payload()).unwrap());
    }
}
