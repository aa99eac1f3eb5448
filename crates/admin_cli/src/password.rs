//! Hidden password entry on the terminal, echoing `*` per character.

use std::io::{Stderr, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::Print,
    terminal::{self, ClearType},
};

use crate::AdminError;

const MAX_ATTEMPTS: usize = 3;

/// What a key press did to the buffer being typed.
#[derive(Debug, PartialEq, Eq)]
enum Edit {
    Typed,
    Erased,
    Ignored,
    Submit,
    Cancel,
}

fn apply_key(buffer: &mut String, key: &KeyEvent) -> Edit {
    if key.kind == KeyEventKind::Release {
        return Edit::Ignored;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Edit::Submit,
        KeyCode::Esc => Edit::Cancel,
        KeyCode::Char('c' | 'd') if ctrl => Edit::Cancel,
        KeyCode::Char(_) if ctrl => Edit::Ignored,
        KeyCode::Char(ch) => {
            buffer.push(ch);
            Edit::Typed
        }
        KeyCode::Backspace if buffer.pop().is_some() => Edit::Erased,
        _ => Edit::Ignored,
    }
}

/// Raw mode for as long as the value lives.
struct HiddenInput {
    out: Stderr,
}

impl HiddenInput {
    fn open() -> Result<Self, AdminError> {
        terminal::enable_raw_mode()?;
        Ok(Self {
            out: std::io::stderr(),
        })
    }

    fn line(&mut self, text: &str) -> Result<(), AdminError> {
        queue!(
            self.out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print(text)
        )?;
        self.out.flush()?;
        Ok(())
    }

    fn read(&mut self, prompt: &str) -> Result<String, AdminError> {
        self.line(prompt)?;
        let mut buffer = String::new();
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            match apply_key(&mut buffer, &key) {
                Edit::Typed => queue!(self.out, Print('*'))?,
                Edit::Erased => queue!(
                    self.out,
                    cursor::MoveLeft(1),
                    Print(' '),
                    cursor::MoveLeft(1)
                )?,
                Edit::Ignored => continue,
                Edit::Submit => {
                    queue!(self.out, Print("\r\n"))?;
                    self.out.flush()?;
                    return Ok(buffer);
                }
                Edit::Cancel => {
                    queue!(self.out, Print("\r\n"))?;
                    self.out.flush()?;
                    return Err(AdminError::Prompt("password entry cancelled"));
                }
            }
            self.out.flush()?;
        }
    }
}

impl Drop for HiddenInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Ask for a new password and its confirmation.
pub fn read_new_password() -> Result<String, AdminError> {
    let mut input = HiddenInput::open()?;
    for _ in 0..MAX_ATTEMPTS {
        let password = input.read("Password: ")?;
        if password.trim().is_empty() {
            input.line("Password must not be blank.\r\n")?;
            continue;
        }
        if input.read("Confirm password: ")? == password {
            return Ok(password);
        }
        input.line("Passwords do not match.\r\n")?;
    }
    Err(AdminError::Prompt("no matching password after 3 attempts"))
}
