//! Line-oriented prompting over any reader/writer pair, so the interactive
//! flows can be driven by scripted input in tests.

use anyhow::{anyhow, Context, Result};
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;

pub struct Prompter<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.out)
    }

    pub fn say(&mut self, line: impl Display) -> Result<()> {
        writeln!(self.out, "{line}").context("write to terminal")
    }

    /// One raw line without its terminator; `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        let n = self.input.read_line(&mut buf).context("read from terminal")?;
        if n == 0 {
            return Ok(None);
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(Some(buf))
    }

    /// Print `label` (no newline) and read the trimmed answer.
    pub fn ask_line(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.out, "{label}").context("write to terminal")?;
        self.out.flush().context("flush terminal")?;
        Ok(self.read_line()?.map(|l| l.trim().to_string()))
    }

    pub fn ask(&mut self, label: &str) -> Result<String> {
        self.ask_line(label)?
            .ok_or_else(|| anyhow!("input closed while waiting for {:?}", label.trim()))
    }

    /// Blank answers take `default`.
    pub fn ask_or(&mut self, label: &str, default: &str) -> Result<String> {
        let answer = self.ask(label)?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    /// Re-asks until the answer parses. A blank answer takes `default` when
    /// there is one.
    pub fn ask_parsed<T>(&mut self, label: &str, default: Option<T>) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let mut default = default;
        loop {
            let answer = self.ask(label)?;
            if answer.is_empty() {
                if let Some(d) = default.take() {
                    return Ok(d);
                }
                self.say("A value is required.")?;
                continue;
            }
            match answer.parse::<T>() {
                Ok(v) => return Ok(v),
                Err(e) => self.say(format!("Invalid value {answer:?}: {e}"))?,
            }
        }
    }

    /// `y`/`yes` (any case) is true; anything else, or end of input, is false.
    pub fn confirm(&mut self, label: &str) -> Result<bool> {
        Ok(self
            .ask_line(label)?
            .is_some_and(|a| matches!(a.to_ascii_lowercase().as_str(), "y" | "yes")))
    }

    /// Pasted text, ended by two consecutive empty lines or end of input.
    /// Lone empty lines inside the block are dropped.
    pub fn read_block(&mut self) -> Result<String> {
        let mut text = String::new();
        let mut empty = 0;
        while let Some(line) = self.read_line()? {
            if line.trim().is_empty() {
                empty += 1;
                if empty >= 2 {
                    break;
                }
                continue;
            }
            empty = 0;
            text.push_str(&line);
            text.push('\n');
        }
        Ok(text)
    }
}
