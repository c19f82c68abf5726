use std::io::Write;

use anyhow::{Context as _, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use services::{Navigator, Route};

/// Prints each navigation transition as its route path.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: &Route) {
        println!("-> {}", route.path());
    }
}

/// Line-oriented prompts over stdin.
pub struct Prompter {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompter {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `prompt` and read one trimmed line. Fails on end of input.
    pub async fn ask(&mut self, prompt: &str) -> Result<String> {
        print!("{prompt} ");
        std::io::stdout().flush().context("flush stdout")?;
        match self.lines.next_line().await.context("read stdin")? {
            Some(line) => Ok(line.trim().to_owned()),
            None => bail!("input closed"),
        }
    }

    pub async fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.ask(&format!("{prompt} [y/N]")).await?;
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    /// Read a 1-based choice among `count` items. Blank input yields `None`.
    pub async fn choose(&mut self, prompt: &str, count: usize) -> Result<Option<usize>> {
        loop {
            let raw = self.ask(prompt).await?;
            if raw.is_empty() {
                return Ok(None);
            }
            match parse_choice(&raw, count) {
                Some(index) => return Ok(Some(index)),
                None => println!("enter a number between 1 and {count}"),
            }
        }
    }
}

fn parse_choice(raw: &str, count: usize) -> Option<usize> {
    raw.parse::<usize>()
        .ok()
        .filter(|n| (1..=count).contains(n))
        .map(|n| n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_are_one_based_and_bounded() {
        assert_eq!(parse_choice("1", 3), Some(0));
        assert_eq!(parse_choice("3", 3), Some(2));
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("x", 3), None);
    }
}
