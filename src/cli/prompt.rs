//! Numbered interactive selection.

use crate::error::{CliError, Result};
use std::io::{BufRead, Write};

/// Prints `[n] label` for every item, then reads a 1-based index.
///
/// Anything other than a number in range is an error. Reading from a closed
/// stdin is treated as an empty answer.
pub fn select_from<'a, T, Rd, W>(
    title: &str,
    items: &'a [T],
    label: impl Fn(&T) -> String,
    input: &mut Rd,
    output: &mut W,
) -> Result<&'a T>
where
    Rd: BufRead,
    W: Write,
{
    writeln!(output, "{}", title)?;
    for (index, item) in items.iter().enumerate() {
        writeln!(output, "[{}] {}", index + 1, label(item))?;
    }
    write!(output, "Choose (1-{}): ", items.len())?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();

    answer
        .parse::<usize>()
        .ok()
        .filter(|choice| (1..=items.len()).contains(choice))
        .map(|choice| &items[choice - 1])
        .ok_or_else(|| {
            CliError::InvalidSelection {
                input: answer.to_string(),
                max: items.len(),
            }
            .into()
        })
}
