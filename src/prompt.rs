//! Interactive input collected at startup.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Asks for the number of new-data clicks per iteration.
pub fn read_max_clicks(input: &mut impl BufRead, output: &mut impl Write) -> Result<usize> {
    write!(output, "Enter the max clicks size: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read max clicks")?;

    let line = line.trim();
    line.parse().with_context(|| format!("Invalid max clicks value: '{}'", line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_integer() {
        let mut out = Vec::new();
        let clicks = read_max_clicks(&mut Cursor::new("3\n"), &mut out).unwrap();

        assert_eq!(clicks, 3);
        assert_eq!(String::from_utf8(out).unwrap(), "Enter the max clicks size: ");
    }

    #[test]
    fn test_trims_whitespace() {
        let clicks = read_max_clicks(&mut Cursor::new("  12 \r\n"), &mut Vec::new()).unwrap();
        assert_eq!(clicks, 12);
    }

    #[test]
    fn test_rejects_non_integer() {
        let err = read_max_clicks(&mut Cursor::new("many\n"), &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("Invalid max clicks value: 'many'"));
    }

    #[test]
    fn test_rejects_negative_and_empty() {
        assert!(read_max_clicks(&mut Cursor::new("-1\n"), &mut Vec::new()).is_err());
        assert!(read_max_clicks(&mut Cursor::new(""), &mut Vec::new()).is_err());
    }
}
