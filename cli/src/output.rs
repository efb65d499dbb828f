//! Colored match printing. ANSI coloring is applied only when standard
//! output is a terminal, matching the reference implementation's
//! `isatty(fileno(stdout))` gate, by writing through a `termcolor`
//! `StandardStream` that already detects this for us.

use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use threadgrep_core::MatchRecord;

pub struct Printer {
    stream: StandardStream,
}

impl Printer {
    pub fn new() -> Self {
        Self {
            stream: StandardStream::stdout(ColorChoice::Auto),
        }
    }

    /// Prints one line, highlighting every interval in `matches` in bold
    /// red, with an optional `filename:`/`line_no:` prefix.
    pub fn print_line(
        &mut self,
        prefix: Option<&str>,
        line: &[u8],
        matches: &MatchRecord,
        only_matches: bool,
    ) -> io::Result<()> {
        if let Some(prefix) = prefix {
            write!(self.stream, "{prefix}")?;
        }

        if only_matches {
            for interval in matches {
                self.write_highlighted(&line[interval.start..interval.end])?;
                writeln!(self.stream)?;
            }
            return Ok(());
        }

        let mut cursor = 0;
        for interval in matches {
            self.stream.write_all(&line[cursor..interval.start])?;
            self.write_highlighted(&line[interval.start..interval.end])?;
            cursor = interval.end;
        }
        self.stream.write_all(&line[cursor..])?;
        writeln!(self.stream)
    }

    /// Prints a whole line with no highlighting, used for `-v` output.
    pub fn print_plain_line(&mut self, prefix: Option<&str>, line: &[u8]) -> io::Result<()> {
        if let Some(prefix) = prefix {
            write!(self.stream, "{prefix}")?;
        }
        self.stream.write_all(line)?;
        writeln!(self.stream)
    }

    pub fn print_binary_match(&mut self, filename: &str) -> io::Result<()> {
        writeln!(io::stderr(), "Binary file {filename} matches")
    }

    fn write_highlighted(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(Color::Red)).set_bold(true);
        self.stream.set_color(&spec)?;
        self.stream.write_all(bytes)?;
        self.stream.reset()
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}
