mod driver;
mod output;
mod walk;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use threadgrep_core::{compile, Flags, Nfa};

use driver::{search_reader, LineOutcome};
use output::Printer;

/// A line-oriented pattern search tool.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Pattern to search for.
    pattern: String,

    /// Files to search; recurses into directories given `-r`. Reads stdin
    /// if empty.
    paths: Vec<PathBuf>,

    /// Ignore case distinctions in the pattern and the input.
    #[arg(short = 'i', long = "ignore-case")]
    ignore_case: bool,

    /// Select non-matching lines.
    #[arg(short = 'v', long = "invert-match")]
    invert_match: bool,

    /// Match only whole words.
    #[arg(short = 'w', long = "word-regexp")]
    word_regexp: bool,

    /// Match only whole lines.
    #[arg(short = 'x', long = "line-regexp")]
    line_regexp: bool,

    /// Print only the matched part of each line.
    #[arg(short = 'o', long = "only-matching")]
    only_matching: bool,

    /// Print the filename before each match.
    #[arg(short = 'H', long = "with-filename")]
    with_filename: bool,

    /// Suppress the filename prefix.
    #[arg(short = 'h', long = "no-filename")]
    no_filename: bool,

    /// Prefix each matching line with its line number.
    #[arg(short = 'n', long = "line-number")]
    line_number: bool,

    /// Treat binary files as text.
    #[arg(short = 'a', long = "text")]
    text: bool,

    /// Recursively search directories.
    #[arg(short = 'r', long = "recursive")]
    recursive: bool,

    /// Print only a count of matching lines per file.
    #[arg(short = 'c', long = "count")]
    count: bool,

    /// Print only filenames containing a match.
    #[arg(short = 'l', long = "files-with-matches")]
    files_with_matches: bool,

    /// Print only filenames with no match.
    #[arg(short = 'L', long = "files-without-match")]
    files_without_match: bool,

    /// Suppress all output; only the exit code is meaningful.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

impl Cli {
    fn flags(&self) -> Flags {
        Flags {
            case_insensitive: self.ignore_case,
            whole_word: self.word_regexp,
            whole_line: self.line_regexp,
            invert: self.invert_match,
        }
    }

    fn show_filename(&self, multiple_sources: bool) -> bool {
        if self.no_filename {
            return false;
        }
        self.with_filename || multiple_sources
    }

    fn output_suppressed(&self) -> bool {
        self.quiet || self.count || self.files_with_matches || self.files_without_match
    }
}

/// Either a real file path or standard input.
enum Source {
    File(PathBuf),
    Stdin,
}

impl Source {
    fn display_name(&self) -> String {
        match self {
            Source::File(path) => path.display().to_string(),
            Source::Stdin => "(standard input)".to_string(),
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let nfa = match compile(cli.pattern.as_bytes(), cli.ignore_case) {
        Ok(nfa) => nfa,
        Err(err) => {
            eprintln!("threadgrep: bad pattern: {err}");
            return ExitCode::from(2);
        }
    };

    let sources = gather_sources(&cli);

    let show_filename = cli.show_filename(sources.len() > 1);
    let tl_nfa: thread_local::ThreadLocal<Nfa> = thread_local::ThreadLocal::new();

    #[cfg(feature = "rayon")]
    let iter = sources.into_par_iter();
    #[cfg(not(feature = "rayon"))]
    let iter = sources.into_iter();

    let results: Vec<bool> = iter
        .map(|source| {
            let local_nfa = tl_nfa.get_or(|| nfa.clone());
            match search_source(&cli, &source, local_nfa, show_filename) {
                Ok(matched) => matched,
                Err(err) => {
                    log::warn!("skipping {}: {err:#}", source.display_name());
                    false
                }
            }
        })
        .collect();

    if results.into_iter().any(|matched| matched) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn gather_sources(cli: &Cli) -> Vec<Source> {
    if cli.paths.is_empty() {
        return vec![Source::Stdin];
    }
    let mut sources = Vec::new();
    for path in &cli.paths {
        if path.is_dir() {
            if !cli.recursive {
                eprintln!("threadgrep: {}: is a directory", path.display());
                continue;
            }
            sources.extend(walk::walk_files(path).map(Source::File));
        } else {
            sources.push(Source::File(path.clone()));
        }
    }
    sources
}

fn search_source(cli: &Cli, source: &Source, nfa: &Nfa, show_filename: bool) -> Result<bool> {
    let flags = cli.flags();
    let name = source.display_name();
    let suppressed = cli.output_suppressed();

    let mut printer = Printer::new();
    let mut matching_lines = 0usize;
    let mut reported_binary = false;

    let mut on_line = |line_no: usize, line: &[u8], outcome: LineOutcome| {
        report_line(
            cli,
            &mut printer,
            &name,
            line_no,
            line,
            outcome,
            suppressed,
            show_filename,
            &mut matching_lines,
            &mut reported_binary,
        );
    };

    let any_match = match source {
        Source::Stdin => {
            let stdin = io::stdin();
            search_reader(stdin.lock(), nfa, flags, cli.text, &mut on_line)
                .context("reading standard input")?
        }
        Source::File(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            let reader = BufReader::new(file);
            search_reader(reader, nfa, flags, cli.text, &mut on_line)
                .with_context(|| format!("reading {}", path.display()))?
        }
    };

    if suppressed && !cli.quiet {
        if cli.count {
            if show_filename {
                println!("{name}:{matching_lines}");
            } else {
                println!("{matching_lines}");
            }
        } else if cli.files_with_matches && any_match {
            println!("{name}");
        } else if cli.files_without_match && !any_match {
            println!("{name}");
        }
    }

    Ok(any_match)
}

#[allow(clippy::too_many_arguments)]
fn report_line(
    cli: &Cli,
    printer: &mut Printer,
    name: &str,
    line_no: usize,
    line: &[u8],
    outcome: LineOutcome,
    suppressed: bool,
    show_filename: bool,
    matching_lines: &mut usize,
    reported_binary: &mut bool,
) {
    let prefix = || -> Option<String> {
        match (show_filename, cli.line_number) {
            (true, true) => Some(format!("{name}:{line_no}:")),
            (true, false) => Some(format!("{name}:")),
            (false, true) => Some(format!("{line_no}:")),
            (false, false) => None,
        }
    };

    match outcome {
        LineOutcome::Binary => {
            if !*reported_binary {
                *reported_binary = true;
                if !cli.quiet {
                    let _ = printer.print_binary_match(name);
                }
            }
        }
        LineOutcome::Matched { matches } => {
            // `search`'s `Flags.invert` already toggled `Found`/`None` per
            // the active `-v` state, so a `Matched` outcome here always
            // means "this line is selected" -- no second inversion.
            *matching_lines += 1;
            if !suppressed {
                let _ = printer.print_line(prefix().as_deref(), line, &matches, cli.only_matching);
            }
        }
        LineOutcome::NoMatch => {}
    }
}
