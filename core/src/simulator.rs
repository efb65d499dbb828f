//! The concurrent NFA simulator: searches a byte buffer for matches against
//! a compiled [`Nfa`], fanning a branching search out across the rayon
//! thread pool.

use crate::arena::{Arena, StateId, TransitionFlag};
use crate::compiler::Nfa;
use crate::matchrecord::MatchRecord;

/// Search-time behavior flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flags {
    /// Fold ASCII letters in the buffer to lowercase before comparing.
    pub case_insensitive: bool,
    /// Discard matches whose end position isn't followed by whitespace (or
    /// end of buffer).
    pub whole_word: bool,
    /// Require a single match spanning the entire buffer.
    pub whole_line: bool,
    /// Toggle `FOUND`/`NONE` after the search completes (`PROGRESS` passes
    /// through unchanged).
    pub invert: bool,
}

/// Outcome of a search over a (possibly incomplete) buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No match, and no partial match is stranded at the end of the buffer.
    None,
    /// At least one branch completed a match.
    Found,
    /// A partial match is stranded at the end of the buffer; the caller
    /// should extend the buffer with more input and search again.
    Progress,
}

#[inline]
fn combine(a: Status, b: Status) -> Status {
    use Status::*;
    match (a, b) {
        (Progress, _) | (_, Progress) => Progress,
        (Found, _) | (_, Found) => Found,
        (None, None) => None,
    }
}

#[inline]
fn invert_status(s: Status) -> Status {
    match s {
        Status::Found => Status::None,
        Status::None => Status::Found,
        Status::Progress => Status::Progress,
    }
}

#[inline]
fn fold_byte(byte: u8, case_insensitive: bool) -> u8 {
    if case_insensitive {
        byte.to_ascii_lowercase()
    } else {
        byte
    }
}

#[inline]
fn is_whitespace(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Searches `buffer` for matches against `nfa`, appending completed matches
/// to `matches` in ascending-start order. Returns the combined status across
/// every task spawned during the search.
pub fn search(buffer: &[u8], nfa: &Nfa, flags: Flags, matches: &mut MatchRecord) -> Status {
    let status = if flags.whole_line {
        search_whole_line(buffer, nfa, flags, matches)
    } else {
        search_scanning(buffer, nfa, flags, matches)
    };
    if flags.invert {
        invert_status(status)
    } else {
        status
    }
}

fn search_scanning(buffer: &[u8], nfa: &Nfa, flags: Flags, matches: &mut MatchRecord) -> Status {
    let mut overall = Status::None;
    let mut pos = 0usize;

    while pos < buffer.len() {
        if !viable_start(nfa, buffer, pos, flags.case_insensitive) {
            pos = if flags.whole_word {
                skip_word(buffer, pos)
            } else {
                pos + 1
            };
            continue;
        }

        let (status, end) = run_task(&nfa.arena, nfa.qaccept, buffer, nfa.q0, pos, flags);
        overall = combine(overall, status);

        if status == Status::Found {
            let accepted = !flags.whole_word || word_boundary_at(buffer, end);
            if accepted {
                if end > pos {
                    matches.push(pos, end);
                    pos = end;
                    continue;
                }
                // Zero-width match (e.g. an empty pattern): nothing to
                // record, but still advance so the scan makes progress.
            }
        }
        pos += 1;
    }

    overall
}

fn search_whole_line(buffer: &[u8], nfa: &Nfa, flags: Flags, matches: &mut MatchRecord) -> Status {
    let (status, end) = run_task(&nfa.arena, nfa.qaccept, buffer, nfa.q0, 0, flags);
    if status == Status::Found && end == buffer.len() {
        if !buffer.is_empty() {
            matches.push(0, buffer.len());
        }
        return Status::Found;
    }
    match status {
        Status::Progress => Status::Progress,
        _ => Status::None,
    }
}

/// Cheap pre-check used by the scanning driver to skip start positions that
/// cannot possibly begin a match. A `q0` epsilon is always treated as
/// viable, so a pattern able to match the empty string is never skipped.
fn viable_start(nfa: &Nfa, buffer: &[u8], pos: usize, case_insensitive: bool) -> bool {
    let byte = fold_byte(buffer[pos], case_insensitive);
    nfa.arena.transitions(nfa.q0).iter().any(|t| match t.flag {
        TransitionFlag::Epsilon | TransitionFlag::Wildcard => true,
        TransitionFlag::Literal => byte == t.symbol,
        TransitionFlag::Invert => byte != t.symbol,
    })
}

/// Advances past the remainder of the current word and any whitespace after
/// it, landing on the start of the next word (or `buffer.len()`). Called
/// after `viable_start` rejects `pos`, so it must make progress even when
/// `pos` is itself already whitespace -- otherwise the scan would never
/// leave a non-matching word boundary.
fn skip_word(buffer: &[u8], mut pos: usize) -> usize {
    while pos < buffer.len() && !is_whitespace(buffer[pos]) {
        pos += 1;
    }
    while pos < buffer.len() && is_whitespace(buffer[pos]) {
        pos += 1;
    }
    pos
}

fn word_boundary_at(buffer: &[u8], end: usize) -> bool {
    match buffer.get(end) {
        None => true,
        Some(&b) => is_whitespace(b),
    }
}

/// Runs one exploration task at `(state, pos)`, fanning out across the
/// thread pool whenever more than one outgoing transition is viable.
/// Returns the combined status of this task and everything it spawned, plus
/// the furthest end position reached by a completed match.
fn run_task(
    arena: &Arena,
    qaccept: StateId,
    buffer: &[u8],
    state: StateId,
    pos: usize,
    flags: Flags,
) -> (Status, usize) {
    if state == qaccept {
        return (Status::Found, pos);
    }

    let at_end = pos >= buffer.len();
    let transitions = arena.transitions(state);

    // A byte-consuming edge we can't try yet (no byte available) still
    // means the match could complete given more input.
    let stranded = at_end && transitions.iter().any(|t| t.flag != TransitionFlag::Epsilon);

    let mut children: Vec<(StateId, usize)> = Vec::new();
    for t in transitions {
        match t.flag {
            TransitionFlag::Epsilon => children.push((t.target, pos)),
            TransitionFlag::Wildcard => {
                if !at_end {
                    children.push((t.target, pos + 1));
                }
            }
            TransitionFlag::Literal => {
                if !at_end && fold_byte(buffer[pos], flags.case_insensitive) == t.symbol {
                    children.push((t.target, pos + 1));
                }
            }
            TransitionFlag::Invert => {
                if !at_end && fold_byte(buffer[pos], flags.case_insensitive) != t.symbol {
                    children.push((t.target, pos + 1));
                }
            }
        }
    }

    let explored = explore(arena, qaccept, buffer, &children, flags);
    if stranded {
        (combine(explored.0, Status::Progress), explored.1)
    } else {
        explored
    }
}

/// Explores a batch of sibling `(state, pos)` continuations, spawning all
/// but the last one onto the rayon pool and combining their outcomes.
fn explore(
    arena: &Arena,
    qaccept: StateId,
    buffer: &[u8],
    children: &[(StateId, usize)],
    flags: Flags,
) -> (Status, usize) {
    match children {
        [] => (Status::None, 0),
        [(state, pos)] => run_task(arena, qaccept, buffer, *state, *pos, flags),
        [(state, pos), rest @ ..] => {
            let (a, b) = rayon::join(
                || run_task(arena, qaccept, buffer, *state, *pos, flags),
                || explore(arena, qaccept, buffer, rest, flags),
            );
            combine_task(a, b)
        }
    }
}

fn combine_task(a: (Status, usize), b: (Status, usize)) -> (Status, usize) {
    let status = combine(a.0, b.0);
    let end = match (a.0 == Status::Found, b.0 == Status::Found) {
        (true, true) => a.1.max(b.1),
        (true, false) => a.1,
        (false, true) => b.1,
        (false, false) => 0,
    };
    (status, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;

    fn run(pattern: &[u8], buffer: &[u8], flags: Flags) -> (Status, Vec<(usize, usize)>) {
        let nfa = compile(pattern, flags.case_insensitive).unwrap();
        let mut matches = MatchRecord::new();
        let status = search(buffer, &nfa, flags, &mut matches);
        let found: Vec<_> = matches.iter().map(|i| (i.start, i.end)).collect();
        (status, found)
    }

    #[test]
    fn simple_literal_matches_once() {
        let (status, found) = run(b"cat", b"a cat sat", Flags::default());
        assert_eq!(status, Status::Found);
        assert_eq!(found, vec![(2, 5)]);
    }

    #[test]
    fn alternation_finds_adjacent_matches() {
        let (status, found) = run(b"a|b", b"cab", Flags::default());
        assert_eq!(status, Status::Found);
        assert_eq!(found, vec![(1, 2), (2, 3)]);
    }

    #[test]
    fn negation_excludes_the_given_byte() {
        let (status, found) = run(b"!a", b"aba", Flags::default());
        assert_eq!(status, Status::Found);
        assert_eq!(found, vec![(1, 2)]);
    }

    #[test]
    fn empty_pattern_matches_without_recording_zero_width_intervals() {
        let (status, found) = run(b"", b"ab", Flags::default());
        assert_eq!(status, Status::Found);
        assert!(found.is_empty());
    }

    #[test]
    fn unterminated_partial_match_reports_progress() {
        let (status, found) = run(b"cat", b"a ca", Flags::default());
        assert_eq!(status, Status::Progress);
        assert!(found.is_empty());
    }

    #[test]
    fn whole_word_rejects_substring_matches() {
        let flags = Flags {
            whole_word: true,
            ..Flags::default()
        };
        let (status, found) = run(b"cat", b"concatenate", flags);
        assert_eq!(status, Status::None);
        assert!(found.is_empty());

        let (status, found) = run(b"cat", b"a cat sat", flags);
        assert_eq!(status, Status::Found);
        assert_eq!(found, vec![(2, 5)]);
    }

    #[test]
    fn whole_line_requires_full_span() {
        let flags = Flags {
            whole_line: true,
            ..Flags::default()
        };
        let (status, found) = run(b"cat", b"cat", flags);
        assert_eq!(status, Status::Found);
        assert_eq!(found, vec![(0, 3)]);

        let (status, found) = run(b"cat", b"a cat", flags);
        assert_eq!(status, Status::None);
        assert!(found.is_empty());
    }

    #[test]
    fn invert_toggles_found_and_none() {
        let flags = Flags {
            invert: true,
            ..Flags::default()
        };
        let (status, _) = run(b"cat", b"cat", flags);
        assert_eq!(status, Status::None);

        let (status, _) = run(b"cat", b"dog", flags);
        assert_eq!(status, Status::Found);
    }
}
