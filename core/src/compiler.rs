//! Recursive-descent compiler from the pattern mini-language into an [`Nfa`].

use thiserror::Error;

use crate::arena::{Arena, StateId, TransitionFlag};

/// A compiled pattern: a state graph plus the two distinguished states every
/// search starts from and tries to reach.
#[derive(Debug, Clone)]
pub struct Nfa {
    pub(crate) arena: Arena,
    pub(crate) q0: StateId,
    pub(crate) qaccept: StateId,
}

impl Nfa {
    /// Number of states in the underlying arena. Exposed for debug printing
    /// and tests; not part of the matching contract.
    pub fn state_count(&self) -> usize {
        self.arena.state_count()
    }
}

/// Everything that can go wrong compiling a pattern.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A `(` was never closed by a matching `)`.
    #[error("unclosed group starting at byte {offset}")]
    UnclosedGroup { offset: usize },
    /// A `!` was immediately followed by a byte that cannot be negated
    /// (`( ) | * ? +`).
    #[error("'!' cannot negate the byte at position {offset}")]
    BadNegationTarget { offset: usize },
    /// The pattern ended in the middle of a `\` or `!\` escape.
    #[error("pattern ends mid-escape at byte {offset}")]
    TruncatedEscape { offset: usize },
}

/// Compiles `pattern` into an [`Nfa`].
///
/// When `case_insensitive` is set, ASCII letters in `pattern` are folded to
/// lowercase at compile time; matching folds the input buffer the same way
/// at search time.
pub fn compile(pattern: &[u8], case_insensitive: bool) -> Result<Nfa, ParseError> {
    let mut arena = Arena::new();
    let (q0, qaccept, _consumed) = compile_expr(pattern, 0, case_insensitive, &mut arena)?;
    Ok(Nfa { arena, q0, qaccept })
}

#[inline]
fn fold(byte: u8, case_insensitive: bool) -> u8 {
    if case_insensitive {
        byte.to_ascii_lowercase()
    } else {
        byte
    }
}

/// Compiles one expression (the top-level pattern, or the content of a
/// group) starting at `pattern[0]`. `base_offset` is added to local indices
/// when reporting errors, so messages point at the original pattern.
///
/// Returns `(q0, qaccept, consumed)` where `consumed` is the number of bytes
/// of `pattern` belonging to this expression -- callers resuming after a
/// nested group use it to find the matching `)`.
fn compile_expr(
    pattern: &[u8],
    base_offset: usize,
    case_insensitive: bool,
    arena: &mut Arena,
) -> Result<(StateId, StateId, usize), ParseError> {
    let q0 = arena.create_state();
    let qaccept = arena.create_state();
    let mut cur = q0;
    let mut prev: Option<StateId> = None;
    let mut i = 0;

    while i < pattern.len() {
        match pattern[i] {
            b'(' => {
                i += 1;
                if i >= pattern.len() {
                    return Err(ParseError::UnclosedGroup {
                        offset: base_offset + i,
                    });
                }
                if pattern[i] == b')' {
                    // `()` matches the empty string and contributes nothing;
                    // a single trailing quantifier is swallowed with it.
                    i += 1;
                    if matches!(pattern.get(i), Some(b'*') | Some(b'?') | Some(b'+')) {
                        i += 1;
                    }
                    continue;
                }
                let (sub_q0, sub_qaccept, sub_len) =
                    compile_expr(&pattern[i..], base_offset + i, case_insensitive, arena)?;
                for t in arena.transitions(sub_q0).to_vec() {
                    arena.add_transition(cur, t.symbol, t.flag, t.target);
                }
                prev = Some(cur);
                cur = sub_qaccept;
                i += sub_len;
                if pattern.get(i) != Some(&b')') {
                    return Err(ParseError::UnclosedGroup {
                        offset: base_offset + i,
                    });
                }
            }
            b')' => {
                arena.add_transition(cur, 0, TransitionFlag::Epsilon, qaccept);
                return Ok((q0, qaccept, i));
            }
            b'|' => {
                if cur != q0 {
                    arena.add_transition(cur, 0, TransitionFlag::Epsilon, qaccept);
                }
                cur = q0;
                prev = None;
            }
            b'.' => {
                let s = arena.create_state();
                arena.add_transition(cur, 0, TransitionFlag::Wildcard, s);
                prev = Some(cur);
                cur = s;
            }
            b'*' => {
                if prev != Some(cur) {
                    if let Some(p) = prev {
                        arena.add_transition(cur, 0, TransitionFlag::Epsilon, p);
                        cur = p;
                    }
                }
            }
            b'+' => {
                if prev != Some(cur) {
                    if let Some(p) = prev {
                        arena.add_transition(cur, 0, TransitionFlag::Epsilon, p);
                    }
                }
            }
            b'?' => {
                if prev != Some(cur) {
                    if let Some(p) = prev {
                        arena.add_transition(p, 0, TransitionFlag::Epsilon, cur);
                    }
                }
            }
            b'!' => {
                i += 1;
                if i >= pattern.len() {
                    return Err(ParseError::TruncatedEscape {
                        offset: base_offset + i,
                    });
                }
                match pattern[i] {
                    b'(' | b')' | b'|' | b'*' | b'?' | b'+' => {
                        return Err(ParseError::BadNegationTarget {
                            offset: base_offset + i,
                        });
                    }
                    b'!' | b'.' => {}
                    b'\\' => {
                        i += 1;
                        if i >= pattern.len() {
                            return Err(ParseError::TruncatedEscape {
                                offset: base_offset + i,
                            });
                        }
                        let sym = fold(unescape(pattern[i]), case_insensitive);
                        let s = arena.create_state();
                        arena.add_transition(cur, sym, TransitionFlag::Invert, s);
                        prev = Some(cur);
                        cur = s;
                    }
                    c => {
                        let sym = fold(c, case_insensitive);
                        let s = arena.create_state();
                        arena.add_transition(cur, sym, TransitionFlag::Invert, s);
                        prev = Some(cur);
                        cur = s;
                    }
                }
            }
            b'\\' => {
                i += 1;
                if i >= pattern.len() {
                    return Err(ParseError::TruncatedEscape {
                        offset: base_offset + i,
                    });
                }
                let sym = fold(unescape(pattern[i]), case_insensitive);
                let s = arena.create_state();
                arena.add_transition(cur, sym, TransitionFlag::Literal, s);
                prev = Some(cur);
                cur = s;
            }
            c => {
                let sym = fold(c, case_insensitive);
                let s = arena.create_state();
                arena.add_transition(cur, sym, TransitionFlag::Literal, s);
                prev = Some(cur);
                cur = s;
            }
        }
        i += 1;
    }

    arena.add_transition(cur, 0, TransitionFlag::Epsilon, qaccept);
    Ok((q0, qaccept, i))
}

#[inline]
fn unescape(byte: u8) -> u8 {
    if byte == b't' {
        b'\t'
    } else {
        byte
    }
}
