//! A pattern-matching engine in the spirit of `grep`'s inner loop: a
//! recursive-descent compiler turns a small pattern language into an NFA,
//! and a concurrent simulator walks a byte buffer against it looking for
//! matches.
//!
//! ## Pattern language
//! Literal bytes match themselves; `.` matches any byte; `*`, `?`, and `+`
//! quantify the atom (group or single byte) immediately before them; `|`
//! separates alternatives; `(...)` groups a subexpression; `!` negates the
//! single atom that follows it; `\` escapes the next byte literally (`\t`
//! becomes a tab).
//!
//! ## Example
//! ```
//! use threadgrep_core::{compile, search, Flags, MatchRecord, Status};
//!
//! let nfa = compile(b"c.t|dog", false).unwrap();
//! let mut matches = MatchRecord::new();
//! let status = search(b"a cat sat with a dog", &nfa, Flags::default(), &mut matches);
//! assert_eq!(status, Status::Found);
//! ```
//!
//! Buffered file reading, recursive file enumeration, and terminal
//! coloring live in the companion binary crate; this crate only implements
//! the matching core.

mod arena;
mod compiler;
mod matchrecord;
mod simulator;

pub use compiler::{compile, Nfa, ParseError};
pub use matchrecord::{Interval, MatchRecord};
pub use simulator::{search, Flags, Status};
