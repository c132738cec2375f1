//! CLI Exit Code Registry
//!
//! Single source of truth for `creddedupe` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad arguments, unknown provider name)   |
//! | 3    | Input format could not be detected or was declined   |
//! | 4    | Input file unreadable, malformed or missing columns  |
//! | 5    | Output or audit log could not be written             |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown or unavailable provider.
pub const EXIT_USAGE: u8 = 2;

/// No adapter matched the input headers, or detection confidence was too
/// low and nobody confirmed the guess.
pub const EXIT_UNDETECTED: u8 = 3;

/// Input could not be read, parsed, or lacks the chosen adapter's columns.
pub const EXIT_BAD_INPUT: u8 = 4;

/// Output CSV or audit log could not be written.
pub const EXIT_WRITE: u8 = 5;
