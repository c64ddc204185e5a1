//! CLI Exit Code Registry
//!
//! Single source of truth for `devintel` exit codes. Scripts that schedule
//! reports rely on them.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success                                             |
//! | 1    | General error (unspecified)                         |
//! | 2    | Usage error (bad arguments, unknown entity)         |
//! | 3    | Configuration file unreadable, malformed or invalid |
//! | 4    | No data: every selected entity loaded empty         |
//! | 5    | Report could not be written                         |
//!
//! A report with exit 4 is still printed; the code only tells a scheduler
//! that nothing was loaded.

/// Success.
pub const EXIT_SUCCESS: u8 = 0;

/// General error.
pub const EXIT_ERROR: u8 = 1;

/// Bad arguments or an entity that is not in the registry.
pub const EXIT_USAGE: u8 = 2;

/// Settings could not be loaded or failed validation.
pub const EXIT_CONFIG: u8 = 3;

/// Every selected entity contributed no rows.
pub const EXIT_NO_DATA: u8 = 4;

/// Writing the report (file or stdout) failed.
pub const EXIT_OUTPUT: u8 = 5;
