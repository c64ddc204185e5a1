use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum IoError {
    /// Directory listing failed (missing directory, permissions).
    ListDir { path: String, message: String },
    /// File could not be opened or read.
    Read { path: String, message: String },
    /// Neither the primary nor the fallback text encoding could decode the file.
    Decode { path: String },
    /// CSV structure error.
    Csv { path: String, message: String },
    /// Workbook could not be opened or has no sheets.
    Workbook { path: String, message: String },
    /// A single sheet failed to read.
    Sheet { path: String, sheet: String, message: String },
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListDir { path, message } => write!(f, "cannot list {path}: {message}"),
            Self::Read { path, message } => write!(f, "cannot read {path}: {message}"),
            Self::Decode { path } => {
                write!(f, "cannot decode {path} as UTF-8 or Windows-1252")
            }
            Self::Csv { path, message } => write!(f, "CSV error in {path}: {message}"),
            Self::Workbook { path, message } => write!(f, "workbook error in {path}: {message}"),
            Self::Sheet { path, sheet, message } => {
                write!(f, "cannot read sheet '{sheet}' in {path}: {message}")
            }
        }
    }
}

impl std::error::Error for IoError {}
