use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;

/// Call site an endpoint or bridge error was raised from.
///
/// Built with [`ErrorLocation::caller`] inside `#[track_caller]` functions, so the
/// position recorded is the caller breaking the contract rather than the helper
/// that noticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorLocation {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl ErrorLocation {
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&'static Location<'static>> for ErrorLocation {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl Display for ErrorLocation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "[{}:{}:{}]", self.file, self.line, self.column)
    }
}
