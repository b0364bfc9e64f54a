use std::io::{self, IsTerminal};
use std::process::ExitCode;

use url2pdf_lib::{ErrorCategory, ErrorPayload, RenderError};

/// Exit code for bad input or configuration.
pub const EXIT_USAGE: u8 = 2;

/// Exit code for every other failure.
pub const EXIT_FAILURE: u8 = 1;

/// Render an error to stderr and return the appropriate exit code.
pub fn render_error(err: RenderError) -> ExitCode {
    let payload = err.to_payload();
    let stderr_is_tty = io::stderr().is_terminal();
    eprintln!("{}", format_error(&payload, stderr_is_tty));
    ExitCode::from(exit_code(payload.category))
}

pub fn exit_code(category: ErrorCategory) -> u8 {
    match category {
        ErrorCategory::Validation | ErrorCategory::Config => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}

/// Human-readable text for terminals, JSON otherwise.
pub fn format_error(payload: &ErrorPayload, human: bool) -> String {
    if !human {
        return serde_json::to_string(payload)
            .unwrap_or_else(|_| format!("{{\"message\":{:?}}}", payload.message));
    }

    let mut out = format!("error: {}", payload.message);
    if let Some(hint) = &payload.remediation {
        out.push_str("\nhint: ");
        out.push_str(hint);
    }
    out
}
