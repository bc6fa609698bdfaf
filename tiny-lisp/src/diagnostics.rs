use std::fmt;

use crate::error::ParseError;

/// Renders parse errors compiler-style: header, location, the offending
/// source line and a caret under the failing token.
///
/// ```text
/// error[E_SYNTAX]: Syntax error at 1:13: expected RPAREN, found END (in DEFUN, in PROGRAM)
///   --> demo.lisp:1:13
///   |
/// 1 | (defun f (x)
///   |             ^
/// help: the input ends before this form is closed; add ')'
/// ```
pub struct DiagnosticPrinter {
    source: String,
    file_name: String,
}

impl DiagnosticPrinter {
    pub fn new(file_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            source: source.into(),
        }
    }

    pub fn render(&self, error: &ParseError) -> String {
        Report { printer: self, error }.to_string()
    }

    pub fn print(&self, error: &ParseError) {
        eprint!("{}", Report { printer: self, error });
    }

    pub fn write_report(&self, out: &mut impl fmt::Write, error: &ParseError) -> fmt::Result {
        let span = error.span();
        let src_line = self.source.lines().nth(span.line.saturating_sub(1)).unwrap_or("");

        // Underline the token, but never past the end of its line
        let width = self
            .source
            .get(span.start..span.end)
            .and_then(|text| text.lines().next())
            .map(|text| text.chars().count())
            .unwrap_or(0)
            .max(1);

        // Tabs are kept so the caret lines up with the source as printed
        let pad: String = src_line
            .chars()
            .take(span.column.saturating_sub(1))
            .map(|ch| if ch == '\t' { '\t' } else { ' ' })
            .collect();

        let gutter = span.line.to_string().len();

        writeln!(out, "error[{}]: {}", error.code(), error)?;
        writeln!(out, "{:gutter$}--> {}:{}", "", self.file_name, span, gutter = gutter + 1)?;
        writeln!(out, "{:gutter$} |", "")?;
        writeln!(out, "{} | {}", span.line, src_line)?;
        writeln!(out, "{:gutter$} | {}{}", "", pad, "^".repeat(width))?;
        if let Some(help) = error.help() {
            writeln!(out, "help: {}", help)?;
        }
        Ok(())
    }
}

struct Report<'a> {
    printer: &'a DiagnosticPrinter,
    error: &'a ParseError,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.printer.write_report(f, self.error)
    }
}
