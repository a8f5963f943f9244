use std::fmt;

/// ## Diagnostics
///
/// One type carries every problem the interpreter reports: compile errors
/// with a source line, runtime errors with the program counter they
/// happened at, and the warnings of both kinds.

#[derive(Clone, PartialEq)]
pub struct Error {
    code: ErrorCode,
    severity: Severity,
    source: Option<String>,
    line_number: Option<usize>,
    location: Option<Location>,
    message: String,
}

/// Program counter of a runtime diagnostic, with the function resolved
/// to its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub function: String,
    pub address: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code,
            severity: code.severity(),
            source: None,
            line_number: None,
            location: None,
            message: String::new(),
        }
    }

    pub fn in_line_number(mut self, line: usize) -> Error {
        self.line_number = Some(line);
        self
    }

    pub fn in_source(mut self, name: &str) -> Error {
        self.source = Some(name.to_string());
        self
    }

    pub fn at(mut self, function: &str, address: usize) -> Error {
        self.location = Some(Location {
            function: function.to_string(),
            address,
        });
        self
    }

    pub fn message<S: Into<String>>(mut self, message: S) -> Error {
        self.message = message.into();
        self
    }

    /// Portability warnings become errors under `--standard`.
    pub fn escalate(mut self) -> Error {
        if self.severity == Severity::Warning {
            self.severity = Severity::Error;
        }
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    pub fn line_number(&self) -> Option<usize> {
        self.line_number
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn text(&self) -> &str {
        if self.message.is_empty() {
            self.code.default_message()
        } else {
            &self.message
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    SyntaxError,
    DuplicateParameter,
    DuplicateAuto,
    ParameterAndAuto,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    ReturnOutsideFunction,
    NotStandard,
    InvalidNumber,
    DivisionByZero,
    ModuloByZero,
    NonIntegerExponent,
    ExponentTooLarge,
    NegativeOperand,
    ArgumentCountMismatch,
    ParameterTypeMismatch,
    UndefinedFunction,
    SubscriptOutOfRange,
    ReturnFromMain,
    Interrupted,
    StackOverflow,
    StackUnderflow,
    RegisterClamped,
    TooManyIdentifiers,
    InternalError,
}

impl ErrorCode {
    pub fn severity(self) -> Severity {
        match self {
            ErrorCode::NotStandard | ErrorCode::RegisterClamped => Severity::Warning,
            ErrorCode::TooManyIdentifiers => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    fn default_message(self) -> &'static str {
        use ErrorCode::*;
        match self {
            SyntaxError => "syntax error",
            DuplicateParameter => "duplicate parameter names",
            DuplicateAuto => "duplicate auto variable names",
            ParameterAndAuto => "variable in both parameter and auto lists",
            BreakOutsideLoop => "Break outside a for/while",
            ContinueOutsideLoop => "Continue outside a for/while",
            ReturnOutsideFunction => "Return outside of a function.",
            NotStandard => "non-standard feature",
            InvalidNumber => "invalid number",
            DivisionByZero => "Divide by zero",
            ModuloByZero => "Modulo by zero",
            NonIntegerExponent => "Non-zero scale in exponent",
            ExponentTooLarge => "exponent too large in raise",
            NegativeOperand => "Square root of a negative number",
            ArgumentCountMismatch => "Parameter number mismatch",
            ParameterTypeMismatch => "Parameter type mismatch",
            UndefinedFunction => "Function not defined.",
            SubscriptOutOfRange => "Array subscript out of bounds.",
            ReturnFromMain => "Return from main program.",
            Interrupted => "interrupted execution",
            StackOverflow => "Stack overflow.",
            StackUnderflow => "Stack error.",
            RegisterClamped => "register out of range",
            TooManyIdentifiers => "Too many identifiers",
            InternalError => "internal error",
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error {{ {} }}", self)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            let kind = if self.is_warning() { "warning" } else { "error" };
            return write!(
                f,
                "Runtime {} (func={}, adr={}): {}",
                kind,
                location.function,
                location.address,
                self.text()
            );
        }
        let source = self.source.as_deref().unwrap_or("(standard_in)");
        match self.line_number {
            Some(line) => write!(f, "{} {}: ", source, line)?,
            None => write!(f, "{}: ", source)?,
        }
        if self.is_warning() {
            write!(f, "(Warning) ")?;
        }
        write!(f, "{}", self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_format() {
        let e = error!(SyntaxError, 3);
        assert_eq!(e.to_string(), "(standard_in) 3: syntax error");
        let e = error!(DuplicateParameter, 7).in_source("lib.b");
        assert_eq!(e.to_string(), "lib.b 7: duplicate parameter names");
    }

    #[test]
    fn test_warning_format_and_escalation() {
        let w = error!(NotStandard, 2; "multiple letter name - abc");
        assert!(w.is_warning());
        assert_eq!(
            w.to_string(),
            "(standard_in) 2: (Warning) multiple letter name - abc"
        );
        let e = w.escalate();
        assert!(!e.is_warning());
        assert_eq!(e.to_string(), "(standard_in) 2: multiple letter name - abc");
    }

    #[test]
    fn test_runtime_format() {
        let e = error!(DivisionByZero).at("f", 12);
        assert_eq!(e.to_string(), "Runtime error (func=f, adr=12): Divide by zero");
        let w = error!(RegisterClamped; "scale too large, set to 9").at("(main)", 3);
        assert_eq!(
            w.to_string(),
            "Runtime warning (func=(main), adr=3): scale too large, set to 9"
        );
    }

    #[test]
    fn test_fatal() {
        assert!(error!(TooManyIdentifiers).is_fatal());
        assert!(!error!(StackUnderflow).is_fatal());
    }
}
