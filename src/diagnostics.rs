use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config::DiagnosticsConfig;
use crate::parser::symbols::Location;

/// Totally ordered severity scale used for both emitted levels and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Debug => write!(f, "debug"),
            Severity::Info => write!(f, "info"),
            Severity::Warn => write!(f, "warn"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    /// A registration call whose arguments do not have the expected shape.
    RegistrationShape,
    /// The same class name registered by two different files.
    DuplicateClass,
    /// The parser had to recover from a syntax error.
    SyntaxError,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::RegistrationShape => "registration-shape",
            DiagnosticCode::DuplicateClass => "duplicate-class",
            DiagnosticCode::SyntaxError => "syntax-error",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticCode::RegistrationShape => Severity::Warn,
            DiagnosticCode::DuplicateClass => Severity::Warn,
            DiagnosticCode::SyntaxError => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagnosticCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration-shape" => Ok(DiagnosticCode::RegistrationShape),
            "duplicate-class" => Ok(DiagnosticCode::DuplicateClass),
            "syntax-error" => Ok(DiagnosticCode::SyntaxError),
            other => Err(format!("unknown diagnostic code: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    /// Severity after applying the per-code level override.
    pub severity: Severity,
    pub message: String,
    pub location: Option<Location>,
    pub surfaced: bool,
}

/// Explicit diagnostics sink passed to every operation that can report.
///
/// Every reported diagnostic is recorded; `levels` and `thresholds` only
/// decide whether it is surfaced.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    levels: HashMap<DiagnosticCode, Severity>,
    thresholds: HashMap<DiagnosticCode, Severity>,
    default_threshold: Severity,
    generated: Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            levels: HashMap::new(),
            thresholds: HashMap::new(),
            default_threshold: Severity::Warn,
            generated: Vec::new(),
        }
    }

    pub fn from_config(config: &DiagnosticsConfig) -> Self {
        let mut diagnostics = Self::new();
        diagnostics.default_threshold = config.default_threshold;

        for (code, severity) in &config.levels {
            match code.parse::<DiagnosticCode>() {
                Ok(code) => diagnostics.set_level(code, *severity),
                Err(e) => tracing::warn!("ignoring diagnostics level: {}", e),
            }
        }
        for (code, severity) in &config.thresholds {
            match code.parse::<DiagnosticCode>() {
                Ok(code) => diagnostics.set_threshold(code, *severity),
                Err(e) => tracing::warn!("ignoring diagnostics threshold: {}", e),
            }
        }

        diagnostics
    }

    pub fn set_level(&mut self, code: DiagnosticCode, severity: Severity) {
        self.levels.insert(code, severity);
    }

    pub fn set_threshold(&mut self, code: DiagnosticCode, severity: Severity) {
        self.thresholds.insert(code, severity);
    }

    pub fn effective_severity(&self, code: DiagnosticCode, default_severity: Severity) -> Severity {
        self.levels.get(&code).copied().unwrap_or(default_severity)
    }

    pub fn effective_threshold(&self, code: DiagnosticCode) -> Severity {
        self.thresholds
            .get(&code)
            .copied()
            .unwrap_or(self.default_threshold)
    }

    /// Record a diagnostic. Returns whether it was surfaced.
    pub fn report(
        &mut self,
        code: DiagnosticCode,
        default_severity: Severity,
        message: impl Into<String>,
        location: Option<Location>,
    ) -> bool {
        let severity = self.effective_severity(code, default_severity);
        let surfaced = severity >= self.effective_threshold(code);
        let message = message.into();

        if surfaced {
            let at = location
                .as_ref()
                .map(|l| l.to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            match severity {
                Severity::Error => tracing::error!(code = %code, "{} ({})", message, at),
                Severity::Warn => tracing::warn!(code = %code, "{} ({})", message, at),
                Severity::Info => tracing::info!(code = %code, "{} ({})", message, at),
                Severity::Debug => tracing::debug!(code = %code, "{} ({})", message, at),
            }
        }

        self.generated.push(Diagnostic {
            code,
            severity,
            message,
            location,
            surfaced,
        });
        surfaced
    }

    /// Every diagnostic generated so far, surfaced or not.
    pub fn all(&self) -> &[Diagnostic] {
        &self.generated
    }

    pub fn surfaced(&self) -> impl Iterator<Item = &Diagnostic> {
        self.generated.iter().filter(|d| d.surfaced)
    }

    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.generated.iter().filter(|d| d.code == code).count()
    }

    pub fn len(&self) -> usize {
        self.generated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generated.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_default_threshold_surfaces_warnings() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.report(DiagnosticCode::RegistrationShape, Severity::Warn, "bad", None));
        assert!(!diagnostics.report(DiagnosticCode::SyntaxError, Severity::Info, "recovered", None));

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.surfaced().count(), 1);
    }

    #[test]
    fn test_threshold_override_suppresses() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.set_threshold(DiagnosticCode::RegistrationShape, Severity::Error);

        assert!(!diagnostics.report(DiagnosticCode::RegistrationShape, Severity::Warn, "bad", None));
        assert!(diagnostics.report(DiagnosticCode::DuplicateClass, Severity::Warn, "dup", None));
        assert_eq!(diagnostics.count(DiagnosticCode::RegistrationShape), 1);
    }

    #[test]
    fn test_level_override_downgrades() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.set_level(DiagnosticCode::RegistrationShape, Severity::Debug);

        assert!(!diagnostics.report(DiagnosticCode::RegistrationShape, Severity::Warn, "bad", None));
        assert_eq!(diagnostics.all()[0].severity, Severity::Debug);
    }

    #[test]
    fn test_from_config_ignores_unknown_codes() {
        let mut config = DiagnosticsConfig::default();
        config.levels.insert("registration-shape".to_string(), Severity::Error);
        config.thresholds.insert("no-such-code".to_string(), Severity::Debug);

        let diagnostics = Diagnostics::from_config(&config);
        assert_eq!(
            diagnostics.effective_severity(DiagnosticCode::RegistrationShape, Severity::Warn),
            Severity::Error
        );
        assert_eq!(diagnostics.effective_threshold(DiagnosticCode::DuplicateClass), Severity::Warn);
    }
}
