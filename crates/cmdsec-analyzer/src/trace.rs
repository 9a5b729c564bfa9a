//! Optional per-class narration.

/// Trace lines, collected only when enabled.
///
/// Messages are built lazily so a disabled log costs nothing beyond the
/// check.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    lines: Option<Vec<String>>,
}

impl TraceLog {
    pub fn new(enabled: bool) -> Self {
        Self {
            lines: enabled.then(Vec::new),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.lines.is_some()
    }

    pub fn line(&mut self, message: impl FnOnce() -> String) {
        if let Some(lines) = self.lines.as_mut() {
            lines.push(message());
        }
    }

    pub fn lines(&self) -> &[String] {
        self.lines.as_deref().unwrap_or(&[])
    }

    pub fn take(&mut self) -> Vec<String> {
        self.lines.as_mut().map(std::mem::take).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_log_skips_messages() {
        let mut log = TraceLog::disabled();
        log.line(|| panic!("message built while disabled"));
        assert!(log.lines().is_empty());
    }

    #[test]
    fn test_take_keeps_log_enabled() {
        let mut log = TraceLog::new(true);
        log.line(|| "one".to_string());
        assert_eq!(log.take(), vec!["one"]);
        assert!(log.is_enabled());
        assert!(log.lines().is_empty());
    }
}
