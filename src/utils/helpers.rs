/// Helper utilities for formatting and classifying metric values

/// Utilization bands used for color coding across the TUI and the status
/// command. Boundaries: below 50 is normal, 50 up to 80 elevated, 80 and
/// above critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Normal,
    Elevated,
    Critical,
}

impl UsageLevel {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 80.0 {
            UsageLevel::Critical
        } else if percent >= 50.0 {
            UsageLevel::Elevated
        } else {
            UsageLevel::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UsageLevel::Normal => "ok",
            UsageLevel::Elevated => "elevated",
            UsageLevel::Critical => "critical",
        }
    }
}

/// Render an optional percentage, falling back to "n/a" for values the
/// backend did not report
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v),
        None => "n/a".to_string(),
    }
}

/// Render an optional string field with the documented fallback
pub fn display_or_unknown(value: Option<&str>) -> &str {
    match value {
        Some(s) if !s.is_empty() => s,
        _ => "Unknown",
    }
}
