//! Shared value types: language hints, recording timeouts, focus handles.

use std::fmt;

/// Opaque handle to the UI context that was focused before recording began.
///
/// The core never interprets the value; it is captured from the focus-tracking
/// collaborator at recording start and handed back when restoring focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FocusHandle(pub u64);

/// Language hint sent to the transcription service.
///
/// `Auto` means the `language` parameter is omitted entirely and the remote
/// service detects the language itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageHint {
    #[default]
    Auto,
    English,
    Russian,
    Chinese,
    Spanish,
    French,
    German,
    Japanese,
    Korean,
    Portuguese,
    Italian,
    Dutch,
    Arabic,
    Turkish,
    Polish,
    Ukrainian,
    Swedish,
    Norwegian,
    Danish,
    Finnish,
    Czech,
    Hungarian,
    Romanian,
    Bulgarian,
    Croatian,
    Slovak,
    Slovenian,
    Estonian,
    Latvian,
    Lithuanian,
    Hindi,
    Thai,
    Vietnamese,
    Indonesian,
    Malay,
    Hebrew,
    Greek,
}

impl LanguageHint {
    /// Two-letter ISO code for the request, or `None` for auto-detect.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            LanguageHint::Auto => None,
            LanguageHint::English => Some("en"),
            LanguageHint::Russian => Some("ru"),
            LanguageHint::Chinese => Some("zh"),
            LanguageHint::Spanish => Some("es"),
            LanguageHint::French => Some("fr"),
            LanguageHint::German => Some("de"),
            LanguageHint::Japanese => Some("ja"),
            LanguageHint::Korean => Some("ko"),
            LanguageHint::Portuguese => Some("pt"),
            LanguageHint::Italian => Some("it"),
            LanguageHint::Dutch => Some("nl"),
            LanguageHint::Arabic => Some("ar"),
            LanguageHint::Turkish => Some("tr"),
            LanguageHint::Polish => Some("pl"),
            LanguageHint::Ukrainian => Some("uk"),
            LanguageHint::Swedish => Some("sv"),
            LanguageHint::Norwegian => Some("no"),
            LanguageHint::Danish => Some("da"),
            LanguageHint::Finnish => Some("fi"),
            LanguageHint::Czech => Some("cs"),
            LanguageHint::Hungarian => Some("hu"),
            LanguageHint::Romanian => Some("ro"),
            LanguageHint::Bulgarian => Some("bg"),
            LanguageHint::Croatian => Some("hr"),
            LanguageHint::Slovak => Some("sk"),
            LanguageHint::Slovenian => Some("sl"),
            LanguageHint::Estonian => Some("et"),
            LanguageHint::Latvian => Some("lv"),
            LanguageHint::Lithuanian => Some("lt"),
            LanguageHint::Hindi => Some("hi"),
            LanguageHint::Thai => Some("th"),
            LanguageHint::Vietnamese => Some("vi"),
            LanguageHint::Indonesian => Some("id"),
            LanguageHint::Malay => Some("ms"),
            LanguageHint::Hebrew => Some("he"),
            LanguageHint::Greek => Some("el"),
        }
    }

    /// Parse a two-letter ISO code (or "auto"). Unknown codes return `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        let hint = match code {
            "auto" => LanguageHint::Auto,
            "en" => LanguageHint::English,
            "ru" => LanguageHint::Russian,
            "zh" => LanguageHint::Chinese,
            "es" => LanguageHint::Spanish,
            "fr" => LanguageHint::French,
            "de" => LanguageHint::German,
            "ja" => LanguageHint::Japanese,
            "ko" => LanguageHint::Korean,
            "pt" => LanguageHint::Portuguese,
            "it" => LanguageHint::Italian,
            "nl" => LanguageHint::Dutch,
            "ar" => LanguageHint::Arabic,
            "tr" => LanguageHint::Turkish,
            "pl" => LanguageHint::Polish,
            "uk" => LanguageHint::Ukrainian,
            "sv" => LanguageHint::Swedish,
            "no" => LanguageHint::Norwegian,
            "da" => LanguageHint::Danish,
            "fi" => LanguageHint::Finnish,
            "cs" => LanguageHint::Czech,
            "hu" => LanguageHint::Hungarian,
            "ro" => LanguageHint::Romanian,
            "bg" => LanguageHint::Bulgarian,
            "hr" => LanguageHint::Croatian,
            "sk" => LanguageHint::Slovak,
            "sl" => LanguageHint::Slovenian,
            "et" => LanguageHint::Estonian,
            "lv" => LanguageHint::Latvian,
            "lt" => LanguageHint::Lithuanian,
            "hi" => LanguageHint::Hindi,
            "th" => LanguageHint::Thai,
            "vi" => LanguageHint::Vietnamese,
            "id" => LanguageHint::Indonesian,
            "ms" => LanguageHint::Malay,
            "he" => LanguageHint::Hebrew,
            "el" => LanguageHint::Greek,
            _ => return None,
        };
        Some(hint)
    }
}

impl fmt::Display for LanguageHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{}", code),
            None => write!(f, "auto"),
        }
    }
}

/// Maximum recording duration before the session auto-stops.
///
/// Only a small fixed set of durations is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingTimeout {
    #[default]
    OneMinute,
    TwoMinutes,
    FiveMinutes,
}

impl RecordingTimeout {
    /// Timeout in whole seconds.
    pub fn secs(&self) -> u64 {
        match self {
            RecordingTimeout::OneMinute => 60,
            RecordingTimeout::TwoMinutes => 120,
            RecordingTimeout::FiveMinutes => 300,
        }
    }

    /// Parse a duration in seconds. Only 60, 120, and 300 are valid.
    pub fn from_secs(secs: u64) -> Option<Self> {
        match secs {
            60 => Some(RecordingTimeout::OneMinute),
            120 => Some(RecordingTimeout::TwoMinutes),
            300 => Some(RecordingTimeout::FiveMinutes),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_auto_has_no_code() {
        assert_eq!(LanguageHint::Auto.code(), None);
    }

    #[test]
    fn test_language_codes_round_trip() {
        let hints = [
            LanguageHint::English,
            LanguageHint::Russian,
            LanguageHint::Chinese,
            LanguageHint::Japanese,
            LanguageHint::Ukrainian,
            LanguageHint::Greek,
        ];
        for hint in hints {
            let code = hint.code().unwrap();
            assert_eq!(LanguageHint::from_code(code), Some(hint));
        }
    }

    #[test]
    fn test_language_from_code_auto() {
        assert_eq!(LanguageHint::from_code("auto"), Some(LanguageHint::Auto));
    }

    #[test]
    fn test_language_from_code_unknown() {
        assert_eq!(LanguageHint::from_code("xx"), None);
        assert_eq!(LanguageHint::from_code(""), None);
    }

    #[test]
    fn test_language_display() {
        assert_eq!(LanguageHint::Auto.to_string(), "auto");
        assert_eq!(LanguageHint::English.to_string(), "en");
        assert_eq!(LanguageHint::Hebrew.to_string(), "he");
    }

    #[test]
    fn test_language_default_is_auto() {
        assert_eq!(LanguageHint::default(), LanguageHint::Auto);
    }

    #[test]
    fn test_recording_timeout_secs() {
        assert_eq!(RecordingTimeout::OneMinute.secs(), 60);
        assert_eq!(RecordingTimeout::TwoMinutes.secs(), 120);
        assert_eq!(RecordingTimeout::FiveMinutes.secs(), 300);
    }

    #[test]
    fn test_recording_timeout_from_secs() {
        assert_eq!(
            RecordingTimeout::from_secs(60),
            Some(RecordingTimeout::OneMinute)
        );
        assert_eq!(
            RecordingTimeout::from_secs(300),
            Some(RecordingTimeout::FiveMinutes)
        );
        assert_eq!(RecordingTimeout::from_secs(90), None);
        assert_eq!(RecordingTimeout::from_secs(0), None);
    }

    #[test]
    fn test_recording_timeout_default() {
        assert_eq!(RecordingTimeout::default(), RecordingTimeout::OneMinute);
    }

    #[test]
    fn test_recording_timeout_as_duration() {
        assert_eq!(
            RecordingTimeout::TwoMinutes.as_duration(),
            std::time::Duration::from_secs(120)
        );
    }

    #[test]
    fn test_focus_handle_copy_semantics() {
        let handle = FocusHandle(0x1234);
        let copy = handle;
        assert_eq!(handle, copy);
        assert_eq!(copy.0, 0x1234);
    }
}
