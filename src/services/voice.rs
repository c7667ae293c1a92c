//! Voice control — server-side mirror of a tab's speech recognizer.
//!
//! DESIGN
//! ======
//! Recognition runs in the browser; the tab reports lifecycle events and the
//! server keeps the authoritative status so only one recognition session is
//! active per connection and transcripts are routed exactly once.
//!
//! ```text
//! idle       --start-->  listening
//! listening  --start/stop--> idle
//! listening  --result--> processing --finish--> idle
//! listening  --error-->  error  (not aborted / no-speech)
//! any but processing --end--> idle
//! ```

use std::fmt;
use std::str::FromStr;

/// Recognizer errors that are routine and never surface to the user.
const BENIGN_ERRORS: &[&str] = &["aborted", "no-speech"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceStatus {
    #[default]
    Idle,
    Listening,
    Processing,
    Error,
}

impl VoiceStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Processing => "processing",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for VoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecognitionLocale {
    #[default]
    ArSa,
    EnUs,
}

impl RecognitionLocale {
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::ArSa => "ar-SA",
            Self::EnUs => "en-US",
        }
    }
}

impl FromStr for RecognitionLocale {
    type Err = VoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ar-SA" => Ok(Self::ArSa),
            "en-US" => Ok(Self::EnUs),
            other => Err(VoiceError::UnsupportedLocale(other.to_owned())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VoiceError {
    #[error("unsupported recognition locale '{0}' (expected ar-SA or en-US)")]
    UnsupportedLocale(String),
    #[error("no recognition in progress (status {0})")]
    NotListening(VoiceStatus),
    #[error("empty transcript")]
    EmptyTranscript,
}

impl crate::frame::ErrorCode for VoiceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedLocale(_) => "E_VOICE_LOCALE",
            Self::NotListening(_) => "E_VOICE_STATE",
            Self::EmptyTranscript => "E_VOICE_TRANSCRIPT",
        }
    }
}

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Recognition began; the tab should start its recognizer.
    Started,
    /// A start while listening acts as stop.
    Stopped,
    /// Busy processing or showing an error; nothing changed.
    Refused,
}

#[derive(Debug, Clone, Default)]
pub struct VoiceControl {
    status: VoiceStatus,
    locale: RecognitionLocale,
}

impl VoiceControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(&self) -> VoiceStatus {
        self.status
    }

    #[must_use]
    pub fn locale(&self) -> RecognitionLocale {
        self.locale
    }

    /// Takes effect on the next recognition session.
    pub fn set_locale(&mut self, locale: RecognitionLocale) {
        self.locale = locale;
    }

    pub fn start(&mut self) -> StartOutcome {
        match self.status {
            VoiceStatus::Idle => {
                self.status = VoiceStatus::Listening;
                StartOutcome::Started
            }
            VoiceStatus::Listening => {
                self.status = VoiceStatus::Idle;
                StartOutcome::Stopped
            }
            VoiceStatus::Processing | VoiceStatus::Error => StartOutcome::Refused,
        }
    }

    /// Explicit stop. Returns true if a recognition session was running.
    pub fn stop(&mut self) -> bool {
        if self.status == VoiceStatus::Listening {
            self.status = VoiceStatus::Idle;
            true
        } else {
            false
        }
    }

    /// Accept a final transcript and enter `processing`. The returned text
    /// is what should be submitted to the command bar.
    ///
    /// # Errors
    ///
    /// Fails if no recognition is running or the transcript is blank.
    pub fn on_result(&mut self, transcript: &str) -> Result<String, VoiceError> {
        if self.status != VoiceStatus::Listening {
            return Err(VoiceError::NotListening(self.status));
        }
        let text = transcript.trim();
        if text.is_empty() {
            return Err(VoiceError::EmptyTranscript);
        }
        self.status = VoiceStatus::Processing;
        Ok(text.to_owned())
    }

    /// The routed command has been handed off.
    pub fn finish_processing(&mut self) {
        if self.status == VoiceStatus::Processing {
            self.status = VoiceStatus::Idle;
        }
    }

    /// Recognizer error. Returns the toast text for errors worth showing.
    pub fn on_error(&mut self, code: &str) -> Option<String> {
        if BENIGN_ERRORS.contains(&code) || self.status != VoiceStatus::Listening {
            return None;
        }
        self.status = VoiceStatus::Error;
        Some(match self.locale {
            RecognitionLocale::ArSa => format!("خطأ في الصوت: {code}"),
            RecognitionLocale::EnUs => format!("Voice error: {code}"),
        })
    }

    /// Recognizer ended. Everything but `processing` settles to idle.
    pub fn on_end(&mut self) {
        if self.status != VoiceStatus::Processing {
            self.status = VoiceStatus::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listening() -> VoiceControl {
        let mut v = VoiceControl::new();
        assert_eq!(v.start(), StartOutcome::Started);
        v
    }

    #[test]
    fn defaults_to_idle_arabic() {
        let v = VoiceControl::new();
        assert_eq!(v.status(), VoiceStatus::Idle);
        assert_eq!(v.locale().tag(), "ar-SA");
    }

    #[test]
    fn happy_path_returns_to_idle() {
        let mut v = listening();
        assert_eq!(v.on_result("  open notepad ").unwrap(), "open notepad");
        assert_eq!(v.status(), VoiceStatus::Processing);

        // end arrives while processing and must not cut it short
        v.on_end();
        assert_eq!(v.status(), VoiceStatus::Processing);

        v.finish_processing();
        assert_eq!(v.status(), VoiceStatus::Idle);
    }

    #[test]
    fn start_while_listening_stops() {
        let mut v = listening();
        assert_eq!(v.start(), StartOutcome::Stopped);
        assert_eq!(v.status(), VoiceStatus::Idle);
    }

    #[test]
    fn start_is_refused_while_busy() {
        let mut v = listening();
        v.on_result("hi").unwrap();
        assert_eq!(v.start(), StartOutcome::Refused);

        let mut v = listening();
        v.on_error("network");
        assert_eq!(v.start(), StartOutcome::Refused);
        assert_eq!(v.status(), VoiceStatus::Error);
    }

    #[test]
    fn benign_errors_are_silent() {
        let mut v = listening();
        assert!(v.on_error("aborted").is_none());
        assert!(v.on_error("no-speech").is_none());
        assert_eq!(v.status(), VoiceStatus::Listening);
    }

    #[test]
    fn error_message_follows_locale() {
        let mut v = listening();
        assert_eq!(v.on_error("network").as_deref(), Some("خطأ في الصوت: network"));

        let mut v = VoiceControl::new();
        v.set_locale(RecognitionLocale::EnUs);
        v.start();
        assert_eq!(v.on_error("not-allowed").as_deref(), Some("Voice error: not-allowed"));
    }

    #[test]
    fn end_clears_error() {
        let mut v = listening();
        v.on_error("audio-capture");
        v.on_end();
        assert_eq!(v.status(), VoiceStatus::Idle);
        assert_eq!(v.start(), StartOutcome::Started);
    }

    #[test]
    fn result_requires_listening() {
        let mut v = VoiceControl::new();
        assert_eq!(v.on_result("x").unwrap_err(), VoiceError::NotListening(VoiceStatus::Idle));

        let mut v = listening();
        assert_eq!(v.on_result("   ").unwrap_err(), VoiceError::EmptyTranscript);
        assert_eq!(v.status(), VoiceStatus::Listening);
    }

    #[test]
    fn stop_only_affects_listening() {
        let mut v = VoiceControl::new();
        assert!(!v.stop());
        let mut v = listening();
        assert!(v.stop());
        assert_eq!(v.status(), VoiceStatus::Idle);
    }

    #[test]
    fn locale_parsing() {
        assert_eq!("en-US".parse::<RecognitionLocale>().unwrap(), RecognitionLocale::EnUs);
        assert!(matches!(
            "fr-FR".parse::<RecognitionLocale>(),
            Err(VoiceError::UnsupportedLocale(ref l)) if l == "fr-FR"
        ));
    }
}
