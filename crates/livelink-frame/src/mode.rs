use std::fmt;

/// Wire format used for one listener or producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FramingMode {
    /// Connection-lifetime framing with the byte-matched sentinel.
    ///
    /// This is what unmodified asset browsers speak.
    #[default]
    Legacy,
    /// Length-prefixed frames with an explicit STOP kind.
    LengthPrefixed,
}

impl FramingMode {
    /// Short name used in logs and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            FramingMode::Legacy => "legacy",
            FramingMode::LengthPrefixed => "prefixed",
        }
    }
}

impl fmt::Display for FramingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
