/// Parser options for controlling error handling and recovery behavior.
///
/// The single `lenient` flag decides between "attempt recovery and continue"
/// and "fail fast on the first structural violation". The remaining fields are
/// resource limits that hold in both modes.
///
/// # Example
///
/// ```
/// use pdf_strata::parser_config::ParserOptions;
///
/// let strict = ParserOptions::strict();
/// assert!(!strict.lenient);
///
/// let custom = ParserOptions {
///     max_nesting: 32,
///     ..ParserOptions::lenient()
/// };
/// assert!(custom.lenient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Attempt recovery (true) or fail on first violation (false)
    pub lenient: bool,

    /// Maximum nesting depth of arrays and dictionaries
    ///
    /// PDF Spec: ISO 32000-1:2008, Section H.1 - Implementation Limits
    pub max_nesting: usize,

    /// Maximum number of cross-reference sections followed through `/Prev` and `/XRefStm`
    pub max_prev_chain: usize,

    /// Maximum entry count accepted in one classic subsection header
    pub max_subsection_count: u64,

    /// Maximum `/N` accepted for an object stream
    pub max_object_stream_objects: usize,

    /// Number of trailing bytes searched for the `startxref` keyword
    pub startxref_window: u64,
}

impl ParserOptions {
    /// Fail fast on any structural violation.
    pub fn strict() -> Self {
        Self {
            lenient: false,
            ..Self::lenient()
        }
    }

    /// Recover wherever a documented recovery path exists.
    pub fn lenient() -> Self {
        Self {
            lenient: true,
            max_nesting: 100,
            max_prev_chain: 1_000,
            max_subsection_count: 1_000_000,
            max_object_stream_objects: 1_000_000,
            startxref_window: 2048,
        }
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::lenient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lenient() {
        assert_eq!(ParserOptions::default(), ParserOptions::lenient());
    }

    #[test]
    fn test_strict_keeps_limits() {
        let strict = ParserOptions::strict();
        let lenient = ParserOptions::lenient();
        assert!(!strict.lenient);
        assert_eq!(strict.max_nesting, lenient.max_nesting);
        assert_eq!(strict.startxref_window, 2048);
    }
}
