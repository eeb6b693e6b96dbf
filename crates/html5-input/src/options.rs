use crate::registry::DEFAULT_ENCODING_LABEL;

/// Configuration for encoding sniffing and chunked decoding.
///
/// The label fields correspond to the encoding hints an HTML user agent has
/// available before it looks at the document bytes. Each label goes through
/// [`lookup`](crate::lookup); labels that do not resolve are skipped by the
/// sniffing cascade rather than reported.
///
/// # Examples
///
/// ```rust
/// use html5_input::StreamOptions;
///
/// let options = StreamOptions {
///     transport_encoding: Some("Shift_JIS".into()),
///     use_statistical_detector: false,
///     ..Default::default()
/// };
/// assert_eq!(options.default_encoding, "windows-1252");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StreamOptions {
    /// Encoding chosen explicitly by the user; decided with certain
    /// confidence.
    ///
    /// # Default
    ///
    /// `None`
    pub override_encoding: Option<String>,

    /// Encoding declared by the transport layer, for example the `charset`
    /// parameter of an HTTP `Content-Type` header; decided with certain
    /// confidence.
    ///
    /// # Default
    ///
    /// `None`
    pub transport_encoding: Option<String>,

    /// Encoding of a same-origin parent browsing context. Ignored when it
    /// resolves to UTF-16.
    ///
    /// # Default
    ///
    /// `None`
    pub same_origin_parent_encoding: Option<String>,

    /// Best guess supplied by the caller, for example derived from the
    /// user's locale.
    ///
    /// # Default
    ///
    /// `None`
    pub likely_encoding: Option<String>,

    /// Fallback used when every other cascade step came up empty.
    ///
    /// # Default
    ///
    /// `"windows-1252"`
    pub default_encoding: String,

    /// Whether to sample the document through the statistical detector
    /// before falling back to `default_encoding`. Has no effect when the
    /// crate is built without the `chardetng` feature.
    ///
    /// # Default
    ///
    /// `true`
    pub use_statistical_detector: bool,

    /// Number of bytes pulled from the source per chunk refill.
    ///
    /// # Default
    ///
    /// `10240`
    pub chunk_size: usize,

    /// Number of leading bytes examined by the `<meta>` prescan.
    ///
    /// # Default
    ///
    /// `1024`
    pub meta_prescan_bytes: usize,

    /// Size of each sample fed to the statistical detector.
    ///
    /// # Default
    ///
    /// `100`
    pub detector_sample_bytes: usize,

    /// Upper bound on the bytes the statistical detector reads in total.
    ///
    /// # Default
    ///
    /// `65536`
    pub detector_max_bytes: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            override_encoding: None,
            transport_encoding: None,
            same_origin_parent_encoding: None,
            likely_encoding: None,
            default_encoding: DEFAULT_ENCODING_LABEL.to_owned(),
            use_statistical_detector: true,
            chunk_size: 10240,
            meta_prescan_bytes: 1024,
            detector_sample_bytes: 100,
            detector_max_bytes: 64 * 1024,
        }
    }
}
