//! Configuration options for the JSON streaming parser.
//!
//! ## Examples
//!
//! ```rust
//! use sprig_bson::{from_json_with_options, ParserOptions};
//!
//! let options = ParserOptions::new().with_max_depth(2);
//! assert!(from_json_with_options("[[1]]", options.clone()).is_ok());
//!
//! let err = from_json_with_options("[[[1]]]", options).unwrap_err();
//! assert_eq!(err.to_string(), "Maximum nesting depth of 2 exceeded at position : 3");
//! ```

/// Configuration options for [`JsonParser`](crate::JsonParser).
///
/// # Examples
///
/// ```rust
/// use sprig_bson::ParserOptions;
///
/// // No nesting cap
/// let options = ParserOptions::new();
/// assert_eq!(options.max_depth, None);
///
/// // At most 64 open containers
/// let options = ParserOptions::new().with_max_depth(64);
/// assert_eq!(options.max_depth, Some(64));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Most containers that may be open at once. `None` leaves nesting
    /// bounded only by memory.
    pub max_depth: Option<usize>,
}

impl ParserOptions {
    /// Creates default options (no nesting cap).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the nesting depth. Opening one container more fails at the
    /// position of its bracket.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Removes the nesting cap.
    #[must_use]
    pub fn without_max_depth(mut self) -> Self {
        self.max_depth = None;
        self
    }
}
