//! Capability interface for pooled decompression engines

use std::fmt;

/// Stream framing an engine is built for.
///
/// The variant is fixed when an engine is created and selects which reuse
/// queue the engine belongs to.
///
/// # Examples
///
/// ```
/// use esox_inflaterpool::Variant;
///
/// assert_eq!(Variant::default(), Variant::Header);
/// assert_eq!(Variant::from_no_header(true), Variant::NoHeader);
/// assert!(Variant::Header.has_zlib_header());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Variant {
    /// zlib framed: 2-byte header and adler32 trailer
    #[default]
    Header,

    /// Raw deflate with no framing
    NoHeader,
}

impl Variant {
    /// Both variants, in queue order
    pub const ALL: [Variant; 2] = [Variant::Header, Variant::NoHeader];

    pub fn from_no_header(no_header: bool) -> Self {
        if no_header {
            Variant::NoHeader
        } else {
            Variant::Header
        }
    }

    pub fn has_zlib_header(self) -> bool {
        matches!(self, Variant::Header)
    }

    pub(crate) fn as_label(self) -> &'static str {
        match self {
            Variant::Header => "header",
            Variant::NoHeader => "no_header",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// A stateful engine that can be recycled by an [`EnginePool`](crate::EnginePool).
///
/// `reset` must restore the observable state of a freshly created engine of
/// the same variant and must not fail.
pub trait Recyclable: Send + 'static {
    /// Build a fresh engine for `variant`
    fn create(variant: Variant) -> Self
    where
        Self: Sized;

    /// The variant fixed at construction
    fn variant(&self) -> Variant;

    /// Discard all decode state, keeping allocated buffers where possible
    fn reset(&mut self);
}
