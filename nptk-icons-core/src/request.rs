// SPDX-License-Identifier: LGPL-3.0-only
//! Icon requests, size bounds, handles and cache keys.

use std::fmt;
use std::sync::Arc;

use crate::error::RejectReason;
use crate::image::IconImage;

/// Callback receiving the decoded icon, or `None` when the icon could not be produced.
///
/// Callbacks always run on the thread that owns the [`IconCache`](crate::IconCache).
pub type IconCallback = Box<dyn FnOnce(Option<IconImage>)>;

/// How the identifier of a request is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    /// A symbolic name looked up in the icon theme.
    ThemedName,
    /// A serialized icon description, see [`Descriptor`](crate::Descriptor).
    StructuredDescriptor,
    /// A local file path.
    FilePath,
    /// A URI whose content is fetched and decoded.
    Uri,
}

/// Maximum extent of a decoded icon along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    /// No limit along this axis.
    Unbounded,
    /// At most this many pixels.
    Px(u32),
}

impl Bound {
    /// The pixel limit, if any.
    pub fn px(self) -> Option<u32> {
        match self {
            Bound::Px(value) => Some(value),
            Bound::Unbounded => None,
        }
    }

    /// Whether this bound limits its axis.
    pub fn is_bounded(self) -> bool {
        matches!(self, Bound::Px(_))
    }
}

impl From<i32> for Bound {
    /// `-1` means unbounded. Any other negative value becomes `Px(0)`, which
    /// the cache rejects as undersized.
    fn from(value: i32) -> Self {
        match value {
            -1 => Bound::Unbounded,
            v if v < 0 => Bound::Px(0),
            v => Bound::Px(v as u32),
        }
    }
}

impl From<u32> for Bound {
    fn from(value: u32) -> Self {
        Bound::Px(value)
    }
}

impl From<Option<u32>> for Bound {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Bound::Unbounded, Bound::Px)
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Unbounded => write!(f, "*"),
            Bound::Px(value) => write!(f, "{}", value),
        }
    }
}

/// Side length used for square themed lookups.
///
/// Both bounds given: the smaller one. One bound given: that one. Neither:
/// `default_size`.
pub fn themed_size(max_width: Bound, max_height: Bound, default_size: u32) -> u32 {
    match (max_width.px(), max_height.px()) {
        (Some(w), Some(h)) => w.min(h),
        (Some(size), None) | (None, Some(size)) => size,
        (None, None) => default_size,
    }
}

/// Opaque token identifying one live request.
///
/// Handles are plain table keys: disconnecting a handle whose request already
/// finished is a harmless miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub(crate) u64);

impl Handle {
    /// Handle returned for rejected requests. Never refers to any work.
    pub const INERT: Handle = Handle(0);

    /// Whether this is the inert handle.
    pub fn is_inert(self) -> bool {
        self == Self::INERT
    }

    /// Raw numeric value, mostly useful for logging.
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Normalized identity of a request, shared by the result cache and the
/// coalescing map.
///
/// The request kind is not part of the key: equal identifier and bounds
/// always coalesce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    identifier: Arc<str>,
    max_width: Bound,
    max_height: Bound,
}

impl CacheKey {
    /// Build a key from its parts.
    pub fn new(identifier: &str, max_width: Bound, max_height: Bound) -> Self {
        Self {
            identifier: Arc::from(identifier),
            max_width,
            max_height,
        }
    }

    /// The request identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Width bound.
    pub fn max_width(&self) -> Bound {
        self.max_width
    }

    /// Height bound.
    pub fn max_height(&self) -> Bound {
        self.max_height
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'@{}x{}", self.identifier, self.max_width, self.max_height)
    }
}

/// One ask for an icon.
pub struct IconRequest {
    /// How `identifier` is interpreted.
    pub kind: IconKind,
    /// Name, descriptor, path or URI depending on `kind`.
    pub identifier: String,
    /// Width bound.
    pub max_width: Bound,
    /// Height bound.
    pub max_height: Bound,
    /// Receiver of the result. Requests without one are rejected.
    pub callback: Option<IconCallback>,
}

impl IconRequest {
    /// Create a request without a callback.
    pub fn new(
        kind: IconKind,
        identifier: impl Into<String>,
        max_width: impl Into<Bound>,
        max_height: impl Into<Bound>,
    ) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
            max_width: max_width.into(),
            max_height: max_height.into(),
            callback: None,
        }
    }

    /// Attach the callback.
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Option<IconImage>) + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// The key this request coalesces and caches under.
    pub fn key(&self) -> CacheKey {
        CacheKey::new(&self.identifier, self.max_width, self.max_height)
    }

    /// Check the request against the rejection rules.
    pub fn validate(&self, min_icon_size: u32) -> Result<(), RejectReason> {
        if self.identifier.trim().is_empty() {
            return Err(RejectReason::EmptyIdentifier);
        }
        let min = min_icon_size.max(1);
        let undersized = |bound: Bound| matches!(bound, Bound::Px(v) if v < min);
        if undersized(self.max_width) || undersized(self.max_height) {
            return Err(RejectReason::UndersizedBounds);
        }
        if self.callback.is_none() {
            return Err(RejectReason::MissingCallback);
        }
        Ok(())
    }
}

impl fmt::Debug for IconRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconRequest")
            .field("kind", &self.kind)
            .field("identifier", &self.identifier)
            .field("max_width", &self.max_width)
            .field("max_height", &self.max_height)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_from_raw() {
        assert_eq!(Bound::from(-1), Bound::Unbounded);
        assert_eq!(Bound::from(-7), Bound::Px(0));
        assert_eq!(Bound::from(32), Bound::Px(32));
        assert_eq!(Bound::from(None::<u32>), Bound::Unbounded);
    }

    #[test]
    fn test_themed_size() {
        assert_eq!(themed_size(Bound::Px(48), Bound::Px(32), 64), 32);
        assert_eq!(themed_size(Bound::Unbounded, Bound::Px(24), 64), 24);
        assert_eq!(themed_size(Bound::Unbounded, Bound::Unbounded, 64), 64);
    }

    #[test]
    fn test_validate() {
        let ok = IconRequest::new(IconKind::ThemedName, "firefox", 48, 48).with_callback(|_| {});
        assert_eq!(ok.validate(1), Ok(()));

        let zero = IconRequest::new(IconKind::ThemedName, "firefox", 0, 0).with_callback(|_| {});
        assert_eq!(zero.validate(1), Err(RejectReason::UndersizedBounds));

        let unbounded = IconRequest::new(IconKind::Uri, "file:///a.png", -1, -1).with_callback(|_| {});
        assert_eq!(unbounded.validate(16), Ok(()));

        let small = IconRequest::new(IconKind::ThemedName, "firefox", 8, -1).with_callback(|_| {});
        assert_eq!(small.validate(16), Err(RejectReason::UndersizedBounds));

        let empty = IconRequest::new(IconKind::ThemedName, "  ", 16, 16).with_callback(|_| {});
        assert_eq!(empty.validate(1), Err(RejectReason::EmptyIdentifier));

        let no_callback = IconRequest::new(IconKind::ThemedName, "firefox", 16, 16);
        assert_eq!(no_callback.validate(1), Err(RejectReason::MissingCallback));
    }

    #[test]
    fn test_key_ignores_kind() {
        let a = IconRequest::new(IconKind::ThemedName, "x", 16, 16);
        let b = IconRequest::new(IconKind::Uri, "x", 16, 16);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), IconRequest::new(IconKind::Uri, "x", 16, 17).key());
    }
}
