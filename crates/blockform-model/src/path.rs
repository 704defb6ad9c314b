//! Structural paths for addressing nodes within a prop value tree
//!
//! Provides [`PropPath`] for hierarchical addressing of props, conditional
//! parts and list items. The path value itself is the lookup key for the
//! reference side-store; [`PropPath::canonical`] renders the string form for
//! hosts that key tables by string.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ModelError;

/// One step of a [`PropPath`]
///
/// Object fields and conditional parts are addressed by key, list items by
/// index. Ordering places indices before keys so sibling items sort
/// numerically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// List item position
    Index(usize),
    /// Object field or conditional part
    Key(String),
}

impl PathSegment {
    /// Key name, if this is a key segment
    #[inline]
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Index(_) => None,
        }
    }

    /// Item index, if this is an index segment
    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Key(_) => None,
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Key(key) => write!(f, "{key}"),
        }
    }
}

/// Path from the root of a block's props to one node
///
/// # Examples
/// - `["title"]` → the `title` field
/// - `["items", 0, "b"]` → field `b` of the first list item
/// - `["kind", "discriminant"]` → the discriminant of conditional `kind`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropPath(Vec<PathSegment>);

impl PropPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .split_last()
            .map(|(_, parent)| Self(parent.to_vec()))
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Append every segment of `suffix`, returning new path
    #[inline]
    #[must_use]
    pub fn join(&self, suffix: &Self) -> Self {
        let mut new = self.clone();
        new.0.extend(suffix.0.iter().cloned());
        new
    }

    /// Check if this path is a prefix of another
    ///
    /// A path is a prefix of itself.
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Check if this path is an ancestor of another (strict prefix)
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Get relative path from ancestor
    ///
    /// # Errors
    /// Returns error if `self` is not a descendant of `ancestor`
    pub fn relative_to(&self, ancestor: &Self) -> Result<Self, ModelError> {
        if !ancestor.is_prefix_of(self) {
            return Err(ModelError::NotDescendant {
                path: self.clone(),
                ancestor: ancestor.clone(),
            });
        }
        Ok(Self(self.0[ancestor.0.len()..].to_vec()))
    }

    /// Replace the segment at `depth`, returning new path
    ///
    /// Returns `None` if the path is shorter than `depth + 1`.
    #[must_use]
    pub fn with_segment(&self, depth: usize, segment: impl Into<PathSegment>) -> Option<Self> {
        if depth >= self.0.len() {
            return None;
        }
        let mut new = self.clone();
        new.0[depth] = segment.into();
        Some(new)
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &PathSegment> {
        self.0.iter()
    }

    /// Canonical string key: an ordered JSON literal array
    ///
    /// Type-preserving: `["items", 0]` and `["items", "0"]` render as
    /// `["items",0]` and `["items","0"]`.
    #[must_use]
    pub fn canonical(&self) -> String {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|segment| match segment {
                PathSegment::Index(index) => index.to_string(),
                PathSegment::Key(key) => JsonValue::String(key.clone()).to_string(),
            })
            .collect();
        format!("[{}]", parts.join(","))
    }

    /// Parse a canonical key produced by [`PropPath::canonical`]
    ///
    /// # Errors
    /// Returns error if the text is not a JSON array of strings and
    /// non-negative integers
    pub fn from_canonical(text: &str) -> Result<Self, ModelError> {
        let invalid = |reason: &str| ModelError::InvalidCanonicalPath {
            key: text.to_string(),
            reason: reason.to_string(),
        };

        let parsed: JsonValue =
            serde_json::from_str(text).map_err(|e| invalid(&e.to_string()))?;
        let JsonValue::Array(items) = parsed else {
            return Err(invalid("expected an array"));
        };

        items
            .into_iter()
            .map(|item| match item {
                JsonValue::String(key) => Ok(PathSegment::Key(key)),
                JsonValue::Number(number) => number
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .map(PathSegment::Index)
                    .ok_or_else(|| invalid("index must be a non-negative integer")),
                _ => Err(invalid("segments must be strings or integers")),
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

impl Display for PropPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<Vec<PathSegment>> for PropPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl FromIterator<PathSegment> for PropPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build a [`PropPath`] from keys and indices
///
/// ```
/// use blockform_model::{prop_path, PathSegment};
///
/// let path = prop_path!["items", 0, "b"];
/// assert_eq!(path.segments()[1], PathSegment::Index(0));
/// ```
#[macro_export]
macro_rules! prop_path {
    () => {
        $crate::PropPath::root()
    };
    ($($segment:expr),+ $(,)?) => {
        $crate::PropPath::new(vec![$($crate::PathSegment::from($segment)),+])
    };
}
