use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// MimeKind
// ---------------------------------------------------------------------------

/// A `base/sub` MIME pair. `sub` may be empty when only the base type is
/// known, e.g. the common denominator of a mixed selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MimeKind {
    pub base: String,
    pub sub: String,
}

impl MimeKind {
    pub fn new(base: impl Into<String>, sub: impl Into<String>) -> Self {
        MimeKind {
            base: base.into(),
            sub: sub.into(),
        }
    }

    /// Split classifier output on `/`. The base must be non-empty.
    pub fn parse(s: &str) -> Option<MimeKind> {
        let (base, sub) = s.split_once('/')?;
        if base.is_empty() {
            return None;
        }
        Some(MimeKind::new(base, sub))
    }

    pub fn base_only(&self) -> MimeKind {
        MimeKind::new(self.base.clone(), "")
    }

    pub fn is_base_only(&self) -> bool {
        self.sub.is_empty()
    }
}

impl fmt::Display for MimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.sub)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a path by extension. `None` means the classifier has nothing to
/// say; resolution then degrades to Universal-tier actions.
pub fn classify(path: &Path) -> Option<MimeKind> {
    let guess = mime_guess::from_path(path).first()?;
    Some(MimeKind::new(
        guess.type_().as_str(),
        guess.subtype().as_str(),
    ))
}

/// The most specific MIME kind shared by a whole selection.
///
/// Equal kinds stay as-is; equal bases with differing subtypes narrow to the
/// base alone; differing bases (or any unclassifiable file, or an empty
/// selection) yield `None`.
pub fn common_mime<I>(kinds: I) -> Option<MimeKind>
where
    I: IntoIterator<Item = Option<MimeKind>>,
{
    let mut iter = kinds.into_iter();
    let mut common = iter.next()??;
    for kind in iter {
        let kind = kind?;
        if kind == common {
            continue;
        }
        if kind.base == common.base {
            common = common.base_only();
        } else {
            return None;
        }
    }
    Some(common)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
