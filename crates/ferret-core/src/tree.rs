use crate::error::Result;
use crate::mime::{self, MimeKind};
use crate::name;
use crate::{installer, io};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// Visibility scope of an action. Tiers are not mutually exclusive: all
/// matching tiers are visible at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Universal,
    BaseType,
    SubType,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Universal => "universal",
            Tier::BaseType => "base",
            Tier::SubType => "sub",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActionDefinition
// ---------------------------------------------------------------------------

/// One resolvable action, derived fresh from the file name on every
/// resolve; nothing here is persisted across runs.
#[derive(Debug, Clone, Serialize)]
pub struct ActionDefinition {
    pub path: PathBuf,
    pub display_name: String,
    pub prompts: Vec<String>,
    pub foreground: bool,
    pub tier: Tier,
}

// ---------------------------------------------------------------------------
// ActionTree
// ---------------------------------------------------------------------------

/// Read-only index over the on-disk action hierarchy:
/// `<root>/` (universal), `<root>/<base>/`, `<root>/<base>/<sub>/`.
#[derive(Debug, Clone)]
pub struct ActionTree {
    root: PathBuf,
}

impl ActionTree {
    /// Open the tree rooted at `root`. A missing root is created lazily and,
    /// when `auto_install` is set, populated with the bundled defaults.
    /// Existing files are never overwritten.
    pub fn open(root: impl Into<PathBuf>, auto_install: bool) -> Result<ActionTree> {
        let root = root.into();
        if !root.exists() {
            io::ensure_dir(&root)?;
            if auto_install {
                installer::install_defaults(&root)?;
            }
        }
        Ok(ActionTree { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Explicit re-install request: copy-if-absent, user edits survive.
    pub fn refresh(&self) -> Result<usize> {
        installer::install_defaults(&self.root)
    }

    /// Resolve the actions visible for a MIME kind, ordered Universal, then
    /// BaseType, then SubType; within a tier by display name, ties broken by
    /// path. `None` degrades to Universal-tier results only. Never fails: an
    /// absent directory simply contributes nothing.
    pub fn resolve(&self, kind: Option<&MimeKind>) -> Vec<ActionDefinition> {
        let mut out = scan_dir(&self.root, Tier::Universal);
        if let Some(kind) = kind {
            let base_dir = self.root.join(&kind.base);
            out.extend(scan_dir(&base_dir, Tier::BaseType));
            if !kind.is_base_only() {
                out.extend(scan_dir(&base_dir.join(&kind.sub), Tier::SubType));
            }
        }
        debug!(
            kind = %kind.map(MimeKind::to_string).unwrap_or_else(|| "*".into()),
            count = out.len(),
            "resolved actions"
        );
        out
    }

    /// Resolve for a selection of paths: classify each file and fold to the
    /// most specific common kind.
    pub fn resolve_paths(&self, paths: &[PathBuf]) -> Vec<ActionDefinition> {
        let kind = mime::common_mime(paths.iter().map(|p| mime::classify(p)));
        self.resolve(kind.as_ref())
    }
}

fn scan_dir(dir: &Path, tier: Tier) -> Vec<ActionDefinition> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut actions: Vec<ActionDefinition> = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            if path.is_dir() {
                return None;
            }
            // Non-UTF8 file names cannot carry the grammar; skip them.
            let file_name = path.file_name()?.to_str()?;
            let parsed = name::parse(file_name);
            Some(ActionDefinition {
                display_name: parsed.display_name,
                prompts: parsed.prompts,
                foreground: parsed.foreground,
                tier,
                path,
            })
        })
        .collect();

    actions.sort_by(|a, b| {
        a.display_name
            .cmp(&b.display_name)
            .then_with(|| a.path.cmp(&b.path))
    });
    actions
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
