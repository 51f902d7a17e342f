//! Workspace root resolution.
//!
//! Priority order: an explicit user path (with `~` and escaped-space
//! expansion) wins outright and is never existence-checked; otherwise the
//! host's current project selects an OS-default project-storage root, falling
//! back to the plugin working directory when that root is absent. No variant
//! here is an error — a root that turns out not to exist simply scans empty.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Host-side lookup for the currently open project.
pub trait ProjectAccessor {
    /// Identifier of the current project, or `None` when nothing is open.
    fn current_project(&self) -> Option<String>;
}

/// Outcome of root resolution.
///
/// `NoProject` is a deliberate, distinct state: callers render "no project
/// open" instead of conflating it with an empty directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRoot {
    /// User-supplied path, expanded but not checked for existence.
    Explicit(PathBuf),
    /// The OS-default storage root for the current project.
    ProjectDefault(PathBuf),
    /// The plugin working directory, used when the default root is absent.
    Fallback(PathBuf),
    /// No explicit path and no project open; nothing to scan.
    NoProject,
}

impl ResolvedRoot {
    /// The path to scan, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::ProjectDefault(path) | Self::Fallback(path) => Some(path),
            Self::NoProject => None,
        }
    }
}

/// Per-OS project-storage roots, relative to the home directory. The last
/// entry is the catch-all for unrecognized platforms.
const DEFAULT_ROOTS: [(&str, &str); 4] = [
    ("macos", "Library/Application Support/io.caido.Caido/projects"),
    ("linux", ".local/share/caido/Caido/projects"),
    ("windows", "AppData/Roaming/caido/Caido/projects"),
    ("", ".caido/projects"),
];

fn default_project_root(os: &str, home: &Path, project_id: &str) -> PathBuf {
    let relative = DEFAULT_ROOTS
        .iter()
        .find(|(key, _)| *key == os || key.is_empty())
        .map_or(".caido/projects", |(_, rel)| *rel);
    home.join(relative).join(project_id)
}

/// Expands a user-entered path: trims whitespace, un-escapes `\ ` sequences,
/// and substitutes a leading `~` with the home directory. Existence is not
/// checked.
#[must_use]
pub fn expand_user_path(raw: &str, home: Option<&Path>) -> PathBuf {
    let unescaped = raw.trim().replace("\\ ", " ");
    if let Some(home) = home {
        if unescaped == "~" {
            return home.to_path_buf();
        }
        if let Some(tail) = unescaped.strip_prefix("~/") {
            return home.join(tail);
        }
    }
    PathBuf::from(unescaped)
}

/// Resolves the root to scan. See the module docs for the priority order.
pub fn resolve(
    explicit: Option<&str>,
    projects: &dyn ProjectAccessor,
    fallback: &Path,
) -> ResolvedRoot {
    resolve_on(
        std::env::consts::OS,
        dirs::home_dir().as_deref(),
        explicit,
        projects,
        fallback,
    )
}

fn resolve_on(
    os: &str,
    home: Option<&Path>,
    explicit: Option<&str>,
    projects: &dyn ProjectAccessor,
    fallback: &Path,
) -> ResolvedRoot {
    if let Some(raw) = explicit
        && !raw.trim().is_empty()
    {
        return ResolvedRoot::Explicit(expand_user_path(raw, home));
    }

    let Some(project_id) = projects.current_project() else {
        return ResolvedRoot::NoProject;
    };

    if let Some(home) = home {
        let composed = default_project_root(os, home, &project_id);
        if composed.exists() {
            return ResolvedRoot::ProjectDefault(composed);
        }
        warn!(
            path = %composed.display(),
            "default project root absent, using plugin working directory"
        );
    }
    ResolvedRoot::Fallback(fallback.to_path_buf())
}
