//! Filesystem layout for per-organization test assets and results.
//!
//! Every organization (and optionally team) owns a directory under the users
//! root; results, back-end scripts, user scripts and proprietary packages
//! live in fixed sub-directories of it. Uploads and the shared package
//! store have their own roots.

use std::path::{Component, Path, PathBuf};

use crate::types::DbId;

/// Results sub-directory of a scope directory.
pub const TEST_RESULTS_ROOT: &str = "test_results";

/// Scripts pulled by workers.
pub const BACK_SCRIPT_ROOT: &str = "back_scripts";

/// Scripts edited by users.
pub const USER_SCRIPT_ROOT: &str = "user_scripts";

/// Proprietary test packages.
pub const TEST_PACKAGE_ROOT: &str = "pypi";

/// Root directories, usually loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoots {
    pub users_root: PathBuf,
    pub upload_root: PathBuf,
    pub store_root: PathBuf,
}

/// Directory names of an organization and its optional team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeDirs {
    pub organization_path: String,
    pub team_path: Option<String>,
}

impl StorageRoots {
    fn scope_dir(&self, scope: &ScopeDirs) -> PathBuf {
        let mut dir = self.users_root.join(&scope.organization_path);
        if let Some(team) = &scope.team_path {
            dir.push(team);
        }
        dir
    }

    pub fn test_results_root(&self, scope: &ScopeDirs) -> PathBuf {
        self.scope_dir(scope).join(TEST_RESULTS_ROOT)
    }

    /// Result directory of a single task run.
    pub fn test_result_path(&self, scope: &ScopeDirs, task_id: DbId) -> PathBuf {
        self.test_results_root(scope).join(task_id.to_string())
    }

    pub fn back_scripts_root(&self, scope: &ScopeDirs) -> PathBuf {
        self.scope_dir(scope).join(BACK_SCRIPT_ROOT)
    }

    pub fn user_scripts_root(&self, scope: &ScopeDirs) -> PathBuf {
        self.scope_dir(scope).join(USER_SCRIPT_ROOT)
    }

    pub fn upload_files_root(&self, upload_dir: &str) -> PathBuf {
        self.upload_root.join(upload_dir)
    }

    /// Package store for a test.
    ///
    /// Non-proprietary packages, and callers without a scope, share the
    /// global store root.
    pub fn test_store_root(&self, scope: Option<&ScopeDirs>, proprietary: bool) -> PathBuf {
        match scope {
            Some(scope) if proprietary => self.scope_dir(scope).join(TEST_PACKAGE_ROOT),
            _ => self.store_root.clone(),
        }
    }
}

/// Whether a user-supplied relative path stays inside its root.
///
/// Rejects absolute paths, Windows drive prefixes and any `..` component.
pub fn is_path_secure(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') {
        return false;
    }
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return false;
    }
    Path::new(path).components().all(|c| match c {
        Component::Normal(_) | Component::CurDir => true,
        Component::ParentDir | Component::RootDir | Component::Prefix(_) => false,
    }) && !path.split(['/', '\\']).any(|part| part == "..")
}
