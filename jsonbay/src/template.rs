//! Template synchronizer - refreshes a project from the versioned template

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Files whose presence marks a directory as a jsonbay project.
pub const PROJECT_MARKER_FILES: &[&str] = &["serverless.yml", jsonbay_core::CONFIG_RELATIVE_PATH];

/// Template entries synchronized into the project: the source tree, the
/// manifests, and the build/deploy configuration. Everything else in the
/// project directory (user data, extra lockfiles) is left alone.
pub const TEMPLATE_WHITELIST: &[&str] = &[
    "src",
    "package.json",
    "package-lock.json",
    "serverless.yml",
    "tsconfig.json",
    "webpack.config.js",
];

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Not a jsonbay project directory: {dir} is missing {marker}")]
    InvalidDirectory { dir: PathBuf, marker: String },

    #[error("Template entry missing: {0}")]
    TemplateEntryMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Check that `dir` looks like a deployable jsonbay project.
pub fn validate_project_dir(dir: &Path) -> Result<(), ValidationError> {
    for marker in PROJECT_MARKER_FILES {
        if !dir.join(marker).exists() {
            return Err(ValidationError::InvalidDirectory {
                dir: dir.to_path_buf(),
                marker: (*marker).to_string(),
            });
        }
    }
    Ok(())
}

/// Copy the whitelisted template entries into the project, overwriting
/// existing files.
///
/// Each file copy is atomic on its own, but the pass is not transactional
/// across files: a mid-copy crash can leave a partially updated project.
pub fn copy_template(template_root: &Path, dest_root: &Path) -> Result<(), ValidationError> {
    for entry in TEMPLATE_WHITELIST {
        let src = template_root.join(entry);
        if !src.exists() {
            return Err(ValidationError::TemplateEntryMissing(src));
        }
        copy_recursive(&src, &dest_root.join(entry))?;
    }
    Ok(())
}

fn copy_recursive(src: &Path, dest: &Path) -> std::io::Result<()> {
    if src.is_dir() {
        fs::create_dir_all(dest)?;
        for child in fs::read_dir(src)? {
            let child = child?;
            copy_recursive(&child.path(), &dest.join(child.file_name()))?;
        }
    } else {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dest)?;
    }
    Ok(())
}
