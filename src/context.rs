//! Instruction and dataset material loading
//!
//! Turns a list of file and folder paths into ordered text blocks. Folders
//! are walked recursively in sorted order so the resulting system turns are
//! stable between runs.

use crate::error::{RagbotError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Text blocks loaded from a list of paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextMaterial {
    /// One text block per contributing file, in load order
    pub texts: Vec<String>,
    /// Files that contributed, parallel to `texts`
    pub files: Vec<PathBuf>,
}

impl ContextMaterial {
    /// Whether nothing was loaded
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Approximate token count of all blocks
    pub fn estimated_tokens(&self) -> usize {
        self.texts.iter().map(|t| estimate_tokens(t)).sum()
    }
}

/// Load text from files and folders
///
/// Blank path strings are skipped. A folder contributes every non-hidden
/// file beneath it, sorted by path.
///
/// # Errors
///
/// Returns `RagbotError::ContextLoad` if a path does not exist or a file is
/// not valid UTF-8 text
///
/// # Examples
///
/// ```no_run
/// use ragbot::context::load_material;
///
/// let material = load_material(&["instructions/".to_string()]).unwrap();
/// for file in &material.files {
///     println!("{}", file.display());
/// }
/// ```
pub fn load_material(paths: &[String]) -> Result<ContextMaterial> {
    let mut material = ContextMaterial::default();

    for raw in paths {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let path = Path::new(trimmed);
        if path.is_dir() {
            for file in folder_files(path)? {
                push_file(&mut material, file)?;
            }
        } else if path.is_file() {
            push_file(&mut material, path.to_path_buf())?;
        } else {
            return Err(
                RagbotError::ContextLoad(format!("Path not found: {}", path.display())).into(),
            );
        }
    }

    tracing::debug!(
        "Loaded {} context blocks (~{} tokens)",
        material.texts.len(),
        material.estimated_tokens()
    );
    Ok(material)
}

fn folder_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry.map_err(|e| {
            RagbotError::ContextLoad(format!("Failed to walk {}: {}", root.display(), e))
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn push_file(material: &mut ContextMaterial, path: PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(&path).map_err(|e| {
        RagbotError::ContextLoad(format!("Failed to read {}: {}", path.display(), e))
    })?;
    material.texts.push(text);
    material.files.push(path);
    Ok(())
}

/// Rough token estimate: characters / 4
///
/// # Examples
///
/// ```
/// use ragbot::context::estimate_tokens;
///
/// assert_eq!(estimate_tokens("abcdefgh"), 2);
/// ```
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() + 3) / 4
}
