//! Video folder scanning.

use bridge_traits::storage::FileSystemAccess;
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;

/// Outcome of scanning the video folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderScan {
    /// Sorted names of regular files with a recognised extension
    pub file_names: Vec<String>,
    /// The folder did not exist and was created
    pub created: bool,
}

/// List video files directly inside `folder`.
///
/// `extensions` are compared case-insensitively and without the leading dot.
/// Subdirectories and files with non-UTF-8 names are ignored. A missing
/// folder is created and reported as empty.
pub async fn scan_video_folder(
    fs: &dyn FileSystemAccess,
    folder: &Path,
    extensions: &[String],
) -> Result<FolderScan> {
    if !fs.exists(folder).await? {
        fs.create_dir_all(folder).await?;
        info!(folder = ?folder, "Created video folder");
        return Ok(FolderScan {
            file_names: Vec::new(),
            created: true,
        });
    }

    let mut file_names = Vec::new();
    for path in fs.list_directory(folder).await? {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            debug!(path = ?path, "Skipping entry with non UTF-8 name");
            continue;
        };

        let recognised = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)));
        if !recognised {
            continue;
        }

        if fs.metadata(&path).await?.is_directory {
            continue;
        }

        file_names.push(name.to_string());
    }

    file_names.sort();
    debug!(folder = ?folder, count = file_names.len(), "Scanned video folder");
    Ok(FolderScan {
        file_names,
        created: false,
    })
}
