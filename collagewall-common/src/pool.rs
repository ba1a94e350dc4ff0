use crate::error::PoolError;
use crate::Result;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

#[derive(Debug, Clone)]
pub struct PoolEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Snapshot of the wallpapers folder at selection time. Re-scanned on
/// every apply; never persisted.
#[derive(Debug, Clone)]
pub struct ImagePool {
    entries: Vec<PoolEntry>,
}

impl ImagePool {
    /// Scans the folder (non-recursively) for supported image files.
    pub fn scan(folder: &Path) -> Result<Self> {
        if !folder.exists() {
            return Err(PoolError::DirectoryRead {
                path: folder.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "Folder not found"),
            }
            .into());
        }

        if !folder.is_dir() {
            return Err(PoolError::DirectoryRead {
                path: folder.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "Path is not a directory",
                ),
            }
            .into());
        }

        let mut entries = Vec::new();

        for entry in WalkDir::new(folder)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();

            if !entry_path.is_file() {
                continue;
            }

            let supported = entry_path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false);
            if !supported {
                continue;
            }

            match std::fs::metadata(entry_path) {
                Ok(metadata) => {
                    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                    entries.push(PoolEntry {
                        path: entry_path.to_path_buf(),
                        modified,
                    });
                }
                Err(e) => {
                    log::warn!("Skipping unreadable file {:?}: {}", entry_path, e);
                }
            }
        }

        if entries.is_empty() {
            return Err(PoolError::NoImagesFound {
                path: folder.to_path_buf(),
            }
            .into());
        }

        log::info!("Discovered {} images in {:?}", entries.len(), folder);
        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<PoolEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter().map(|e| &e.path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.path.to_string_lossy() == path)
    }

    /// Pool paths ordered by modification time, most recent first. Ties
    /// are broken by filename so the sequential cursor is stable.
    pub fn sorted_recent_first(&self) -> Vec<PathBuf> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.path.file_name().cmp(&b.path.file_name()))
        });
        entries.into_iter().map(|e| e.path).collect()
    }
}

/// Validates an image file by extension and magic bytes.
pub fn validate_image(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(PoolError::FileAccess {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"),
        }
        .into());
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") | Some("png") | Some("bmp") | Some("webp") => {}
        _ => {
            return Err(PoolError::UnsupportedFormat {
                path: path.to_path_buf(),
            }
            .into())
        }
    }

    validate_image_header(path)
}

fn validate_image_header(path: &Path) -> Result<()> {
    use std::fs::File;
    use std::io::Read;

    let mut file = File::open(path).map_err(|e| PoolError::FileAccess {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut header = [0u8; 12];
    match file.read(&mut header) {
        Ok(bytes_read) if bytes_read >= 4 => match &header[0..4] {
            [0xFF, 0xD8, 0xFF, _] => Ok(()),                                              // JPEG
            [0x89, 0x50, 0x4E, 0x47] => Ok(()),                                           // PNG
            [0x42, 0x4D, _, _] => Ok(()),                                                 // BMP
            [0x52, 0x49, 0x46, 0x46] if bytes_read >= 12 && &header[8..12] == b"WEBP" => Ok(()), // WebP
            _ => Err(PoolError::CorruptedImage {
                path: path.to_path_buf(),
            }
            .into()),
        },
        _ => Err(PoolError::CorruptedImage {
            path: path.to_path_buf(),
        }
        .into()),
    }
}
