use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{fs, io};

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A post as stored by the data layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// JSON export of a post record.
    Record,
    /// Raw post body; the title is the file stem.
    Body,
}

pub struct ContentFile {
    pub file_path: PathBuf,
    pub kind: FileKind,
    pub post: PostRecord,
}

impl ContentFile {
    pub fn from_file(file_path: PathBuf) -> io::Result<ContentFile> {
        let kind = match Self::guess_type(&file_path) {
            None => return Err(io::Error::new(ErrorKind::Unsupported, format!("Could not guess the type of the file {}", file_path.display()))),
            Some(kind) => kind,
        };

        let raw_content = fs::read_to_string(&file_path)?;
        Self::from_string(file_path, kind, &raw_content)
    }

    pub fn from_string(file_path: PathBuf, kind: FileKind, raw_content: &str) -> io::Result<ContentFile> {
        let post = match kind {
            FileKind::Record => match serde_json::from_str::<PostRecord>(raw_content) {
                Ok(post) => post,
                Err(e) => return Err(io::Error::new(
                    ErrorKind::InvalidData, format!("Error parsing post record {}: {}", file_path.display(), e))),
            },
            FileKind::Body => PostRecord {
                id: None,
                title: Self::title_from_path(&file_path),
                content: raw_content.to_string(),
                author: None,
                created_at: None,
            },
        };

        Ok(ContentFile {
            file_path,
            kind,
            post,
        })
    }

    fn guess_type(file_name: &Path) -> Option<FileKind> {
        let ext = file_name.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(FileKind::Record),
            "html" | "htm" | "md" | "txt" => Some(FileKind::Body),
            _ => None,
        }
    }

    fn title_from_path(file_name: &Path) -> String {
        file_name.file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.replace(['_', '-'], " "))
            .unwrap_or_default()
    }
}
