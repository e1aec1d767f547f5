use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info};
use rand::{thread_rng, Rng};
use thiserror::Error;

use crate::time::now_millis;
use crate::types::user::DEFAULT_AVATAR;

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("Please upload a file")]
    Empty,

    #[error("Not an image! Please upload an image.")]
    NotImage,

    #[error("File too large, the limit is {0} MiB")]
    TooLarge(usize),

    #[error("write avatar file: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum ImageType {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    Unknown,
}

impl ImageType {
    fn from_mime(mime: &str) -> Self {
        match mime {
            "image/png" => ImageType::Png,
            "image/jpeg" | "image/jpg" | "image/pjpeg" => ImageType::Jpeg,
            "image/gif" => ImageType::Gif,
            "image/webp" => ImageType::Webp,
            "image/bmp" | "image/x-ms-bmp" => ImageType::Bmp,
            _ => ImageType::Unknown,
        }
    }

    fn detect(data: &[u8]) -> Self {
        const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

        if data.starts_with(PNG_SIGNATURE) {
            ImageType::Png
        } else if data.starts_with(JPEG_SIGNATURE) {
            ImageType::Jpeg
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            ImageType::Gif
        } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            ImageType::Webp
        } else if data.starts_with(b"BM") {
            ImageType::Bmp
        } else {
            ImageType::Unknown
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ImageType::Png => ".png",
            ImageType::Jpeg => ".jpg",
            ImageType::Gif => ".gif",
            ImageType::Webp => ".webp",
            ImageType::Bmp => ".bmp",
            ImageType::Unknown => "",
        }
    }
}

/// Directory of uploaded avatar files.
pub struct AvatarStore {
    dir: PathBuf,
    limit_mib: usize,
}

impl AvatarStore {
    pub fn new(dir: PathBuf, limit_mib: usize) -> Self {
        Self { dir, limit_mib }
    }

    pub fn limit_mib(&self) -> usize {
        self.limit_mib
    }

    /// Validates and writes an uploaded image, returning its new file name.
    pub fn save(&self, content_type: Option<&str>, data: &[u8]) -> Result<String, AvatarError> {
        if data.is_empty() {
            return Err(AvatarError::Empty);
        }

        let mime = content_type
            .and_then(|s| s.split(';').next())
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_default();
        if !mime.starts_with("image/") {
            return Err(AvatarError::NotImage);
        }

        if data.len() > self.limit_mib * 1024 * 1024 {
            return Err(AvatarError::TooLarge(self.limit_mib));
        }

        let mut image_type = ImageType::from_mime(&mime);
        if image_type == ImageType::Unknown {
            image_type = ImageType::detect(data);
        }

        let suffix: u32 = thread_rng().gen_range(0..1_000_000_000);
        let name = format!(
            "avatar-{}-{suffix}{}",
            now_millis(),
            image_type.extension()
        );

        fs::write(self.dir.join(&name), data)?;
        info!("Saved avatar '{name}', {} bytes", data.len());
        Ok(name)
    }

    /// Deletes a previous avatar. The default avatar is shared and never removed.
    pub fn remove(&self, name: &str) -> Result<()> {
        if name == DEFAULT_AVATAR {
            return Ok(());
        }
        let path = match self.path(name) {
            Some(path) => path,
            None => return Ok(()),
        };
        debug!("Removing avatar file {}", path.display());
        fs::remove_file(&path).with_context(|| format!("remove avatar file '{name}'"))
    }

    /// Resolves a file name inside the avatar directory. Names that could
    /// escape it are refused.
    pub fn path(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty()
            || name.starts_with('.')
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
        {
            return None;
        }
        Some(self.dir.join(name))
    }

    pub fn content_type(name: &str) -> &'static str {
        let ext = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return "application/octet-stream",
        };
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "bmp" => "image/bmp",
            "svg" => "image/svg+xml",
            _ => "application/octet-stream",
        }
    }
}
