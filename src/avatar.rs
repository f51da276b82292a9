//! Avatar uploads: extension check, "fit within" thumbnail, storage under a random name.

use std::io;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, ImageFormat};
use rand::RngCore;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const AVATAR_SIZE: u32 = 150;
pub const DEFAULT_AVATAR: &str = "default_avatar.png";

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("only jpg, jpeg and png images are allowed")]
    DisallowedExtension,
    #[error("the upload is not a readable image: {0}")]
    Decode(image::ImageError),
    #[error("failed to encode avatar: {0}")]
    Encode(image::ImageError),
    #[error("failed to store avatar at {path}: {source}")]
    Storage { path: PathBuf, source: io::Error },
    #[error("avatar worker failed: {0}")]
    Worker(String),
}

impl AvatarError {
    /// Whether the uploader is at fault, as opposed to the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::DisallowedExtension | Self::Decode(_))
    }
}

/// An uploaded file as received from the transport.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Lower-cased extension of `file_name` if it is on the allow-list.
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Target dimensions for a source image: scaled down to fit the avatar box,
/// aspect ratio kept, never scaled up.
pub fn fit_within(width: u32, height: u32, bound: u32) -> (u32, u32) {
    if width <= bound && height <= bound {
        return (width, height);
    }
    let scale = f64::min(bound as f64 / width as f64, bound as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, bound);
    let h = ((height as f64 * scale).round() as u32).clamp(1, bound);
    (w, h)
}

fn random_file_name(ext: &str) -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{hex}.{ext}")
}

fn render_thumbnail(bytes: &[u8], format: ImageFormat, output: &Path) -> Result<(), AvatarError> {
    let img = image::load_from_memory(bytes).map_err(AvatarError::Decode)?;
    let (w, h) = img.dimensions();
    let (tw, th) = fit_within(w, h, AVATAR_SIZE);
    let mut thumb = if (tw, th) == (w, h) { img } else { img.thumbnail_exact(tw, th) };
    if format == ImageFormat::Jpeg {
        // JPEG has no alpha channel.
        thumb = DynamicImage::ImageRgb8(thumb.to_rgb8());
    }
    thumb.save_with_format(output, format).map_err(|err| match err {
        image::ImageError::IoError(source) => AvatarError::Storage { path: output.to_path_buf(), source },
        other => AvatarError::Encode(other),
    })
}

/// Stores `upload` as a thumbnail under `dir` and returns the generated file name.
#[instrument(skip(upload), fields(file_name = %upload.file_name, size = upload.bytes.len()))]
pub async fn process_avatar(dir: &Path, upload: AvatarUpload) -> Result<String, AvatarError> {
    let ext = allowed_extension(&upload.file_name).ok_or(AvatarError::DisallowedExtension)?;
    let format = if ext == "png" { ImageFormat::Png } else { ImageFormat::Jpeg };

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| AvatarError::Storage { path: dir.to_path_buf(), source })?;

    let file_name = random_file_name(&ext);
    let output = dir.join(&file_name);
    let bytes = upload.bytes;
    tokio::task::spawn_blocking(move || render_thumbnail(&bytes, format, &output))
        .await
        .map_err(|err| AvatarError::Worker(err.to_string()))??;

    debug!(%file_name, "stored avatar");
    Ok(file_name)
}

/// Removes a stored avatar that ended up unused. Failures are only logged.
pub async fn discard_avatar(dir: &Path, file_name: &str) {
    let path = dir.join(file_name);
    if let Err(err) = tokio::fs::remove_file(&path).await {
        warn!(path = %path.display(), error = %err, "failed to remove unused avatar");
    }
}
