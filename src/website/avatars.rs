use std::{io::Cursor, path::Path};

use bytes::Bytes;
use image::ImageFormat;
use uuid::Uuid;

use crate::{errors::AppError, log_and_wrap_custom_internal};

pub const AVATAR_SIZE: u32 = 256;
const AVATAR_DIR: &str = "avatars";

/// Decodes the upload and shrinks it to fit in a square of `AVATAR_SIZE`,
/// keeping the aspect ratio. The result is PNG encoded.
pub fn make_thumbnail(data: &[u8]) -> Result<Vec<u8>, AppError> {
    let image = image::load_from_memory(data)?;
    let thumbnail = if image.width() > AVATAR_SIZE || image.height() > AVATAR_SIZE {
        image.thumbnail(AVATAR_SIZE, AVATAR_SIZE)
    } else {
        image
    };

    let mut buffer = Cursor::new(Vec::new());
    thumbnail.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Stores the avatar under the media root and returns its public url.
pub async fn save_avatar(media_root: &Path, user_pk: i64, data: Bytes) -> Result<String, AppError> {
    let png = tokio::task::spawn_blocking(move || make_thumbnail(&data))
        .await
        .map_err(|e| log_and_wrap_custom_internal!(e))??;

    let directory = media_root.join(AVATAR_DIR);
    tokio::fs::create_dir_all(&directory)
        .await
        .map_err(|e| log_and_wrap_custom_internal!(e))?;

    let file_name = format!("{}-{}.png", user_pk, Uuid::new_v4());
    tokio::fs::write(directory.join(&file_name), png)
        .await
        .map_err(|e| log_and_wrap_custom_internal!(e))?;

    tracing::info!(user_pk, file_name = %file_name, "avatar stored");
    Ok(format!("/media/{}/{}", AVATAR_DIR, file_name))
}

/// Deletes a stored avatar given its public url. Urls outside the avatars
/// directory are ignored.
pub async fn remove_avatar(media_root: &Path, url: &str) {
    let Some(file_name) = url
        .strip_prefix("/media/")
        .and_then(|rest| rest.strip_prefix(AVATAR_DIR))
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return;
    };
    if file_name.is_empty() || file_name.contains('/') || file_name.contains("..") {
        return;
    }

    match tokio::fs::remove_file(media_root.join(AVATAR_DIR).join(file_name)).await {
        Ok(()) => tracing::info!(file_name, "avatar removed"),
        Err(e) => tracing::warn!(file_name, error = %e, "avatar could not be removed"),
    }
}
