//! Multipart helpers for the upload endpoints

use axum::extract::Multipart;
use vidhub_core::models::UploadFile;
use vidhub_core::AppError;

/// Field names accepted for the video payload.
const FILE_FIELDS: [&str; 2] = ["file", "video"];
const THUMBNAIL_FIELD: &str = "thumbnail";
const VIDEO_ID_FIELD: &str = "videoId";

const FALLBACK_FILENAME: &str = "video";
const FALLBACK_THUMBNAIL_FILENAME: &str = "thumbnail";

/// Parts of a video upload form.
#[derive(Debug)]
pub struct VideoUpload {
    pub video: UploadFile,
    /// Optional image to use instead of the provider's thumbnail
    pub thumbnail: Option<UploadFile>,
}

/// Parts of a standalone thumbnail upload form.
#[derive(Debug)]
pub struct ThumbnailUpload {
    pub thumbnail: UploadFile,
    pub video_id: Option<String>,
}

#[derive(Default)]
struct UploadForm {
    video: Option<UploadFile>,
    thumbnail: Option<UploadFile>,
    video_id: Option<String>,
}

/// Read the known fields of a multipart form, enforcing the size limits.
///
/// At most one video field (`file` or `video`) and one `thumbnail` field are
/// accepted; unknown fields are ignored. Without `max_video_size` video fields
/// are ignored too.
async fn read_upload_form(
    mut multipart: Multipart,
    max_video_size: Option<usize>,
    max_thumbnail_size: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if field_name == VIDEO_ID_FIELD {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read videoId: {}", e)))?;
            form.video_id = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            continue;
        }

        let is_thumbnail = field_name == THUMBNAIL_FIELD;
        let video_limit = max_video_size.filter(|_| FILE_FIELDS.contains(&field_name.as_str()));
        if !is_thumbnail && video_limit.is_none() {
            continue;
        }

        let slot_taken = if is_thumbnail {
            form.thumbnail.is_some()
        } else {
            form.video.is_some()
        };
        if slot_taken {
            return Err(AppError::InvalidInput(if is_thumbnail {
                "Multiple thumbnail fields are not allowed".to_string()
            } else {
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string()
            }));
        }

        let fallback = if is_thumbnail {
            FALLBACK_THUMBNAIL_FILENAME
        } else {
            FALLBACK_FILENAME
        };
        let filename = upload_filename(field.file_name(), fallback);
        let content_type = field.content_type().map(|s: &str| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

        let upload = UploadFile {
            filename,
            content_type,
            data,
        };

        if is_thumbnail {
            // Browsers send an empty part for an unset file input
            if upload.is_empty() {
                continue;
            }
            validate_file_size(upload.len(), max_thumbnail_size)?;
            validate_image_type(upload.content_type.as_deref())?;
            form.thumbnail = Some(upload);
        } else {
            if let Some(limit) = video_limit {
                validate_file_size(upload.len(), limit)?;
            }
            form.video = Some(upload);
        }
    }

    Ok(form)
}

/// Read a video upload: exactly one non-empty video field plus an optional
/// `thumbnail` image.
pub async fn extract_video_upload(
    multipart: Multipart,
    max_video_size: usize,
    max_thumbnail_size: usize,
) -> Result<VideoUpload, AppError> {
    let form = read_upload_form(multipart, Some(max_video_size), max_thumbnail_size).await?;

    let video = form
        .video
        .ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;
    if video.is_empty() {
        return Err(AppError::InvalidInput("File is empty".to_string()));
    }

    Ok(VideoUpload {
        video,
        thumbnail: form.thumbnail,
    })
}

/// Read a standalone thumbnail upload: a required `thumbnail` image and an
/// optional `videoId` text field.
pub async fn extract_thumbnail_upload(
    multipart: Multipart,
    max_thumbnail_size: usize,
) -> Result<ThumbnailUpload, AppError> {
    let form = read_upload_form(multipart, None, max_thumbnail_size).await?;

    let thumbnail = form
        .thumbnail
        .ok_or_else(|| AppError::InvalidInput("No thumbnail file provided".to_string()))?;

    Ok(ThumbnailUpload {
        thumbnail,
        video_id: form.video_id,
    })
}

/// Thumbnails must be images when the client declares a content type.
fn validate_image_type(content_type: Option<&str>) -> Result<(), AppError> {
    match content_type {
        Some(ct) if !ct.starts_with("image/") => Err(AppError::InvalidInput(format!(
            "Thumbnail must be an image, got {}",
            ct
        ))),
        _ => Ok(()),
    }
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Strip any client-side directory from the filename.
fn upload_filename(raw: Option<&str>, fallback: &str) -> String {
    raw.and_then(|name| name.rsplit(['/', '\\']).next())
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(10, 10).is_ok());
        let err = validate_file_size(11, 10).unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[test]
    fn test_upload_filename_strips_directories() {
        assert_eq!(upload_filename(Some("clip.mp4"), "video"), "clip.mp4");
        assert_eq!(
            upload_filename(Some("C:\\Users\\me\\clip.mp4"), "video"),
            "clip.mp4"
        );
        assert_eq!(upload_filename(Some("../../etc/clip.mp4"), "video"), "clip.mp4");
    }

    #[test]
    fn test_upload_filename_fallback() {
        assert_eq!(upload_filename(None, "video"), "video");
        assert_eq!(upload_filename(Some("  "), "video"), "video");
        assert_eq!(upload_filename(Some("uploads/"), "thumbnail"), "thumbnail");
    }

    #[test]
    fn test_validate_image_type() {
        assert!(validate_image_type(Some("image/png")).is_ok());
        assert!(validate_image_type(None).is_ok());
        let err = validate_image_type(Some("video/mp4")).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
