//! Multipart form parsing
//!
//! Buffers `multipart/form-data` requests into text fields and
//! uploaded files, enforcing per-type size caps before anything is
//! handed to a service.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::AppError;
use crate::service::account::UploadedFile;

/// Maximum image upload size: 10 MB
const MAX_IMAGE_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Maximum video upload size: 200 MB
const MAX_VIDEO_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// A fully buffered multipart form
#[derive(Debug, Default)]
pub struct MultipartForm {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    /// Drain the whole request body into memory
    ///
    /// Fields with a content type are treated as file uploads and
    /// size-capped by type; everything else is read as text.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to parse multipart: {}", e)))?
        {
            let field_name = field.name().unwrap_or("").to_string();
            if field_name.is_empty() {
                continue;
            }

            match field.content_type().map(|s| s.to_string()) {
                Some(content_type) => {
                    let max_size = if content_type.starts_with("image/") {
                        MAX_IMAGE_UPLOAD_BYTES
                    } else if content_type.starts_with("video/") {
                        MAX_VIDEO_UPLOAD_BYTES
                    } else {
                        return Err(AppError::Validation(format!(
                            "Unsupported media type: {}",
                            content_type
                        )));
                    };

                    let mut bytes = Vec::new();
                    while let Some(chunk) = field.chunk().await.map_err(|e| {
                        AppError::Validation(format!("Failed to read file: {}", e))
                    })? {
                        if bytes.len() + chunk.len() > max_size {
                            return Err(AppError::Validation(format!(
                                "File too large: exceeds {} bytes",
                                max_size
                            )));
                        }
                        bytes.extend_from_slice(&chunk);
                    }

                    form.files.insert(
                        field_name,
                        UploadedFile {
                            data: bytes,
                            content_type,
                        },
                    );
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        AppError::Validation(format!("Failed to read field: {}", e))
                    })?;
                    form.texts.insert(field_name, value);
                }
            }
        }

        Ok(form)
    }

    /// A text field, or a `Validation` error naming it
    pub fn require_text(&self, name: &str) -> Result<String, AppError> {
        self.texts
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::Validation(format!("{} is required", name)))
    }

    /// An optional text field
    pub fn text(&self, name: &str) -> Option<String> {
        self.texts.get(name).cloned()
    }

    /// Take an uploaded file out of the form, if present
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    /// Take a required uploaded file, or a `Validation` error
    pub fn require_file(&mut self, name: &str) -> Result<UploadedFile, AppError> {
        self.take_file(name)
            .ok_or_else(|| AppError::Validation(format!("{} file is required", name)))
    }
}
