use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub body: Bytes,
}

/// Multipart body split into file parts (by field name) and text parts.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub files: HashMap<String, Vec<UploadedFile>>,
    pub fields: HashMap<String, String>,
}

impl MultipartForm {
    pub async fn read(mut mp: Multipart) -> ApiResult<Self> {
        let mut form = MultipartForm::default();
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
        {
            let Some(name) = field.name().map(|s| s.trim_end_matches("[]").to_string()) else {
                continue;
            };
            let filename = field.file_name().map(|s| s.to_string());
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let body = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?;

            match filename {
                Some(filename) => form.files.entry(name).or_default().push(UploadedFile {
                    filename,
                    content_type,
                    body,
                }),
                None => {
                    form.fields
                        .insert(name, String::from_utf8_lossy(&body).trim().to_string());
                }
            }
        }
        Ok(form)
    }

    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        self.files.remove(name).unwrap_or_default()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }
}
