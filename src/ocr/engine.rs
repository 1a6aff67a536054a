use super::OcrError;

pub trait OcrEngine: Send + Sync {
    /// Recognizes text in an encoded image (PNG/JPEG), optionally limited to
    /// the characters in `whitelist`.
    fn recognize(&self, image_bytes: &[u8], whitelist: Option<&str>) -> Result<String, OcrError>;
}

/// Tesseract via libtesseract. Only available with the `ocr` feature.
#[cfg(feature = "ocr")]
pub struct TesseractEngine {
    tessdata_dir: Option<std::path::PathBuf>,
    languages: String,
}

#[cfg(feature = "ocr")]
impl TesseractEngine {
    pub fn new(tessdata_dir: Option<std::path::PathBuf>, languages: &str) -> Self {
        if let Some(dir) = &tessdata_dir {
            if !dir.join("eng.traineddata").exists() {
                tracing::warn!(dir = %dir.display(), "eng.traineddata not found in tessdata dir");
            }
        }
        Self {
            tessdata_dir,
            languages: languages.to_string(),
        }
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractEngine {
    fn recognize(&self, image_bytes: &[u8], whitelist: Option<&str>) -> Result<String, OcrError> {
        let datapath = match &self.tessdata_dir {
            Some(dir) => Some(
                dir.to_str()
                    .ok_or_else(|| OcrError::Unavailable("invalid tessdata path".into()))?,
            ),
            None => None,
        };

        let mut tess = tesseract::Tesseract::new(datapath, Some(self.languages.as_str()))
            .map_err(|e| OcrError::Unavailable(format!("{e:?}")))?;

        if let Some(chars) = whitelist {
            tess = tess
                .set_variable("tessedit_char_whitelist", chars)
                .map_err(|e| OcrError::Processing(format!("{e:?}")))?;
        }

        let mut tess = tess
            .set_image_from_mem(image_bytes)
            .map_err(|e| OcrError::Decode(format!("{e:?}")))?;

        tess.get_text()
            .map_err(|e| OcrError::Processing(format!("{e:?}")))
    }
}

/// Stand-in when the binary is built without OCR support.
pub struct UnavailableOcr;

impl OcrEngine for UnavailableOcr {
    fn recognize(&self, _image_bytes: &[u8], _whitelist: Option<&str>) -> Result<String, OcrError> {
        Err(OcrError::Unavailable(
            "built without the `ocr` feature".into(),
        ))
    }
}

/// Returns canned text; used by tests and local runs without Tesseract.
pub struct FixedTextOcr {
    pub text: String,
}

impl FixedTextOcr {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl OcrEngine for FixedTextOcr {
    fn recognize(&self, _image_bytes: &[u8], whitelist: Option<&str>) -> Result<String, OcrError> {
        Ok(match whitelist {
            Some(allowed) => self
                .text
                .chars()
                .filter(|c| c.is_whitespace() || allowed.contains(*c))
                .collect(),
            None => self.text.clone(),
        })
    }
}

pub fn default_engine(cfg: &crate::config::OcrConfig) -> std::sync::Arc<dyn OcrEngine> {
    #[cfg(feature = "ocr")]
    {
        std::sync::Arc::new(TesseractEngine::new(cfg.tessdata_dir.clone(), &cfg.languages))
    }
    #[cfg(not(feature = "ocr"))]
    {
        let _ = cfg;
        tracing::warn!("OCR disabled: built without the `ocr` feature");
        std::sync::Arc::new(UnavailableOcr)
    }
}
