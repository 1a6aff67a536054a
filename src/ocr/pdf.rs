use super::OcrError;

/// Upper bound on pages rendered from one upload.
pub const MAX_PDF_PAGES: usize = 10;

pub trait PdfRasterizer: Send + Sync {
    /// Renders pages to PNG, in order. Rendering stops at the first page that
    /// fails; that failure is the last element.
    fn render_pages(&self, pdf: &[u8], max_pages: usize) -> Result<Vec<Result<Vec<u8>, OcrError>>, OcrError>;
}

#[cfg(feature = "ocr")]
pub struct PdfiumRasterizer {
    target_width: i32,
}

#[cfg(feature = "ocr")]
impl PdfiumRasterizer {
    pub fn new() -> Self {
        Self { target_width: 2000 }
    }

    fn load() -> Result<pdfium_render::prelude::Pdfium, OcrError> {
        use pdfium_render::prelude::Pdfium;

        let bindings = match std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
            Ok(path) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&path)),
            Err(_) => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| OcrError::Unavailable(format!("PDFium library not found: {e}")))?;
        Ok(Pdfium::new(bindings))
    }
}

#[cfg(feature = "ocr")]
impl PdfRasterizer for PdfiumRasterizer {
    fn render_pages(&self, pdf: &[u8], max_pages: usize) -> Result<Vec<Result<Vec<u8>, OcrError>>, OcrError> {
        use pdfium_render::prelude::*;

        let pdfium = Self::load()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| OcrError::PdfRendering {
                page: 0,
                reason: e.to_string(),
            })?;

        let config = PdfRenderConfig::new()
            .set_target_width(self.target_width)
            .set_maximum_height(self.target_width * 2);

        let mut out = Vec::new();
        for (index, page) in document.pages().iter().enumerate().take(max_pages) {
            let rendered = page
                .render_with_config(&config)
                .map_err(|e| OcrError::PdfRendering {
                    page: index + 1,
                    reason: e.to_string(),
                })
                .and_then(|bitmap| super::preprocess::encode_png(&bitmap.as_image()));
            let failed = rendered.is_err();
            out.push(rendered);
            if failed {
                break;
            }
        }
        tracing::debug!(pages = out.len(), "pdf rendered");
        Ok(out)
    }
}

/// Stand-in when the binary is built without PDFium.
pub struct UnavailablePdf;

impl PdfRasterizer for UnavailablePdf {
    fn render_pages(&self, _pdf: &[u8], _max_pages: usize) -> Result<Vec<Result<Vec<u8>, OcrError>>, OcrError> {
        Err(OcrError::Unavailable("PDF rendering needs the `ocr` feature".into()))
    }
}

pub fn default_rasterizer() -> std::sync::Arc<dyn PdfRasterizer> {
    #[cfg(feature = "ocr")]
    {
        std::sync::Arc::new(PdfiumRasterizer::new())
    }
    #[cfg(not(feature = "ocr"))]
    {
        std::sync::Arc::new(UnavailablePdf)
    }
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}
