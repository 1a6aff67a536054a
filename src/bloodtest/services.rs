use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::rules::{diagnoses, evaluate, Finding};
use crate::{
    error::{ApiError, ApiResult},
    ocr::{pdf::is_pdf, preprocess::is_image, OcrEngine, OcrError, PdfRasterizer, LAB_REPORT_WHITELIST},
    upload::UploadedFile,
};

/// Below this many non-whitespace characters the OCR result is unusable.
pub const MIN_TEXT_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodTestReport {
    pub findings: Vec<Finding>,
    pub diagnoses: Vec<String>,
    pub pages_processed: usize,
    pub text_length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Pdf,
}

pub fn classify(file: &UploadedFile) -> ApiResult<UploadKind> {
    if is_pdf(&file.body) {
        Ok(UploadKind::Pdf)
    } else if is_image(&file.body) {
        Ok(UploadKind::Image)
    } else {
        Err(ApiError::UnsupportedMedia(format!(
            "{} is neither an image nor a PDF",
            file.filename
        )))
    }
}

/// Outcome of one page: keep going, or stop the whole loop.
fn page_failed(err: OcrError, page: usize) -> ApiResult<()> {
    match err {
        OcrError::Unavailable(_) => Err(err.into()),
        other => {
            warn!(page, error = %other, "page failed, stopping OCR loop");
            Ok(())
        }
    }
}

/// OCR every page of every upload in order. The first failing page ends the
/// loop; text gathered before it is kept.
pub fn extract_text(
    ocr: &dyn OcrEngine,
    pdf: &dyn PdfRasterizer,
    files: &[UploadedFile],
    max_pdf_pages: usize,
) -> ApiResult<(String, usize)> {
    let kinds = files.iter().map(classify).collect::<ApiResult<Vec<_>>>()?;

    let mut text = String::new();
    let mut pages = 0usize;

    'files: for (file, kind) in files.iter().zip(kinds) {
        let images: Vec<Result<Vec<u8>, OcrError>> = match kind {
            UploadKind::Image => vec![Ok(file.body.to_vec())],
            UploadKind::Pdf => match pdf.render_pages(&file.body, max_pdf_pages) {
                Ok(rendered) => rendered,
                Err(e) => {
                    page_failed(e, pages + 1)?;
                    break 'files;
                }
            },
        };

        for image in images {
            let page_no = pages + 1;
            let recognized = image.and_then(|bytes| ocr.recognize(&bytes, Some(LAB_REPORT_WHITELIST)));
            match recognized {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                    pages += 1;
                }
                Err(e) => {
                    page_failed(e, page_no)?;
                    break 'files;
                }
            }
        }
    }

    debug!(pages, chars = text.len(), "blood test text extracted");
    Ok((text, pages))
}

pub fn analyze(
    ocr: &dyn OcrEngine,
    pdf: &dyn PdfRasterizer,
    files: &[UploadedFile],
    max_pdf_pages: usize,
) -> ApiResult<BloodTestReport> {
    let (text, pages_processed) = extract_text(ocr, pdf, files, max_pdf_pages)?;

    let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
    if meaningful < MIN_TEXT_CHARS {
        return Err(ApiError::Unprocessable(
            "Could not extract enough text from the blood test".into(),
        ));
    }

    let findings = evaluate(&text);
    let diagnoses = diagnoses(&findings);
    Ok(BloodTestReport {
        findings,
        diagnoses,
        pages_processed,
        text_length: text.len(),
    })
}
