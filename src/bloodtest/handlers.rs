use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::services::{analyze, classify, BloodTestReport};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResponse, ApiResult},
    ocr::pdf::MAX_PDF_PAGES,
    profile::{
        model::{BloodTestMeta, BloodTestStatus},
        services::record_blood_test,
    },
    state::AppState,
    storage::ext_from_mime,
    upload::{MultipartForm, UploadedFile},
};

pub const FILE_FIELD: &str = "bloodTestFile";
pub const USERNAME_FIELD: &str = "username";

pub fn routes() -> Router<AppState> {
    Router::new().route("/blood-test/analyze", post(analyze_upload))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub report: BloodTestReport,
    pub profile_updated: bool,
}

/// POST /blood-test/analyze (multipart `bloodTestFile`, optional `username`)
#[instrument(skip(state, mp), fields(user = %user.username))]
pub async fn analyze_upload(
    State(state): State<AppState>,
    user: AuthUser,
    mp: Multipart,
) -> ApiResult<Json<ApiResponse<AnalyzeResponse>>> {
    let mut form = MultipartForm::read(mp).await?;
    let files = form.take_files(FILE_FIELD);
    if files.is_empty() {
        return Err(ApiError::BadRequest(format!("{FILE_FIELD} is required")));
    }
    let username = form.field(USERNAME_FIELD).map(str::to_string);
    if let Some(username) = &username {
        user.ensure_owner(username)?;
    }
    for file in &files {
        classify(file)?;
    }

    let (ocr, pdf) = (state.ocr.clone(), state.pdf.clone());
    let uploads = files.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        analyze(ocr.as_ref(), pdf.as_ref(), &files, MAX_PDF_PAGES)
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))?;

    let mut profile_updated = false;
    if let Some(username) = username {
        profile_updated = attach_to_profile(&state, &username, uploads, &outcome).await?;
    }

    let report = outcome?;
    info!(
        pages = report.pages_processed,
        diagnoses = report.diagnoses.len(),
        "blood test analyzed"
    );
    Ok(ApiResponse::ok(AnalyzeResponse {
        report,
        profile_updated,
    }))
}

/// Stores every uploaded part and records the metadata on the owner's
/// profile. Returns `false` when there is no profile to attach to.
async fn attach_to_profile(
    state: &AppState,
    username: &str,
    files: Vec<UploadedFile>,
    outcome: &ApiResult<BloodTestReport>,
) -> ApiResult<bool> {
    if state.profiles.get(username).await?.is_none() {
        warn!(username, "no profile for blood test upload, metadata skipped");
        return Ok(false);
    }

    let mut keys = Vec::with_capacity(files.len());
    for file in &files {
        let ext = ext_from_mime(&file.content_type).unwrap_or("bin");
        let key = format!("blood-tests/{username}/{}.{ext}", Uuid::new_v4());
        match state
            .storage
            .put_object(&key, file.body.clone(), &file.content_type)
            .await
        {
            Ok(()) => keys.push(key),
            Err(e) => warn!(error = %e, key = %key, "failed to store blood test file"),
        }
    }
    let mut keys = keys.into_iter();

    let (status, diagnoses) = match outcome {
        Ok(report) => (BloodTestStatus::Analyzed, report.diagnoses.clone()),
        Err(_) => (BloodTestStatus::Failed, Vec::new()),
    };
    let filename = files
        .into_iter()
        .next()
        .map(|f| f.filename)
        .unwrap_or_default();
    let meta = BloodTestMeta {
        filename,
        uploaded_at: OffsetDateTime::now_utc(),
        status,
        file_key: keys.next(),
        extra_file_keys: keys.collect(),
        diagnoses,
    };
    Ok(record_blood_test(state.profiles.as_ref(), username, meta, OffsetDateTime::now_utc()).await?)
}
