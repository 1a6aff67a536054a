use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    ai::{GeminiClient, LlmClient},
    auth::{
        google::{GoogleVerifier, TokenInfoVerifier},
        repo::{CredentialRepo, PgCredentialRepo},
    },
    config::{AppConfig, StoreBackend},
    db,
    history::repo::{HistoryRepo, PgHistoryRepo},
    memory::{MemoryCredentialRepo, MemoryHistoryRepo, MemoryProductRepo, MemoryProfileRepo},
    ocr::{engine::default_engine, pdf::default_rasterizer, OcrEngine, PdfRasterizer},
    products::repo::{PgProductRepo, ProductRepo},
    profile::repo::{PgProfileRepo, ProfileRepo},
    storage::{NoopStorage, Storage, StorageClient},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub credentials: Arc<dyn CredentialRepo>,
    pub profiles: Arc<dyn ProfileRepo>,
    pub products: Arc<dyn ProductRepo>,
    pub history: Arc<dyn HistoryRepo>,
    pub storage: Arc<dyn StorageClient>,
    pub google: Arc<dyn GoogleVerifier>,
    pub ai: Arc<dyn LlmClient>,
    pub ocr: Arc<dyn OcrEngine>,
    pub pdf: Arc<dyn PdfRasterizer>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let (credentials, profiles, products, history): (
            Arc<dyn CredentialRepo>,
            Arc<dyn ProfileRepo>,
            Arc<dyn ProductRepo>,
            Arc<dyn HistoryRepo>,
        ) = match config.store {
            StoreBackend::Postgres => {
                let pool = db::connect(&config).await?;
                db::migrate(&pool).await?;
                (
                    Arc::new(PgCredentialRepo::new(pool.clone())),
                    Arc::new(PgProfileRepo::new(pool.clone())),
                    Arc::new(PgProductRepo::new(pool.clone())),
                    Arc::new(PgHistoryRepo::new(pool)),
                )
            }
            StoreBackend::Memory => {
                warn!("using in-memory stores; data is lost on restart");
                (
                    Arc::new(MemoryCredentialRepo::default()),
                    Arc::new(MemoryProfileRepo::default()),
                    Arc::new(MemoryProductRepo::default()),
                    Arc::new(MemoryHistoryRepo::default()),
                )
            }
        };

        let storage: Arc<dyn StorageClient> = match &config.storage {
            Some(cfg) => Arc::new(Storage::new(cfg, "us-east-1").await?),
            None => {
                info!("object storage not configured; blood test files are not kept");
                Arc::new(NoopStorage)
            }
        };

        Ok(Self {
            credentials,
            profiles,
            products,
            history,
            storage,
            google: Arc::new(TokenInfoVerifier::new(&config.google)?),
            ai: Arc::new(GeminiClient::new(&config.ai)?),
            ocr: default_engine(&config.ocr),
            pdf: default_rasterizer(),
            config,
        })
    }

    /// In-memory state with scripted OCR, LLM and Google stand-ins.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::{
            config::{AiConfig, GoogleConfig, JwtConfig, OcrConfig},
            ocr::pdf::UnavailablePdf,
            test_support::{seeded_products, MockGoogle, ScriptedLlm, ScriptedOcr},
        };

        let config = Arc::new(AppConfig {
            store: StoreBackend::Memory,
            database_url: String::new(),
            db_max_connections: 1,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            storage: None,
            ai: AiConfig {
                api_key: String::new(),
                model: "test".into(),
                base_url: "http://ai.invalid".into(),
                timeout_secs: 1,
            },
            google: GoogleConfig {
                client_id: "test-client".into(),
                tokeninfo_url: "http://google.invalid".into(),
            },
            ocr: OcrConfig {
                tessdata_dir: None,
                languages: "eng".into(),
            },
            upload_limit_bytes: 20 * 1024 * 1024,
            host: "127.0.0.1".into(),
            port: 0,
        });

        Self {
            config,
            credentials: Arc::new(MemoryCredentialRepo::default()),
            profiles: Arc::new(MemoryProfileRepo::default()),
            products: Arc::new(MemoryProductRepo::with_products(seeded_products())),
            history: Arc::new(MemoryHistoryRepo::default()),
            storage: Arc::new(NoopStorage),
            google: Arc::new(MockGoogle),
            ai: Arc::new(ScriptedLlm),
            ocr: Arc::new(ScriptedOcr),
            pdf: Arc::new(UnavailablePdf),
        }
    }
}
