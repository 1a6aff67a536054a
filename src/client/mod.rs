//! Client-side pieces of the app: HTTP API wrapper, on-device cache and the
//! profile wizard.

pub mod api;
pub mod cache;
pub mod wizard;

pub use api::{ApiClient, ClientConfig, ClientError};
pub use cache::{CacheKey, DeviceCache};
pub use wizard::{ProfileWizard, WizardError, WizardStep};
