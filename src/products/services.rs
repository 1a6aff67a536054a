use tracing::debug;

use super::{model::ProductLookup, repo::ProductRepo};

pub const MAX_BATCH: usize = 100;

/// Looks barcodes up one after another, keeping request order. Unknown
/// barcodes become not-found markers instead of errors.
pub async fn batch_lookup(
    repo: &dyn ProductRepo,
    barcodes: &[String],
) -> anyhow::Result<Vec<ProductLookup>> {
    let mut out = Vec::with_capacity(barcodes.len());
    for raw in barcodes {
        let barcode = raw.trim();
        match repo.find_by_barcode(barcode).await? {
            Some(p) => out.push(ProductLookup::Found(p)),
            None => {
                debug!(barcode, "product not found");
                out.push(ProductLookup::not_found(barcode));
            }
        }
    }
    Ok(out)
}
