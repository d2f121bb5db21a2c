//! Command implementations.

pub mod cart;
pub mod favorites;
pub mod orders;

use std::io::Write;

use alghazaly_core::{ProductId, ProductSummary};
use alghazaly_storefront::StorefrontError;
use alghazaly_storefront::api::ApiError;
use alghazaly_storefront::mutation::MutationError;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The storefront client failed.
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    /// Output could not be serialized.
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    /// Output could not be written.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ApiError> for CommandError {
    fn from(err: ApiError) -> Self {
        Self::Storefront(err.into())
    }
}

impl From<MutationError> for CommandError {
    fn from(err: MutationError) -> Self {
        Self::Storefront(err.into())
    }
}

/// Product details for mutations that need them. The backend reprices the
/// line, so the price only affects the optimistic view.
pub fn product(id: String, name: Option<String>, price: Decimal) -> ProductSummary {
    let id = ProductId::new(id);
    ProductSummary {
        name: name.unwrap_or_else(|| id.to_string()),
        id,
        name_ar: None,
        price,
        sku: None,
        image_url: None,
        stock_quantity: None,
    }
}

/// Pretty-print `value` as JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
