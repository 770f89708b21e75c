//! vouchr Client SDK.
//!
//! Back-office services use this crate to buy, batch and redeem codes through
//! the vouchr API.
//!
//! # Example
//!
//! ```no_run
//! use vouchr_client::{BatchOrder, VouchrClient};
//! use vouchr_core::{Decimal, PaymentMethod};
//!
//! # async fn example() -> Result<(), vouchr_client::ClientError> {
//! let client = VouchrClient::new("http://vouchr.internal:8080", "your-service-api-key")?;
//!
//! let run = client
//!     .purchase_all_batches(BatchOrder {
//!         request_id: "order-2291".to_string(),
//!         buyer_id: "6f1c9b7e-0000-4000-8000-000000000001".to_string(),
//!         product_key: "eload:100".to_string(),
//!         unit_price: Decimal::from(95),
//!         total_quantity: 250,
//!         payment_method: PaymentMethod::Credits,
//!     })
//!     .await;
//!
//! println!("{} codes issued", run.codes().len());
//! if let Some(err) = run.error {
//!     return Err(err);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, VouchrClient};
pub use error::ClientError;
pub use types::*;
