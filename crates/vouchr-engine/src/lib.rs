//! Transactional issuance engine for vouchr.
//!
//! - [`IssuanceCoordinator`] sells codes: debit, stock reservation and code
//!   creation in one store transaction.
//! - [`BatchController`] splits large orders into bounded chunks with
//!   server-side progress checkpoints.
//! - [`RedemptionResolver`] binds a code to its redeemer exactly once.
//!
//! Every component takes its store handle at construction.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vouchr_core::{Decimal, LineItem, PaymentMethod, PurchaseMode, PurchaseRequest, UserId};
//! use vouchr_engine::{EngineConfig, IssuanceCoordinator, RandomCodeSource};
//! use vouchr_store::RocksStore;
//!
//! let store = Arc::new(RocksStore::open("/tmp/vouchr-db").unwrap());
//! let coordinator =
//!     IssuanceCoordinator::new(store, Arc::new(RandomCodeSource), EngineConfig::default());
//!
//! let receipt = coordinator
//!     .issue(&PurchaseRequest {
//!         buyer_id: UserId::generate(),
//!         line_items: vec![LineItem::new("tv:30d".parse().unwrap(), Decimal::from(99), 3)],
//!         payment_method: PaymentMethod::Credits,
//!         mode: PurchaseMode::Resale,
//!     })
//!     .unwrap();
//! println!("{} codes, balance {}", receipt.codes.len(), receipt.new_balance);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod batch;
pub mod config;
pub mod coordinator;
pub mod redeem;
pub mod source;

pub use batch::{BatchController, BatchOutcome, BatchRequest};
pub use config::EngineConfig;
pub use coordinator::{IssuanceCoordinator, IssuanceReceipt};
pub use redeem::{Redemption, RedemptionResolver};
pub use source::{CodeSource, RandomCodeSource, SeededCodeSource};
