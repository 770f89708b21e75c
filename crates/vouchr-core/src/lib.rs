//! Core types and utilities for vouchr.
//!
//! This crate provides the foundational types of the issuance engine:
//!
//! - **Identifiers**: `UserId`, `TransactionId`, `IssuanceId`, `RequestId`
//! - **Accounts**: `CreditAccount`, `MemberRole`
//! - **Products**: `ProductKey`, `ProductCategory`, `ProductStock`, `StockLevel`
//! - **Codes**: `RedemptionCode`, `CodeFormat`, `CodeGenerator`, `IssuedCode`
//! - **Purchases**: `PurchaseRequest`, `LineItem`, `PaymentMethod`, `PurchaseMode`
//! - **Batches**: `BatchCheckpoint`, `BatchRecord`, `BatchProgress`, `BatchState`
//! - **Ledger**: `CreditTransaction`, `TransactionType`
//!
//! # Money
//!
//! Balances and prices are `rust_decimal::Decimal`. No binary floating point
//! touches an amount anywhere in the workspace.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod batch;
pub mod code;
pub mod credits;
pub mod error;
pub mod ids;
pub mod issued;
pub mod product;
pub mod purchase;

pub use account::{CreditAccount, MemberRole, UnknownRole};
pub use batch::{next_chunk_len, BatchCheckpoint, BatchProgress, BatchRecord, BatchState};
pub use code::{CodeError, CodeFormat, CodeGenerator, RedemptionCode, ALPHABET};
pub use credits::{CreditTransaction, TransactionType};
pub use error::{ErrorClass, IssuanceError, Result};
pub use ids::{IdError, IssuanceId, RequestId, TransactionId, UserId};
pub use issued::IssuedCode;
pub use product::{ProductCategory, ProductKey, ProductKeyError, ProductStock, StockLevel};
pub use purchase::{LineItem, PaymentMethod, PurchaseMode, PurchaseRequest};
pub use rust_decimal::Decimal;
