//! # Repository Module
//!
//! Database repository implementations for Vendia.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Caller / Ledger engine                                                 │
//! │       │                                                                 │
//! │       │  db.products().get(account_id, id)                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                      │
//! │  ├── get(&self, account_id, id)          ← pool-backed reads            │
//! │  └── get_tx(conn, account_id, id)        ← same row inside a            │
//! │                                            caller-owned transaction     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `*_tx` associated functions take a `&mut SqliteConnection` so the
//! ledger engine can compose several repository writes into ONE transaction;
//! the multi-table sale commit depends on this.
//!
//! ## Available Repositories
//!
//! - [`account::AccountRepository`] - Accounts and document numbering
//! - [`party::PartyRepository`] - Customers and suppliers
//! - [`product::ProductRepository`] - Product catalog
//! - [`stock::StockRepository`] - Stock counter + movement journal access
//! - [`sale::SaleRepository`] - Sale, line item and serial record rows
//! - [`debt::DebtRepository`] - Receivables, payables, debt payments
//! - [`quotation::QuotationRepository`] - Quotations and their lines

pub mod account;
pub mod debt;
pub mod party;
pub mod product;
pub mod quotation;
pub mod sale;
pub mod stock;
