//! Matching engine and payment lifecycle state machine for the
//! reconciliation service.
//!
//! The engine ingests two asynchronous streams — expected payments and
//! settled bank transactions — and decides, for each transaction, which
//! payment (if any) it satisfies, using a graded set of matching
//! heuristics ([`kernel`]). It maintains per-payment lifecycle state
//! (received amount, status) and produces an auditable link set
//! ([`payment::ReconciliationLink`]) via the two reconcilers
//! ([`reconciler::reconcile_transaction`], [`reconciler::reconcile_payment`]).
//!
//! Storage is abstracted behind [`repository::Repository`] so the engine
//! does not care whether the backing store is in-memory, an embedded KV,
//! or a relational database.

pub mod config;
pub mod error;
pub mod hmac;
pub mod kernel;
pub mod payment;
pub mod reconciler;
pub mod repository;

pub use config::Settings;
pub use error::ReconcileError;
pub use payment::{
    MatchType, Payment, PaymentInput, PaymentStatus, ReconciliationLink, Transaction,
    TransactionInput,
};
pub use repository::{InMemoryRepository, PaymentFilter, Repository};
