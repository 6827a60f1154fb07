//! Item ingestion pipeline for the market catalog.
//!
//! Turns one upload plus creator-supplied fields into a durably stored,
//! hash-stamped [`Item`](market_types::Item):
//!
//! ```text
//! upload -> derive id/picture -> persist -> canonicalize -> hash -> reconcile
//! ```
//!
//! The record is inserted before its hash is known. If hashing or
//! reconciliation fails, the record stays in the store marked
//! [`HashStatus::Failed`](market_types::HashStatus) (or `Pending` if even that
//! write fails); [`IngestPipeline::repair`] and the [`RepairSweeper`] finish
//! the job later. Nothing is rolled back.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod sweeper;
pub mod upload;

pub use config::IngestConfig;
pub use error::{IngestError, IngestResult};
pub use pipeline::{CreateOutcome, IngestPipeline, Stage, StageTiming, VerifyReport};
pub use sweeper::{RepairSweeper, SweepReport};
pub use upload::{CreateRequest, Upload};
