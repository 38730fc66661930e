//! Gridded reanalysis fields organized as a validated time series.
//!
//! A [`GriddedFieldSet`] is built once from a flat stream of already-decoded
//! [`GridRecord`]s that fall inside an inclusive time window. Records are
//! grouped by [`Variable`](reanalysis_common::Variable), aligned on a sorted
//! timestep axis and tagged with their physical unit. A variable that is not
//! present at every timestep is masked as a whole rather than kept partially.
//!
//! # Architecture
//!
//! ```text
//! Retriever::retrieve(request)
//!      │
//!      ▼
//! RecordSource ──► FieldSetBuilder::push(record)
//!                       │
//!                       ├─► window filter, timestep registration
//!                       ├─► Variable classification (unknown = fatal)
//!                       └─► ocean grid captured from first SST record
//!                       │
//!                       ▼
//!                  FieldSetBuilder::finish()
//!                       │
//!                       └─► GriddedFieldSet { timesteps, grids, variables }
//! ```

pub mod dataset;
pub mod error;
pub mod field;
pub mod record;
pub mod source;

pub use dataset::{FieldSetBuilder, GriddedFieldSet};
pub use error::{FieldSetError, Result};
pub use field::{Coverage, GriddedVariable, MaskReason};
pub use record::GridRecord;
pub use source::{fetch_field_set, RecordSource, RetrievalRequest, Retriever};
