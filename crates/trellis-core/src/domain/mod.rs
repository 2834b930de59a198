//! Domain model (IDs, records, paging, merge strategies, context, events).

pub mod context;
pub mod errors;
pub mod events;
pub mod ids;
pub mod merge;
pub mod page;
pub mod record;

pub use context::{CancelHandle, Context, Interrupted};
pub use errors::{Operation, ValidationError};
pub use events::{DomainEvent, EventEnvelope};
pub use ids::{EventId, RecordId};
pub use merge::{FullReplace, Patch, RecordUpdate, SparsePatch, UpdateMerger};
pub use page::PageRequest;
pub use record::{NewRecord, Record};
