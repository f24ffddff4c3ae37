//! Stream state: fragment ingestion, offset indexing, and the session worker.

pub mod fragment;
pub mod offset_index;
pub mod session;
pub mod worker;

pub use fragment::{read_fragment, FragmentOutcome};
pub use offset_index::OffsetIndex;
pub use session::Session;
pub use worker::session_worker_loop;
