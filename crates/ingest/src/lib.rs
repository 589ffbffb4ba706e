//! Collaborator contracts around the core: ingestion sources, the
//! trending-hashtag supplier, reply drafting, idea generation, and the
//! supervised stream task.
//!
//! Real platform clients live behind these traits; the core treats their
//! failures as degradation (empty results), never as scheduler errors.

pub mod cycle;
pub mod drafter;
pub mod error;
pub mod hashtags;
pub mod ideas;
pub mod source;
pub mod stream;

pub use cycle::{ingest_cycle, SourceRun};
pub use drafter::{NoDrafter, ReplyDrafter};
pub use error::IngestError;
pub use hashtags::{normalize_hashtags, CachedHashtags, HashtagSource, StaticHashtags};
pub use ideas::{ensure_today_ideas, IdeaGenerator, NoIdeaGenerator};
pub use source::{PostSource, StaticSource};
pub use stream::{StreamClient, StreamSupervisor};
