//! Scoring, trending lifecycle, and alert selection.
//!
//! [`score`] is the pure scoring engine; [`authors`] the per-author
//! adaptive threshold; [`trend`] the per-cycle trending state machine;
//! [`alert`] picks which trending posts merit an outbound alert.

pub mod alert;
pub mod authors;
pub mod score;
pub mod trend;

pub use alert::{select_alerts, AlertBatch, AlertKind, ALERT_DEDUP_EPSILON};
pub use authors::{required_engagement, AuthorStats, ScaleBand};
pub use score::{compute_scores, score_metrics, time_decay, Scores, SCORE_CAP};
pub use trend::{rank_and_mark, RankOptions};
