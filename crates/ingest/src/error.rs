use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("source '{source_name}' failed: {detail}")]
    Source { source_name: String, detail: String },

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("stream error: {0}")]
    Stream(String),
}
