use thiserror::Error;

#[derive(Debug, Error)]
pub enum HallError {
    #[error("invalid hall layout: {0}")]
    InvalidLayout(String),
    #[error("could not allocate a {width}x{height} drawing surface: {reason}")]
    Surface {
        width: u32,
        height: u32,
        reason: String,
    },
    #[error("content descriptor: {0}")]
    Content(#[from] serde_json::Error),
}
