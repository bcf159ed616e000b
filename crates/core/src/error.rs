use crate::domain::AlbumId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("album not found: {0}")]
    NotFound(AlbumId),

    #[error("photo not found: {0}")]
    PhotoNotFound(i64),

    #[error("cannot move album {album} under {new_parent}: it would become its own ancestor")]
    Cycle { album: AlbumId, new_parent: AlbumId },

    #[error("album {album} points to missing parent {missing_parent}")]
    BrokenChain {
        album: AlbumId,
        missing_parent: AlbumId,
    },

    #[error("album tree is inconsistent: {0}")]
    ConsistencyViolation(String),

    #[error("album title must not be empty")]
    EmptyTitle,

    #[error("unsupported catalog schema version {0}")]
    UnsupportedSchema(i32),
}

pub type Result<T> = std::result::Result<T, Error>;
