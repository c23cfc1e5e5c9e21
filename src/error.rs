use thiserror::Error;

use crate::sim::SnakeId;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown snake: {0:?}")]
    UnknownSnake(SnakeId),

    #[error("Room is full ({0} players)")]
    RoomFull(usize),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Account service error: {0}")]
    Service(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
