// src/error.rs
use thiserror::Error;

use crate::RoundId;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Response tagged for round {response_round} is neither the current round {current_round} nor a prior one")]
    ArbitrationInvariant {
        response_round: RoundId,
        current_round: RoundId,
    },

    #[error("Round {round_id} has no responders")]
    NoResponders { round_id: RoundId },

    #[error("Round {round_id} is already resolved")]
    AlreadyResolved { round_id: RoundId },

    #[error("Round {round_id} cannot be concluded as pending")]
    StillPending { round_id: RoundId },

    #[error("Mailbox closed while awaiting round {round_id}")]
    MailboxClosed { round_id: RoundId },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, QuizError>;
