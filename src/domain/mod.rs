//! Domain layer - User entity, validation and repository contract

pub mod error;
pub mod user;

pub use error::DomainError;
pub use user::{
    Character, Deck, DeckCard, OwnedCard, Projection, Settings, Stats, User, UserId,
    UserRepository, UserValidationError,
};
