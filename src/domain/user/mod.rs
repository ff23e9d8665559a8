//! User domain
//!
//! This module provides the card-game user entity, its field validation and
//! the repository trait that storage backends implement.

mod entity;
mod repository;
mod validation;

pub use entity::{
    Character, Deck, DeckCard, OwnedCard, Settings, Stats, User, UserId,
};
pub use repository::{Projection, UserRepository};
pub(crate) use repository::ensure_password_hashed;
pub use validation::{
    validate_email, validate_name, validate_password, UserValidationError, MIN_NAME_LENGTH,
};

#[cfg(test)]
pub use repository::mock::MockUserRepository;
