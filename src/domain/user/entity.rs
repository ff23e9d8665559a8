//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::validation::{validate_email, validate_name, validate_password, UserValidationError};

/// User identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a new random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_level() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// A playable character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    #[serde(default)]
    pub character_name: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub race: String,
}

impl Character {
    /// Create a level 1 character
    pub fn new(
        character_name: impl Into<String>,
        class: impl Into<String>,
        race: impl Into<String>,
    ) -> Self {
        Self {
            character_name: character_name.into(),
            level: default_level(),
            class: class.into(),
            race: race.into(),
        }
    }
}

/// A card in the user's collection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedCard {
    #[serde(default)]
    pub card_id: String,
    #[serde(default)]
    pub card_type: String,
    /// Free-form card attributes
    #[serde(default)]
    pub card_details: Map<String, Value>,
}

/// One entry of a deck list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckCard {
    #[serde(default)]
    pub card_id: String,
    #[serde(default)]
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    #[serde(default)]
    pub deck_name: String,
    #[serde(default)]
    pub cards: Vec<DeckCard>,
}

/// Lifetime game statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default)]
    pub games_played: u64,
    #[serde(default)]
    pub games_won: u64,
    #[serde(default, rename = "totalXP")]
    pub total_xp: u64,
}

/// Per-user client preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_true")]
    pub notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            notifications: true,
        }
    }
}

/// User entity for the card game
///
/// The password never travels with the serialized document. It is either the
/// plaintext set by [`User::new`] / [`User::set_password`] (marked modified and
/// hashed before the next write) or the stored hash, present only when the
/// record was read with the password projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier for the user
    id: UserId,
    first_name: String,
    last_name: String,
    email: String,
    #[serde(skip)]
    password: Option<String>,
    /// Set when `password` holds plaintext that has not been hashed yet
    #[serde(skip)]
    password_modified: bool,
    #[serde(default)]
    characters: Vec<Character>,
    #[serde(default)]
    owned_cards: Vec<OwnedCard>,
    #[serde(default)]
    decks: Vec<Deck>,
    #[serde(default)]
    stats: Stats,
    #[serde(default)]
    achievements: Vec<String>,
    #[serde(default)]
    settings: Settings,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a plaintext password and empty game records
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: UserId::generate(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password: Some(password.into()),
            password_modified: true,
            characters: Vec::new(),
            owned_cards: Vec::new(),
            decks: Vec::new(),
            stats: Stats::default(),
            achievements: Vec::new(),
            settings: Settings::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check every field rule
    ///
    /// A missing password is only an error while the record has never been
    /// stored; reads without the password projection leave it unset.
    pub fn validate(&self, is_new: bool) -> Result<(), UserValidationError> {
        validate_name("firstName", &self.first_name)?;
        validate_name("lastName", &self.last_name)?;
        validate_email(&self.email)?;

        if is_new || self.password.is_some() {
            validate_password(self.password.as_deref())?;
        }

        Ok(())
    }

    // Getters

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// The stored hash, or pending plaintext when [`Self::is_password_modified`]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn is_password_modified(&self) -> bool {
        self.password_modified
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn owned_cards(&self) -> &[OwnedCard] {
        &self.owned_cards
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn achievements(&self) -> &[String] {
        &self.achievements
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    pub fn set_first_name(&mut self, first_name: impl Into<String>) {
        self.first_name = first_name.into();
        self.touch();
    }

    pub fn set_last_name(&mut self, last_name: impl Into<String>) {
        self.last_name = last_name.into();
        self.touch();
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.touch();
    }

    /// Replace the password with new plaintext, to be hashed before the next write
    ///
    /// Writing back the stored hash unchanged is a no-op.
    pub fn set_password(&mut self, password: impl Into<String>) {
        let password = password.into();

        if !self.password_modified && self.password.as_deref() == Some(password.as_str()) {
            return;
        }

        self.password = Some(password);
        self.password_modified = true;
        self.touch();
    }

    /// Swap pending plaintext for its hash and clear the modified flag
    pub(crate) fn apply_password_hash(&mut self, hash: String) {
        self.password = Some(hash);
        self.password_modified = false;
    }

    /// Drop the password, as a default projection read does
    pub(crate) fn without_password(mut self) -> Self {
        self.password = None;
        self.password_modified = false;
        self
    }

    /// Attach a hash read back from the store
    pub(crate) fn with_stored_password(mut self, hash: String) -> Self {
        self.password = Some(hash);
        self.password_modified = false;
        self
    }

    pub fn add_character(&mut self, character: Character) {
        self.characters.push(character);
        self.touch();
    }

    pub fn characters_mut(&mut self) -> &mut Vec<Character> {
        self.touch();
        &mut self.characters
    }

    pub fn add_owned_card(&mut self, card: OwnedCard) {
        self.owned_cards.push(card);
        self.touch();
    }

    pub fn owned_cards_mut(&mut self) -> &mut Vec<OwnedCard> {
        self.touch();
        &mut self.owned_cards
    }

    pub fn add_deck(&mut self, deck: Deck) {
        self.decks.push(deck);
        self.touch();
    }

    pub fn decks_mut(&mut self) -> &mut Vec<Deck> {
        self.touch();
        &mut self.decks
    }

    /// Count a finished game and award experience
    pub fn record_game(&mut self, won: bool, xp: u64) {
        self.stats.games_played = self.stats.games_played.saturating_add(1);
        if won {
            self.stats.games_won = self.stats.games_won.saturating_add(1);
        }
        self.stats.total_xp = self.stats.total_xp.saturating_add(xp);
        self.touch();
    }

    /// Add an achievement; returns false if it was already unlocked
    pub fn unlock_achievement(&mut self, achievement: impl Into<String>) -> bool {
        let achievement = achievement.into();

        if self.achievements.contains(&achievement) {
            return false;
        }

        self.achievements.push(achievement);
        self.touch();
        true
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
