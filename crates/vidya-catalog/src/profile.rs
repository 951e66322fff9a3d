//! Preference records and preset option lists.
//!
//! The authoring actor personalizes each lesson with the student's name, a
//! familiar object ("like"), a narration language and a character preset.
//! The option lists mirror what the generation backend supports.

use serde::{Deserialize, Serialize};

/// Familiar objects the lesson can be themed around.
pub const LIKES_OPTIONS: [&str; 15] = [
    "Apples", "Bananas", "Avocado", "Panda", "Car", "Clock", "Monkey", "Mango", "Dinosaur",
    "Truck", "Carrot", "Pencil", "Lion", "Bottle", "Tomato",
];

/// Character presets the generation backend can render.
pub const CHARACTER_OPTIONS: [&str; 2] = ["Doraemon", "Chhota Bheem"];

/// Narration languages: display name paired with its BCP-47 code.
pub const LANGUAGE_OPTIONS: [(&str, &str); 15] = [
    ("English", "en"),
    ("Hindi", "hi"),
    ("Marathi", "mr"),
    ("Tamil", "ta"),
    ("Telugu", "te"),
    ("Kannada", "kn"),
    ("Malayalam", "ml"),
    ("Bengali", "bn"),
    ("Gujarati", "gu"),
    ("Punjabi", "pa"),
    ("Urdu", "ur"),
    ("Assamese", "as"),
    ("Oriya", "or"),
    ("Nepali", "ne"),
    ("Sanskrit", "sa"),
];

/// Fallback profile name when none has been stored yet.
const DEFAULT_STUDENT_NAME: &str = "Student";

// ============================================================================
// StudentProfile
// ============================================================================

/// The consuming actor's profile, written by the authoring actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    /// Display name of the student.
    pub name: String,
}

impl Default for StudentProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_STUDENT_NAME.to_string(),
        }
    }
}

impl StudentProfile {
    /// Creates a profile with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

// ============================================================================
// TeacherSelection
// ============================================================================

/// The authoring actor's current personalization choices.
///
/// `language` holds the display name; the wire payload wants the BCP-47
/// code, resolved through [`TeacherSelection::language_code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherSelection {
    /// Selected familiar object, one of [`LIKES_OPTIONS`].
    pub likes: String,

    /// Selected language display name, one of [`LANGUAGE_OPTIONS`].
    pub language: String,

    /// Selected character preset, one of [`CHARACTER_OPTIONS`].
    pub character: String,
}

impl Default for TeacherSelection {
    fn default() -> Self {
        Self {
            likes: LIKES_OPTIONS[0].to_string(),
            language: LANGUAGE_OPTIONS[0].0.to_string(),
            character: CHARACTER_OPTIONS[0].to_string(),
        }
    }
}

impl TeacherSelection {
    /// Resolves the stored language display name to its BCP-47 code.
    ///
    /// Unrecognized display names fall back to English.
    #[must_use]
    pub fn language_code(&self) -> &'static str {
        LANGUAGE_OPTIONS
            .iter()
            .find(|(name, _)| *name == self.language)
            .map_or("en", |(_, code)| code)
    }

    /// Formats the character preset the way the backend expects it.
    ///
    /// Display names are lowercased and spaces become underscores, so
    /// "Chhota Bheem" is sent as "chhota_bheem".
    #[must_use]
    pub fn character_preset(&self) -> String {
        self.character.to_lowercase().replace(' ', "_")
    }

    /// Formats the selected like as a lowercase artifact name.
    #[must_use]
    pub fn artifact(&self) -> String {
        self.likes.to_lowercase()
    }
}

// ============================================================================
// Tests
// ============================================================================
