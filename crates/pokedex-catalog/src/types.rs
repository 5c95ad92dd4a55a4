//! Type tags: the closed set of categorical labels used for a record's own
//! typing and for its damage-relation lists.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl TypeTag {
    pub const ALL: [TypeTag; 18] = [
        TypeTag::Normal,
        TypeTag::Fire,
        TypeTag::Water,
        TypeTag::Electric,
        TypeTag::Grass,
        TypeTag::Ice,
        TypeTag::Fighting,
        TypeTag::Poison,
        TypeTag::Ground,
        TypeTag::Flying,
        TypeTag::Psychic,
        TypeTag::Bug,
        TypeTag::Rock,
        TypeTag::Ghost,
        TypeTag::Dragon,
        TypeTag::Dark,
        TypeTag::Steel,
        TypeTag::Fairy,
    ];

    /// Lowercase wire name (`"fire"`, `"psychic"`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            TypeTag::Normal => "normal",
            TypeTag::Fire => "fire",
            TypeTag::Water => "water",
            TypeTag::Electric => "electric",
            TypeTag::Grass => "grass",
            TypeTag::Ice => "ice",
            TypeTag::Fighting => "fighting",
            TypeTag::Poison => "poison",
            TypeTag::Ground => "ground",
            TypeTag::Flying => "flying",
            TypeTag::Psychic => "psychic",
            TypeTag::Bug => "bug",
            TypeTag::Rock => "rock",
            TypeTag::Ghost => "ghost",
            TypeTag::Dragon => "dragon",
            TypeTag::Dark => "dark",
            TypeTag::Steel => "steel",
            TypeTag::Fairy => "fairy",
        }
    }

    /// Capitalized label for badges (`"Fire"`).
    pub fn label(self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }

    /// Badge color as an RGB triple.
    pub const fn color_rgb(self) -> (u8, u8, u8) {
        match self {
            TypeTag::Normal => (0xA8, 0xA7, 0x7A),
            TypeTag::Fire => (0xEE, 0x81, 0x30),
            TypeTag::Water => (0x63, 0x90, 0xF0),
            TypeTag::Electric => (0xF7, 0xD0, 0x2C),
            TypeTag::Grass => (0x7A, 0xC7, 0x4C),
            TypeTag::Ice => (0x96, 0xD9, 0xD6),
            TypeTag::Fighting => (0xC2, 0x2E, 0x28),
            TypeTag::Poison => (0xA3, 0x3E, 0xA1),
            TypeTag::Ground => (0xE2, 0xBF, 0x65),
            TypeTag::Flying => (0xA9, 0x8F, 0xF3),
            TypeTag::Psychic => (0xF9, 0x55, 0x87),
            TypeTag::Bug => (0xA6, 0xB9, 0x1A),
            TypeTag::Rock => (0xB6, 0xA1, 0x36),
            TypeTag::Ghost => (0x73, 0x57, 0x97),
            TypeTag::Dragon => (0x6F, 0x35, 0xFC),
            TypeTag::Dark => (0x70, 0x57, 0x46),
            TypeTag::Steel => (0xB7, 0xB7, 0xCE),
            TypeTag::Fairy => (0xD6, 0x85, 0xAD),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTypeTag(pub String);

impl fmt::Display for UnknownTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown type tag `{}`", self.0)
    }
}

impl std::error::Error for UnknownTypeTag {}

impl FromStr for TypeTag {
    type Err = UnknownTypeTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TypeTag::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or(UnknownTypeTag(s.trim().to_string()))
    }
}
