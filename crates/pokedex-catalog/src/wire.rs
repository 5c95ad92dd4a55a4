//! The flat "wire" shape records travel in.
//!
//! Every boundary (JSON dataset files, the CSV pair, HTTP responses) speaks
//! this shape: scalars that may arrive as numbers or strings, and list-valued
//! fields packed into comma-delimited strings with `nan`/empty sentinels for
//! "no value". Parsing happens here once; [`crate::Record`] only ever holds
//! clean types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::TypeTag;

/// A loosely typed wire scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// `true` for the tokens that mean "no value": empty/whitespace and `nan`.
pub fn is_missing_token(token: &str) -> bool {
    let t = token.trim();
    t.is_empty() || t.eq_ignore_ascii_case("nan")
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_integral_text(s: &str) -> Option<i64> {
    let t = s.trim();
    if is_missing_token(t) {
        return None;
    }
    if let Ok(n) = t.parse::<i64>() {
        return Some(n);
    }
    // Flat-table exports sometimes carry ids as floats ("307.0").
    t.parse::<f64>().ok().and_then(integral)
}

impl Scalar {
    fn as_integral(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            Scalar::Float(f) => integral(*f),
            Scalar::Text(s) => parse_integral_text(s),
            Scalar::Bool(_) => None,
        }
    }

    /// A positive record id.
    pub fn as_id(&self) -> Option<u32> {
        self.as_integral()
            .filter(|n| *n > 0)
            .and_then(|n| u32::try_from(n).ok())
    }

    /// Non-negative integer, saturating at `u16::MAX`.
    pub fn as_u16(&self) -> Option<u16> {
        self.as_integral()
            .filter(|n| *n >= 0)
            .map(|n| u16::try_from(n).unwrap_or(u16::MAX))
    }

    pub fn as_u8(&self) -> Option<u8> {
        self.as_integral()
            .filter(|n| *n >= 0)
            .and_then(|n| u8::try_from(n).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Scalar::Int(n) => *n as f64,
            Scalar::Float(f) => *f,
            Scalar::Text(s) => {
                if is_missing_token(s) {
                    return None;
                }
                s.trim().parse::<f64>().ok()?
            }
            Scalar::Bool(_) => return None,
        };
        v.is_finite().then_some(v)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            Scalar::Int(n) => Some(*n != 0),
            Scalar::Float(f) => integral(*f).map(|n| n != 0),
            Scalar::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                other => parse_integral_text(other).map(|n| n != 0),
            },
        }
    }

    /// Non-empty text with sentinels removed. Numbers are rendered as text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Scalar::Text(s) => {
                if is_missing_token(s) {
                    None
                } else {
                    Some(s.trim().to_string())
                }
            }
            Scalar::Int(n) => Some(n.to_string()),
            Scalar::Float(f) if f.is_finite() => Some(f.to_string()),
            Scalar::Float(_) => None,
            Scalar::Bool(b) => Some(b.to_string()),
        }
    }
}

fn scalar<T>(value: &Option<Scalar>, f: impl FnOnce(&Scalar) -> Option<T>) -> Option<T> {
    value.as_ref().and_then(f)
}

/// Split a comma-delimited field into trimmed, non-sentinel tokens.
pub fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !is_missing_token(token))
}

/// Parse a comma-delimited id list. Unparseable entries are dropped.
pub fn parse_id_list(raw: &str) -> Vec<u32> {
    split_list(raw)
        .filter_map(|token| {
            let id = parse_integral_text(token)
                .filter(|n| *n > 0)
                .and_then(|n| u32::try_from(n).ok());
            if id.is_none() {
                tracing::debug!(token, "dropping malformed evolution id");
            }
            id
        })
        .collect()
}

/// Parse a comma-delimited type list. Unknown tags are dropped.
pub fn parse_type_list(raw: &str) -> Vec<TypeTag> {
    split_list(raw)
        .filter_map(|token| match token.to_ascii_lowercase().parse::<TypeTag>() {
            Ok(tag) => Some(tag),
            Err(err) => {
                tracing::debug!(%err, "dropping malformed type tag");
                None
            }
        })
        .collect()
}

pub fn parse_text_list(raw: &str) -> Vec<String> {
    split_list(raw).map(str::to_string).collect()
}

pub fn join_list<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// A record in its wire shape. Every field is optional; missing columns and
/// JSON `null` both read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireRecord {
    pub id: Option<Scalar>,
    pub name: Option<Scalar>,
    pub species: Option<Scalar>,
    pub generation: Option<Scalar>,
    pub official_artwork_url: Option<Scalar>,
    pub sprite_url: Option<Scalar>,
    pub icon_url: Option<Scalar>,
    pub primary_type: Option<Scalar>,
    pub secondary_type: Option<Scalar>,
    pub height_m: Option<Scalar>,
    pub weight_kg: Option<Scalar>,
    pub hp: Option<Scalar>,
    pub attack: Option<Scalar>,
    pub defense: Option<Scalar>,
    pub special_attack: Option<Scalar>,
    pub special_defense: Option<Scalar>,
    pub speed: Option<Scalar>,
    pub base_stat_total: Option<Scalar>,
    pub flavor_text: Option<Scalar>,
    pub previous_evolution_id: Option<Scalar>,
    pub next_evolution_id: Option<Scalar>,
    pub evolution_conditions: Option<Scalar>,
    pub is_legendary: Option<Scalar>,
    pub is_mythical: Option<Scalar>,
    pub double_damage_from: Option<Scalar>,
    pub half_damage_from: Option<Scalar>,
    pub no_damage_from: Option<Scalar>,
    pub double_damage_to: Option<Scalar>,
    pub half_damage_to: Option<Scalar>,
    pub no_damage_to: Option<Scalar>,
}

/// Damage columns as stored in the separate damage-relations table.
pub const DAMAGE_COLUMNS: [&str; 6] = [
    "double_damage_from",
    "half_damage_from",
    "no_damage_from",
    "double_damage_to",
    "half_damage_to",
    "no_damage_to",
];

impl WireRecord {
    pub fn id(&self) -> Option<u32> {
        scalar(&self.id, Scalar::as_id)
    }

    pub fn text(value: &Option<Scalar>) -> Option<String> {
        scalar(value, Scalar::as_text)
    }

    /// Raw list text of a list-valued field (empty when absent).
    pub fn list_text(value: &Option<Scalar>) -> String {
        Self::text(value).unwrap_or_default()
    }

    pub fn u16_field(value: &Option<Scalar>) -> Option<u16> {
        scalar(value, Scalar::as_u16)
    }

    pub fn u8_field(value: &Option<Scalar>) -> Option<u8> {
        scalar(value, Scalar::as_u8)
    }

    pub fn f64_field(value: &Option<Scalar>) -> Option<f64> {
        scalar(value, Scalar::as_f64)
    }

    pub fn bool_field(value: &Option<Scalar>) -> bool {
        scalar(value, Scalar::as_bool).unwrap_or(false)
    }

    pub fn previous_evolution_id(&self) -> Option<u32> {
        scalar(&self.previous_evolution_id, Scalar::as_id)
    }

    /// The total as declared by the source, if any.
    pub fn declared_total(&self) -> Option<u32> {
        scalar(&self.base_stat_total, Scalar::as_integral)
            .filter(|n| *n >= 0)
            .and_then(|n| u32::try_from(n).ok())
    }

    /// Build a wire record from one CSV row (header → cell).
    pub fn from_columns(row: &HashMap<String, String>) -> Self {
        let cell = |name: &str| -> Option<Scalar> {
            row.get(name)
                .filter(|v| !v.trim().is_empty())
                .map(|v| Scalar::Text(v.clone()))
        };
        Self {
            id: cell("id"),
            name: cell("name"),
            species: cell("species"),
            generation: cell("generation"),
            official_artwork_url: cell("official_artwork_url"),
            sprite_url: cell("sprite_url"),
            icon_url: cell("icon_url"),
            primary_type: cell("primary_type"),
            secondary_type: cell("secondary_type"),
            height_m: cell("height_m"),
            weight_kg: cell("weight_kg"),
            hp: cell("hp"),
            attack: cell("attack"),
            defense: cell("defense"),
            special_attack: cell("special_attack"),
            special_defense: cell("special_defense"),
            speed: cell("speed"),
            base_stat_total: cell("base_stat_total"),
            flavor_text: cell("flavor_text"),
            previous_evolution_id: cell("previous_evolution_id"),
            next_evolution_id: cell("next_evolution_id"),
            evolution_conditions: cell("evolution_conditions"),
            is_legendary: cell("is_legendary"),
            is_mythical: cell("is_mythical"),
            double_damage_from: cell("double_damage_from"),
            half_damage_from: cell("half_damage_from"),
            no_damage_from: cell("no_damage_from"),
            double_damage_to: cell("double_damage_to"),
            half_damage_to: cell("half_damage_to"),
            no_damage_to: cell("no_damage_to"),
        }
    }

    /// Fill damage columns from a damage-table row. Columns the record
    /// already carries are left alone.
    pub fn merge_damage_columns(&mut self, row: &HashMap<String, String>) {
        let cell = |name: &str| -> Option<Scalar> {
            row.get(name)
                .filter(|v| !v.trim().is_empty())
                .map(|v| Scalar::Text(v.clone()))
        };
        let slots: [(&mut Option<Scalar>, &str); 6] = [
            (&mut self.double_damage_from, DAMAGE_COLUMNS[0]),
            (&mut self.half_damage_from, DAMAGE_COLUMNS[1]),
            (&mut self.no_damage_from, DAMAGE_COLUMNS[2]),
            (&mut self.double_damage_to, DAMAGE_COLUMNS[3]),
            (&mut self.half_damage_to, DAMAGE_COLUMNS[4]),
            (&mut self.no_damage_to, DAMAGE_COLUMNS[5]),
        ];
        for (slot, column) in slots {
            if slot.is_none() {
                *slot = cell(column);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_list_drops_sentinels_and_garbage() {
        assert_eq!(parse_id_list("134, 135 ,136"), vec![134, 135, 136]);
        assert_eq!(parse_id_list(""), Vec::<u32>::new());
        assert_eq!(parse_id_list("NaN"), Vec::<u32>::new());
        assert_eq!(parse_id_list("2,,abc,nan,3.0,-4,0"), vec![2, 3]);
    }

    #[test]
    fn type_list_lowercases_and_drops_unknown() {
        assert_eq!(
            parse_type_list("Fire, WATER,,shadow"),
            vec![TypeTag::Fire, TypeTag::Water]
        );
    }

    #[test]
    fn scalar_ids_accept_numbers_floats_and_strings() {
        assert_eq!(Scalar::Int(307).as_id(), Some(307));
        assert_eq!(Scalar::Float(307.0).as_id(), Some(307));
        assert_eq!(Scalar::Text(" 307.0 ".into()).as_id(), Some(307));
        assert_eq!(Scalar::Text("nan".into()).as_id(), None);
        assert_eq!(Scalar::Float(f64::NAN).as_id(), None);
        assert_eq!(Scalar::Float(1.5).as_id(), None);
        assert_eq!(Scalar::Int(0).as_id(), None);
    }

    #[test]
    fn oversized_stats_saturate() {
        assert_eq!(Scalar::Int(70_000).as_u16(), Some(u16::MAX));
        assert_eq!(Scalar::Text("1e6".into()).as_u16(), Some(u16::MAX));
        assert_eq!(Scalar::Int(255).as_u16(), Some(255));
        assert_eq!(Scalar::Int(-1).as_u16(), None);
    }

    #[test]
    fn scalar_bools_accept_flat_table_encodings() {
        assert_eq!(Scalar::Text("1".into()).as_bool(), Some(true));
        assert_eq!(Scalar::Text("False".into()).as_bool(), Some(false));
        assert_eq!(Scalar::Int(0).as_bool(), Some(false));
        assert_eq!(Scalar::Bool(true).as_bool(), Some(true));
    }

    #[test]
    fn wire_record_reads_mixed_json() {
        let json = r#"{"id": "25", "name": "pikachu", "previous_evolution_id": 172.0,
                       "next_evolution_id": 26, "hp": "35", "is_legendary": 0, "flavor_text": null}"#;
        let wire: WireRecord = serde_json::from_str(json).unwrap();
        assert_eq!(wire.id(), Some(25));
        assert_eq!(wire.previous_evolution_id(), Some(172));
        assert_eq!(parse_id_list(&WireRecord::list_text(&wire.next_evolution_id)), vec![26]);
        assert_eq!(WireRecord::u16_field(&wire.hp), Some(35));
        assert!(!WireRecord::bool_field(&wire.is_legendary));
        assert_eq!(WireRecord::text(&wire.flavor_text), None);
    }

    #[test]
    fn merge_damage_keeps_existing_columns() {
        let mut wire = WireRecord {
            double_damage_from: Some(Scalar::Text("ground".into())),
            ..WireRecord::default()
        };
        let row: HashMap<String, String> = [
            ("double_damage_from".to_string(), "water".to_string()),
            ("half_damage_from".to_string(), "fire,steel".to_string()),
            ("no_damage_from".to_string(), "".to_string()),
        ]
        .into_iter()
        .collect();
        wire.merge_damage_columns(&row);
        assert_eq!(WireRecord::list_text(&wire.double_damage_from), "ground");
        assert_eq!(WireRecord::list_text(&wire.half_damage_from), "fire,steel");
        assert_eq!(wire.no_damage_from, None);
    }
}
