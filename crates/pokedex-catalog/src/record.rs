//! Catalog records with clean internal types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::TypeTag;
use crate::wire::{
    join_list, parse_id_list, parse_text_list, parse_type_list, Scalar, WireRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    Hp,
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
    Speed,
    Total,
}

impl StatKind {
    pub const BASE: [StatKind; 6] = [
        StatKind::Hp,
        StatKind::Attack,
        StatKind::Defense,
        StatKind::SpecialAttack,
        StatKind::SpecialDefense,
        StatKind::Speed,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            StatKind::Hp => "HP",
            StatKind::Attack => "Attack",
            StatKind::Defense => "Defense",
            StatKind::SpecialAttack => "Sp. Atk",
            StatKind::SpecialDefense => "Sp. Def",
            StatKind::Speed => "Speed",
            StatKind::Total => "Total",
        }
    }

    /// Bar scale for this stat. Values above it are clamped when drawn.
    pub const fn declared_max(self) -> u32 {
        match self {
            StatKind::Total => 720,
            _ => 255,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaseStats {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub special_attack: u16,
    pub special_defense: u16,
    pub speed: u16,
}

impl BaseStats {
    pub fn get(&self, kind: StatKind) -> u32 {
        match kind {
            StatKind::Hp => u32::from(self.hp),
            StatKind::Attack => u32::from(self.attack),
            StatKind::Defense => u32::from(self.defense),
            StatKind::SpecialAttack => u32::from(self.special_attack),
            StatKind::SpecialDefense => u32::from(self.special_defense),
            StatKind::Speed => u32::from(self.speed),
            StatKind::Total => self.total(),
        }
    }

    /// Sum of the six base stats. This is the only source of the total.
    pub fn total(&self) -> u32 {
        StatKind::BASE.iter().map(|k| self.get(*k)).sum()
    }
}

/// Damage relations as six type-tag lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DamageRelations {
    pub double_damage_from: Vec<TypeTag>,
    pub half_damage_from: Vec<TypeTag>,
    pub no_damage_from: Vec<TypeTag>,
    pub double_damage_to: Vec<TypeTag>,
    pub half_damage_to: Vec<TypeTag>,
    pub no_damage_to: Vec<TypeTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireRecord", into = "WireRecord")]
pub struct Record {
    pub id: u32,
    pub name: String,
    pub species: Option<String>,
    pub generation: Option<u8>,
    pub primary_type: TypeTag,
    pub secondary_type: Option<TypeTag>,
    pub stats: BaseStats,
    pub height_m: Option<f64>,
    pub weight_kg: Option<f64>,
    pub flavor_text: Option<String>,
    pub official_artwork_url: Option<String>,
    pub sprite_url: Option<String>,
    pub icon_url: Option<String>,
    pub previous_evolution_id: Option<u32>,
    pub next_evolution_ids: Vec<u32>,
    pub evolution_conditions: Vec<String>,
    pub is_legendary: bool,
    pub is_mythical: bool,
    pub damage: DamageRelations,
}

impl Record {
    pub fn base_stat_total(&self) -> u32 {
        self.stats.total()
    }

    /// Name with the first letter uppercased and the rest lowercased.
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
            None => String::new(),
        }
    }

    /// Primary type, then the secondary one when it adds information.
    pub fn types(&self) -> Vec<TypeTag> {
        let mut out = vec![self.primary_type];
        if let Some(second) = self.secondary_type {
            if second != self.primary_type {
                out.push(second);
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record has no valid id")]
    MissingId,
    #[error("record {id} has no name")]
    MissingName { id: u32 },
    #[error("record {id} has no primary type")]
    MissingPrimaryType { id: u32 },
    #[error("record {id} has unknown primary type `{value}`")]
    UnknownPrimaryType { id: u32, value: String },
}

impl TryFrom<WireRecord> for Record {
    type Error = RecordError;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        let id = wire.id().ok_or(RecordError::MissingId)?;
        let name = WireRecord::text(&wire.name).ok_or(RecordError::MissingName { id })?;

        let primary_raw =
            WireRecord::text(&wire.primary_type).ok_or(RecordError::MissingPrimaryType { id })?;
        let primary_type = primary_raw
            .parse::<TypeTag>()
            .map_err(|_| RecordError::UnknownPrimaryType {
                id,
                value: primary_raw.clone(),
            })?;

        let secondary_type = match WireRecord::text(&wire.secondary_type) {
            None => None,
            Some(raw) => match raw.parse::<TypeTag>() {
                Ok(tag) if tag == primary_type => None,
                Ok(tag) => Some(tag),
                Err(err) => {
                    tracing::debug!(id, %err, "dropping malformed secondary type");
                    None
                }
            },
        };

        let stat = |v: &Option<Scalar>| WireRecord::u16_field(v).unwrap_or(0);
        let stats = BaseStats {
            hp: stat(&wire.hp),
            attack: stat(&wire.attack),
            defense: stat(&wire.defense),
            special_attack: stat(&wire.special_attack),
            special_defense: stat(&wire.special_defense),
            speed: stat(&wire.speed),
        };

        let types = |v: &Option<Scalar>| parse_type_list(&WireRecord::list_text(v));
        let damage = DamageRelations {
            double_damage_from: types(&wire.double_damage_from),
            half_damage_from: types(&wire.half_damage_from),
            no_damage_from: types(&wire.no_damage_from),
            double_damage_to: types(&wire.double_damage_to),
            half_damage_to: types(&wire.half_damage_to),
            no_damage_to: types(&wire.no_damage_to),
        };

        Ok(Record {
            id,
            name,
            species: WireRecord::text(&wire.species),
            generation: WireRecord::u8_field(&wire.generation),
            primary_type,
            secondary_type,
            stats,
            height_m: WireRecord::f64_field(&wire.height_m),
            weight_kg: WireRecord::f64_field(&wire.weight_kg),
            flavor_text: WireRecord::text(&wire.flavor_text),
            official_artwork_url: WireRecord::text(&wire.official_artwork_url),
            sprite_url: WireRecord::text(&wire.sprite_url),
            icon_url: WireRecord::text(&wire.icon_url),
            previous_evolution_id: wire.previous_evolution_id(),
            next_evolution_ids: parse_id_list(&WireRecord::list_text(&wire.next_evolution_id)),
            evolution_conditions: parse_text_list(&WireRecord::list_text(
                &wire.evolution_conditions,
            )),
            is_legendary: WireRecord::bool_field(&wire.is_legendary),
            is_mythical: WireRecord::bool_field(&wire.is_mythical),
            damage,
        })
    }
}

impl From<Record> for WireRecord {
    fn from(r: Record) -> Self {
        let text = |s: Option<String>| s.map(Scalar::Text);
        let int = |n: u32| Some(Scalar::Int(i64::from(n)));
        let list = |tags: &[TypeTag]| Some(Scalar::Text(join_list(tags)));
        let total = r.base_stat_total();
        WireRecord {
            id: int(r.id),
            name: Some(Scalar::Text(r.name)),
            species: text(r.species),
            generation: r.generation.map(|g| Scalar::Int(i64::from(g))),
            official_artwork_url: text(r.official_artwork_url),
            sprite_url: text(r.sprite_url),
            icon_url: text(r.icon_url),
            primary_type: Some(Scalar::Text(r.primary_type.as_str().to_string())),
            secondary_type: Some(Scalar::Text(
                r.secondary_type
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_default(),
            )),
            height_m: r.height_m.map(Scalar::Float),
            weight_kg: r.weight_kg.map(Scalar::Float),
            hp: int(u32::from(r.stats.hp)),
            attack: int(u32::from(r.stats.attack)),
            defense: int(u32::from(r.stats.defense)),
            special_attack: int(u32::from(r.stats.special_attack)),
            special_defense: int(u32::from(r.stats.special_defense)),
            speed: int(u32::from(r.stats.speed)),
            base_stat_total: int(total),
            flavor_text: text(r.flavor_text),
            previous_evolution_id: r.previous_evolution_id.map(|id| Scalar::Int(i64::from(id))),
            next_evolution_id: Some(Scalar::Text(join_list(&r.next_evolution_ids))),
            evolution_conditions: Some(Scalar::Text(r.evolution_conditions.join(", "))),
            is_legendary: Some(Scalar::Bool(r.is_legendary)),
            is_mythical: Some(Scalar::Bool(r.is_mythical)),
            double_damage_from: list(&r.damage.double_damage_from),
            half_damage_from: list(&r.damage.half_damage_from),
            no_damage_from: list(&r.damage.no_damage_from),
            double_damage_to: list(&r.damage.double_damage_to),
            half_damage_to: list(&r.damage.half_damage_to),
            no_damage_to: list(&r.damage.no_damage_to),
        }
    }
}
