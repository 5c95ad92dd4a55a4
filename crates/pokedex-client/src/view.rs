//! Screen view models.
//!
//! Everything here is plain data derived from a [`Session`]; the renderer
//! turns it into terminal text.

use pokedex_catalog::{Catalog, Evolution, Record, StatKind, TypeTag};

use crate::session::{DetailTab, Session, Screen};

pub const NO_ENTRY_TEXT: &str = "No entry available.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBadge {
    pub tag: TypeTag,
    pub label: String,
    pub rgb: (u8, u8, u8),
}

impl From<TypeTag> for TypeBadge {
    fn from(tag: TypeTag) -> Self {
        Self {
            tag,
            label: tag.label(),
            rgb: tag.color_rgb(),
        }
    }
}

/// Primary badge, then the secondary one only when present and different.
pub fn type_badges(record: &Record) -> Vec<TypeBadge> {
    record.types().into_iter().map(TypeBadge::from).collect()
}

/// `value / max * 100`, clamped to `[0, 100]`.
pub fn stat_percent(value: u32, max: u32) -> f64 {
    if max == 0 {
        return 0.0;
    }
    (f64::from(value) / f64::from(max) * 100.0).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatBar {
    pub kind: StatKind,
    pub value: u32,
    pub max: u32,
    pub percent: f64,
}

impl StatBar {
    pub fn new(kind: StatKind, value: u32) -> Self {
        let max = kind.declared_max();
        Self {
            kind,
            value,
            max,
            percent: stat_percent(value, max),
        }
    }
}

pub fn stat_bars(record: &Record) -> Vec<StatBar> {
    StatKind::BASE
        .iter()
        .chain(std::iter::once(&StatKind::Total))
        .map(|kind| StatBar::new(*kind, record.stats.get(*kind)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DamageList {
    /// Rendered as an explicit "None".
    None,
    Types(Vec<TypeBadge>),
}

impl DamageList {
    fn from_tags(tags: &[TypeTag]) -> Self {
        if tags.is_empty() {
            DamageList::None
        } else {
            DamageList::Types(tags.iter().copied().map(TypeBadge::from).collect())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageSection {
    pub title: &'static str,
    pub entries: DamageList,
}

pub fn damage_taken(record: &Record) -> Vec<DamageSection> {
    let d = &record.damage;
    vec![
        DamageSection {
            title: "Weak To (2x)",
            entries: DamageList::from_tags(&d.double_damage_from),
        },
        DamageSection {
            title: "Resists (1/2x)",
            entries: DamageList::from_tags(&d.half_damage_from),
        },
        DamageSection {
            title: "Immune To (0x)",
            entries: DamageList::from_tags(&d.no_damage_from),
        },
    ]
}

pub fn damage_dealt(record: &Record) -> Vec<DamageSection> {
    let d = &record.damage;
    vec![
        DamageSection {
            title: "Super Effective Against (2x)",
            entries: DamageList::from_tags(&d.double_damage_to),
        },
        DamageSection {
            title: "Not Very Effective Against (1/2x)",
            entries: DamageList::from_tags(&d.half_damage_to),
        },
        DamageSection {
            title: "No Effect Against (0x)",
            entries: DamageList::from_tags(&d.no_damage_to),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMember {
    pub id: u32,
    pub name: String,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvolutionView {
    DoesNotEvolve,
    Stages(Vec<Vec<ChainMember>>),
}

pub fn evolution_view(catalog: &Catalog, id: u32) -> EvolutionView {
    match catalog.evolution(id) {
        Evolution::DoesNotEvolve => EvolutionView::DoesNotEvolve,
        Evolution::Evolves(chain) => EvolutionView::Stages(
            chain
                .stages
                .iter()
                .map(|stage| {
                    stage
                        .iter()
                        .map(|member| ChainMember {
                            id: *member,
                            name: catalog
                                .get(*member)
                                .map(Record::display_name)
                                .unwrap_or_default(),
                            current: *member == id,
                        })
                        .collect()
                })
                .collect(),
        ),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneralTab {
    pub stats: Vec<StatBar>,
    pub evolution: EvolutionView,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoreInfoTab {
    pub species: Option<String>,
    pub generation: Option<u8>,
    pub height_m: Option<f64>,
    pub weight_kg: Option<f64>,
    pub entry: String,
    pub legendary: bool,
    pub mythical: bool,
    pub evolution_conditions: Vec<String>,
    pub damage_taken: Vec<DamageSection>,
    pub damage_dealt: Vec<DamageSection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TabBody {
    General(GeneralTab),
    MoreInfo(MoreInfoTab),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub id: u32,
    pub name: String,
    pub badges: Vec<TypeBadge>,
    pub artwork_url: Option<String>,
    pub tab: DetailTab,
    pub body: TabBody,
}

pub fn detail_view(catalog: &Catalog, record: &Record, tab: DetailTab) -> DetailView {
    let body = match tab {
        DetailTab::General => TabBody::General(GeneralTab {
            stats: stat_bars(record),
            evolution: evolution_view(catalog, record.id),
        }),
        DetailTab::MoreInfo => TabBody::MoreInfo(MoreInfoTab {
            species: record.species.clone(),
            generation: record.generation,
            height_m: record.height_m,
            weight_kg: record.weight_kg,
            entry: record
                .flavor_text
                .clone()
                .unwrap_or_else(|| NO_ENTRY_TEXT.to_string()),
            legendary: record.is_legendary,
            mythical: record.is_mythical,
            evolution_conditions: record.evolution_conditions.clone(),
            damage_taken: damage_taken(record),
            damage_dealt: damage_dealt(record),
        }),
    };

    DetailView {
        id: record.id,
        name: record.display_name(),
        badges: type_badges(record),
        artwork_url: record
            .official_artwork_url
            .clone()
            .or_else(|| record.sprite_url.clone()),
        tab,
        body,
    }
}

/// One row on the landing or search results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub index: usize,
    pub id: u32,
    pub name: String,
    pub badges: Vec<TypeBadge>,
}

pub fn cards<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<Card> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, r)| Card {
            index,
            id: r.id,
            name: r.display_name(),
            badges: type_badges(r),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenView {
    Landing {
        picks: Vec<Card>,
        total: usize,
    },
    SearchResults {
        query: String,
        pending: bool,
        failed: bool,
        cards: Vec<Card>,
    },
    Detail(Box<DetailView>),
    NotFound {
        id: u32,
    },
}

impl Session {
    pub fn view(&self) -> ScreenView {
        let catalog = self.catalog();
        match self.screen() {
            Screen::Landing => ScreenView::Landing {
                picks: cards(self.landing_picks().iter().filter_map(|id| catalog.get(*id))),
                total: catalog.len(),
            },
            Screen::SearchResults => {
                let search = self.search_state();
                ScreenView::SearchResults {
                    query: search.query.clone(),
                    pending: search.pending.is_some(),
                    failed: search.failed,
                    cards: cards(&search.results),
                }
            }
            Screen::Detail { id } => match catalog.get(id) {
                Some(record) => ScreenView::Detail(Box::new(detail_view(catalog, record, self.tab()))),
                None => ScreenView::NotFound { id },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokedex_catalog::load::catalog_from_json_str;
    use std::sync::Arc;

    fn catalog() -> Catalog {
        catalog_from_json_str(
            r#"[
                {"id": 128, "name": "TAUROS", "primary_type": "normal", "secondary_type": "normal",
                 "hp": 75, "attack": 100, "defense": 95, "special_attack": 40, "special_defense": 70, "speed": 110,
                 "double_damage_from": "fighting"},
                {"id": 133, "name": "eevee", "primary_type": "normal", "next_evolution_id": "134,135"},
                {"id": 134, "name": "vaporeon", "primary_type": "water", "previous_evolution_id": 133},
                {"id": 135, "name": "jolteon", "primary_type": "electric", "previous_evolution_id": 133},
                {"id": 999, "name": "bigmon", "primary_type": "steel", "hp": 300, "attack": 255,
                 "defense": 255, "special_attack": 255, "special_defense": 255, "speed": 255}
            ]"#,
        )
        .unwrap()
        .0
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(stat_percent(0, 255), 0.0);
        assert_eq!(stat_percent(255, 255), 100.0);
        assert_eq!(stat_percent(300, 255), 100.0);
        assert_eq!(stat_percent(10, 0), 0.0);
        assert!((stat_percent(360, 720) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn oversized_stats_draw_full_bars() {
        let c = catalog();
        let bars = stat_bars(c.get(999).unwrap());
        assert_eq!(bars.len(), 7);
        assert_eq!(bars[0].value, 300);
        assert_eq!(bars[0].percent, 100.0);
        let total = bars.last().unwrap();
        assert_eq!(total.kind, StatKind::Total);
        assert_eq!(total.value, 1575);
        assert_eq!(total.max, 720);
        assert_eq!(total.percent, 100.0);
    }

    #[test]
    fn same_secondary_type_is_suppressed() {
        let c = catalog();
        let badges = type_badges(c.get(128).unwrap());
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].label, "Normal");
    }

    #[test]
    fn empty_damage_blocks_are_none() {
        let c = catalog();
        let taken = damage_taken(c.get(128).unwrap());
        assert_eq!(taken[0].entries, DamageList::Types(vec![TypeBadge::from(TypeTag::Fighting)]));
        assert_eq!(taken[1].entries, DamageList::None);
        assert_eq!(taken[2].entries, DamageList::None);
        assert!(damage_dealt(c.get(128).unwrap())
            .iter()
            .all(|s| s.entries == DamageList::None));
    }

    #[test]
    fn branching_chain_marks_current_member() {
        let c = catalog();
        let EvolutionView::Stages(stages) = evolution_view(&c, 135) else {
            panic!("eevee line evolves");
        };
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0][0].name, "Eevee");
        let current: Vec<u32> = stages.iter().flatten().filter(|m| m.current).map(|m| m.id).collect();
        assert_eq!(current, vec![135]);
        assert_eq!(evolution_view(&c, 128), EvolutionView::DoesNotEvolve);
    }

    #[test]
    fn more_info_falls_back_to_placeholder_entry() {
        let c = catalog();
        let view = detail_view(&c, c.get(128).unwrap(), DetailTab::MoreInfo);
        let TabBody::MoreInfo(info) = view.body else {
            panic!("more info tab");
        };
        assert_eq!(info.entry, NO_ENTRY_TEXT);
        assert_eq!(view.name, "Tauros");
    }

    #[test]
    fn missing_detail_is_not_found_placeholder() {
        let mut s = Session::new(Arc::new(catalog()));
        s.open(4242);
        assert_eq!(s.view(), ScreenView::NotFound { id: 4242 });
        s.open(133);
        assert!(matches!(s.view(), ScreenView::Detail(d) if d.id == 133));
    }
}
