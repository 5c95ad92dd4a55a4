//! Terminal rendering of [`ScreenView`]s with `colored`.
//!
//! Color can be switched off globally with `colored::control::set_override`.

use colored::Colorize;

use crate::session::{DetailTab, ErrorBanner};
use crate::view::{
    Card, DamageList, DamageSection, DetailView, EvolutionView, GeneralTab, MoreInfoTab,
    ScreenView, StatBar, TabBody, TypeBadge,
};

pub const BAR_WIDTH: usize = 24;

const HIGHLIGHT: (u8, u8, u8) = (0xff, 0xcb, 0x05);

pub fn badge(b: &TypeBadge) -> String {
    let (r, g, bl) = b.rgb;
    format!(" {} ", b.label)
        .on_truecolor(r, g, bl)
        .truecolor(255, 255, 255)
        .bold()
        .to_string()
}

pub fn badges(list: &[TypeBadge]) -> String {
    list.iter().map(badge).collect::<Vec<_>>().join(" ")
}

/// A fixed-width block bar filled to `percent` (already clamped).
pub fn bar(percent: f64, width: usize) -> String {
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn stat_line(s: &StatBar) -> String {
    let (r, g, b) = if s.percent >= 50.0 {
        (0x4c, 0xaf, 0x50)
    } else if s.percent >= 25.0 {
        (0xff, 0xc1, 0x07)
    } else {
        (0xf4, 0x43, 0x36)
    };
    format!(
        "  {:<8} {:>4} {}",
        s.kind.label(),
        s.value,
        bar(s.percent, BAR_WIDTH).truecolor(r, g, b)
    )
}

fn heading(text: &str) -> String {
    text.bold().underline().to_string()
}

pub fn card_line(c: &Card) -> String {
    format!(
        "  [{}] {} {}  {}",
        c.index + 1,
        format!("#{:03}", c.id).dimmed(),
        c.name.bold(),
        badges(&c.badges)
    )
}

pub fn render_evolution(evo: &EvolutionView) -> String {
    match evo {
        EvolutionView::DoesNotEvolve => "  This creature does not evolve.".italic().to_string(),
        EvolutionView::Stages(stages) => {
            let (r, g, b) = HIGHLIGHT;
            let parts: Vec<String> = stages
                .iter()
                .map(|stage| {
                    stage
                        .iter()
                        .map(|m| {
                            let label = format!("#{} {}", m.id, m.name);
                            if m.current {
                                format!("[{label}]").truecolor(r, g, b).bold().to_string()
                            } else {
                                label
                            }
                        })
                        .collect::<Vec<_>>()
                        .join(" / ")
                })
                .collect();
            format!("  {}", parts.join(" → "))
        }
    }
}

fn damage_block(out: &mut Vec<String>, sections: &[DamageSection]) {
    for s in sections {
        let entries = match &s.entries {
            DamageList::None => "None".dimmed().to_string(),
            DamageList::Types(list) => badges(list),
        };
        out.push(format!("  {}: {}", s.title.bold(), entries));
    }
}

fn general_tab(out: &mut Vec<String>, tab: &GeneralTab) {
    out.push(heading("Base Stats"));
    out.extend(tab.stats.iter().map(stat_line));
    out.push(String::new());
    out.push(heading("Evolution Chain"));
    out.push(render_evolution(&tab.evolution));
}

fn more_info_tab(out: &mut Vec<String>, info: &MoreInfoTab) {
    fn or_unknown<T: ToString>(v: &Option<T>) -> String {
        v.as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "unknown".to_string())
    }

    out.push(format!("  {} {}", "Species:".bold(), or_unknown(&info.species)));
    out.push(format!("  {} {}", "Generation:".bold(), or_unknown(&info.generation)));
    out.push(format!(
        "  {} {}",
        "Height:".bold(),
        info.height_m
            .map(|h| format!("{h} m"))
            .unwrap_or_else(|| "unknown".to_string())
    ));
    out.push(format!(
        "  {} {}",
        "Weight:".bold(),
        info.weight_kg
            .map(|w| format!("{w} kg"))
            .unwrap_or_else(|| "unknown".to_string())
    ));
    if info.legendary {
        out.push(format!("  {}", "Legendary".truecolor(0xff, 0xcb, 0x05).bold()));
    }
    if info.mythical {
        out.push(format!("  {}", "Mythical".truecolor(0xb3, 0x88, 0xff).bold()));
    }
    if !info.evolution_conditions.is_empty() {
        out.push(format!(
            "  {} {}",
            "Evolves by:".bold(),
            info.evolution_conditions.join(", ")
        ));
    }
    out.push(String::new());
    out.push(heading("Pokédex Entry"));
    out.push(format!("  {}", info.entry));
    out.push(String::new());
    out.push(heading("Damage Taken"));
    damage_block(out, &info.damage_taken);
    out.push(String::new());
    out.push(heading("Damage Dealt"));
    damage_block(out, &info.damage_dealt);
}

pub fn render_detail(d: &DetailView) -> String {
    let mut out = Vec::new();
    out.push(format!(
        "{} {}  {}",
        format!("#{:03}", d.id).dimmed(),
        d.name.bold(),
        badges(&d.badges)
    ));
    if let Some(url) = &d.artwork_url {
        out.push(format!("  {}", url.dimmed()));
    }

    let tabs: Vec<String> = DetailTab::ORDER
        .iter()
        .map(|t| {
            if *t == d.tab {
                format!("[{}]", t.label()).bold().to_string()
            } else {
                format!(" {} ", t.label()).dimmed().to_string()
            }
        })
        .collect();
    out.push(tabs.join(" "));
    out.push(String::new());

    match &d.body {
        TabBody::General(tab) => general_tab(&mut out, tab),
        TabBody::MoreInfo(info) => more_info_tab(&mut out, info),
    }
    out.join("\n")
}

pub fn render_banner(b: &ErrorBanner) -> String {
    format!("{} {}", "error:".red().bold(), b.message.red())
}

pub fn render_screen(view: &ScreenView, banner: Option<&ErrorBanner>) -> String {
    let mut out = Vec::new();
    if let Some(b) = banner {
        out.push(render_banner(b));
        out.push(String::new());
    }

    match view {
        ScreenView::Landing { picks, total } => {
            out.push(heading("Pokédex"));
            out.push(format!("  {total} creatures in the catalog."));
            if !picks.is_empty() {
                out.push(String::new());
                out.push("Random picks (`view <n>` to open):".to_string());
                out.extend(picks.iter().map(card_line));
            }
        }
        ScreenView::SearchResults {
            query,
            pending,
            failed,
            cards,
        } => {
            out.push(heading(&format!("Results for \"{query}\"")));
            if *pending {
                out.push("  searching...".dimmed().to_string());
            } else if *failed {
                out.push("  Search failed; results unavailable.".italic().to_string());
            } else if cards.is_empty() {
                out.push("  No matches.".italic().to_string());
            } else {
                out.extend(cards.iter().map(card_line));
            }
        }
        ScreenView::Detail(d) => out.push(render_detail(d)),
        ScreenView::NotFound { id } => {
            out.push(format!("{} #{id} is not in the catalog.", "not found:".yellow().bold()));
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::session::Session;
    use pokedex_catalog::load::catalog_from_json_str;
    use std::sync::Arc;
    use std::time::Instant;

    fn session() -> Session {
        colored::control::set_override(false);
        let (catalog, _) = catalog_from_json_str(
            r#"[
                {"id": 1, "name": "bulbasaur", "primary_type": "grass", "secondary_type": "poison",
                 "hp": 45, "attack": 49, "defense": 49, "special_attack": 65, "special_defense": 65, "speed": 45,
                 "next_evolution_id": "2", "double_damage_from": "fire,ice,flying,psychic",
                 "half_damage_from": "water,electric,grass,fighting,fairy"},
                {"id": 2, "name": "ivysaur", "primary_type": "grass", "previous_evolution_id": 1}
            ]"#,
        )
        .unwrap();
        Session::new(Arc::new(catalog))
    }

    #[test]
    fn bar_width_is_fixed() {
        assert_eq!(bar(0.0, 10), "░".repeat(10));
        assert_eq!(bar(100.0, 10), "█".repeat(10));
        assert_eq!(bar(50.0, 10), format!("{}{}", "█".repeat(5), "░".repeat(5)));
    }

    #[test]
    fn general_tab_shows_stats_and_highlighted_chain() {
        let mut s = session();
        s.open(2);
        let text = render_screen(&s.view(), None);
        assert!(text.contains("#002 Ivysaur"));
        assert!(text.contains("[General]"));
        assert!(text.contains("#1 Bulbasaur → [#2 Ivysaur]"));
        assert!(text.contains("Total"));
    }

    #[test]
    fn more_info_tab_shows_none_placeholders() {
        let mut s = session();
        s.open(1);
        s.cycle_tab().unwrap();
        let text = render_screen(&s.view(), None);
        assert!(text.contains("[More Info]"));
        assert!(text.contains("Weak To (2x):  Fire   Ice   Flying   Psychic "));
        assert!(text.contains("Immune To (0x): None"));
        assert!(text.contains("No entry available."));
    }

    #[test]
    fn banner_and_not_found() {
        let mut s = session();
        s.open(77);
        s.raise_error("request failed", Instant::now());
        let text = render_screen(&s.view(), s.banner());
        assert!(text.starts_with("error: request failed"));
        assert!(text.contains("#77 is not in the catalog."));
    }

    #[test]
    fn failed_search_is_not_shown_as_an_empty_match() {
        let mut s = session();
        let now = Instant::now();
        let ticket = s.submit_search("bulba").unwrap();
        s.complete_search(
            ticket,
            Err(ClientError::network("http://127.0.0.1:9", "connection refused")),
            now,
        );
        let text = render_screen(&s.view(), s.banner());
        assert!(text.contains("Search failed; results unavailable."));
        assert!(!text.contains("No matches."));

        let ticket = s.submit_search("zzz").unwrap();
        s.complete_search(ticket, Ok(Vec::new()), now);
        let text = render_screen(&s.view(), None);
        assert!(text.contains("No matches."));
    }
}
