//! Evolution chain output for `pokedex chain` (text, Graphviz DOT, JSON).

use anyhow::{anyhow, Result};

use pokedex_catalog::{Catalog, Evolution, EvolutionChain};
use pokedex_client::render::render_evolution;
use pokedex_client::view::evolution_view;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFormat {
    Text,
    Dot,
    Json,
}

impl ChainFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "dot" | "gv" => Ok(Self::Dot),
            "json" => Ok(Self::Json),
            other => Err(anyhow!(
                "unknown chain format `{other}` (expected text|dot|json)"
            )),
        }
    }
}

pub fn render_chain(catalog: &Catalog, id: u32, format: ChainFormat) -> Result<String> {
    if !catalog.contains(id) {
        return Err(anyhow!("record {id} not found"));
    }
    Ok(match format {
        ChainFormat::Text => render_evolution(&evolution_view(catalog, id)),
        ChainFormat::Dot => render_dot(catalog, &catalog.evolution_chain(id), id),
        ChainFormat::Json => serde_json::to_string_pretty(&chain_json(catalog, id))?,
    })
}

/// Parent -> child pairs between consecutive stages.
fn chain_edges(catalog: &Catalog, chain: &EvolutionChain) -> Vec<(u32, u32)> {
    let mut edges = Vec::new();
    for pair in chain.stages.windows(2) {
        let (parents, children) = (&pair[0], &pair[1]);
        for parent in parents {
            let Some(record) = catalog.get(*parent) else {
                continue;
            };
            for child in &record.next_evolution_ids {
                if children.contains(child) {
                    edges.push((*parent, *child));
                }
            }
        }
    }
    edges
}

pub fn render_dot(catalog: &Catalog, chain: &EvolutionChain, current: u32) -> String {
    fn dot_escape(s: &str) -> String {
        s.replace('\\', "\\\\").replace('"', "\\\"")
    }

    let mut out = String::new();
    out.push_str("digraph evolution {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, style=rounded, fontname=\"Helvetica\"];\n\n");

    for stage in &chain.stages {
        for id in stage {
            let name = catalog
                .get(*id)
                .map(|r| r.display_name())
                .unwrap_or_default();
            let mut attrs = vec![format!("label=\"#{id}\\n{}\"", dot_escape(&name))];
            if *id == current {
                attrs.push("color=\"#ffcb05\"".to_string());
                attrs.push("penwidth=3".to_string());
            }
            out.push_str(&format!("  n{id} [{}];\n", attrs.join(", ")));
        }
        if stage.len() > 1 {
            let members: Vec<String> = stage.iter().map(|id| format!("n{id}")).collect();
            out.push_str(&format!("  {{ rank=same; {}; }}\n", members.join("; ")));
        }
    }

    let edges = chain_edges(catalog, chain);
    if !edges.is_empty() {
        out.push('\n');
    }
    for (from, to) in edges {
        out.push_str(&format!("  n{from} -> n{to};\n"));
    }

    out.push_str("}\n");
    out
}

pub fn chain_json(catalog: &Catalog, id: u32) -> serde_json::Value {
    let evolution = catalog.evolution(id);
    let stages: Vec<Vec<serde_json::Value>> = catalog
        .evolution_chain(id)
        .stages
        .iter()
        .map(|stage| {
            stage
                .iter()
                .map(|member| {
                    serde_json::json!({
                        "id": member,
                        "name": catalog.get(*member).map(|r| r.name.clone()),
                    })
                })
                .collect()
        })
        .collect();

    serde_json::json!({
        "id": id,
        "evolves": matches!(evolution, Evolution::Evolves(_)),
        "stages": stages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokedex_catalog::load::catalog_from_json_str;

    fn eevee() -> Catalog {
        catalog_from_json_str(
            r#"[
                {"id": 133, "name": "eevee", "primary_type": "normal", "next_evolution_id": "134,135"},
                {"id": 134, "name": "vaporeon", "primary_type": "water", "previous_evolution_id": 133},
                {"id": 135, "name": "jolteon", "primary_type": "electric", "previous_evolution_id": 133},
                {"id": 128, "name": "tauros", "primary_type": "normal"}
            ]"#,
        )
        .unwrap()
        .0
    }

    #[test]
    fn parses_formats() {
        assert_eq!(ChainFormat::parse("DOT").unwrap(), ChainFormat::Dot);
        assert!(ChainFormat::parse("svg").is_err());
    }

    #[test]
    fn dot_groups_branches_and_highlights_current() {
        let c = eevee();
        let dot = render_dot(&c, &c.evolution_chain(134), 134);
        assert!(dot.starts_with("digraph evolution {"));
        assert!(dot.contains("n134 [label=\"#134\\nVaporeon\", color=\"#ffcb05\", penwidth=3];"));
        assert!(dot.contains("{ rank=same; n134; n135; }"));
        assert!(dot.contains("n133 -> n134;"));
        assert!(dot.contains("n133 -> n135;"));
    }

    #[test]
    fn json_reports_non_evolving_records() {
        let c = eevee();
        let v = chain_json(&c, 128);
        assert_eq!(v["evolves"], false);
        assert_eq!(v["stages"], serde_json::json!([[{"id": 128, "name": "tauros"}]]));
        assert_eq!(chain_json(&c, 133)["stages"][1][1]["name"], "jolteon");
    }

    #[test]
    fn unknown_record_is_an_error() {
        assert!(render_chain(&eevee(), 7, ChainFormat::Text).is_err());
    }
}
