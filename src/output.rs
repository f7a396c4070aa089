//! Serializable views of a translation run

use crate::edge::Edge;
use crate::linker::{CrossUnitLink, GlobalLinkerStats};
use crate::node::{NodeId, NodeKind, Value};
use crate::position::PhysicalLocation;
use crate::translator::{TranslatedUnit, TranslationResult, UnitFailure};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// `CPG_QUIET=1` suppresses progress output
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("CPG_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

#[derive(Debug, Serialize)]
pub struct NodeDocument<'a> {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<&'a PhysicalLocation>,
    /// Text-valued fields; node-valued fields appear as edges
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<&'a str, &'a str>,
}

#[derive(Debug, Serialize)]
pub struct UnitDocument<'a> {
    pub path: &'a str,
    pub package: &'a str,
    pub root: NodeId,
    pub nodes: Vec<NodeDocument<'a>>,
    pub edges: Vec<Edge>,
}

impl<'a> UnitDocument<'a> {
    pub fn new(unit: &'a TranslatedUnit) -> Self {
        let nodes = unit
            .graph
            .nodes()
            .map(|record| NodeDocument {
                id: record.id,
                kind: record.kind,
                name: &record.name,
                code: record.code.as_deref(),
                location: record.location.as_ref(),
                attributes: record
                    .fields
                    .iter()
                    .filter_map(|(field, value)| match value {
                        Value::Text(text) => Some((field.as_str(), text.as_str())),
                        _ => None,
                    })
                    .collect(),
            })
            .collect();

        Self {
            path: &unit.path,
            package: &unit.package,
            root: unit.root,
            nodes,
            edges: unit.graph.edges().collect(),
        }
    }
}

/// The whole produced graph: per-unit subgraphs plus phase-2 links
#[derive(Debug, Serialize)]
pub struct GraphDocument<'a> {
    pub units: Vec<UnitDocument<'a>>,
    pub links: &'a [CrossUnitLink],
    pub linker: &'a GlobalLinkerStats,
    pub failures: &'a [UnitFailure],
}

impl<'a> GraphDocument<'a> {
    pub fn new(result: &'a TranslationResult) -> Self {
        Self {
            units: result.units.iter().map(UnitDocument::new).collect(),
            links: &result.links,
            linker: &result.linker,
            failures: &result.failures,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::TranslationManager;

    #[test]
    fn test_graph_document_json() {
        let result = TranslationManager::new().translate_sources(vec![(
            "geo.go".to_string(),
            "package geo\n\nimport \"math\"\n\ntype Point struct{ x int }\n".to_string(),
        )]);
        let doc = GraphDocument::new(&result);
        let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();

        let unit = &json["units"][0];
        assert_eq!(unit["path"], "geo.go");
        assert_eq!(unit["package"], "geo");

        let nodes = unit["nodes"].as_array().unwrap();
        let include = nodes
            .iter()
            .find(|n| n["kind"] == "IncludeDeclaration")
            .unwrap();
        assert_eq!(include["name"], "math");
        assert_eq!(include["attributes"]["filename"], "math");

        let edges = unit["edges"].as_array().unwrap();
        assert!(!edges.is_empty());
        assert_eq!(json["linker"]["external"], 1);
        assert!(json["failures"].as_array().unwrap().is_empty());
    }
}
