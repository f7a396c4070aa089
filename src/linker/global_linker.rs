use crate::engine::MemoryGraph;
use crate::node::{NodeId, NodeKind, NodeRecord};
use crate::translator::TranslatedUnit;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Include → root of a unit of the imported package
    Include,
    /// Call expression → function declared in another unit
    Invoke,
}

/// An edge whose endpoints live in different unit graphs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossUnitLink {
    pub from_unit: usize,
    pub from: NodeId,
    pub to_unit: usize,
    pub to: NodeId,
    pub kind: LinkKind,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GlobalLinkerStats {
    pub resolved: usize,
    pub ambiguous: usize,
    pub external: usize,
    pub total: usize,
}

impl fmt::Display for GlobalLinkerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Global Linker Stats:")?;
        writeln!(f, "  Total References: {}", self.total)?;
        writeln!(f, "  Resolved: {}", self.resolved)?;
        writeln!(f, "  Ambiguous: {}", self.ambiguous)?;
        writeln!(f, "  External: {}", self.external)
    }
}

enum Outcome {
    Resolved(Vec<(usize, NodeId)>),
    Ambiguous,
    External,
}

pub struct GlobalLinker<'a> {
    units: &'a [TranslatedUnit],
}

impl<'a> GlobalLinker<'a> {
    pub fn new(units: &'a [TranslatedUnit]) -> Self {
        Self { units }
    }

    pub fn run(&self) -> (Vec<CrossUnitLink>, GlobalLinkerStats) {
        let mut links = Vec::new();
        let mut stats = GlobalLinkerStats::default();

        for (index, unit) in self.units.iter().enumerate() {
            for include in unit.graph.nodes_of_kind(NodeKind::IncludeDeclaration) {
                let outcome = self.resolve_include(include);
                record(&mut stats, &mut links, index, include.id, LinkKind::Include, outcome);
            }

            for call in unit.graph.nodes_of_kind(NodeKind::CallExpression) {
                // already bound inside the unit
                if call.field("invokes").as_nodes().is_some_and(|ids| !ids.is_empty()) {
                    continue;
                }
                let outcome = self.resolve_call(index, call);
                record(&mut stats, &mut links, index, call.id, LinkKind::Invoke, outcome);
            }
        }

        tracing::info!(
            "linked {} of {} references ({} ambiguous, {} external)",
            stats.resolved,
            stats.total,
            stats.ambiguous,
            stats.external
        );
        (links, stats)
    }

    /// Units of the package an import path names, grouped by directory
    fn package_units(&self, import_path: &str) -> Vec<BTreeSet<usize>> {
        let package = import_path.rsplit('/').next().unwrap_or(import_path);
        let mut by_dir: Vec<(&str, BTreeSet<usize>)> = Vec::new();
        for (index, unit) in self.units.iter().enumerate() {
            if unit.package != package {
                continue;
            }
            let dir = unit.dir();
            match by_dir.iter_mut().find(|(d, _)| *d == dir) {
                Some((_, members)) => {
                    members.insert(index);
                }
                None => by_dir.push((dir, BTreeSet::from([index]))),
            }
        }
        by_dir.into_iter().map(|(_, members)| members).collect()
    }

    fn resolve_include(&self, include: &NodeRecord) -> Outcome {
        let Some(path) = include.field("filename").as_text() else {
            return Outcome::External;
        };
        let mut packages = self.package_units(path);
        match packages.len() {
            0 => Outcome::External,
            1 => Outcome::Resolved(
                packages
                    .remove(0)
                    .into_iter()
                    .map(|i| (i, self.units[i].root))
                    .collect(),
            ),
            _ => Outcome::Ambiguous,
        }
    }

    fn resolve_call(&self, from: usize, call: &NodeRecord) -> Outcome {
        let unit = &self.units[from];
        let candidates: BTreeSet<usize> = match qualifier(&unit.graph, call) {
            Some(qualifier) => {
                let include = unit
                    .graph
                    .nodes_of_kind(NodeKind::IncludeDeclaration)
                    .find(|inc| inc.name == qualifier);
                let Some(path) = include.and_then(|inc| inc.field("filename").as_text()) else {
                    // method call on a value, not a package
                    return Outcome::External;
                };
                match self.package_units(path).as_slice() {
                    [members] => members.clone(),
                    [] => return Outcome::External,
                    _ => return Outcome::Ambiguous,
                }
            }
            None => self
                .units
                .iter()
                .enumerate()
                .filter(|(i, other)| {
                    *i != from && other.package == unit.package && other.dir() == unit.dir()
                })
                .map(|(i, _)| i)
                .collect(),
        };

        let matches: Vec<(usize, NodeId)> = candidates
            .into_iter()
            .flat_map(|i| {
                self.units[i]
                    .graph
                    .nodes_of_kind(NodeKind::FunctionDeclaration)
                    .filter(|f| f.name == call.name)
                    .map(move |f| (i, f.id))
                    .collect::<Vec<_>>()
            })
            .collect();

        match matches.len() {
            0 => Outcome::External,
            1 => Outcome::Resolved(matches),
            _ => Outcome::Ambiguous,
        }
    }
}

fn record(
    stats: &mut GlobalLinkerStats,
    links: &mut Vec<CrossUnitLink>,
    from_unit: usize,
    from: NodeId,
    kind: LinkKind,
    outcome: Outcome,
) {
    stats.total += 1;
    match outcome {
        Outcome::Resolved(targets) => {
            stats.resolved += 1;
            links.extend(targets.into_iter().map(|(to_unit, to)| CrossUnitLink {
                from_unit,
                from,
                to_unit,
                to,
                kind,
            }));
        }
        Outcome::Ambiguous => stats.ambiguous += 1,
        Outcome::External => stats.external += 1,
    }
}

/// Name of the operand in a `pkg.Func(...)` call
fn qualifier<'g>(graph: &'g MemoryGraph, call: &NodeRecord) -> Option<&'g str> {
    let callee = graph.node(call.field("callee").as_node()?)?;
    if callee.kind != NodeKind::MemberExpression {
        return None;
    }
    let base = graph.node(callee.field("base").as_node()?)?;
    Some(base.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::TranslationManager;

    fn translate(files: &[(&str, &str)]) -> crate::TranslationResult {
        let files = files
            .iter()
            .map(|(name, src)| (name.to_string(), src.to_string()))
            .collect();
        TranslationManager::new().with_workers(2).translate_sources(files)
    }

    #[test]
    fn test_includes_resolve_to_package_units() {
        let result = translate(&[
            ("app/main.go", "package main\n\nimport \"example.com/geo\"\n\nfunc main() { geo.Area(2) }\n"),
            ("geo/area.go", "package geo\n\nfunc Area(r int) int { return r }\n"),
            ("geo/scale.go", "package geo\n\nfunc Scale(r int) int { return r }\n"),
        ]);
        assert!(result.failures.is_empty());

        let includes: Vec<&CrossUnitLink> = result
            .links
            .iter()
            .filter(|l| l.kind == LinkKind::Include)
            .collect();
        assert_eq!(includes.len(), 2);

        let calls: Vec<&CrossUnitLink> = result
            .links
            .iter()
            .filter(|l| l.kind == LinkKind::Invoke)
            .collect();
        assert_eq!(calls.len(), 1);
        let target = &result.units[calls[0].to_unit];
        assert_eq!(target.path, "geo/area.go");
        assert_eq!(target.graph.node(calls[0].to).unwrap().name, "Area");
    }

    #[test]
    fn test_same_package_calls_and_external_references() {
        let result = translate(&[
            ("calc/a.go", "package calc\n\nimport \"fmt\"\n\nfunc A() { B(); fmt.Println() }\n"),
            ("calc/b.go", "package calc\n\nfunc B() {}\n"),
        ]);

        let invoke = result
            .links
            .iter()
            .find(|l| l.kind == LinkKind::Invoke)
            .unwrap();
        assert_eq!(result.units[invoke.from_unit].path, "calc/a.go");
        assert_eq!(result.units[invoke.to_unit].path, "calc/b.go");

        // the fmt include and fmt.Println stay external
        assert_eq!(result.linker.external, 2);
        assert_eq!(result.linker.resolved, 1);
    }

    #[test]
    fn test_calls_within_unit_need_no_linking() {
        let result = translate(&[(
            "p/main.go",
            "package p\n\nfunc main() { helper() }\n\nfunc helper() {}\n",
        )]);
        assert!(result.failures.is_empty());
        assert!(result.links.is_empty());
        assert_eq!(result.linker.total, 0);
        assert_eq!(result.linker.external, 0);
    }

    #[test]
    fn test_duplicate_functions_are_ambiguous() {
        let result = translate(&[
            ("p/a.go", "package p\n\nfunc Run() { Helper() }\n"),
            ("p/b.go", "package p\n\nfunc Helper() {}\n"),
            ("p/c.go", "package p\n\nfunc Helper() {}\n"),
        ]);
        assert_eq!(result.linker.ambiguous, 1);
        assert!(result.links.is_empty());
    }
}
