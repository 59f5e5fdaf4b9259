//! Logic-key dependency graph and evaluation order.
//!
//! Nodes are logic-key names; `A -> B` when an expression of `A` references
//! `B` (or a sub-property `B.x`). Field paths are leaves and never edges.
//! Ordering uses Tarjan's strongly connected components: components come
//! out dependencies-first, and any component with more than one key (or a
//! self-loop) is a cycle.

use crate::artifact::LogicSection;
use crate::field_paths::FIELDS_PREFIX;
use crate::parser::parse_expression;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::debug;

/// Outgoing references of every declared logic key, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    pub edges: IndexMap<String, IndexSet<String>>,
}

impl DependencyGraph {
    /// Keys that `key` references directly.
    pub fn dependencies(&self, key: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(key)
            .into_iter()
            .flat_map(|deps| deps.iter().map(String::as_str))
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges.get(from).is_some_and(|deps| deps.contains(to))
    }
}

/// Evaluation order for a logic section. `sorted` holds every declared key:
/// acyclic keys in dependency order, then the cyclic ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopologicalOrder {
    pub sorted: Vec<String>,
    pub cyclic_keys: Vec<String>,
}

impl TopologicalOrder {
    pub fn is_cyclic(&self, key: &str) -> bool {
        self.cyclic_keys.iter().any(|k| k == key)
    }
}

/// Resolve a referenced variable to the logic key it names, if any.
pub fn referenced_key<'a>(variable: &str, keys: &'a IndexSet<String>) -> Option<&'a str> {
    if let Some(k) = keys.get(variable) {
        return Some(k.as_str());
    }
    let (root, _) = variable.split_once('.')?;
    if root == FIELDS_PREFIX {
        return None;
    }
    keys.get(root).map(String::as_str)
}

pub fn build_dependency_graph(logic: &LogicSection) -> DependencyGraph {
    let keys: IndexSet<String> = logic.keys().cloned().collect();
    let mut edges = IndexMap::new();
    for (name, entry) in logic {
        let mut deps = IndexSet::new();
        for (_, expr) in entry.value.expressions() {
            // Unparseable expressions contribute no edges; the validator
            // reports them.
            let Ok(parsed) = parse_expression(expr) else {
                continue;
            };
            for var in &parsed.variables {
                if let Some(k) = referenced_key(var, &keys) {
                    deps.insert(k.to_owned());
                }
            }
        }
        edges.insert(name.clone(), deps);
    }
    DependencyGraph { edges }
}

pub fn topological_sort_logic_keys(logic: &LogicSection) -> TopologicalOrder {
    let graph = build_dependency_graph(logic);
    let order = topological_sort(&graph);
    debug!(
        sorted = ?order.sorted,
        cyclic = ?order.cyclic_keys,
        "logic keys ordered"
    );
    order
}

/// Order the nodes of `graph`; see the module docs.
pub fn topological_sort(graph: &DependencyGraph) -> TopologicalOrder {
    let mut state = Tarjan {
        graph,
        index: IndexMap::new(),
        lowlink: IndexMap::new(),
        on_stack: IndexSet::new(),
        stack: Vec::new(),
        next_index: 0,
        components: Vec::new(),
    };
    for key in graph.edges.keys() {
        if !state.index.contains_key(key.as_str()) {
            state.strongconnect(key);
        }
    }

    let mut sorted = Vec::new();
    let mut cyclic: IndexSet<&str> = IndexSet::new();
    for component in &state.components {
        let is_cycle = component.len() > 1 || graph.has_edge(component[0], component[0]);
        if is_cycle {
            cyclic.extend(component.iter().copied());
        } else {
            sorted.push(component[0].to_owned());
        }
    }

    // Cyclic keys go last, in declaration order.
    let cyclic_keys: Vec<String> = graph
        .edges
        .keys()
        .filter(|k| cyclic.contains(k.as_str()))
        .cloned()
        .collect();
    sorted.extend(cyclic_keys.iter().cloned());

    TopologicalOrder {
        sorted,
        cyclic_keys,
    }
}

struct Tarjan<'g> {
    graph: &'g DependencyGraph,
    index: IndexMap<&'g str, usize>,
    lowlink: IndexMap<&'g str, usize>,
    on_stack: IndexSet<&'g str>,
    stack: Vec<&'g str>,
    next_index: usize,
    /// Emitted dependencies-first.
    components: Vec<Vec<&'g str>>,
}

impl<'g> Tarjan<'g> {
    /// Iterative form of Tarjan's `strongconnect`: each frame holds a node
    /// and the position of its next unexplored edge, so stack use does not
    /// grow with the length of a dependency chain.
    fn strongconnect(&mut self, root: &'g str) {
        let graph = self.graph;
        let mut frames: Vec<(&'g str, usize)> = Vec::new();
        self.visit(root);
        frames.push((root, 0));

        while let Some(frame) = frames.last_mut() {
            let v = frame.0;
            let next = graph.edges.get(v).and_then(|deps| deps.get_index(frame.1));
            match next {
                Some(w) => {
                    frame.1 += 1;
                    let w = w.as_str();
                    if !self.index.contains_key(w) {
                        self.visit(w);
                        frames.push((w, 0));
                    } else if self.on_stack.contains(w) {
                        let low = self.lowlink[v].min(self.index[w]);
                        self.lowlink.insert(v, low);
                    }
                }
                None => {
                    frames.pop();
                    if self.lowlink[v] == self.index[v] {
                        self.pop_component(v);
                    }
                    if let Some(&(parent, _)) = frames.last() {
                        let low = self.lowlink[parent].min(self.lowlink[v]);
                        self.lowlink.insert(parent, low);
                    }
                }
            }
        }
    }

    fn visit(&mut self, v: &'g str) {
        self.index.insert(v, self.next_index);
        self.lowlink.insert(v, self.next_index);
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack.insert(v);
    }

    fn pop_component(&mut self, root: &'g str) {
        let mut component = Vec::new();
        while let Some(w) = self.stack.pop() {
            self.on_stack.swap_remove(w);
            component.push(w);
            if w == root {
                break;
            }
        }
        component.reverse();
        self.components.push(component);
    }
}
