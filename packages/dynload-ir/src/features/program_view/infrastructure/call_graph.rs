//! Class-hierarchy call graph with petgraph
//!
//! Every concrete method of the view is a root, so the graph answers
//! "who calls this method" for the whole view, not only for what is
//! reachable from one entry point.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::FxHashMap;

use super::view::ProgramView;
use crate::features::program_view::errors::ViewResult;
use crate::shared::models::{InvokeExpr, MethodSignature, StmtId};

/// Call graph protocol
///
/// Implementations can use any data structure (petgraph, HashMap, etc.)
pub trait CallGraphProvider {
    /// Methods called from `method`, in call-site order
    fn callees_of(&self, method: &MethodSignature) -> Vec<MethodSignature>;

    /// Methods with at least one call edge to `method`, in discovery order
    fn callers_of(&self, method: &MethodSignature) -> Vec<MethodSignature>;

    /// All methods in the graph
    fn methods(&self) -> Vec<MethodSignature>;

    fn contains_method(&self, method: &MethodSignature) -> bool {
        self.methods().contains(method)
    }

    fn num_methods(&self) -> usize {
        self.methods().len()
    }
}

/// CHA call graph over one view
pub struct ClassCallGraph {
    /// Method → method, weighted by the call site
    graph: DiGraph<MethodSignature, StmtId>,

    /// Signature → node index
    nodes: FxHashMap<MethodSignature, NodeIndex>,
}

impl ClassCallGraph {
    /// Build the graph over every concrete method of `view`
    pub fn build<O>(view: &ProgramView, is_opaque: O) -> ViewResult<Self>
    where
        O: Fn(&InvokeExpr) -> bool,
    {
        let mut cg = Self {
            graph: DiGraph::new(),
            nodes: FxHashMap::default(),
        };

        for method in view.methods() {
            let Some(body) = &method.body else {
                continue;
            };
            let caller = cg.node(&method.signature);
            for (offset, stmt) in body.stmts.iter().enumerate() {
                let Some(invoke) = stmt.invoke_expr() else {
                    continue;
                };
                if is_opaque(invoke) {
                    continue;
                }
                for target in view.resolve_invoke(invoke)? {
                    if view.body(&target).is_none() {
                        continue;
                    }
                    let callee = cg.node(&target);
                    let site = StmtId::new(method.signature.clone(), offset as u32);
                    cg.graph.add_edge(caller, callee, site);
                }
            }
        }

        tracing::trace!(
            methods = cg.graph.node_count(),
            edges = cg.graph.edge_count(),
            "class call graph built"
        );
        Ok(cg)
    }

    fn node(&mut self, method: &MethodSignature) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(method) {
            return idx;
        }
        let idx = self.graph.add_node(method.clone());
        self.nodes.insert(method.clone(), idx);
        idx
    }

    /// Call sites that target `method`, in discovery order
    pub fn call_sites_of(&self, method: &MethodSignature) -> Vec<StmtId> {
        let Some(&idx) = self.nodes.get(method) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.id(), e.weight().clone()))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, site)| site).collect()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl CallGraphProvider for ClassCallGraph {
    fn callees_of(&self, method: &MethodSignature) -> Vec<MethodSignature> {
        let Some(&idx) = self.nodes.get(method) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        edges.sort_by_key(|(id, _)| *id);

        let mut callees: Vec<MethodSignature> = Vec::new();
        for (_, target) in edges {
            let sig = &self.graph[target];
            if !callees.contains(sig) {
                callees.push(sig.clone());
            }
        }
        callees
    }

    fn callers_of(&self, method: &MethodSignature) -> Vec<MethodSignature> {
        let mut callers: Vec<MethodSignature> = Vec::new();
        for site in self.call_sites_of(method) {
            if !callers.contains(&site.method) {
                callers.push(site.method);
            }
        }
        callers
    }

    fn methods(&self) -> Vec<MethodSignature> {
        self.graph.node_weights().cloned().collect()
    }

    fn contains_method(&self, method: &MethodSignature) -> bool {
        self.nodes.contains_key(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Body, ClassDef, ClassType, MethodDef, Stmt, Type};
    use std::sync::Arc;

    fn sig(name: &str) -> MethodSignature {
        MethodSignature::new("a.A", name, vec![], Type::Void)
    }

    fn method(name: &str, calls: &[&str]) -> MethodDef {
        let mut stmts: Vec<Stmt> = calls
            .iter()
            .map(|c| Stmt::Invoke(InvokeExpr::new_static(sig(c), vec![])))
            .collect();
        stmts.push(Stmt::ReturnVoid);
        MethodDef::new(sig(name), true, Some(Body::new(vec![], stmts)))
    }

    fn graph(methods: Vec<MethodDef>) -> ClassCallGraph {
        let mut class = ClassDef::new(ClassType::new("a.A"));
        class.methods = methods;
        let view = ProgramView::new(vec![Arc::new(class)]);
        ClassCallGraph::build(&view, |_| false).unwrap()
    }

    #[test]
    fn test_callers_in_discovery_order() {
        let cg = graph(vec![
            method("foo", &["bar", "bar"]),
            method("baz", &["bar"]),
            method("bar", &[]),
        ]);
        assert_eq!(cg.callers_of(&sig("bar")), vec![sig("foo"), sig("baz")]);
        assert_eq!(cg.call_sites_of(&sig("bar")).len(), 3);
        assert_eq!(cg.callees_of(&sig("foo")), vec![sig("bar")]);
    }

    #[test]
    fn test_cycle_is_represented() {
        let cg = graph(vec![method("a", &["b"]), method("b", &["a"])]);
        assert_eq!(cg.callers_of(&sig("a")), vec![sig("b")]);
        assert_eq!(cg.callers_of(&sig("b")), vec![sig("a")]);
        assert_eq!(cg.num_methods(), 2);
    }

    #[test]
    fn test_uncalled_method_has_no_callers() {
        let cg = graph(vec![method("root", &[])]);
        assert!(cg.callers_of(&sig("root")).is_empty());
        assert!(cg.contains_method(&sig("root")));
        assert!(!cg.contains_method(&sig("missing")));
    }
}
