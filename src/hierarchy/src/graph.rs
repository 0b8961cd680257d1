//! Role inheritance graph
//!
//! Adjacency-map directed graph with `parent -> child` edges. Node and
//! neighbour collections are ordered maps/sets, so every traversal visits
//! roles in name order and results do not depend on input row order.
//!
//! Enumerations that can blow up combinatorially (elementary cycles, simple
//! paths) are iterative and draw from a [`StepBudget`]; running out of budget
//! is reported as an error instead of running unbounded.

use crate::error::{HierarchyError, Result};
use crate::inputs::{InheritanceRow, RoleDefinitionRow};
use crate::types::{RoleNode, RoleType};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use tracing::debug;

/// Bounded step counter for combinatorial traversals
#[derive(Debug)]
pub struct StepBudget {
    operation: &'static str,
    limit: usize,
    used: usize,
}

impl StepBudget {
    pub fn new(operation: &'static str, limit: usize) -> Self {
        Self {
            operation,
            limit,
            used: 0,
        }
    }

    /// Consume one step
    pub fn tick(&mut self) -> Result<()> {
        self.used += 1;
        if self.used > self.limit {
            return Err(HierarchyError::EnumerationBudgetExceeded {
                operation: self.operation,
                limit: self.limit,
            });
        }
        Ok(())
    }

    pub fn used(&self) -> usize {
        self.used
    }
}

/// DFS frame: a node and the position in its successor list
struct Frame<'a> {
    successors: Vec<&'a str>,
    next: usize,
}

impl<'a> Frame<'a> {
    fn new(successors: Vec<&'a str>) -> Self {
        Self { successors, next: 0 }
    }

    fn advance(&mut self) -> Option<&'a str> {
        let node = self.successors.get(self.next).copied();
        self.next += 1;
        node
    }
}

/// Directed graph of roles and inheritance edges
#[derive(Debug, Clone, Default)]
pub struct RoleGraph {
    nodes: BTreeMap<String, RoleNode>,
    outgoing: BTreeMap<String, BTreeSet<String>>,
    incoming: BTreeMap<String, BTreeSet<String>>,
}

impl RoleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node; an existing node keeps its type unless `role_type` is
    /// given explicitly by a definition
    fn add_node(&mut self, name: &str, role_type: Option<RoleType>) {
        match self.nodes.get_mut(name) {
            Some(node) => {
                if let Some(role_type) = role_type {
                    node.role_type = role_type;
                }
            }
            None => {
                self.nodes.insert(
                    name.to_string(),
                    RoleNode::new(name, role_type.unwrap_or_default()),
                );
                self.outgoing.insert(name.to_string(), BTreeSet::new());
                self.incoming.insert(name.to_string(), BTreeSet::new());
            }
        }
    }

    /// Insert `parent -> child`; duplicate edges are idempotent
    fn add_edge(&mut self, parent: &str, child: &str) {
        self.add_node(parent, None);
        self.add_node(child, None);

        if let Some(children) = self.outgoing.get_mut(parent) {
            children.insert(child.to_string());
        }
        if let Some(parents) = self.incoming.get_mut(child) {
            parents.insert(parent.to_string());
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct edges, self-loops included
    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn contains(&self, role: &str) -> bool {
        self.nodes.contains_key(role)
    }

    pub fn node(&self, role: &str) -> Option<&RoleNode> {
        self.nodes.get(role)
    }

    /// Role names in sorted order
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// All edges as `(parent, child)` in sorted order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outgoing.iter().flat_map(|(parent, children)| {
            children
                .iter()
                .map(move |child| (parent.as_str(), child.as_str()))
        })
    }

    pub fn successors(&self, role: &str) -> impl Iterator<Item = &str> {
        self.outgoing
            .get(role)
            .into_iter()
            .flat_map(|children| children.iter().map(String::as_str))
    }

    pub fn has_edge(&self, parent: &str, child: &str) -> bool {
        self.outgoing
            .get(parent)
            .map_or(false, |children| children.contains(child))
    }

    pub fn in_degree(&self, role: &str) -> usize {
        self.incoming.get(role).map_or(0, BTreeSet::len)
    }

    pub fn out_degree(&self, role: &str) -> usize {
        self.outgoing.get(role).map_or(0, BTreeSet::len)
    }

    /// Roles with an edge to themselves
    pub fn self_loops(&self) -> impl Iterator<Item = &str> {
        self.roles().filter(|role| self.has_edge(role, role))
    }

    /// Roles with in-degree 0
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.roles().filter(|role| self.in_degree(role) == 0)
    }

    /// Roles with out-degree 0
    pub fn is_leaf(&self, role: &str) -> bool {
        self.out_degree(role) == 0
    }

    /// Roles with neither inbound nor outbound edges
    pub fn is_isolated(&self, role: &str) -> bool {
        self.in_degree(role) == 0 && self.out_degree(role) == 0
    }

    /// Topological order via Kahn's algorithm, or `None` if the graph has a
    /// cycle (self-loops included)
    pub fn topological_order(&self) -> Option<Vec<&str>> {
        let mut in_degree: HashMap<&str, usize> =
            self.roles().map(|role| (role, self.in_degree(role))).collect();

        let mut queue: VecDeque<&str> = self.roots().collect();
        let mut sorted = Vec::with_capacity(self.node_count());

        while let Some(current) = queue.pop_front() {
            sorted.push(current);

            for child in self.successors(current) {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }

        if sorted.len() == self.node_count() {
            Some(sorted)
        } else {
            None
        }
    }

    /// True if any cycle (including a self-loop) exists
    pub fn is_cyclic(&self) -> bool {
        self.topological_order().is_none()
    }

    /// Shortest distance (in edges) from `source` to every reachable role
    pub fn bfs_distances(&self, source: &str) -> HashMap<&str, usize> {
        let mut distances = HashMap::new();
        let Some((source, _)) = self.nodes.get_key_value(source) else {
            return distances;
        };

        let mut queue = VecDeque::new();
        distances.insert(source.as_str(), 0);
        queue.push_back(source.as_str());

        while let Some(current) = queue.pop_front() {
            let distance = distances[current];
            for next in self.successors(current) {
                if !distances.contains_key(next) {
                    distances.insert(next, distance + 1);
                    queue.push_back(next);
                }
            }
        }

        distances
    }

    /// Largest BFS distance reachable from `source`
    pub fn eccentricity(&self, source: &str) -> usize {
        self.bfs_distances(source)
            .into_values()
            .max()
            .unwrap_or(0)
    }

    /// `source` followed by every role reachable from it, in BFS order
    pub fn descendant_closure(&self, source: &str) -> Vec<String> {
        let mut order = Vec::new();
        if !self.contains(source) {
            return order;
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(source);
        queue.push_back(source);

        while let Some(current) = queue.pop_front() {
            order.push(current.to_string());
            for next in self.successors(current) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        order
    }

    /// Strongly connected components (Tarjan), each listed in name order
    ///
    /// Components come out in reverse topological order of the condensed
    /// graph. Every role belongs to exactly one component.
    pub fn strongly_connected_components(&self) -> Vec<Vec<&str>> {
        let mut next_index = 0;
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut lowlink: HashMap<&str, usize> = HashMap::new();
        let mut stack: Vec<&str> = Vec::new();
        let mut on_stack: HashSet<&str> = HashSet::new();
        let mut components = Vec::new();

        for root in self.roles() {
            if index.contains_key(root) {
                continue;
            }

            index.insert(root, next_index);
            lowlink.insert(root, next_index);
            next_index += 1;
            stack.push(root);
            on_stack.insert(root);
            let mut calls = vec![(root, Frame::new(self.successors(root).collect()))];

            loop {
                let (node, next) = match calls.last_mut() {
                    Some((node, frame)) => (*node, frame.advance()),
                    None => break,
                };

                match next {
                    Some(next) if !index.contains_key(next) => {
                        index.insert(next, next_index);
                        lowlink.insert(next, next_index);
                        next_index += 1;
                        stack.push(next);
                        on_stack.insert(next);
                        calls.push((next, Frame::new(self.successors(next).collect())));
                    }
                    Some(next) => {
                        if on_stack.contains(next) {
                            let low = lowlink[node].min(index[next]);
                            lowlink.insert(node, low);
                        }
                    }
                    None => {
                        calls.pop();
                        if let Some((parent, _)) = calls.last() {
                            let low = lowlink[*parent].min(lowlink[node]);
                            lowlink.insert(*parent, low);
                        }

                        if lowlink[node] == index[node] {
                            let mut component = Vec::new();
                            while let Some(member) = stack.pop() {
                                on_stack.remove(member);
                                component.push(member);
                                if member == node {
                                    break;
                                }
                            }
                            component.sort_unstable();
                            components.push(component);
                        }
                    }
                }
            }
        }

        components
    }

    /// Enumerate every elementary cycle of length >= 2
    ///
    /// Each cycle is reported once, starting at its smallest role name and
    /// listed in traversal order. Self-loops are not included; see
    /// [`RoleGraph::self_loops`].
    ///
    /// # Algorithm
    ///
    /// Johnson's circuit search. Roles outside a multi-role strongly
    /// connected component cannot be on a cycle, so a cycle-free graph costs
    /// no steps at all. For each start role `s` (in name order) the search
    /// stays inside the component of `s` and only visits roles ordered after
    /// `s`, so every cycle is found exactly once, from its minimum. Blocked
    /// roles are not re-entered until a cycle through them is possible again.
    pub fn elementary_cycles(&self, budget: &mut StepBudget) -> Result<Vec<Vec<String>>> {
        let mut component_of: HashMap<&str, usize> = HashMap::new();
        for (id, component) in self.strongly_connected_components().iter().enumerate() {
            if component.len() > 1 {
                for role in component {
                    component_of.insert(*role, id);
                }
            }
        }

        let mut cycles = Vec::new();
        for start in self.roles() {
            let Some(&component) = component_of.get(start) else {
                continue;
            };
            let successors =
                |role: &str| self.circuit_successors(role, start, component, &component_of);

            let mut path: Vec<&str> = vec![start];
            let mut blocked: HashSet<&str> = HashSet::from([start]);
            let mut blocked_by: HashMap<&str, HashSet<&str>> = HashMap::new();
            let mut closed: HashSet<&str> = HashSet::new();
            let mut stack = vec![(start, Frame::new(successors(start)))];

            loop {
                let (node, next) = match stack.last_mut() {
                    Some((node, frame)) => (*node, frame.advance()),
                    None => break,
                };
                budget.tick()?;

                match next {
                    Some(next) if next == start => {
                        cycles.push(path.iter().map(|r| r.to_string()).collect());
                        closed.extend(path.iter().copied());
                    }
                    Some(next) if !blocked.contains(next) => {
                        path.push(next);
                        closed.remove(next);
                        blocked.insert(next);
                        stack.push((next, Frame::new(successors(next))));
                    }
                    Some(_) => {}
                    None => {
                        if closed.contains(node) {
                            unblock(node, &mut blocked, &mut blocked_by);
                        } else {
                            for succ in successors(node) {
                                blocked_by.entry(succ).or_default().insert(node);
                            }
                        }
                        stack.pop();
                        path.pop();
                    }
                }
            }
        }

        debug!("Enumerated {} elementary cycles in {} steps", cycles.len(), budget.used());
        Ok(cycles)
    }

    /// Successors of `role` that stay inside the searched component and
    /// after `start`, self-loops excluded
    fn circuit_successors<'a>(
        &'a self,
        role: &str,
        start: &str,
        component: usize,
        component_of: &HashMap<&str, usize>,
    ) -> Vec<&'a str> {
        self.successors(role)
            .filter(|next| {
                *next != role && *next >= start && component_of.get(next) == Some(&component)
            })
            .collect()
    }

    /// Enumerate every simple path from `source` that ends at a leaf
    ///
    /// A leaf has out-degree 0. Paths that can only continue into roles
    /// already on the path are dropped, so on a cycle-free graph this is
    /// exactly the set of root-to-leaf paths.
    pub fn paths_to_leaves(&self, source: &str, budget: &mut StepBudget) -> Result<Vec<Vec<String>>> {
        let mut paths = Vec::new();
        let Some((source, _)) = self.nodes.get_key_value(source) else {
            return Ok(paths);
        };
        let source = source.as_str();

        if self.is_leaf(source) {
            paths.push(vec![source.to_string()]);
            return Ok(paths);
        }

        let mut path: Vec<&str> = vec![source];
        let mut on_path: HashSet<&str> = HashSet::from([source]);
        let mut stack = vec![Frame::new(self.successors(source).collect())];

        while let Some(frame) = stack.last_mut() {
            budget.tick()?;

            match frame.advance() {
                Some(next) if on_path.contains(next) => continue,
                Some(next) if self.is_leaf(next) => {
                    let mut complete: Vec<String> = path.iter().map(|r| r.to_string()).collect();
                    complete.push(next.to_string());
                    paths.push(complete);
                }
                Some(next) => {
                    path.push(next);
                    on_path.insert(next);
                    stack.push(Frame::new(self.successors(next).collect()));
                }
                None => {
                    stack.pop();
                    if let Some(done) = path.pop() {
                        on_path.remove(done);
                    }
                }
            }
        }

        Ok(paths)
    }
}

/// Release `role` and every role transitively waiting on it
fn unblock<'a>(
    role: &'a str,
    blocked: &mut HashSet<&'a str>,
    blocked_by: &mut HashMap<&'a str, HashSet<&'a str>>,
) {
    let mut pending = vec![role];
    while let Some(current) = pending.pop() {
        if blocked.remove(current) {
            if let Some(waiting) = blocked_by.remove(current) {
                pending.extend(waiting);
            }
        }
    }
}

/// Builds a [`RoleGraph`] from inheritance and definition rows
#[derive(Debug, Default)]
pub struct RoleGraphBuilder {
    graph: RoleGraph,
    ignored_rows: usize,
}

impl RoleGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one edge per inheritance row
    ///
    /// Rows with a blank parent or child are ignored.
    pub fn add_inheritance(mut self, rows: &[InheritanceRow]) -> Self {
        for row in rows {
            let parent = row.parent_role.trim();
            let child = row.child_role.trim();

            if parent.is_empty() || child.is_empty() {
                self.ignored_rows += 1;
                continue;
            }

            self.graph.add_edge(parent, child);
        }
        self
    }

    /// Add every defined role as a node, isolated if it has no edges
    pub fn add_definitions(mut self, rows: &[RoleDefinitionRow]) -> Self {
        for row in rows {
            let name = row.role_name.trim();
            if name.is_empty() {
                self.ignored_rows += 1;
                continue;
            }

            self.graph.add_node(name, Some(row.role_type));
        }
        self
    }

    /// Add a single edge
    pub fn edge(mut self, parent: &str, child: &str) -> Self {
        self.graph.add_edge(parent, child);
        self
    }

    /// Add a single standalone role
    pub fn role(mut self, name: &str, role_type: RoleType) -> Self {
        self.graph.add_node(name, Some(role_type));
        self
    }

    pub fn build(self) -> RoleGraph {
        if self.ignored_rows > 0 {
            debug!("Ignored {} blank hierarchy/definition rows", self.ignored_rows);
        }
        debug!(
            "Built role graph: {} roles, {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        self.graph
    }
}
