//! The normalization graph — dependencies between statements
//!
//! Nodes are statements; edges always point from the earlier statement
//! to the later one, with a label per dependency kind:
//!
//! - `variable_flow`: the earlier statement writes a variable the later
//!   one reads (or re-writes). Removing the earlier statement would
//!   change what the later one observes.
//! - `variable_reverse_flow`: the earlier statement reads a variable the
//!   later one overwrites. The data flows against program order.
//! - `order`: control statements pin their neighborhood; no statement
//!   may migrate across a control boundary.
//!
//! `linearize` consumes the graph: it propagates the keep flag along
//! data-flow edges, then emits the surviving statements in a layered,
//! deterministic topological order.

use super::statement::Statement;
use crate::token::{Token, Variable};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap, HashMap, VecDeque};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EdgeLabels {
    variable_flow: bool,
    variable_reverse_flow: bool,
    order: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DependencyKind {
    VariableFlow,
    VariableReverseFlow,
    Order,
}

pub(crate) struct NormalizationGraph {
    statements: Vec<Statement>,
    successors: Vec<BTreeMap<usize, EdgeLabels>>,
    predecessors: Vec<BTreeMap<usize, EdgeLabels>>,
}

impl NormalizationGraph {
    pub(crate) fn new(statements: Vec<Statement>) -> Self {
        let count = statements.len();
        let mut graph = Self {
            statements,
            successors: vec![BTreeMap::new(); count],
            predecessors: vec![BTreeMap::new(); count],
        };
        graph.build_edges();
        graph
    }

    fn add_edge(&mut self, from: usize, to: usize, kind: DependencyKind) {
        debug_assert!(from < to, "edges point from earlier to later statements");
        let labels = self.successors[from].entry(to).or_default();
        match kind {
            DependencyKind::VariableFlow => labels.variable_flow = true,
            DependencyKind::VariableReverseFlow => labels.variable_reverse_flow = true,
            DependencyKind::Order => labels.order = true,
        }
        let updated = *labels;
        self.predecessors[to].insert(from, updated);
    }

    fn build_edges(&mut self) {
        let mut last_write: HashMap<Variable, usize> = HashMap::new();
        let mut reads_since_write: HashMap<Variable, Vec<usize>> = HashMap::new();
        let mut last_control: Option<usize> = None;
        let mut since_last_control: Vec<usize> = Vec::new();

        for index in 0..self.statements.len() {
            let semantics = self.statements[index].semantics().clone();

            // Data flow: a read observes the latest write before it.
            for variable in &semantics.reads {
                if let Some(&writer) = last_write.get(variable) {
                    if writer != index {
                        self.add_edge(writer, index, DependencyKind::VariableFlow);
                    }
                }
            }

            // A write supersedes the previous write and invalidates what
            // earlier readers saw.
            for variable in &semantics.writes {
                if let Some(&writer) = last_write.get(variable) {
                    if writer != index {
                        self.add_edge(writer, index, DependencyKind::VariableFlow);
                    }
                }
                if let Some(readers) = reads_since_write.get(variable) {
                    for &reader in readers {
                        if reader != index {
                            self.add_edge(reader, index, DependencyKind::VariableReverseFlow);
                        }
                    }
                }
            }
            for variable in &semantics.writes {
                last_write.insert(variable.clone(), index);
                reads_since_write.remove(variable);
            }
            for variable in &semantics.reads {
                reads_since_write.entry(variable.clone()).or_default().push(index);
            }

            // Control boundaries: nothing moves across them.
            if let Some(control) = last_control {
                if control != index {
                    self.add_edge(control, index, DependencyKind::Order);
                }
            }
            if semantics.control {
                for &pinned in &since_last_control {
                    if pinned != index {
                        self.add_edge(pinned, index, DependencyKind::Order);
                    }
                }
                last_control = Some(index);
                since_last_control.clear();
            } else {
                since_last_control.push(index);
            }
        }
    }

    /// Propagate the keep flag: a kept statement keeps the writers it
    /// depends on (flow predecessors) and the overwriters that must not
    /// clobber it early (reverse-flow successors).
    fn spread_keep(&mut self) {
        let mut worklist: VecDeque<usize> = (0..self.statements.len())
            .filter(|&i| self.statements[i].keep())
            .collect();

        while let Some(current) = worklist.pop_front() {
            let mut newly_kept = Vec::new();
            for (&predecessor, labels) in &self.predecessors[current] {
                if labels.variable_flow && !self.statements[predecessor].keep() {
                    newly_kept.push(predecessor);
                }
            }
            for (&successor, labels) in &self.successors[current] {
                if labels.variable_reverse_flow && !self.statements[successor].keep() {
                    newly_kept.push(successor);
                }
            }
            for index in newly_kept {
                self.statements[index].mark_keep();
                worklist.push_back(index);
            }
        }
    }

    /// Emit the kept statements in layered canonical order.
    ///
    /// All roots of the current layer are drained (largest statement
    /// first, then lexicographic token-type ordinals) before any
    /// statement they unblock becomes eligible, so the order is layered
    /// and deterministic.
    pub(crate) fn linearize(mut self) -> Vec<Token> {
        self.spread_keep();

        let mut in_degree: Vec<usize> = self.predecessors.iter().map(BTreeMap::len).collect();
        let mut roots: BinaryHeap<Reverse<RootEntry>> = (0..self.statements.len())
            .filter(|&i| in_degree[i] == 0)
            .map(|i| Reverse(self.root_entry(i)))
            .collect();

        let mut tokens = Vec::new();
        while !roots.is_empty() {
            let mut next_roots = BinaryHeap::new();
            while let Some(Reverse(entry)) = roots.pop() {
                let index = entry.index;
                if self.statements[index].keep() {
                    tokens.extend_from_slice(self.statements[index].tokens());
                }
                for (&successor, _) in &self.successors[index] {
                    in_degree[successor] -= 1;
                    if in_degree[successor] == 0 {
                        next_roots.push(Reverse(self.root_entry(successor)));
                    }
                }
            }
            roots = next_roots;
        }
        tokens
    }

    fn root_entry(&self, index: usize) -> RootEntry {
        let statement = &self.statements[index];
        RootEntry {
            token_count: statement.token_count(),
            ordinals: statement.ordinals(),
            line: statement.line_number(),
            index,
        }
    }

    #[cfg(test)]
    pub(crate) fn keep_flags(&mut self) -> Vec<bool> {
        self.spread_keep();
        self.statements.iter().map(Statement::keep).collect()
    }
}

/// Priority of a root statement: bigger statements come first, ties are
/// broken by the token-type ordinal sequence, then by position, so the
/// walk never depends on hash or insertion order.
#[derive(Debug, PartialEq, Eq)]
struct RootEntry {
    token_count: usize,
    ordinals: Vec<u32>,
    line: i32,
    index: usize,
}

impl Ord for RootEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .token_count
            .cmp(&self.token_count)
            .then_with(|| self.ordinals.cmp(&other.ordinals))
            .then_with(|| self.line.cmp(&other.line))
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for RootEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::super::statement::group_statements;
    use super::*;
    use crate::token::{TokenSemantics, TokenType, Variable};

    fn token(name: &str, ordinal: u32, line: i32, semantics: TokenSemantics) -> Token {
        Token::new(TokenType::syntax(name, ordinal), "f.x", line, 1, 1).with_semantics(semantics)
    }

    fn var(name: &str) -> Variable {
        Variable::new(name)
    }

    #[test]
    fn test_write_before_read_creates_flow_edge_and_keeps_writer() {
        let tokens = vec![
            token("ASSIGN", 0, 1, TokenSemantics::plain().with_write(var("x"))),
            token("CALL", 1, 2, TokenSemantics::critical().with_read(var("x"))),
        ];
        let mut graph = NormalizationGraph::new(group_statements(&tokens));
        assert_eq!(graph.keep_flags(), vec![true, true]);
    }

    #[test]
    fn test_unrelated_statement_is_not_kept() {
        let tokens = vec![
            token("ASSIGN", 0, 1, TokenSemantics::plain().with_write(var("dead"))),
            token("CALL", 1, 2, TokenSemantics::critical().with_read(var("x"))),
        ];
        let mut graph = NormalizationGraph::new(group_statements(&tokens));
        assert_eq!(graph.keep_flags(), vec![false, true]);
    }

    #[test]
    fn test_reverse_flow_keeps_the_overwriter() {
        // Critical read of x, then x is overwritten. The overwrite must
        // stay, otherwise the read could be reordered past it.
        let tokens = vec![
            token("ASSIGN", 0, 1, TokenSemantics::plain().with_write(var("x"))),
            token("CALL", 1, 2, TokenSemantics::critical().with_read(var("x"))),
            token("ASSIGN", 0, 3, TokenSemantics::plain().with_write(var("x"))),
        ];
        let mut graph = NormalizationGraph::new(group_statements(&tokens));
        assert_eq!(graph.keep_flags(), vec![true, true, true]);
    }

    #[test]
    fn test_keep_propagates_transitively() {
        let tokens = vec![
            token("ASSIGN", 0, 1, TokenSemantics::plain().with_write(var("a"))),
            token(
                "ASSIGN",
                0,
                2,
                TokenSemantics::plain().with_read(var("a")).with_write(var("b")),
            ),
            token("CALL", 1, 3, TokenSemantics::critical().with_read(var("b"))),
        ];
        let mut graph = NormalizationGraph::new(group_statements(&tokens));
        assert_eq!(graph.keep_flags(), vec![true, true, true]);
    }

    #[test]
    fn test_order_edges_do_not_spread_keep() {
        let tokens = vec![
            token("IF", 0, 1, TokenSemantics::control()),
            token("ASSIGN", 1, 2, TokenSemantics::plain().with_write(var("dead"))),
        ];
        let mut graph = NormalizationGraph::new(group_statements(&tokens));
        assert_eq!(graph.keep_flags(), vec![true, false]);
    }

    #[test]
    fn test_linearize_emits_only_kept_statements() {
        let tokens = vec![
            token("ASSIGN", 0, 1, TokenSemantics::plain().with_write(var("dead"))),
            token("CALL", 1, 2, TokenSemantics::critical()),
        ];
        let graph = NormalizationGraph::new(group_statements(&tokens));
        let output = graph.linearize();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].token_type.name(), "CALL");
    }

    #[test]
    fn test_independent_statements_emit_in_canonical_order() {
        // Two independent critical statements; the two-token one is
        // emitted first regardless of input order.
        let forward = vec![
            token("A", 0, 1, TokenSemantics::critical()),
            token("B", 1, 2, TokenSemantics::critical()),
            token("B2", 2, 2, TokenSemantics::critical()),
        ];
        let swapped = vec![
            token("B", 1, 2, TokenSemantics::critical()),
            token("B2", 2, 2, TokenSemantics::critical()),
            token("A", 0, 1, TokenSemantics::critical()),
        ];

        let names = |tokens: Vec<Token>| {
            tokens
                .into_iter()
                .map(|t| t.token_type.name().to_string())
                .collect::<Vec<_>>()
        };

        let forward_out = names(NormalizationGraph::new(group_statements(&forward)).linearize());
        let swapped_out = names(NormalizationGraph::new(group_statements(&swapped)).linearize());
        assert_eq!(forward_out, vec!["B", "B2", "A"]);
        assert_eq!(forward_out, swapped_out);
    }

    #[test]
    fn test_control_boundary_pins_order() {
        // write x / IF / write x: the two writes must not cross the
        // control statement, even though only data edges chain them.
        let tokens = vec![
            token("ASSIGN", 0, 1, TokenSemantics::critical().with_write(var("x"))),
            token("IF", 1, 2, TokenSemantics::control()),
            token("ASSIGN", 0, 3, TokenSemantics::critical().with_write(var("x"))),
        ];
        let graph = NormalizationGraph::new(group_statements(&tokens));
        let output = graph.linearize();
        let lines: Vec<i32> = output.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }
}
