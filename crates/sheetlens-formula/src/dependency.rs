//! Per-sheet formula dependency tracking
//!
//! Two-pass design: a [`GraphBuilder`] consumes every formula cell of one
//! sheet in row-major order, then [`GraphBuilder::finish`] freezes it into
//! an immutable [`SheetGraph`] that answers "which formulas consume this
//! cell". The builder/graph split makes the build-then-query sequencing a
//! type-level contract: nothing can query a graph that is still being
//! populated.
//!
//! All maps are keyed by the canonical A1 label of
//! [`CellAddress::label`]; the graph is rebuilt from scratch per sheet
//! and dropped at sheet end.

use ahash::{AHashMap, AHashSet};
use log::warn;
use sheetlens_core::{CellAddress, Worksheet};

use crate::compile::compile;
use crate::error::FormulaResult;
use crate::render::render_tokens;
use crate::token::Token;

/// In-progress dependency graph for one sheet
#[derive(Debug, Default)]
pub struct GraphBuilder {
    /// Referenced address → formula addresses whose token stream referenced
    /// it, in first-seen order, duplicates allowed
    refs_to_formulas: AHashMap<String, Vec<String>>,
    /// Formula address → formula addresses that reference it (the
    /// "who consumes me" edge in the formula-to-formula subgraph)
    formula_parents: AHashMap<String, Vec<String>>,
    /// Formula address → rendered display text, `[.C3]=...` form
    rendered: AHashMap<String, String>,
}

impl GraphBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one formula cell's rendered text and reference edges
    ///
    /// Fails if the token stream does not render; the caller is expected
    /// to skip the cell and continue (one bad formula never aborts the
    /// sheet). On failure the builder is left untouched.
    pub fn add_formula(
        &mut self,
        sheet: &Worksheet,
        row: u32,
        col: u16,
        tokens: &[Token],
    ) -> FormulaResult<()> {
        let text = render_tokens(tokens)?;
        let formula_addr = CellAddress::label(row, col);
        self.rendered
            .insert(formula_addr.clone(), format!("[.{}]={}", formula_addr, text));

        for token in tokens {
            match token {
                Token::CellRef(addr) => {
                    self.add_reference(sheet, addr.row, addr.col, &formula_addr);
                }
                Token::AreaRef(range) => {
                    // An area fans out to every contained cell; rows past
                    // the last populated row can never be queried, so
                    // whole-column spans are clamped there.
                    let last_row = range.end.row.min(sheet.last_row().unwrap_or(0));
                    for r in range.start.row..=last_row {
                        for c in range.start.col..=range.end.col {
                            self.add_reference(sheet, r, c, &formula_addr);
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn add_reference(&mut self, sheet: &Worksheet, row: u32, col: u16, formula_addr: &str) {
        let ref_addr = CellAddress::label(row, col);

        if sheet.is_formula_at(row, col) {
            self.formula_parents
                .entry(ref_addr.clone())
                .or_default()
                .push(formula_addr.to_string());
        }

        self.refs_to_formulas
            .entry(ref_addr)
            .or_default()
            .push(formula_addr.to_string());
    }

    /// Freeze the builder into a queryable graph
    pub fn finish(self) -> SheetGraph {
        SheetGraph {
            refs_to_formulas: self.refs_to_formulas,
            formula_parents: self.formula_parents,
            rendered: self.rendered,
        }
    }
}

/// Completed dependency graph for one sheet
#[derive(Debug, Default)]
pub struct SheetGraph {
    refs_to_formulas: AHashMap<String, Vec<String>>,
    formula_parents: AHashMap<String, Vec<String>>,
    rendered: AHashMap<String, String>,
}

impl SheetGraph {
    /// Build the graph for a whole sheet
    ///
    /// Walks the sheet's formula cells in row-major order, compiling each
    /// source text. A formula that fails to compile or render contributes
    /// nothing and is logged; processing continues with the next cell.
    pub fn build(sheet: &Worksheet) -> SheetGraph {
        let mut builder = GraphBuilder::new();

        for (row, col, source) in sheet.formula_cells() {
            let added = compile(source).and_then(|tokens| {
                builder.add_formula(sheet, row, col, &tokens)
            });
            if let Err(e) = added {
                warn!(
                    "skipping formula at {}: {}",
                    CellAddress::label(row, col),
                    e
                );
            }
        }

        builder.finish()
    }

    /// The rendered display text for a formula cell, if it rendered
    pub fn rendered_formula(&self, addr: &str) -> Option<&str> {
        self.rendered.get(addr).map(String::as_str)
    }

    /// All rendered formulas that directly or transitively reference a cell
    ///
    /// Breadth-first over the parent edges: direct referencers first, then
    /// their referencers, and so on. Each formula's parent list is
    /// expanded at most once per query, so the walk terminates even on a
    /// cyclic reference graph. Repeated appearances are collapsed keeping
    /// the last (most transitively distant) occurrence in place; addresses
    /// whose formula failed to render are skipped.
    pub fn formulas_affecting(&self, value_addr: &str) -> Vec<String> {
        let Some(direct) = self.refs_to_formulas.get(value_addr) else {
            return Vec::new();
        };

        let mut collected: Vec<&str> = Vec::new();
        let mut frontier: Vec<&str> = direct.iter().map(String::as_str).collect();
        let mut expanded: AHashSet<&str> = AHashSet::new();

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for addr in frontier {
                collected.push(addr);
                if expanded.insert(addr) {
                    if let Some(parents) = self.formula_parents.get(addr) {
                        next.extend(parents.iter().map(String::as_str));
                    }
                }
            }
            frontier = next;
        }

        // Deduplicate scanning from the end: the rightmost occurrence of
        // each address survives at its original position.
        let mut seen: AHashSet<&str> = AHashSet::new();
        let mut keep = vec![false; collected.len()];
        for i in (0..collected.len()).rev() {
            keep[i] = seen.insert(collected[i]);
        }

        collected
            .iter()
            .zip(keep)
            .filter(|(_, keep)| *keep)
            .filter_map(|(addr, _)| self.rendered.get(*addr).cloned())
            .collect()
    }

    /// The composite annotation for a plain cell: affecting formulas
    /// joined with `" || "`, or `None` when there are none
    pub fn annotation_for(&self, value_addr: &str) -> Option<String> {
        let formulas = self.formulas_affecting(value_addr);
        if formulas.is_empty() {
            None
        } else {
            Some(formulas.join(" || "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet_with(formulas: &[(u32, u16, &str)], values: &[(u32, u16, f64)]) -> Worksheet {
        let mut ws = Worksheet::new("Test");
        for (row, col, n) in values {
            ws.set_value_at(*row, *col, *n);
        }
        for (row, col, text) in formulas {
            ws.set_formula_at(*row, *col, *text);
        }
        ws
    }

    #[test]
    fn test_direct_reference() {
        let ws = sheet_with(&[(0, 1, "=A1*2")], &[(0, 0, 5.0)]);
        let graph = SheetGraph::build(&ws);

        assert_eq!(graph.formulas_affecting("A1"), vec!["[.B1]=[.A1]*2"]);
        assert_eq!(graph.annotation_for("A1").unwrap(), "[.B1]=[.A1]*2");
        assert!(graph.formulas_affecting("Z9").is_empty());
    }

    #[test]
    fn test_area_fan_out() {
        // C3 references A1:A3; each member cell gets the edge exactly once
        let ws = sheet_with(
            &[(2, 2, "=SUM(A1:A3)")],
            &[(0, 0, 1.0), (1, 0, 2.0), (2, 0, 3.0)],
        );
        let graph = SheetGraph::build(&ws);

        for addr in ["A1", "A2", "A3"] {
            assert_eq!(
                graph.formulas_affecting(addr),
                vec!["[.C3]=SUM([.A1:.A3])"],
                "cell {}",
                addr
            );
        }
    }

    #[test]
    fn test_transitive_chain() {
        // A1 <- B1 (formula) <- C1 (formula): querying A1 yields both,
        // direct referencer first
        let ws = sheet_with(&[(0, 1, "=A1+1"), (0, 2, "=B1*2")], &[(0, 0, 1.0)]);
        let graph = SheetGraph::build(&ws);

        assert_eq!(
            graph.formulas_affecting("A1"),
            vec!["[.B1]=[.A1]+1", "[.C1]=[.B1]*2"]
        );
        assert_eq!(
            graph.annotation_for("A1").unwrap(),
            "[.B1]=[.A1]+1 || [.C1]=[.B1]*2"
        );
    }

    #[test]
    fn test_cycle_terminates() {
        // B1 and C1 reference each other; both also consume A1. The walk
        // must terminate and report each formula once.
        let ws = sheet_with(&[(0, 1, "=C1+A1"), (0, 2, "=B1+A1")], &[(0, 0, 1.0)]);
        let graph = SheetGraph::build(&ws);

        let result = graph.formulas_affecting("A1");
        assert_eq!(result.len(), 2);
        assert!(result.iter().any(|f| f.starts_with("[.B1]=")));
        assert!(result.iter().any(|f| f.starts_with("[.C1]=")));
    }

    #[test]
    fn test_self_reference_terminates() {
        let ws = sheet_with(&[(0, 1, "=B1+A1")], &[(0, 0, 1.0)]);
        let graph = SheetGraph::build(&ws);

        assert_eq!(graph.formulas_affecting("A1"), vec!["[.B1]=[.B1]+[.A1]"]);
    }

    #[test]
    fn test_duplicate_references_collapse() {
        // D1 references A1 twice; the annotation lists it once
        let ws = sheet_with(&[(0, 3, "=A1+A1")], &[(0, 0, 1.0)]);
        let graph = SheetGraph::build(&ws);

        assert_eq!(graph.formulas_affecting("A1"), vec!["[.D1]=[.A1]+[.A1]"]);
    }

    #[test]
    fn test_rightmost_occurrence_wins() {
        // A1 feeds B1 (=C1+A1) and C1 (=A1*2) directly, and B1 appears
        // again when C1's parent edge is expanded. The walk collects
        // [B1, C1, B1]; only the rightmost B1 survives, so the result
        // must be [C1, B1] — a keep-first dedup would give [B1, C1].
        let ws = sheet_with(&[(0, 1, "=C1+A1"), (0, 2, "=A1*2")], &[(0, 0, 1.0)]);
        let graph = SheetGraph::build(&ws);

        assert_eq!(
            graph.formulas_affecting("A1"),
            vec!["[.C1]=[.A1]*2", "[.B1]=[.C1]+[.A1]"]
        );
        assert_eq!(
            graph.annotation_for("A1").unwrap(),
            "[.C1]=[.A1]*2 || [.B1]=[.C1]+[.A1]"
        );
    }

    #[test]
    fn test_broken_formula_is_isolated() {
        // The unparsable formula contributes nothing; the valid one still
        // annotates its references.
        let ws = sheet_with(&[(0, 1, "=)("), (0, 2, "=A1*3")], &[(0, 0, 1.0)]);
        let graph = SheetGraph::build(&ws);

        assert!(graph.rendered_formula("B1").is_none());
        assert_eq!(graph.formulas_affecting("A1"), vec!["[.C1]=[.A1]*3"]);
    }

    #[test]
    fn test_overlong_column_reference_is_isolated() {
        // The reference overflows the column space; the formula is
        // skipped like any other bad one and the rest still annotates.
        let ws = sheet_with(&[(0, 1, "=AAAAAAAA1+1"), (0, 2, "=A1*3")], &[(0, 0, 1.0)]);
        let graph = SheetGraph::build(&ws);

        assert!(graph.rendered_formula("B1").is_none());
        assert_eq!(graph.formulas_affecting("A1"), vec!["[.C1]=[.A1]*3"]);
    }

    #[test]
    fn test_whole_column_clamped_to_used_rows() {
        let ws = sheet_with(&[(0, 3, "=SUM(A:A)")], &[(0, 0, 1.0), (5, 0, 2.0)]);
        let graph = SheetGraph::build(&ws);

        assert_eq!(graph.formulas_affecting("A1"), vec!["[.D1]=SUM(A:A)"]);
        assert_eq!(graph.formulas_affecting("A6"), vec!["[.D1]=SUM(A:A)"]);
    }

    #[test]
    fn test_builder_untouched_reference_map_on_render_failure() {
        let mut builder = GraphBuilder::new();
        let ws = Worksheet::new("Test");

        // Two leftover operands: render fails, nothing recorded
        let tokens = [Token::lit("1"), Token::lit("2")];
        assert!(builder.add_formula(&ws, 0, 0, &tokens).is_err());

        let graph = builder.finish();
        assert!(graph.rendered_formula("A1").is_none());
    }
}
