//! Lexical parent side table
//!
//! AST nodes hold no back-references. Passes that need the enclosing
//! construct of a node (scope lookups, "is this inside a closure") ask a
//! [`LexicalParents`] table instead. The table is filled by one walk over a
//! finished tree; until [`LexicalParents::assign`] has seen a node, that node
//! has no parent.
//!
//! Statements directly in a file have the [`TopLevelDeclaration`] as parent.
//! Code blocks, conditions and switch cases are not nodes of their own, so a
//! statement inside a function body has the function declaration as parent.

use crate::ast::visit::{
    walk_declaration, walk_expression, walk_pattern, walk_statement, walk_top_level, walk_type,
};
use crate::ast::*;
use rustc_hash::FxHashMap;

/// Maps a node to the node that lexically encloses it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexicalParents {
    parents: FxHashMap<NodeId, NodeId>,
}

impl LexicalParents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the parent of every node below `unit`.
    ///
    /// Assigning a second tree adds to the table; ids are only unique within
    /// one unit, so use one table per unit.
    pub fn assign(&mut self, unit: &TopLevelDeclaration) {
        let mut assigner = Assigner {
            parents: &mut self.parents,
            stack: vec![unit.id],
        };
        walk_top_level(&mut assigner, unit);
    }

    /// Build a table for `unit` in one step.
    pub fn of(unit: &TopLevelDeclaration) -> Self {
        let mut parents = Self::new();
        parents.assign(unit);
        parents
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    pub fn is_assigned(&self, id: NodeId) -> bool {
        self.parents.contains_key(&id)
    }

    /// Enclosing nodes of `id`, innermost first, ending at the top level.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent_of(id), move |&parent| self.parent_of(parent))
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

struct Assigner<'t> {
    parents: &'t mut FxHashMap<NodeId, NodeId>,
    /// Ids of the nodes currently being walked; the last one is the parent
    stack: Vec<NodeId>,
}

impl Assigner<'_> {
    fn enter(&mut self, id: NodeId) {
        if let Some(&parent) = self.stack.last() {
            self.parents.insert(id, parent);
        }
        self.stack.push(id);
    }

    fn leave(&mut self) {
        self.stack.pop();
    }
}

impl<'ast> Visitor<'ast> for Assigner<'_> {
    fn visit_statement(&mut self, statement: &'ast Statement) {
        self.enter(statement.id);
        walk_statement(self, statement);
        self.leave();
    }

    fn visit_declaration(&mut self, declaration: &'ast Declaration) {
        self.enter(declaration.id);
        walk_declaration(self, declaration);
        self.leave();
    }

    fn visit_expression(&mut self, expression: &'ast Expression) {
        self.enter(expression.id);
        walk_expression(self, expression);
        self.leave();
    }

    fn visit_type(&mut self, ty: &'ast Type) {
        self.enter(ty.id);
        walk_type(self, ty);
        self.leave();
    }

    fn visit_pattern(&mut self, pattern: &'ast Pattern) {
        self.enter(pattern.id);
        walk_pattern(self, pattern);
        self.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticPool;
    use crate::folding::{fold, PrecedenceTable};
    use crate::parser;
    use crate::source::SourceFile;

    fn unit(source: &str) -> TopLevelDeclaration {
        let mut pool = DiagnosticPool::new();
        let unit = parser::parse(&SourceFile::in_memory(source), &mut pool).expect("parse");
        assert!(pool.is_empty(), "unexpected diagnostics: {:?}", pool.diagnostics());
        fold(unit, &PrecedenceTable::standard())
    }

    /// Every node reachable from `node`, paired with its parent id.
    fn edges<'ast>(node: NodeRef<'ast>, out: &mut Vec<(NodeId, NodeId)>) {
        for child in node.children() {
            out.push((child.id(), node.id()));
            edges(child, out);
        }
    }

    #[test]
    fn test_nothing_assigned_before_the_pass() {
        let unit = unit("let x = 1");
        let parents = LexicalParents::new();
        assert!(parents.is_empty());
        assert!(!parents.is_assigned(unit.statements[0].id));
    }

    #[test]
    fn test_every_node_but_the_root_has_its_parent() {
        let unit = unit(
            "struct Point {\n  var x: Int\n  func scaled(by k: Int) -> Point {\n    return Point(x: x * k)\n  }\n}\nlet p = Point(x: 1).scaled(by: 2)\nif let v = p.x as Int? { print(v) }",
        );
        let parents = LexicalParents::of(&unit);

        let mut expected = Vec::new();
        edges(NodeRef::TopLevel(&unit), &mut expected);
        assert!(!expected.is_empty());
        assert_eq!(parents.len(), expected.len());
        for (child, parent) in expected {
            assert_eq!(parents.parent_of(child), Some(parent));
        }
        assert!(!parents.is_assigned(unit.id));
    }

    #[test]
    fn test_ancestors_end_at_top_level() {
        let unit = unit("func f() {\n  let g = { a + b }\n}");
        let parents = LexicalParents::of(&unit);

        let statement = &unit.statements[0];
        let StatementKind::Declaration(function) = &statement.kind else {
            panic!("Expected declaration, got {:?}", statement.kind);
        };
        let DeclarationKind::Function(declaration) = &function.kind else {
            panic!("Expected function, got {:?}", function.kind);
        };
        let body = declaration.body.as_ref().expect("body");
        let inner = &body.statements[0];

        let chain: Vec<NodeId> = parents.ancestors(inner.id).collect();
        assert_eq!(chain, vec![function.id, statement.id, unit.id]);
    }
}
