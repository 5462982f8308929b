//! # Introduction
//!
//! swiftast turns Swift source text into a fully located abstract syntax
//! tree for downstream tools such as linters, formatters and documentation
//! generators. It does no type checking, name resolution or execution.
//!
//! ## Translation pipeline
//!
//! ```text
//! SourceFile → Lexer → Parser → flat AST → Folding → AST → LexicalParents
//! ```
//!
//! 1. [`source`]: files, locations and half-open ranges.
//! 2. [`parser::lexer`]: total tokenizer; whitespace and comments are kept
//!    as tokens so the text can be rebuilt from the token ranges.
//! 3. [`parser`]: recursive descent over the significant tokens, with
//!    speculative parsing for generic argument clauses and closure headers.
//!    Operator chains are left as flat sequence expressions.
//! 4. [`folding`]: nests sequence expressions by precedence group,
//!    including groups declared in the file itself.
//! 5. [`lexical_parent`]: optional side table from node to enclosing node.
//! 6. [`diagnostic`]: per-file pool of fatal errors, errors and warnings,
//!    with checkpoints for speculative parsing.
//!
//! [`translate`] runs all of it for one file.
//!
//! ```no_run
//! use swiftast::diagnostic::DiagnosticPool;
//! use swiftast::source::SourceFile;
//! use swiftast::{translate, TranslationOptions};
//!
//! let file = SourceFile::in_memory("let x = 1 + 2 * 3");
//! let mut pool = DiagnosticPool::new();
//! let translation = translate(&file, &mut pool, &TranslationOptions::default());
//! let mut diagnostics = Vec::new();
//! pool.report(&mut diagnostics);
//! ```

pub mod ast;
pub mod diagnostic;
pub mod folding;
pub mod lexical_parent;
pub mod parser;
pub mod source;

use ast::TopLevelDeclaration;
use diagnostic::{DiagnosticPool, StopSignal};
use folding::PrecedenceTable;
use lexical_parent::LexicalParents;
use source::SourceFile;

/// Knobs for [`translate`].
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    /// Base precedence table; the file's own `precedencegroup` and
    /// `operator` declarations are always added on top.
    pub precedence: PrecedenceTable,
    /// Build the lexical parent table after folding
    pub assign_parents: bool,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            precedence: PrecedenceTable::standard(),
            assign_parents: true,
        }
    }
}

/// Result of translating one file.
#[derive(Debug, Clone)]
pub struct Translation {
    pub unit: TopLevelDeclaration,
    /// `None` when [`TranslationOptions::assign_parents`] is off
    pub parents: Option<LexicalParents>,
}

/// Lex, parse and fold `file`, reporting into `pool`.
///
/// Returns [`StopSignal`] when the pool's thresholds are exceeded or a fatal
/// error occurs; the causes stay in `pool`.
pub fn translate(
    file: &SourceFile,
    pool: &mut DiagnosticPool,
    options: &TranslationOptions,
) -> Result<Translation, StopSignal> {
    let unit = parser::parse(file, pool)?;
    let table = options.precedence.clone().with_declarations(&unit);
    let unit = folding::fold(unit, &table);
    let parents = options.assign_parents.then(|| LexicalParents::of(&unit));
    Ok(Translation { unit, parents })
}
