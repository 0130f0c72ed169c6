//! Dependency rewriting via source-level AST transformation.
//!
//! Pre-processed source is parsed with Oxc, `require(...)` call expressions
//! are rewritten in place to the bundle runtime's require identifier with the
//! resolved canonical key as argument, and the mutated tree is printed back
//! to source. Everything else in the tree passes through untouched.
//!
//! The parse / find-and-rewrite / unparse split keeps the rewriter behind a
//! narrow seam: any parser and printer pair that can locate call expressions
//! could back it.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{Argument, CallExpression, Expression};
use oxc_ast_visit::{VisitMut, walk_mut};
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_span::{Atom, SourceType};

use crate::graph::ModuleKey;
use crate::{Error, Result, resolver};

/// Identifier the emitted bundle's runtime exposes to every module factory.
pub const RUNTIME_REQUIRE: &str = "__bindle_require__";

/// Interop helper emitted by upstream transpilation around default imports.
/// Its sole argument is itself a module-reference call.
const INTEROP_DEFAULT_HELPER: &str = "_interopRequireDefault";

/// Rewrite every module reference in `source` and collect the referenced
/// dependency keys (duplicates preserved).
///
/// `module` is the key of the module being rewritten; its directory is the
/// referencing directory for all specifiers inside it.
pub fn rewrite(
    source: &str,
    module: &ModuleKey,
    root: &Path,
) -> Result<(String, Vec<ModuleKey>)> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if !ret.errors.is_empty() {
        let message = ret
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::Parse {
            module: module.to_string(),
            message,
        });
    }

    let mut program = ret.program;
    let mut rewriter = RequireRewriter {
        allocator: &allocator,
        module,
        root,
        dependencies: Vec::new(),
        error: None,
    };
    rewriter.visit_program(&mut program);
    if let Some(error) = rewriter.error.take() {
        return Err(error);
    }

    let code = Codegen::new().build(&program).code;
    Ok((code, rewriter.dependencies))
}

struct RequireRewriter<'a, 'b> {
    allocator: &'a Allocator,
    module: &'b ModuleKey,
    root: &'b Path,
    dependencies: Vec<ModuleKey>,
    error: Option<Error>,
}

impl<'a> RequireRewriter<'a, '_> {
    /// Rewrite one `require(...)` call in place: callee becomes the runtime
    /// require identifier, the argument becomes the completed module key.
    fn convert(&mut self, call: &mut CallExpression<'a>) {
        let specifier = match call.arguments.first() {
            Some(Argument::StringLiteral(lit)) if call.arguments.len() == 1 => {
                lit.value.to_string()
            }
            _ => {
                // dynamic requires are unsupported
                self.error = Some(Error::Resolution {
                    specifier: "<dynamic>".to_string(),
                    from: self.module.to_string(),
                    reason: "module reference argument must be a single string literal"
                        .to_string(),
                });
                return;
            }
        };

        let resolved = resolver::resolve(self.module.dir(), &specifier, self.root)
            .and_then(|key| resolver::complete(self.root, key));
        let key = match resolved {
            Ok(key) => key,
            Err(error) => {
                self.error = Some(error);
                return;
            }
        };

        if let Expression::Identifier(ident) = &mut call.callee {
            ident.name = Atom::from(RUNTIME_REQUIRE);
        }
        if let Some(Argument::StringLiteral(lit)) = call.arguments.first_mut() {
            lit.value = Atom::from(&*self.allocator.alloc_str(key.as_str()));
            // drop the original raw text so the printer re-quotes the new value
            lit.raw = None;
        }
        self.dependencies.push(key);
    }
}

fn callee_name<'s>(call: &'s CallExpression) -> Option<&'s str> {
    match &call.callee {
        Expression::Identifier(ident) => Some(ident.name.as_str()),
        _ => None,
    }
}

impl<'a> VisitMut<'a> for RequireRewriter<'a, '_> {
    fn visit_call_expression(&mut self, call: &mut CallExpression<'a>) {
        if self.error.is_some() {
            return;
        }

        if callee_name(call) == Some(INTEROP_DEFAULT_HELPER) && call.arguments.len() == 1 {
            if let Some(Argument::CallExpression(inner)) = call.arguments.first_mut() {
                if callee_name(inner) == Some("require") {
                    self.convert(inner);
                    return;
                }
            }
        } else if callee_name(call) == Some("require") {
            self.convert(call);
            return;
        }

        walk_mut::walk_call_expression(self, call);
    }
}
