//! Static resolution pass
//!
//! Walks the parsed tree once before execution and records, for every
//! variable reference that lands on a local binding, how many frames up the
//! chain the binding lives. References with no entry are globals and get
//! looked up by name at runtime. The pass also rejects programs that are
//! structurally invalid even though they parse: `return` at the top level,
//! `this` outside a class, a local read inside its own initializer.

use crate::ast::{Expr, ExprId, FunctionDecl, Program, Spanned, Stmt};
use crate::error::{CompileError, Result};
use std::collections::HashMap;

/// Distance side table: reference occurrence to frame hops
pub type Resolutions = HashMap<ExprId, usize>;

/// Resolve a program, producing its distance table
pub fn resolve(program: &Program) -> Result<Resolutions> {
    let mut resolver = Resolver::new();
    resolver.resolve_statements(&program.statements)?;
    Ok(resolver.resolutions)
}

/// What kind of function body we are currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
    Initializer,
    Method,
}

/// What kind of class body we are currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

struct Resolver {
    /// Scope stack mirroring runtime frame nesting. The bool marks whether
    /// the name's initializer has finished (declared vs defined).
    scopes: Vec<HashMap<String, bool>>,
    resolutions: Resolutions,
    current_function: FunctionKind,
    current_class: ClassKind,
}

impl Resolver {
    fn new() -> Self {
        Resolver {
            scopes: Vec::new(),
            resolutions: Resolutions::new(),
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
        }
    }

    fn resolve_statements(&mut self, statements: &[Spanned<Stmt>]) -> Result<()> {
        for stmt in statements {
            self.resolve_stmt(stmt)?;
        }
        Ok(())
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Mark a name as existing in the innermost scope but not yet usable.
    /// Global declarations are unrestricted and never tracked here.
    fn declare(&mut self, name: &Spanned<String>) -> Result<()> {
        let Some(scope) = self.scopes.last_mut() else {
            return Ok(());
        };
        if scope.contains_key(&name.node) {
            return Err(CompileError::resolve(
                format!("a variable named '{}' already exists in this scope", name.node),
                name.span,
            ));
        }
        scope.insert(name.node.clone(), false);
        Ok(())
    }

    /// Mark a declared name as fully initialized and usable
    fn define(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    /// Record the frame distance for a reference if it lands on a local.
    /// No entry means the reference falls through to the global frame.
    fn resolve_local(&mut self, id: ExprId, name: &str) {
        for (distance, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name) {
                self.resolutions.insert(id, distance);
                return;
            }
        }
    }

    fn resolve_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<()> {
        match &stmt.node {
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::Var { name, init } => {
                self.declare(name)?;
                if let Some(init) = init {
                    self.resolve_expr(init)?;
                }
                self.define(&name.node);
                Ok(())
            }

            Stmt::Block(statements) => {
                self.begin_scope();
                let result = self.resolve_statements(statements);
                self.end_scope();
                result
            }

            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(cond)?;
                self.resolve_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch)?;
                }
                Ok(())
            }

            Stmt::While { cond, body } => {
                self.resolve_expr(cond)?;
                self.resolve_stmt(body)
            }

            Stmt::Function(decl) => {
                // Defined before the body resolves, so recursion works
                self.declare(&decl.name)?;
                self.define(&decl.name.node);
                self.resolve_function(decl, FunctionKind::Function)
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    return Err(CompileError::resolve(
                        "cannot return from top-level code".to_string(),
                        *keyword,
                    ));
                }
                if let Some(value) = value {
                    if self.current_function == FunctionKind::Initializer {
                        return Err(CompileError::resolve(
                            "cannot return a value from an initializer".to_string(),
                            *keyword,
                        ));
                    }
                    self.resolve_expr(value)?;
                }
                Ok(())
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let enclosing = self.current_class;
                self.current_class = ClassKind::Class;

                self.declare(name)?;
                self.define(&name.node);

                if let Some(superclass) = superclass {
                    if let Expr::Variable {
                        name: super_name, ..
                    } = &superclass.node
                    {
                        if super_name == &name.node {
                            self.current_class = enclosing;
                            return Err(CompileError::resolve(
                                "a class cannot inherit from itself".to_string(),
                                superclass.span,
                            ));
                        }
                    }
                    self.current_class = ClassKind::Subclass;
                    self.resolve_expr(superclass)?;

                    // Mirrors the `super` frame the executor opens
                    self.begin_scope();
                    self.define("super");
                }

                // Mirrors the frame the bound method's closure adds
                self.begin_scope();
                self.define("this");

                for method in methods {
                    let kind = if method.name.node == crate::interp::INITIALIZER_NAME {
                        FunctionKind::Initializer
                    } else {
                        FunctionKind::Method
                    };
                    self.resolve_function(method, kind)?;
                }

                self.end_scope();
                if superclass.is_some() {
                    self.end_scope();
                }

                self.current_class = enclosing;
                Ok(())
            }
        }
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionKind) -> Result<()> {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param)?;
            self.define(&param.node);
        }
        let result = self.resolve_statements(&decl.body);
        self.end_scope();

        self.current_function = enclosing;
        result
    }

    fn resolve_expr(&mut self, expr: &Spanned<Expr>) -> Result<()> {
        match &expr.node {
            Expr::Literal(_) => Ok(()),

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { expr: inner, .. } => self.resolve_expr(inner),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)
            }

            Expr::Variable { name, id } => {
                if self.scopes.last().is_some_and(|scope| {
                    scope.get(name) == Some(&false)
                }) {
                    return Err(CompileError::resolve(
                        format!("cannot read local variable '{name}' in its own initializer"),
                        expr.span,
                    ));
                }
                self.resolve_local(*id, name);
                Ok(())
            }

            Expr::Assign { name, id, value } => {
                self.resolve_expr(value)?;
                self.resolve_local(*id, name);
                Ok(())
            }

            Expr::Call { callee, args } => {
                self.resolve_expr(callee)?;
                for arg in args {
                    self.resolve_expr(arg)?;
                }
                Ok(())
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object)?;
                self.resolve_expr(value)
            }

            Expr::This { id } => {
                if self.current_class == ClassKind::None {
                    return Err(CompileError::resolve(
                        "cannot use 'this' outside of a class".to_string(),
                        expr.span,
                    ));
                }
                self.resolve_local(*id, "this");
                Ok(())
            }

            Expr::Super { id, .. } => {
                match self.current_class {
                    ClassKind::None => {
                        return Err(CompileError::resolve(
                            "cannot use 'super' outside of a class".to_string(),
                            expr.span,
                        ));
                    }
                    ClassKind::Class => {
                        return Err(CompileError::resolve(
                            "cannot use 'super' in a class with no superclass".to_string(),
                            expr.span,
                        ));
                    }
                    ClassKind::Subclass => {}
                }
                self.resolve_local(*id, "super");
                Ok(())
            }
        }
    }
}
