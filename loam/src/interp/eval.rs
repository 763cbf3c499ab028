//! Statement executor and expression evaluator
//!
//! A direct tree-walker: statements run for effect, expressions produce a
//! [`Value`]. Variable references resolved by the static pass are read at
//! their recorded distance; everything else is looked up by name in the
//! global frame.

use super::env::{self, EnvRef, Environment, child_env};
use super::error::{InterpResult, RuntimeError};
use super::value::{Class, Function, Instance, NativeFn, Value};
use crate::ast::{BinOp, Expr, ExprId, Lit, LogicOp, Program, Span, Spanned, Stmt, UnOp};
use crate::resolver::Resolutions;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Method name treated as the constructor
pub const INITIALIZER_NAME: &str = "init";

/// Stack growth parameters for deeply recursive programs
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// Outcome of executing a statement.
///
/// `return` is not an error: it short-circuits enclosing blocks and loops
/// until the function-call operation in progress intercepts it.
#[derive(Debug)]
#[must_use]
pub enum Flow {
    /// Execution ran to completion
    Normal,
    /// A `return` statement is unwinding with this value
    Return(Value),
}

/// The interpreter
pub struct Interpreter {
    /// Global frame, pre-seeded with native functions
    globals: EnvRef,
    /// Resolution distances keyed by reference occurrence
    locals: Resolutions,
    /// Sink for `print` output
    output: Box<dyn Write>,
}

impl Interpreter {
    /// Create a new interpreter writing to stdout
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Create a new interpreter writing `print` output to the given sink
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = Environment::new().into_ref();
        globals.borrow_mut().define(
            "clock".to_string(),
            Value::Native(Rc::new(NativeFn {
                name: "clock",
                arity: 0,
                func: native_clock,
            })),
        );
        Interpreter {
            globals,
            locals: Resolutions::new(),
            output,
        }
    }

    /// Merge resolution distances computed by the resolver.
    ///
    /// Additive so a REPL can feed one batch per input line; ids never
    /// collide because the parser numbers them monotonically.
    pub fn add_resolutions(&mut self, resolutions: Resolutions) {
        self.locals.extend(resolutions);
    }

    /// Run a full top-level statement sequence.
    ///
    /// Stops at the first runtime error; statements after the failing one are
    /// never executed.
    pub fn interpret(&mut self, program: &Program) -> InterpResult<()> {
        let globals = Rc::clone(&self.globals);
        for stmt in &program.statements {
            // Top-level `return` is rejected by the resolver
            let _ = self.execute(stmt, &globals)?;
        }
        Ok(())
    }

    // ---- statements ----

    fn execute(&mut self, stmt: &Spanned<Stmt>, env: &EnvRef) -> InterpResult<Flow> {
        match &stmt.node {
            Stmt::Expression(expr) => {
                self.eval(expr, env)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.eval(expr, env)?;
                writeln!(self.output, "{value}").map_err(|e| RuntimeError::io(e, expr.span))?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, init } => {
                let value = match init {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Nil,
                };
                env.borrow_mut().define(name.node.clone(), value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => self.execute_block(statements, child_env(env)),

            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond, env)?.is_truthy() {
                    self.execute(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, env)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { cond, body } => {
                while self.eval(cond, env)?.is_truthy() {
                    match self.execute(body, env)? {
                        Flow::Normal => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                // Defined by name in the current frame, enabling recursion
                let function = Function {
                    decl: Rc::new(decl.clone()),
                    closure: Rc::clone(env),
                    is_initializer: false,
                };
                env.borrow_mut()
                    .define(decl.name.node.clone(), Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                // Name goes in first as nil so methods can close over it
                env.borrow_mut().define(name.node.clone(), Value::Nil);

                let superclass_value = match superclass {
                    Some(expr) => match self.eval(expr, env)? {
                        Value::Class(class) => Some(class),
                        other => {
                            return Err(RuntimeError::invalid_superclass(
                                other.type_name(),
                                expr.span,
                            ));
                        }
                    },
                    None => None,
                };

                // Methods of a subclass close over an extra frame holding `super`
                let method_env = match &superclass_value {
                    Some(class) => {
                        let frame = child_env(env);
                        frame
                            .borrow_mut()
                            .define("super".to_string(), Value::Class(Rc::clone(class)));
                        frame
                    }
                    None => Rc::clone(env),
                };

                let mut method_table = HashMap::new();
                for method in methods {
                    let function = Function {
                        decl: Rc::new(method.clone()),
                        closure: Rc::clone(&method_env),
                        is_initializer: method.name.node == INITIALIZER_NAME,
                    };
                    method_table.insert(method.name.node.clone(), function);
                }

                let class = Value::Class(Rc::new(Class {
                    name: name.node.clone(),
                    superclass: superclass_value,
                    methods: method_table,
                }));
                env.borrow_mut().assign(&name.node, class);
                Ok(Flow::Normal)
            }
        }
    }

    /// Execute statements directly in the given frame. A `Return` outcome
    /// short-circuits the rest of the sequence.
    fn execute_block(&mut self, statements: &[Spanned<Stmt>], env: EnvRef) -> InterpResult<Flow> {
        for stmt in statements {
            match self.execute(stmt, &env)? {
                Flow::Normal => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    // ---- expressions ----

    /// Evaluate an expression with automatic stack growth for deep recursion
    fn eval(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr, env))
    }

    fn eval_inner(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> InterpResult<Value> {
        match &expr.node {
            Expr::Literal(lit) => Ok(match lit {
                Lit::Number(n) => Value::Number(*n),
                Lit::Str(s) => Value::Str(Rc::new(s.clone())),
                Lit::Bool(b) => Value::Bool(*b),
                Lit::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.eval(inner, env),

            Expr::Unary { op, expr: inner } => {
                let value = self.eval(inner, env)?;
                match op {
                    UnOp::Neg => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::operand_not_number(inner.span)),
                    },
                    UnOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }

            Expr::Binary { left, op, right } => {
                let lval = self.eval(left, env)?;
                let rval = self.eval(right, env)?;
                self.eval_binary(*op, lval, rval, expr.span)
            }

            Expr::Logical { left, op, right } => {
                // The deciding operand value itself is the result
                let lval = self.eval(left, env)?;
                match op {
                    LogicOp::Or if lval.is_truthy() => Ok(lval),
                    LogicOp::And if !lval.is_truthy() => Ok(lval),
                    _ => self.eval(right, env),
                }
            }

            Expr::Variable { name, id } => self.lookup_variable(name, *id, expr.span, env),

            Expr::Assign { name, id, value } => {
                let value = self.eval(value, env)?;
                let assigned = match self.locals.get(id) {
                    Some(&distance) => env::assign_at(env, distance, name, value.clone()),
                    None => self.globals.borrow_mut().assign(name, value.clone()),
                };
                if assigned {
                    Ok(value)
                } else {
                    Err(RuntimeError::undefined_variable(name, expr.span))
                }
            }

            Expr::Call { callee, args } => {
                let callee_value = self.eval(callee, env)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval(arg, env)?);
                }
                self.call_value(callee_value, arg_values, expr.span)
            }

            Expr::Get { object, name } => {
                let object = self.eval(object, env)?;
                match object {
                    Value::Instance(instance) => self.instance_get(&instance, name),
                    other => Err(RuntimeError::not_an_instance(other.type_name(), name.span)),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.eval(object, env)?;
                let Value::Instance(instance) = object else {
                    return Err(RuntimeError::not_an_instance(
                        object.type_name(),
                        name.span,
                    ));
                };
                let value = self.eval(value, env)?;
                instance
                    .borrow_mut()
                    .fields
                    .insert(name.node.clone(), value.clone());
                Ok(value)
            }

            Expr::This { id } => self.lookup_variable("this", *id, expr.span, env),

            Expr::Super { id, method } => {
                let distance = match self.locals.get(id) {
                    Some(&distance) => distance,
                    None => {
                        return Err(RuntimeError::undefined_variable("super", expr.span));
                    }
                };
                let superclass = match env::get_at(env, distance, "super") {
                    Some(Value::Class(class)) => class,
                    _ => return Err(RuntimeError::undefined_variable("super", expr.span)),
                };
                // The receiver lives one frame closer than `super`
                let receiver = env::get_at(env, distance - 1, "this")
                    .ok_or_else(|| RuntimeError::undefined_variable("this", expr.span))?;
                let function = superclass
                    .find_method(&method.node)
                    .ok_or_else(|| RuntimeError::undefined_property(&method.node, method.span))?;
                Ok(Value::Function(Rc::new(function.bind(receiver))))
            }
        }
    }

    fn eval_binary(&self, op: BinOp, left: Value, right: Value, span: Span) -> InterpResult<Value> {
        match op {
            BinOp::Add => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => {
                    Ok(Value::Str(Rc::new(format!("{a}{b}"))))
                }
                _ => Err(RuntimeError::bad_addition(
                    left.type_name(),
                    right.type_name(),
                    span,
                )),
            },
            BinOp::Sub => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => Err(RuntimeError::operands_not_numbers(span)),
            },
            BinOp::Mul => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                _ => Err(RuntimeError::operands_not_numbers(span)),
            },
            // IEEE division: dividing by zero yields infinity or NaN
            BinOp::Div => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
                _ => Err(RuntimeError::operands_not_numbers(span)),
            },
            BinOp::Lt => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
                _ => Err(RuntimeError::operands_not_numbers(span)),
            },
            BinOp::Le => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
                _ => Err(RuntimeError::operands_not_numbers(span)),
            },
            BinOp::Gt => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
                _ => Err(RuntimeError::operands_not_numbers(span)),
            },
            BinOp::Ge => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),
                _ => Err(RuntimeError::operands_not_numbers(span)),
            },
            // Equality never errors
            BinOp::Eq => Ok(Value::Bool(left == right)),
            BinOp::Ne => Ok(Value::Bool(left != right)),
        }
    }

    fn lookup_variable(
        &self,
        name: &str,
        id: ExprId,
        span: Span,
        env: &EnvRef,
    ) -> InterpResult<Value> {
        let value = match self.locals.get(&id) {
            Some(&distance) => env::get_at(env, distance, name),
            // Globals are looked up by name, permitting forward references
            None => self.globals.borrow().get(name),
        };
        value.ok_or_else(|| RuntimeError::undefined_variable(name, span))
    }

    /// Field if present, else a method bound to the receiver
    fn instance_get(
        &self,
        instance: &Rc<RefCell<Instance>>,
        name: &Spanned<String>,
    ) -> InterpResult<Value> {
        if let Some(value) = instance.borrow().fields.get(&name.node) {
            return Ok(value.clone());
        }
        let class = Rc::clone(&instance.borrow().class);
        match class.find_method(&name.node) {
            Some(method) => Ok(Value::Function(Rc::new(
                method.bind(Value::Instance(Rc::clone(instance))),
            ))),
            None => Err(RuntimeError::undefined_property(&name.node, name.span)),
        }
    }

    // ---- calls ----

    fn call_value(&mut self, callee: Value, args: Vec<Value>, span: Span) -> InterpResult<Value> {
        match callee {
            Value::Native(native) => {
                if args.len() != native.arity {
                    return Err(RuntimeError::arity_mismatch(native.arity, args.len(), span));
                }
                (native.func)(&args)
            }
            Value::Function(function) => self.call_function(&function, args, span),
            Value::Class(class) => self.construct(class, args, span),
            other => Err(RuntimeError::not_callable(other.type_name(), span)),
        }
    }

    /// Call a user-defined function with automatic stack growth
    fn call_function(
        &mut self,
        function: &Function,
        args: Vec<Value>,
        span: Span,
    ) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.call_function_inner(function, args, span)
        })
    }

    fn call_function_inner(
        &mut self,
        function: &Function,
        args: Vec<Value>,
        span: Span,
    ) -> InterpResult<Value> {
        if args.len() != function.arity() {
            return Err(RuntimeError::arity_mismatch(
                function.arity(),
                args.len(),
                span,
            ));
        }

        let env = child_env(&function.closure);
        for (param, arg) in function.decl.params.iter().zip(args) {
            env.borrow_mut().define(param.node.clone(), arg);
        }

        let result = match self.execute_block(&function.decl.body, env)? {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        };

        if function.is_initializer {
            // An initializer always yields the receiver, even after a bare return
            return env::get_at(&function.closure, 0, "this")
                .ok_or_else(|| RuntimeError::undefined_variable("this", span));
        }
        Ok(result)
    }

    fn construct(&mut self, class: Rc<Class>, args: Vec<Value>, span: Span) -> InterpResult<Value> {
        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(&class))));
        match class.find_method(INITIALIZER_NAME) {
            Some(init) => {
                let bound = init.bind(Value::Instance(Rc::clone(&instance)));
                self.call_function(&bound, args, span)?;
            }
            None => {
                if !args.is_empty() {
                    return Err(RuntimeError::arity_mismatch(0, args.len(), span));
                }
            }
        }
        Ok(Value::Instance(instance))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn native_clock(_args: &[Value]) -> InterpResult<Value> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    Ok(Value::Number(now.as_secs_f64()))
}
