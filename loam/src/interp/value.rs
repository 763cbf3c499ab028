//! Runtime values for the interpreter

use super::env::EnvRef;
use super::error::InterpResult;
use crate::ast::FunctionDecl;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    /// Double-precision number
    Number(f64),
    /// String
    Str(Rc<String>),
    /// Boolean
    Bool(bool),
    /// Nil
    Nil,
    /// Host-provided function
    Native(Rc<NativeFn>),
    /// User-defined function (closure)
    Function(Rc<Function>),
    /// Class, callable as a constructor
    Class(Rc<Class>),
    /// Instance of a class
    Instance(Rc<RefCell<Instance>>),
}

impl Value {
    /// Check if value is truthy: nil and false are falsy, everything else
    /// (including 0 and "") is truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    /// Get type name for error messages
    pub fn type_name(&self) -> &str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Nil => "nil",
            Value::Native(_) => "native function",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64 Display already drops the fractional part of integral values
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Nil => write!(f, "nil"),
            Value::Native(_) => write!(f, "<native fn>"),
            Value::Function(func) => write!(f, "<fn {}>", func.decl.name.node),
            Value::Class(class) => write!(f, "{}", class.name),
            Value::Instance(instance) => {
                write!(f, "{} instance", instance.borrow().class.name)
            }
        }
    }
}

impl PartialEq for Value {
    /// Type-aware equality: values of different kinds are never equal,
    /// callables and instances compare by identity
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Host-provided function with fixed arity
pub struct NativeFn {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> InterpResult<Value>,
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// User-defined function: a declaration plus the frame captured at its
/// definition point
#[derive(Debug, Clone)]
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub closure: EnvRef,
    pub is_initializer: bool,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }

    /// Produce a bound method: a copy of this function whose closure is a
    /// fresh frame defining `this` as the receiver
    pub fn bind(&self, receiver: Value) -> Function {
        let env = super::env::child_env(&self.closure);
        env.borrow_mut().define("this".to_string(), receiver);
        Function {
            decl: Rc::clone(&self.decl),
            closure: env,
            is_initializer: self.is_initializer,
        }
    }
}

/// Class: name, optional superclass, and a method table frozen once the
/// declaration finishes executing
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: HashMap<String, Function>,
}

impl Class {
    /// Look up a method on this class or its ancestors
    pub fn find_method(&self, name: &str) -> Option<&Function> {
        if let Some(method) = self.methods.get(name) {
            Some(method)
        } else if let Some(superclass) = &self.superclass {
            superclass.find_method(name)
        } else {
            None
        }
    }

    /// Constructor arity: the arity of `init` if declared, else zero
    pub fn arity(&self) -> usize {
        self.find_method(super::eval::INITIALIZER_NAME)
            .map(Function::arity)
            .unwrap_or(0)
    }
}

/// Instance: originating class plus a per-instance field table
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::Number(42.0)), "42");
        assert_eq!(format!("{}", Value::Number(2.5)), "2.5");
        assert_eq!(format!("{}", Value::Bool(true)), "true");
        assert_eq!(format!("{}", Value::Nil), "nil");
        assert_eq!(
            format!("{}", Value::Str(Rc::new("hi".to_string()))),
            "hi"
        );
    }

    #[test]
    fn test_integral_number_prints_without_fraction() {
        assert_eq!(format!("{}", Value::Number(100.0)), "100");
        assert_eq!(format!("{}", Value::Number(-3.0)), "-3");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::Str(Rc::new(String::new())).is_truthy());
    }

    #[test]
    fn test_equality_same_kind() {
        assert_eq!(Value::Number(1.0), Value::Number(1.0));
        assert_eq!(Value::Nil, Value::Nil);
        assert_eq!(
            Value::Str(Rc::new("a".to_string())),
            Value::Str(Rc::new("a".to_string()))
        );
    }

    #[test]
    fn test_equality_across_kinds() {
        assert_ne!(Value::Number(1.0), Value::Str(Rc::new("1".to_string())));
        assert_ne!(Value::Bool(false), Value::Nil);
        assert_ne!(Value::Number(0.0), Value::Bool(false));
    }

    #[test]
    fn test_instance_identity_equality() {
        let class = Rc::new(Class {
            name: "Point".to_string(),
            superclass: None,
            methods: HashMap::new(),
        });
        let a = Value::Instance(Rc::new(RefCell::new(Instance::new(Rc::clone(&class)))));
        let b = Value::Instance(Rc::new(RefCell::new(Instance::new(class))));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_find_method_walks_superclass_chain() {
        let base = Rc::new(Class {
            name: "Base".to_string(),
            superclass: None,
            methods: HashMap::new(),
        });
        let derived = Class {
            name: "Derived".to_string(),
            superclass: Some(base),
            methods: HashMap::new(),
        };
        assert!(derived.find_method("missing").is_none());
    }

    #[test]
    fn test_class_display() {
        let class = Rc::new(Class {
            name: "Point".to_string(),
            superclass: None,
            methods: HashMap::new(),
        });
        assert_eq!(format!("{}", Value::Class(Rc::clone(&class))), "Point");
        let instance = Value::Instance(Rc::new(RefCell::new(Instance::new(class))));
        assert_eq!(format!("{instance}"), "Point instance");
    }
}
