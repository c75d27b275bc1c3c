use std::fmt::Display;
use std::rc::Rc;

use carrot_core::ast::Node;
use thiserror::Error;

use crate::heap::Heap;
use crate::print_handler::PrintHandler;

/// Identity key of a runtime object. Assigned once at allocation and never
/// reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u64);

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Null,
    Int,
    Float,
    Str,
    List,
    Function,
}

impl ObjectType {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectType::Null => "null",
            ObjectType::Int => "int",
            ObjectType::Float => "float",
            ObjectType::Str => "str",
            ObjectType::List => "list",
            ObjectType::Function => "function",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Null,
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Vec<ObjectId>),
    Function(Function),
}

impl Payload {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Payload::Null => ObjectType::Null,
            Payload::Int(_) => ObjectType::Int,
            Payload::Float(_) => ObjectType::Float,
            Payload::Str(_) => ObjectType::Str,
            Payload::List(_) => ObjectType::List,
            Payload::Function(_) => ObjectType::Function,
        }
    }
}

/// A runtime value stored in the [`Heap`]. Its display form is rendered once
/// when the object is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub(crate) payload: Payload,
    pub(crate) display: Rc<str>,
}

impl Object {
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn object_type(&self) -> ObjectType {
        self.payload.object_type()
    }

    pub fn type_name(&self) -> &'static str {
        self.object_type().name()
    }

    pub fn display(&self) -> &str {
        &self.display
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    Builtin(BuiltinFunction),
    User(UserFunction),
}

/// A function defined in script code. It captures nothing but its own
/// parameters and body.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFunction {
    pub name: Rc<str>,
    pub parameters: Vec<Rc<str>>,
    pub body: Rc<[Node]>,
}

pub type BuiltinEntry =
    fn(&mut Heap, &mut PrintHandler, Vec<ObjectId>) -> Result<ObjectId, EvaluationError>;

#[derive(Clone)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub func: BuiltinEntry,
}

impl PartialEq for BuiltinFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.func as usize == other.func as usize
    }
}

impl std::fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinFunction")
            .field("name", &self.name)
            .finish()
    }
}

/// Non-local exit from a node: either a `return` unwinding to the enclosing
/// call, or a fatal error unwinding to the driver.
#[derive(Debug, PartialEq)]
pub enum QuickReturn {
    Return(ObjectId),
    Error(EvaluationError),
}

impl From<EvaluationError> for QuickReturn {
    fn from(error: EvaluationError) -> Self {
        QuickReturn::Error(error)
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum EvaluationError {
    #[error("variable \"{0}\" is undefined; define it before accessing it")]
    UndefinedVariable(Rc<str>),
    #[error("function \"{0}\" is undefined; define the function before calling it")]
    UndefinedFunction(Rc<str>),
    #[error("cannot assign to \"{0}\" because it was never defined")]
    AssignToUndefined(Rc<str>),
    #[error("called an object that is not a function: {0}")]
    CallNonFunction(String),
    #[error("function \"{function}\" expects {expected} arguments, but {actual} were passed")]
    WrongArgumentCount {
        function: Rc<str>,
        expected: usize,
        actual: usize,
    },
    #[error("function '{function}' accepts {expected} argument(s), but {actual} were passed")]
    BuiltinArgumentCount {
        function: &'static str,
        expected: &'static str,
        actual: usize,
    },
    #[error("unsupported operand types for `{operator}`: {left} and {right}")]
    UnsupportedOperation {
        operator: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("unsupported operand type for unary `{operator}`: {operand}")]
    UnsupportedUnaryOperation {
        operator: &'static str,
        operand: &'static str,
    },
    #[error("integer division by zero")]
    DivisionByZero,
    #[error("integer overflow in `{0}`")]
    IntegerOverflow(&'static str),
    #[error("index {index} is out of range for length {length}")]
    IndexOutOfRange { index: i64, length: usize },
    #[error("objects of type {0} cannot be indexed")]
    NotIndexable(&'static str),
    #[error("index must be an int, not {0}")]
    InvalidIndex(&'static str),
    #[error("objects of type {0} cannot be iterated")]
    NotIterable(&'static str),
    #[error("object {0} was already destroyed")]
    DestroyedObject(ObjectId),
    #[error("calling \"{function}\" exceeded the limit of {limit} nested calls")]
    RecursionLimit { function: Rc<str>, limit: usize },
    #[error("failed to write output: {0}")]
    Output(String),
}
