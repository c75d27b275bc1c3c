use std::fmt::Display;
use std::rc::Rc;

/// Static type tag written in variable and function declarations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DataType {
    Str,
    Int,
    Float,
    Bool,
    List,
    Null,
}

impl DataType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "str" => Some(DataType::Str),
            "int" => Some(DataType::Int),
            "float" => Some(DataType::Float),
            "bool" => Some(DataType::Bool),
            "list" => Some(DataType::List),
            "null" => Some(DataType::Null),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Str => "str",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Bool => "bool",
            DataType::List => "list",
            DataType::Null => "null",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Vec<Node>),
}

impl LiteralValue {
    pub fn data_type(&self) -> DataType {
        match self {
            LiteralValue::Int(_) => DataType::Int,
            LiteralValue::Float(_) => DataType::Float,
            LiteralValue::Str(_) => DataType::Str,
            LiteralValue::List(_) => DataType::List,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Power,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionDefinition {
    pub name: Rc<str>,
    pub parameters: Vec<Rc<str>>,
    pub return_type: DataType,
    pub body: Rc<[Node]>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct IfBranches {
    /// `blocks[i]` runs when `conditions[i]` is the first truthy condition.
    pub conditions: Vec<Node>,
    pub blocks: Vec<Vec<Node>>,
    pub else_block: Option<Vec<Node>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Iteration {
    pub iterable: Box<Node>,
    pub index_name: Option<Rc<str>>,
    pub item_name: Option<Rc<str>>,
    pub body: Vec<Node>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Node {
    Statements(Vec<Node>),
    BinaryOp {
        operator: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    UnaryOp {
        operator: UnaryOperator,
        operand: Box<Node>,
    },
    FunctionDef(FunctionDefinition),
    FunctionCall {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    ItemAccess {
        target: Box<Node>,
        index: Box<Node>,
    },
    If(IfBranches),
    Iter(Iteration),
    Literal(LiteralValue),
    Null,
    Return(Box<Node>),
    VariableDef {
        name: Rc<str>,
        data_type: DataType,
        value: Box<Node>,
    },
    VariableAssign {
        name: Rc<str>,
        value: Box<Node>,
    },
    VariableAccess(Rc<str>),
}

impl Node {
    /// Short name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Statements(_) => "statement list",
            Node::BinaryOp { .. } => "binary operation",
            Node::UnaryOp { .. } => "unary operation",
            Node::FunctionDef(_) => "function definition",
            Node::FunctionCall { .. } => "function call",
            Node::ItemAccess { .. } => "item access",
            Node::If(_) => "if",
            Node::Iter(_) => "iter",
            Node::Literal(_) => "literal",
            Node::Null => "null",
            Node::Return(_) => "return",
            Node::VariableDef { .. } => "variable definition",
            Node::VariableAssign { .. } => "variable assignment",
            Node::VariableAccess(_) => "variable access",
        }
    }
}

fn write_separated(
    f: &mut std::fmt::Formatter<'_>,
    items: impl IntoIterator<Item = impl Display>,
    separator: &str,
) -> std::fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_block(f: &mut std::fmt::Formatter<'_>, statements: &[Node]) -> std::fmt::Result {
    for statement in statements {
        write!(f, " {};", statement)?;
    }
    Ok(())
}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiteralValue::Int(value) => write!(f, "{}", value),
            LiteralValue::Float(value) => write!(f, "{:?}", value),
            LiteralValue::Str(value) => write!(f, "{:?}", value),
            LiteralValue::List(items) => {
                write!(f, "[")?;
                write_separated(f, items, ", ")?;
                write!(f, "]")
            }
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Statements(statements) => {
                for statement in statements {
                    writeln!(f, "{};", statement)?;
                }
                Ok(())
            }
            Node::BinaryOp {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", left, operator.symbol(), right),
            Node::UnaryOp { operator, operand } => match operator {
                UnaryOperator::Plus => write!(f, "(+{})", operand),
                UnaryOperator::Minus => write!(f, "(-{})", operand),
            },
            Node::FunctionDef(function) => {
                write!(f, "{}(", function.name)?;
                write_separated(f, function.parameters.iter(), ", ")?;
                write!(f, ") -> {}:", function.return_type.name())?;
                write_block(f, &function.body)?;
                write!(f, " end")
            }
            Node::FunctionCall { callee, arguments } => {
                write!(f, "{}(", callee)?;
                write_separated(f, arguments, ", ")?;
                write!(f, ")")
            }
            Node::ItemAccess { target, index } => write!(f, "({}[{}])", target, index),
            Node::If(branches) => {
                for (i, (condition, block)) in
                    branches.conditions.iter().zip(&branches.blocks).enumerate()
                {
                    let keyword = if i == 0 { "if" } else { " elif" };
                    write!(f, "{} {}:", keyword, condition)?;
                    write_block(f, block)?;
                }
                if let Some(else_block) = &branches.else_block {
                    write!(f, " else:")?;
                    write_block(f, else_block)?;
                }
                write!(f, " end")
            }
            Node::Iter(iteration) => {
                write!(f, "iter {}", iteration.iterable)?;
                match (&iteration.index_name, &iteration.item_name) {
                    (Some(index), Some(item)) => write!(f, " as {}, {}", index, item)?,
                    (None, Some(item)) => write!(f, " as {}", item)?,
                    _ => {}
                }
                write!(f, ":")?;
                write_block(f, &iteration.body)?;
                write!(f, " end")
            }
            Node::Literal(value) => write!(f, "{}", value),
            Node::Null => write!(f, "null"),
            Node::Return(value) => write!(f, "return {}", value),
            Node::VariableDef {
                name,
                data_type,
                value,
            } => write!(f, "{}: {} = {}", name, data_type.name(), value),
            Node::VariableAssign { name, value } => write!(f, "{} = {}", name, value),
            Node::VariableAccess(name) => write!(f, "{}", name),
        }
    }
}
