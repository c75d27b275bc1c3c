use carrot_core::ast::{IfBranches, Iteration, LiteralValue, Node};
use carrot_core::stack::ensure_sufficient_stack;

use crate::builtins;
use crate::environment::Environment;
use crate::heap::Heap;
use crate::object::{EvaluationError, Function, ObjectId, Payload, QuickReturn, UserFunction};
use crate::operators::{binary_operation, is_truthy, unary_operation};
use crate::print_handler::PrintHandler;

/// Deepest chain of user-defined calls a script may build.
pub const MAX_CALL_DEPTH: usize = 15_000;

/// Tree-walking evaluation session. Owns the object arena, the scope chain
/// and the destination of printed output.
#[derive(Debug)]
pub struct Evaluator {
    heap: Heap,
    environment: Environment,
    output: PrintHandler,
}

/// Values an `iter` statement walks over.
enum Sequence {
    Items(Vec<ObjectId>),
    Chars(Vec<char>),
    Range(i64),
}

impl Sequence {
    fn len(&self) -> usize {
        match self {
            Sequence::Items(items) => items.len(),
            Sequence::Chars(chars) => chars.len(),
            Sequence::Range(end) => *end as usize,
        }
    }

    fn item(&self, heap: &mut Heap, position: usize) -> ObjectId {
        match self {
            Sequence::Items(items) => items[position],
            Sequence::Chars(chars) => heap.str(chars[position].to_string()),
            Sequence::Range(_) => heap.int(position as i64),
        }
    }
}

impl Evaluator {
    pub fn new(output: PrintHandler) -> Self {
        let mut heap = Heap::new();
        let mut environment = Environment::new();
        builtins::register(&mut heap, &mut environment);
        Evaluator {
            heap,
            environment,
            output,
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn output(&self) -> &PrintHandler {
        &self.output
    }

    pub fn into_output(self) -> PrintHandler {
        self.output
    }

    /// Runs a whole program. A `return` at the top level stops the program
    /// and its value becomes the result.
    pub fn eval_program(&mut self, program: &Node) -> Result<ObjectId, EvaluationError> {
        let result = self.evaluate(program);
        tracing::debug!(
            objects = self.heap.len(),
            ok = result.is_ok(),
            "program finished"
        );
        result
    }

    /// Evaluates a single node. A bare `return` node yields its value.
    pub fn evaluate(&mut self, node: &Node) -> Result<ObjectId, EvaluationError> {
        match self.eval_node(node) {
            Ok(value) | Err(QuickReturn::Return(value)) => Ok(value),
            Err(QuickReturn::Error(error)) => Err(error),
        }
    }

    /// Whole-program teardown. Destroys every object and binding, including
    /// the built-ins; a second call destroys nothing.
    pub fn teardown(&mut self) -> usize {
        self.environment.clear();
        let destroyed = self.heap.clear();
        tracing::debug!(destroyed, "evaluator torn down");
        destroyed
    }

    fn eval_node(&mut self, node: &Node) -> Result<ObjectId, QuickReturn> {
        ensure_sufficient_stack(|| self.eval_node_inner(node))
    }

    fn eval_node_inner(&mut self, node: &Node) -> Result<ObjectId, QuickReturn> {
        tracing::trace!(kind = node.kind_name(), "evaluate");
        match node {
            Node::Statements(statements) => self.eval_block(statements),
            Node::Literal(literal) => self.eval_literal(literal),
            Node::Null => Ok(self.heap.null()),
            Node::BinaryOp {
                operator,
                left,
                right,
            } => {
                let left = self.eval_node(left)?;
                let right = self.eval_node(right)?;
                Ok(binary_operation(&mut self.heap, *operator, left, right)?)
            }
            Node::UnaryOp { operator, operand } => {
                let operand = self.eval_node(operand)?;
                Ok(unary_operation(&mut self.heap, *operator, operand)?)
            }
            Node::VariableDef { name, value, .. } => {
                let value = self.eval_node(value)?;
                self.environment.set(name.clone(), value);
                Ok(self.heap.null())
            }
            Node::VariableAssign { name, value } => {
                let value = self.eval_node(value)?;
                if !self.environment.assign(name, value) {
                    return Err(EvaluationError::AssignToUndefined(name.clone()).into());
                }
                Ok(self.heap.null())
            }
            Node::VariableAccess(name) => self
                .environment
                .get(name)
                .ok_or_else(|| EvaluationError::UndefinedVariable(name.clone()).into()),
            Node::FunctionDef(definition) => {
                let function = self.heap.function(Function::User(UserFunction {
                    name: definition.name.clone(),
                    parameters: definition.parameters.clone(),
                    body: definition.body.clone(),
                }));
                self.environment.set(definition.name.clone(), function);
                Ok(self.heap.null())
            }
            Node::FunctionCall { callee, arguments } => self.eval_call(callee, arguments),
            Node::ItemAccess { target, index } => {
                let target = self.eval_node(target)?;
                let index = self.eval_node(index)?;
                Ok(self.eval_item_access(target, index)?)
            }
            Node::If(branches) => self.eval_if(branches),
            Node::Iter(iteration) => self.eval_iter(iteration),
            Node::Return(value) => {
                let value = self.eval_node(value)?;
                Err(QuickReturn::Return(value))
            }
        }
    }

    fn eval_statements(&mut self, statements: &[Node]) -> Result<(), QuickReturn> {
        for statement in statements {
            self.eval_node(statement)?;
        }
        Ok(())
    }

    /// Evaluates every statement and wraps the results in a list.
    fn eval_block(&mut self, statements: &[Node]) -> Result<ObjectId, QuickReturn> {
        let results = self.eval_expressions(statements)?;
        Ok(self.heap.list(results))
    }

    fn eval_expressions(&mut self, nodes: &[Node]) -> Result<Vec<ObjectId>, QuickReturn> {
        let mut result = Vec::with_capacity(nodes.len());
        for node in nodes {
            result.push(self.eval_node(node)?);
        }
        Ok(result)
    }

    fn eval_literal(&mut self, literal: &LiteralValue) -> Result<ObjectId, QuickReturn> {
        Ok(match literal {
            LiteralValue::Int(value) => self.heap.int(*value),
            LiteralValue::Float(value) => self.heap.float(*value),
            LiteralValue::Str(value) => self.heap.str(value.clone()),
            LiteralValue::List(items) => {
                let items = self.eval_expressions(items)?;
                self.heap.list(items)
            }
        })
    }

    fn eval_call(&mut self, callee: &Node, arguments: &[Node]) -> Result<ObjectId, QuickReturn> {
        let function = match callee {
            Node::VariableAccess(name) => self
                .environment
                .get(name)
                .ok_or_else(|| EvaluationError::UndefinedFunction(name.clone()))?,
            other => self.eval_node(other)?,
        };
        let function = match self.heap.get(function)?.payload() {
            Payload::Function(function) => function.clone(),
            _ => {
                let display = self.heap.display(function)?.to_owned();
                return Err(EvaluationError::CallNonFunction(display).into());
            }
        };

        match function {
            Function::Builtin(builtin) => {
                let arguments = self.eval_expressions(arguments)?;
                Ok((builtin.func)(&mut self.heap, &mut self.output, arguments)?)
            }
            Function::User(function) => {
                if function.parameters.len() != arguments.len() {
                    return Err(EvaluationError::WrongArgumentCount {
                        function: function.name.clone(),
                        expected: function.parameters.len(),
                        actual: arguments.len(),
                    }
                    .into());
                }
                let arguments = self.eval_expressions(arguments)?;
                Ok(self.apply_function(&function, arguments)?)
            }
        }
    }

    /// Runs `function` in a fresh frame whose parent scope is the caller's.
    /// When the frame ends, objects it created that are still reachable from
    /// the result or from a surviving binding move to the caller.
    fn apply_function(
        &mut self,
        function: &UserFunction,
        arguments: Vec<ObjectId>,
    ) -> Result<ObjectId, EvaluationError> {
        if self.environment.depth() > MAX_CALL_DEPTH {
            return Err(EvaluationError::RecursionLimit {
                function: function.name.clone(),
                limit: MAX_CALL_DEPTH,
            });
        }
        tracing::debug!(
            function = %function.name,
            depth = self.environment.depth(),
            "enter call frame"
        );
        self.heap.push_frame();
        self.environment.push_enclosed();
        for (parameter, argument) in function.parameters.iter().zip(arguments) {
            self.environment.set(parameter.clone(), argument);
        }

        let result = self.eval_statements(&function.body);
        self.environment.pop_enclosed();
        let value = match result {
            Ok(()) => Ok(self.heap.null()),
            Err(QuickReturn::Return(value)) => Ok(value),
            Err(QuickReturn::Error(error)) => Err(error),
        };

        let roots = value
            .iter()
            .copied()
            .chain(self.environment.bound_objects());
        let destroyed = self.heap.pop_frame(roots);
        tracing::debug!(function = %function.name, destroyed, "leave call frame");
        value
    }

    fn eval_item_access(
        &mut self,
        target: ObjectId,
        index: ObjectId,
    ) -> Result<ObjectId, EvaluationError> {
        let index = match self.heap.get(index)?.payload() {
            Payload::Int(index) => *index,
            other => return Err(EvaluationError::InvalidIndex(other.object_type().name())),
        };
        let resolve = |length: usize| {
            let position = if index < 0 {
                index + length as i64
            } else {
                index
            };
            usize::try_from(position)
                .ok()
                .filter(|position| *position < length)
                .ok_or(EvaluationError::IndexOutOfRange { index, length })
        };

        let chars: Vec<char> = match self.heap.get(target)?.payload() {
            Payload::List(items) => return Ok(items[resolve(items.len())?]),
            Payload::Str(value) => value.chars().collect(),
            other => return Err(EvaluationError::NotIndexable(other.object_type().name())),
        };
        let c = chars[resolve(chars.len())?];
        Ok(self.heap.str(c.to_string()))
    }

    fn eval_if(&mut self, branches: &IfBranches) -> Result<ObjectId, QuickReturn> {
        for (condition, block) in branches.conditions.iter().zip(&branches.blocks) {
            let condition = self.eval_node(condition)?;
            if is_truthy(&self.heap, condition)? {
                return self.eval_block(block);
            }
        }
        match &branches.else_block {
            Some(block) => self.eval_block(block),
            None => Ok(self.heap.null()),
        }
    }

    /// The loop runs in its own frame. After each pass, objects the pass
    /// created that no binding reaches are destroyed.
    fn eval_iter(&mut self, iteration: &Iteration) -> Result<ObjectId, QuickReturn> {
        let iterable = self.eval_node(&iteration.iterable)?;
        let sequence = match self.heap.get(iterable)?.payload() {
            Payload::List(items) => Sequence::Items(items.clone()),
            Payload::Str(value) => Sequence::Chars(value.chars().collect()),
            Payload::Int(end) if *end >= 0 => Sequence::Range(*end),
            other => {
                return Err(EvaluationError::NotIterable(other.object_type().name()).into());
            }
        };

        self.heap.push_frame();
        let result = self.eval_passes(iteration, &sequence);
        let returned = match &result {
            Err(QuickReturn::Return(value)) => Some(*value),
            _ => None,
        };
        let bindings = self.environment.bound_objects();
        self.heap.pop_frame(returned.into_iter().chain(bindings));
        result?;
        Ok(self.heap.null())
    }

    fn eval_passes(
        &mut self,
        iteration: &Iteration,
        sequence: &Sequence,
    ) -> Result<(), QuickReturn> {
        for position in 0..sequence.len() {
            if let Some(name) = &iteration.index_name {
                let index = self.heap.int(position as i64);
                self.environment.set(name.clone(), index);
            }
            let item = sequence.item(&mut self.heap, position);
            if let Some(name) = &iteration.item_name {
                self.environment.set(name.clone(), item);
            }
            self.eval_statements(&iteration.body)?;
            self.heap.collect_frame(self.environment.bound_objects());
        }
        Ok(())
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(PrintHandler::default())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Evaluator, MAX_CALL_DEPTH};
    use crate::object::EvaluationError;
    use crate::print_handler::PrintHandler;

    fn run(source: &str) -> (Evaluator, Result<String, EvaluationError>) {
        let program = carrot_core::parse(source).unwrap();
        let mut evaluator = Evaluator::new(PrintHandler::buffer());
        let result = evaluator
            .eval_program(&program)
            .map(|value| evaluator.heap().display(value).unwrap().to_owned());
        (evaluator, result)
    }

    fn output_of(source: &str) -> String {
        let (evaluator, result) = run(source);
        if let Err(error) = result {
            panic!("{} failed: {}", source, error);
        }
        evaluator.output().get_output().to_owned()
    }

    #[test]
    fn test_builtin_output() {
        let tests = vec![
            ("println(\"a\", \"b\")", "ab\n"),
            ("print(1, 2.5, null)", "12.500000null"),
            ("print([1, \"x\", [2]])", "[1, \"x\", [2]]"),
            (
                "println(type(1), type(1.0), type(\"s\"), type([]), type(null))",
                "intfloatstrlistnull\n",
            ),
            ("print(type(print))", "function"),
            ("print(print)", "<builtin function print>"),
        ];
        for (input, expected) in tests {
            assert_eq!(output_of(input), expected, "{}", input);
        }
    }

    #[test]
    fn test_arithmetic() {
        let tests = vec![
            ("print(1 - 2 - 3)", "-4"),
            ("print(2 + 3 * 4)", "14"),
            ("print((2 + 3) * 4)", "20"),
            ("print(2 ^ 10)", "1024"),
            ("print(7 / 2, \" \", 7.0 / 2)", "3 3.500000"),
            ("print(-3 + +1)", "-2"),
            ("print(\"ab\" + \"cd\")", "abcd"),
            ("print([1] + [2, 3])", "[1, 2, 3]"),
            ("print(1 < 2, 2 <= 1, 1 == 1, \"a\" != \"a\")", "1010"),
        ];
        for (input, expected) in tests {
            assert_eq!(output_of(input), expected, "{}", input);
        }
    }

    #[test]
    fn test_variables() {
        let tests = vec![
            ("x: int = 5 print(x)", "5"),
            ("x: int = 5 x = x * 2 print(x)", "10"),
            ("xs: list = [1, 2, 3] print(xs[0], xs[-1])", "13"),
            ("s: str = \"abc\" print(s[1])", "b"),
        ];
        for (input, expected) in tests {
            assert_eq!(output_of(input), expected, "{}", input);
        }
    }

    #[test]
    fn test_function_result_survives_frame() {
        let source = "f(x) -> int: return x end\nr: int = f(5)\nprintln(type(f(5)))\nprintln(r)";
        let (evaluator, result) = run(source);
        assert!(result.is_ok());
        assert_eq!(evaluator.output().get_output(), "int\n5\n");
    }

    #[test]
    fn test_return_value_is_call_result() {
        let (_, result) = run("f(a, b) -> int: return a + b end\nreturn f(2, 3)");
        assert_eq!(result, Ok("5".to_owned()));

        let (_, result) = run("f() -> null: end\nreturn f()");
        assert_eq!(result, Ok("null".to_owned()));
    }

    #[test]
    fn test_return_stops_function_body() {
        let source = "\
f() -> int:
  println(\"before\")
  return 1
  println(\"after\")
end
f()";
        assert_eq!(output_of(source), "before\n");
    }

    #[test]
    fn test_return_unwinds_nested_blocks() {
        let source = "\
first(xs) -> int:
  iter xs as x:
    if x > 2:
      return x
    end
  end
  return -1
end
println(first([1, 2, 3, 4]))
println(first([1]))";
        assert_eq!(output_of(source), "3\n-1\n");
    }

    #[test]
    fn test_dynamic_scoping() {
        let source = "\
show() -> null:
  println(y)
end
caller() -> null:
  y: int = 7
  show()
end
caller()";
        assert_eq!(output_of(source), "7\n");

        let (_, result) = run("show() -> null: println(y) end\nshow()");
        assert_eq!(result, Err(EvaluationError::UndefinedVariable("y".into())));
    }

    #[test]
    fn test_assignment_escapes_frame() {
        let source = "\
xs: list = []
keep() -> null:
  xs = [\"kept\", 1]
end
keep()
println(xs)";
        assert_eq!(output_of(source), "[\"kept\", 1]\n");
    }

    #[test]
    fn test_frame_objects_are_destroyed() {
        let definition = "f() -> int:\n  a: int = 1\n  b: str = \"x\"\n  return 2\nend\n";
        let (evaluator, result) = run(definition);
        assert!(result.is_ok());
        let before = evaluator.heap().len();

        let (evaluator, result) = run(&format!("{}f()\nf()\n", definition));
        assert!(result.is_ok());
        // Each call leaves only its result behind.
        assert_eq!(evaluator.heap().len(), before + 2);
        assert_eq!(evaluator.heap().frame_depth(), 1);
    }

    #[test]
    fn test_loop_temporaries_are_destroyed_each_pass() {
        let count_after = |passes: usize| {
            let body = "  x = x + i * 2\n  s = s + \"w\"\n";
            let source = format!("x: int = 0\ns: str = \"\"\niter {} as i:\n{}end", passes, body);
            let (evaluator, result) = run(&source);
            assert!(result.is_ok());
            assert_eq!(evaluator.heap().frame_depth(), 1);
            evaluator.heap().len()
        };
        assert_eq!(count_after(10), count_after(1000));
    }

    #[test]
    fn test_loop_keeps_what_bindings_reach() {
        let source = "\
xs: list = []
iter 3 as i:
  xs = xs + [[i, \"n\"]]
end
println(xs)
last() -> int:
  iter [4, 5, 6] as i, x:
    if i == 1:
      return x * 10
    end
  end
end
println(last())";
        assert_eq!(output_of(source), "[[0, \"n\"], [1, \"n\"], [2, \"n\"]]\n50\n");
    }

    #[test]
    fn test_deep_recursion() {
        let source = "\
down(n) -> int:
  if n == 0:
    return 0
  end
  return down(n - 1) + 1
end
return down(10000)";
        let (evaluator, result) = run(source);
        assert_eq!(result, Ok("10000".to_owned()));
        assert_eq!(evaluator.environment().depth(), 1);
    }

    #[test]
    fn test_runaway_recursion_is_an_error() {
        let (evaluator, result) = run("forever(n) -> int: return forever(n + 1) end\nforever(0)");
        assert_eq!(
            result,
            Err(EvaluationError::RecursionLimit {
                function: "forever".into(),
                limit: MAX_CALL_DEPTH,
            })
        );
        assert_eq!(evaluator.heap().frame_depth(), 1);
        assert_eq!(evaluator.environment().depth(), 1);
    }

    #[test]
    fn test_if() {
        let tests = vec![
            ("if 1: print(\"a\") end", "a"),
            ("if 0: print(\"a\") end", ""),
            ("if 0: print(\"a\") else: print(\"b\") end", "b"),
            (
                "x: int = 2 if x == 1: print(1) elif x == 2: print(2) else: print(3) end",
                "2",
            ),
            ("if \"\": print(1) elif []: print(2) elif null: print(3) end", ""),
        ];
        for (input, expected) in tests {
            assert_eq!(output_of(input), expected, "{}", input);
        }
    }

    #[test]
    fn test_iter() {
        let tests = vec![
            ("iter [1, 2, 3] as x: print(x) end", "123"),
            ("iter \"ab\" as i, c: print(i, c) end", "0a1b"),
            ("iter 3 as i: print(i) end", "012"),
            ("iter 2: print(\"x\") end", "xx"),
            ("iter 0 as i: print(i) end", ""),
        ];
        for (input, expected) in tests {
            assert_eq!(output_of(input), expected, "{}", input);
        }
    }

    #[test]
    fn test_errors() {
        let tests = vec![
            ("x", EvaluationError::UndefinedVariable("x".into())),
            ("nope(1)", EvaluationError::UndefinedFunction("nope".into())),
            ("x = 1", EvaluationError::AssignToUndefined("x".into())),
            ("x: int = 1 x(2)", EvaluationError::CallNonFunction("1".to_owned())),
            (
                "f(a) -> int: return a end f(1, 2)",
                EvaluationError::WrongArgumentCount {
                    function: "f".into(),
                    expected: 1,
                    actual: 2,
                },
            ),
            (
                "type()",
                EvaluationError::BuiltinArgumentCount {
                    function: "type",
                    expected: "exactly 1",
                    actual: 0,
                },
            ),
            ("print(1 / 0)", EvaluationError::DivisionByZero),
            (
                "[1, 2][2]",
                EvaluationError::IndexOutOfRange {
                    index: 2,
                    length: 2,
                },
            ),
            ("[1][\"0\"]", EvaluationError::InvalidIndex("str")),
            ("5[0]", EvaluationError::NotIndexable("int")),
            ("iter 1.5: end", EvaluationError::NotIterable("float")),
            ("iter -1: end", EvaluationError::NotIterable("int")),
        ];
        for (input, expected) in tests {
            let (_, result) = run(input);
            assert_eq!(result, Err(expected), "{}", input);
        }
    }

    #[test]
    fn test_error_stops_remaining_statements() {
        let (evaluator, result) = run("println(\"a\")\nmissing()\nprintln(\"b\")");
        assert_eq!(result, Err(EvaluationError::UndefinedFunction("missing".into())));
        assert_eq!(evaluator.output().get_output(), "a\n");
    }

    #[test]
    fn test_error_inside_call_unwinds_frames() {
        let (evaluator, result) = run("f() -> null: missing() end\nf()");
        assert!(result.is_err());
        assert_eq!(evaluator.heap().frame_depth(), 1);
        assert_eq!(evaluator.environment().depth(), 1);
    }

    #[test]
    fn test_evaluate_bare_return() {
        let mut evaluator = Evaluator::new(PrintHandler::buffer());
        let program = carrot_core::parse("return 42").unwrap();
        let carrot_core::ast::Node::Statements(statements) = program else {
            panic!("expected a statement list");
        };
        let value = evaluator.evaluate(&statements[0]).unwrap();
        assert_eq!(evaluator.heap().display(value), Ok("42"));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let (mut evaluator, result) = run("x: list = [1, 2]");
        assert!(result.is_ok());
        assert!(evaluator.teardown() > 0);
        assert!(evaluator.heap().is_empty());
        assert_eq!(evaluator.teardown(), 0);
    }
}
