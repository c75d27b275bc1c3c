use crate::environment::Environment;
use crate::heap::Heap;
use crate::object::{BuiltinFunction, EvaluationError, Function, ObjectId};
use crate::print_handler::PrintHandler;

fn builtin_print(
    heap: &mut Heap,
    output: &mut PrintHandler,
    args: Vec<ObjectId>,
) -> Result<ObjectId, EvaluationError> {
    if args.is_empty() {
        return Err(EvaluationError::BuiltinArgumentCount {
            function: "print",
            expected: "at least 1",
            actual: 0,
        });
    }
    let mut text = String::new();
    for arg in &args {
        text.push_str(heap.display(*arg)?);
    }
    output
        .print(&text)
        .map_err(|error| EvaluationError::Output(error.to_string()))?;
    Ok(heap.null())
}

fn builtin_println(
    heap: &mut Heap,
    output: &mut PrintHandler,
    mut args: Vec<ObjectId>,
) -> Result<ObjectId, EvaluationError> {
    args.push(heap.str("\n"));
    builtin_print(heap, output, args)
}

fn builtin_type(
    heap: &mut Heap,
    _output: &mut PrintHandler,
    args: Vec<ObjectId>,
) -> Result<ObjectId, EvaluationError> {
    if args.len() != 1 {
        return Err(EvaluationError::BuiltinArgumentCount {
            function: "type",
            expected: "exactly 1",
            actual: args.len(),
        });
    }
    let type_name = heap.type_name(args[0])?;
    Ok(heap.str(type_name))
}

const BUILTINS: [BuiltinFunction; 3] = [
    BuiltinFunction {
        name: "print",
        func: builtin_print,
    },
    BuiltinFunction {
        name: "println",
        func: builtin_println,
    },
    BuiltinFunction {
        name: "type",
        func: builtin_type,
    },
];

/// Binds every built-in by name in the program scope.
pub fn register(heap: &mut Heap, environment: &mut Environment) {
    for builtin in BUILTINS {
        let name = builtin.name;
        let id = heap.function(Function::Builtin(builtin));
        environment.set(name.into(), id);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{builtin_print, builtin_println, builtin_type};
    use crate::heap::Heap;
    use crate::object::EvaluationError;
    use crate::print_handler::PrintHandler;

    #[test]
    fn test_print() {
        let mut heap = Heap::new();
        let mut output = PrintHandler::buffer();

        let no_arguments = builtin_print(&mut heap, &mut output, vec![]);
        assert_eq!(
            no_arguments,
            Err(EvaluationError::BuiltinArgumentCount {
                function: "print",
                expected: "at least 1",
                actual: 0
            })
        );

        let a = heap.str("a");
        let one = heap.int(1);
        let result = builtin_print(&mut heap, &mut output, vec![a, one]).unwrap();
        assert_eq!(heap.type_name(result), Ok("null"));
        assert_eq!(output.get_output(), "a1");
    }

    #[test]
    fn test_println() {
        let mut heap = Heap::new();
        let mut output = PrintHandler::buffer();

        let a = heap.str("a");
        let b = heap.str("b");
        builtin_println(&mut heap, &mut output, vec![a, b]).unwrap();
        assert_eq!(output.get_output(), "ab\n");

        builtin_println(&mut heap, &mut output, vec![]).unwrap();
        assert_eq!(output.get_output(), "ab\n\n");
    }

    #[test]
    fn test_type() {
        let mut heap = Heap::new();
        let mut output = PrintHandler::buffer();

        let values = vec![
            (heap.null(), "null"),
            (heap.int(5), "int"),
            (heap.float(0.5), "float"),
            (heap.str("s"), "str"),
            (heap.list(vec![]), "list"),
        ];
        for (value, expected) in values {
            let result = builtin_type(&mut heap, &mut output, vec![value]).unwrap();
            assert_eq!(heap.display(result), Ok(expected));
            assert_eq!(heap.type_name(result), Ok("str"));
        }

        let one = heap.int(1);
        let two = heap.int(2);
        assert_eq!(
            builtin_type(&mut heap, &mut output, vec![one, two]),
            Err(EvaluationError::BuiltinArgumentCount {
                function: "type",
                expected: "exactly 1",
                actual: 2
            })
        );
    }
}
