use std::cmp::Ordering;

use carrot_core::ast::{BinaryOperator, UnaryOperator};

use crate::heap::Heap;
use crate::object::{EvaluationError, ObjectId, Payload};

/// Truthiness used by `if`: `null`, zero, and empty strings or lists are false.
pub fn is_truthy(heap: &Heap, id: ObjectId) -> Result<bool, EvaluationError> {
    Ok(match heap.get(id)?.payload() {
        Payload::Null => false,
        Payload::Int(value) => *value != 0,
        Payload::Float(value) => *value != 0.0,
        Payload::Str(value) => !value.is_empty(),
        Payload::List(items) => !items.is_empty(),
        Payload::Function(_) => true,
    })
}

fn boolean(heap: &mut Heap, value: bool) -> ObjectId {
    heap.int(value as i64)
}

pub fn binary_operation(
    heap: &mut Heap,
    operator: BinaryOperator,
    left: ObjectId,
    right: ObjectId,
) -> Result<ObjectId, EvaluationError> {
    match operator {
        BinaryOperator::Equal => {
            let equal = values_equal(heap, left, right)?;
            return Ok(boolean(heap, equal));
        }
        BinaryOperator::NotEqual => {
            let equal = values_equal(heap, left, right)?;
            return Ok(boolean(heap, !equal));
        }
        _ => {}
    }

    let left_payload = heap.get(left)?.payload().clone();
    let right_payload = heap.get(right)?.payload().clone();
    let unsupported = || EvaluationError::UnsupportedOperation {
        operator: operator.symbol(),
        left: left_payload.object_type().name(),
        right: right_payload.object_type().name(),
    };

    match (&left_payload, &right_payload) {
        (Payload::Int(l), Payload::Int(r)) => int_operation(heap, operator, *l, *r),
        (Payload::Int(l), Payload::Float(r)) => float_operation(heap, operator, *l as f64, *r),
        (Payload::Float(l), Payload::Int(r)) => float_operation(heap, operator, *l, *r as f64),
        (Payload::Float(l), Payload::Float(r)) => float_operation(heap, operator, *l, *r),
        (Payload::Str(l), Payload::Str(r)) => match operator {
            BinaryOperator::Plus => Ok(heap.str(format!("{}{}", l, r))),
            _ => match comparison(operator, l.cmp(r)) {
                Some(result) => Ok(boolean(heap, result)),
                None => Err(unsupported()),
            },
        },
        (Payload::List(l), Payload::List(r)) if operator == BinaryOperator::Plus => {
            let items = l.iter().chain(r).copied().collect();
            Ok(heap.list(items))
        }
        _ => Err(unsupported()),
    }
}

fn int_operation(
    heap: &mut Heap,
    operator: BinaryOperator,
    left: i64,
    right: i64,
) -> Result<ObjectId, EvaluationError> {
    let overflow = || EvaluationError::IntegerOverflow(operator.symbol());
    let value = match operator {
        BinaryOperator::Plus => left.checked_add(right).ok_or_else(overflow)?,
        BinaryOperator::Minus => left.checked_sub(right).ok_or_else(overflow)?,
        BinaryOperator::Multiply => left.checked_mul(right).ok_or_else(overflow)?,
        BinaryOperator::Divide => {
            if right == 0 {
                return Err(EvaluationError::DivisionByZero);
            }
            left.checked_div(right).ok_or_else(overflow)?
        }
        BinaryOperator::Power => {
            if right < 0 {
                return Ok(heap.float((left as f64).powf(right as f64)));
            }
            let exponent = u32::try_from(right).map_err(|_| overflow())?;
            left.checked_pow(exponent).ok_or_else(overflow)?
        }
        _ => {
            let result = comparison(operator, left.cmp(&right)).unwrap_or(false);
            return Ok(boolean(heap, result));
        }
    };
    Ok(heap.int(value))
}

fn float_operation(
    heap: &mut Heap,
    operator: BinaryOperator,
    left: f64,
    right: f64,
) -> Result<ObjectId, EvaluationError> {
    let value = match operator {
        BinaryOperator::Plus => left + right,
        BinaryOperator::Minus => left - right,
        BinaryOperator::Multiply => left * right,
        BinaryOperator::Divide => left / right,
        BinaryOperator::Power => left.powf(right),
        _ => {
            let result = left
                .partial_cmp(&right)
                .and_then(|ordering| comparison(operator, ordering))
                .unwrap_or(false);
            return Ok(boolean(heap, result));
        }
    };
    Ok(heap.float(value))
}

fn comparison(operator: BinaryOperator, ordering: Ordering) -> Option<bool> {
    match operator {
        BinaryOperator::LessThan => Some(ordering == Ordering::Less),
        BinaryOperator::GreaterThan => Some(ordering == Ordering::Greater),
        BinaryOperator::LessEqual => Some(ordering != Ordering::Greater),
        BinaryOperator::GreaterEqual => Some(ordering != Ordering::Less),
        _ => None,
    }
}

/// Two values are equal when they share a type and a display form.
fn values_equal(heap: &Heap, left: ObjectId, right: ObjectId) -> Result<bool, EvaluationError> {
    let left = heap.get(left)?;
    let right = heap.get(right)?;
    Ok(left.object_type() == right.object_type() && left.display() == right.display())
}

pub fn unary_operation(
    heap: &mut Heap,
    operator: UnaryOperator,
    operand: ObjectId,
) -> Result<ObjectId, EvaluationError> {
    let payload = heap.get(operand)?.payload().clone();
    match (operator, payload) {
        (UnaryOperator::Plus, Payload::Int(value)) => Ok(heap.int(value)),
        (UnaryOperator::Plus, Payload::Float(value)) => Ok(heap.float(value)),
        (UnaryOperator::Minus, Payload::Int(value)) => value
            .checked_neg()
            .map(|value| heap.int(value))
            .ok_or(EvaluationError::IntegerOverflow("-")),
        (UnaryOperator::Minus, Payload::Float(value)) => Ok(heap.float(-value)),
        (operator, payload) => Err(EvaluationError::UnsupportedUnaryOperation {
            operator: match operator {
                UnaryOperator::Plus => "+",
                UnaryOperator::Minus => "-",
            },
            operand: payload.object_type().name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use carrot_core::ast::{BinaryOperator, UnaryOperator};
    use pretty_assertions::assert_eq;

    use super::{binary_operation, is_truthy, unary_operation};
    use crate::heap::Heap;
    use crate::object::EvaluationError;

    #[test]
    fn test_arithmetic() {
        let mut heap = Heap::new();
        let seven = heap.int(7);
        let two = heap.int(2);
        let half = heap.float(0.5);
        let a = heap.str("a");
        let b = heap.str("b");

        let tests = vec![
            (BinaryOperator::Plus, seven, two, "9", "int"),
            (BinaryOperator::Minus, seven, two, "5", "int"),
            (BinaryOperator::Multiply, seven, two, "14", "int"),
            (BinaryOperator::Divide, seven, two, "3", "int"),
            (BinaryOperator::Power, seven, two, "49", "int"),
            (BinaryOperator::Plus, seven, half, "7.500000", "float"),
            (BinaryOperator::Divide, half, two, "0.250000", "float"),
            (BinaryOperator::Plus, a, b, "ab", "str"),
            (BinaryOperator::LessThan, two, seven, "1", "int"),
            (BinaryOperator::GreaterEqual, two, seven, "0", "int"),
            (BinaryOperator::LessEqual, half, seven, "1", "int"),
            (BinaryOperator::LessThan, b, a, "0", "int"),
        ];

        for (operator, left, right, display, type_name) in tests {
            let result = binary_operation(&mut heap, operator, left, right).unwrap();
            assert_eq!(heap.display(result), Ok(display));
            assert_eq!(heap.type_name(result), Ok(type_name));
        }
    }

    #[test]
    fn test_negative_power_is_float() {
        let mut heap = Heap::new();
        let two = heap.int(2);
        let minus_one = heap.int(-1);
        let result = binary_operation(&mut heap, BinaryOperator::Power, two, minus_one).unwrap();
        assert_eq!(heap.display(result), Ok("0.500000"));
    }

    #[test]
    fn test_equality_compares_type_and_display() {
        let mut heap = Heap::new();
        let one = heap.int(1);
        let other_one = heap.int(1);
        let one_str = heap.str("1");
        let first = heap.list(vec![one]);
        let second = heap.list(vec![other_one]);

        let tests = vec![
            (BinaryOperator::Equal, one, other_one, "1"),
            (BinaryOperator::Equal, one, one_str, "0"),
            (BinaryOperator::NotEqual, one, one_str, "1"),
            (BinaryOperator::Equal, first, second, "1"),
        ];
        for (operator, left, right, expected) in tests {
            let result = binary_operation(&mut heap, operator, left, right).unwrap();
            assert_eq!(heap.display(result), Ok(expected));
        }
    }

    #[test]
    fn test_list_concatenation() {
        let mut heap = Heap::new();
        let one = heap.int(1);
        let x = heap.str("x");
        let left = heap.list(vec![one]);
        let right = heap.list(vec![x]);
        let result = binary_operation(&mut heap, BinaryOperator::Plus, left, right).unwrap();
        assert_eq!(heap.display(result), Ok("[1, \"x\"]"));
    }

    #[test]
    fn test_errors() {
        let mut heap = Heap::new();
        let one = heap.int(1);
        let zero = heap.int(0);
        let max = heap.int(i64::MAX);
        let s = heap.str("s");
        let null = heap.null();

        assert_eq!(
            binary_operation(&mut heap, BinaryOperator::Divide, one, zero),
            Err(EvaluationError::DivisionByZero)
        );
        assert_eq!(
            binary_operation(&mut heap, BinaryOperator::Plus, max, one),
            Err(EvaluationError::IntegerOverflow("+"))
        );
        assert_eq!(
            binary_operation(&mut heap, BinaryOperator::Minus, s, one),
            Err(EvaluationError::UnsupportedOperation {
                operator: "-",
                left: "str",
                right: "int"
            })
        );
        assert_eq!(
            unary_operation(&mut heap, UnaryOperator::Minus, null),
            Err(EvaluationError::UnsupportedUnaryOperation {
                operator: "-",
                operand: "null"
            })
        );
    }

    #[test]
    fn test_unary() {
        let mut heap = Heap::new();
        let five = heap.int(5);
        let half = heap.float(0.5);
        let negated = unary_operation(&mut heap, UnaryOperator::Minus, five).unwrap();
        assert_eq!(heap.display(negated), Ok("-5"));
        let positive = unary_operation(&mut heap, UnaryOperator::Plus, half).unwrap();
        assert_eq!(heap.display(positive), Ok("0.500000"));
    }

    #[test]
    fn test_truthiness() {
        let mut heap = Heap::new();
        let falsy = vec![
            heap.null(),
            heap.int(0),
            heap.float(0.0),
            heap.str(""),
            heap.list(vec![]),
        ];
        for id in falsy {
            assert_eq!(is_truthy(&heap, id), Ok(false));
        }
        let one = heap.int(1);
        let truthy = vec![one, heap.float(0.1), heap.str("a"), heap.list(vec![one])];
        for id in truthy {
            assert_eq!(is_truthy(&heap, id), Ok(true));
        }
    }
}
