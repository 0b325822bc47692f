use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::ast::{BinaryOperator, Expression, ObjectKey, PathSegment};
use crate::context::Context;
use crate::error::EvalError;
use crate::value::{as_index, as_key, is_truthy, loose_equals, strict_equals, to_number, type_name};

impl Expression {
    pub fn evaluate(&self, ctx: &Context<'_>) -> Result<Value, EvalError> {
        match self {
            Expression::Null => Ok(Value::Null),
            Expression::Bool(b) => Ok(Value::Bool(*b)),
            Expression::Number(n) => Ok(Value::Number(n.clone())),
            Expression::String(s) => Ok(Value::String(s.clone())),
            Expression::Variable(path) => self.resolve_path(path, ctx),
            Expression::Negation(inner) => Ok(Value::Bool(!is_truthy(&inner.evaluate(ctx)?))),
            Expression::Binary {
                left,
                operator,
                right,
            } => {
                let left = left.evaluate(ctx)?;
                let right = right.evaluate(ctx)?;
                compare(*operator, &left, &right).map(Value::Bool)
            }
            Expression::Call { name, arguments } => {
                let method = ctx
                    .methods()
                    .get(name)
                    .ok_or_else(|| EvalError::UndefinedMethod { name: name.clone() })?;
                let args = evaluate_all(arguments, ctx)?;
                Ok(method(&args))
            }
            Expression::Filter { name, arguments } => {
                let filter = ctx
                    .methods()
                    .get(name)
                    .ok_or_else(|| EvalError::UndefinedFilter { name: name.clone() })?;
                let args = evaluate_all(arguments, ctx)?;
                Ok(filter(&args))
            }
            Expression::Array(items) => evaluate_all(items, ctx).map(Value::Array),
            Expression::Object(properties) => {
                let mut map = Map::new();
                for (key, value) in properties {
                    let key = match key {
                        ObjectKey::Static(name) => name.clone(),
                        ObjectKey::Computed(expr) => as_key(&expr.evaluate(ctx)?),
                    };
                    map.insert(key, value.evaluate(ctx)?);
                }
                Ok(Value::Object(map))
            }
        }
    }

    fn resolve_path(&self, path: &[PathSegment], ctx: &Context<'_>) -> Result<Value, EvalError> {
        let undefined = || EvalError::UndefinedVariable {
            path: self.to_string(),
        };
        let Some((PathSegment::Name(first), rest)) = path.split_first() else {
            return Err(undefined());
        };
        let mut current = Cow::Borrowed(ctx.lookup(first).ok_or_else(undefined)?);
        for segment in rest {
            let key = match segment {
                PathSegment::Name(name) => Value::String(name.clone()),
                PathSegment::Computed(expr) => expr.evaluate(ctx)?,
            };
            current = match current {
                Cow::Borrowed(target) => member(target, &key),
                Cow::Owned(target) => member(&target, &key).map(|v| Cow::Owned(v.into_owned())),
            }
            .ok_or_else(undefined)?;
        }
        Ok(current.into_owned())
    }
}

fn evaluate_all(items: &[Expression], ctx: &Context<'_>) -> Result<Vec<Value>, EvalError> {
    items.iter().map(|e| e.evaluate(ctx)).collect()
}

/// `target.key` / `target[key]`. Lists and strings expose `length`.
fn member<'v>(target: &'v Value, key: &Value) -> Option<Cow<'v, Value>> {
    match target {
        Value::Object(map) => map.get(&as_key(key)).map(Cow::Borrowed),
        Value::Array(items) => {
            if key.as_str() == Some("length") {
                return Some(Cow::Owned(Value::from(items.len())));
            }
            items.get(as_index(key)?).map(Cow::Borrowed)
        }
        Value::String(s) if key.as_str() == Some("length") => {
            Some(Cow::Owned(Value::from(s.chars().count())))
        }
        _ => None,
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn compare(operator: BinaryOperator, left: &Value, right: &Value) -> Result<bool, EvalError> {
    let null_identity = operator.is_identity() && (left.is_null() || right.is_null());
    if !null_identity && !(is_scalar(left) && is_scalar(right)) {
        return Err(EvalError::TypeMismatch {
            operator: operator.symbol(),
            left: type_name(left),
            right: type_name(right),
        });
    }

    Ok(match operator {
        BinaryOperator::StrictEq => strict_equals(left, right),
        BinaryOperator::StrictNe => !strict_equals(left, right),
        BinaryOperator::LooseEq => loose_equals(left, right),
        BinaryOperator::LooseNe => !loose_equals(left, right),
        BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
            let ordering = match (left, right) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => to_number(left).partial_cmp(&to_number(right)),
            };
            let Some(ordering) = ordering else {
                return Ok(false);
            };
            match operator {
                BinaryOperator::Lt => ordering.is_lt(),
                BinaryOperator::Le => ordering.is_le(),
                BinaryOperator::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }
        }
    })
}
