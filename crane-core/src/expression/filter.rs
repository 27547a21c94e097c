use crate::{
    BinaryOpType, Conjunction, DbField, Error, Field, Operation, Predicate, QueryField,
    QueryGroup, QueryItem, Record, Result, UnaryOpType, Value,
};

/// Every shape accepted where an operation takes a filter.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum QueryFilter {
    /// Matches every row.
    #[default]
    None,
    Predicate(Predicate),
    /// Each pair becomes an equality, combined with `AND`.
    Object(Record),
    Field(QueryField),
    /// Combined with `AND` in order.
    Fields(Vec<QueryField>),
    Group(QueryGroup),
    /// Equality on the primary key.
    Key(Value),
}

impl QueryFilter {
    pub fn key(value: impl Into<Value>) -> Self {
        QueryFilter::Key(value.into())
    }
}

impl From<Predicate> for QueryFilter {
    fn from(value: Predicate) -> Self {
        QueryFilter::Predicate(value)
    }
}

impl From<Record> for QueryFilter {
    fn from(value: Record) -> Self {
        QueryFilter::Object(value)
    }
}

impl From<QueryField> for QueryFilter {
    fn from(value: QueryField) -> Self {
        QueryFilter::Field(value)
    }
}

impl From<Vec<QueryField>> for QueryFilter {
    fn from(value: Vec<QueryField>) -> Self {
        QueryFilter::Fields(value)
    }
}

impl From<QueryGroup> for QueryFilter {
    fn from(value: QueryGroup) -> Self {
        QueryFilter::Group(value)
    }
}

impl<T: Into<QueryFilter>> From<Option<T>> for QueryFilter {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// Normalizes any filter shape into a [`QueryGroup`].
///
/// Pure: the same input always produces the same group. Parameter names are left to the caller
/// ([`QueryGroup::assign_parameters`]).
pub fn translate(filter: QueryFilter, primary: Option<&DbField>) -> Result<QueryGroup> {
    Ok(match filter {
        QueryFilter::None => QueryGroup::default(),
        QueryFilter::Predicate(predicate) => match translate_predicate(&predicate)? {
            QueryItem::Group(group) => group,
            QueryItem::Field(field) => QueryGroup::and([field]),
        },
        QueryFilter::Object(record) => QueryGroup::and(
            record
                .into_inner()
                .into_iter()
                .map(|(k, v)| QueryField::equal(k, v)),
        ),
        QueryFilter::Field(field) => QueryGroup::and([field]),
        QueryFilter::Fields(fields) => QueryGroup::and(fields),
        QueryFilter::Group(group) => group,
        QueryFilter::Key(value) => {
            let Some(primary) = primary else {
                return Err(Error::mapping(
                    "Cannot filter by key: no primary key is defined",
                ));
            };
            QueryGroup::and([QueryField::new(
                Field::new(primary.name.clone()),
                Operation::Equal,
                value,
            )?])
        }
    })
}

fn translate_predicate(predicate: &Predicate) -> Result<QueryItem> {
    match predicate {
        Predicate::Binary {
            op: op @ (BinaryOpType::And | BinaryOpType::Or),
            lhs,
            rhs,
        } => {
            let conjunction = if *op == BinaryOpType::And {
                Conjunction::And
            } else {
                Conjunction::Or
            };
            let mut group = QueryGroup::new(conjunction);
            for side in [lhs, rhs] {
                match translate_predicate(side)? {
                    QueryItem::Group(inner)
                        if inner.conjunction == conjunction && !inner.is_not =>
                    {
                        group.items.extend(inner.items)
                    }
                    item => group.items.push(item),
                }
            }
            Ok(QueryItem::Group(group))
        }
        Predicate::Binary { op, lhs, rhs } if op.is_comparison() => comparison(*op, lhs, rhs),
        Predicate::Binary { op, .. } => Err(Error::unsupported(format!(
            "binary operator `{op}` in `{predicate}`"
        ))),
        Predicate::Unary {
            op: UnaryOpType::Not,
            arg,
        } => Ok(match translate_predicate(arg)? {
            QueryItem::Field(mut field) => {
                field.operation = field.operation.negate();
                QueryItem::Field(field)
            }
            QueryItem::Group(group) => QueryItem::Group(group.negated()),
        }),
        Predicate::Call {
            method,
            receiver,
            args,
        } => call(predicate, method, receiver, args),
        // A boolean column on its own
        Predicate::Column(field) => Ok(QueryItem::Field(QueryField::equal(field.clone(), true))),
        _ => Err(Error::unsupported(format!(
            "`{predicate}` is not a condition"
        ))),
    }
}

fn comparison(op: BinaryOpType, lhs: &Predicate, rhs: &Predicate) -> Result<QueryItem> {
    let operation = match op {
        BinaryOpType::Equal => Operation::Equal,
        BinaryOpType::NotEqual => Operation::NotEqual,
        BinaryOpType::Less => Operation::LessThan,
        BinaryOpType::LessEqual => Operation::LessThanOrEqual,
        BinaryOpType::Greater => Operation::GreaterThan,
        BinaryOpType::GreaterEqual => Operation::GreaterThanOrEqual,
        _ => {
            return Err(Error::unsupported(format!(
                "binary operator `{op}` in `{lhs} {op} {rhs}`"
            )));
        }
    };
    let (field, operation, operand) = match (lhs, rhs) {
        (Predicate::Column(..), Predicate::Column(..)) => {
            return Err(Error::unsupported(format!(
                "column to column comparison `{lhs} {op} {rhs}`"
            )));
        }
        (Predicate::Column(field), operand) => (field, operation, operand),
        (operand, Predicate::Column(field)) => (field, operation.flip(), operand),
        _ => {
            return Err(Error::unsupported(format!(
                "comparison without a column `{lhs} {op} {rhs}`"
            )));
        }
    };
    let value = evaluate(operand)?;
    Ok(QueryItem::Field(QueryField::new(
        field.clone(),
        operation,
        value,
    )?))
}

/// Operand of a comparison, must not reference columns.
fn evaluate(predicate: &Predicate) -> Result<Value> {
    Ok(match predicate {
        Predicate::Value(v) => v.clone(),
        Predicate::Unary {
            op: UnaryOpType::Negative,
            arg,
        } => negative(evaluate(arg)?)
            .ok_or_else(|| Error::unsupported(format!("negation of `{arg}`")))?,
        Predicate::List(items) => Value::List(
            Some(items.iter().map(evaluate).collect::<Result<_>>()?),
            Box::new(Value::Null),
        ),
        _ => return Err(Error::unsupported(format!("operand `{predicate}`"))),
    })
}

fn negative(value: Value) -> Option<Value> {
    Some(match value {
        Value::Int8(Some(v)) => Value::Int8(Some(v.checked_neg()?)),
        Value::Int16(Some(v)) => Value::Int16(Some(v.checked_neg()?)),
        Value::Int32(Some(v)) => Value::Int32(Some(v.checked_neg()?)),
        Value::Int64(Some(v)) => Value::Int64(Some(v.checked_neg()?)),
        Value::Float32(Some(v)) => Value::Float32(Some(-v)),
        Value::Float64(Some(v)) => Value::Float64(Some(-v)),
        Value::Decimal(Some(v)) => Value::Decimal(Some(-v)),
        _ => return None,
    })
}

fn call(
    predicate: &Predicate,
    method: &str,
    receiver: &Predicate,
    args: &[Predicate],
) -> Result<QueryItem> {
    let field = match (receiver, method, args) {
        (Predicate::Column(field), "is_none", []) => QueryField::is_null(field.clone()),
        (Predicate::Column(field), "is_some", []) => QueryField::is_not_null(field.clone()),
        (
            Predicate::Column(field),
            "contains" | "starts_with" | "ends_with" | "like",
            [argument],
        ) => {
            let value = evaluate(argument)?;
            let Some(text) = value.as_str() else {
                return Err(Error::unsupported(format!(
                    "`{method}` on `{field}` requires a string argument, found `{argument}`"
                )));
            };
            let pattern = match method {
                "contains" => format!("%{text}%"),
                "starts_with" => format!("{text}%"),
                "ends_with" => format!("%{text}"),
                _ => text.to_string(),
            };
            QueryField::new(field.clone(), Operation::Like, pattern)?
        }
        (Predicate::Range { start, end, inclusive }, "contains", [Predicate::Column(field)]) => {
            return range(field, start.as_deref(), end.as_deref(), *inclusive);
        }
        (Predicate::List(..) | Predicate::Value(Value::List(..)), "contains", [Predicate::Column(field)]) => {
            QueryField::new(field.clone(), Operation::In, evaluate(receiver)?)?
        }
        _ => {
            return Err(Error::unsupported(format!(
                "method `{method}` in `{predicate}`"
            )));
        }
    };
    Ok(QueryItem::Field(field))
}

fn range(
    field: &Field,
    start: Option<&Predicate>,
    end: Option<&Predicate>,
    inclusive: bool,
) -> Result<QueryItem> {
    let start = start.map(evaluate).transpose()?;
    let end = end.map(evaluate).transpose()?;
    let field = field.clone();
    Ok(match (start, end) {
        (Some(start), Some(end)) if inclusive => QueryItem::Field(QueryField::new(
            field,
            Operation::Between,
            Value::List(Some(vec![start, end]), Box::new(Value::Null)),
        )?),
        (Some(start), Some(end)) => QueryItem::Group(QueryGroup::and([
            QueryField::new(field.clone(), Operation::GreaterThanOrEqual, start)?,
            QueryField::new(field, Operation::LessThan, end)?,
        ])),
        (Some(start), None) => QueryItem::Field(QueryField::new(
            field,
            Operation::GreaterThanOrEqual,
            start,
        )?),
        (None, Some(end)) => QueryItem::Field(QueryField::new(
            field,
            if inclusive {
                Operation::LessThanOrEqual
            } else {
                Operation::LessThan
            },
            end,
        )?),
        (None, None) => {
            return Err(Error::unsupported(format!(
                "unbounded range on `{field}`"
            )));
        }
    })
}
