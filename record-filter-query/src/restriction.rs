//! Single-column predicates, the leaves of a filter tree.
//!
//! A restriction is created by [`Scope::with`](crate::Scope::with) or
//! [`Scope::without`](crate::Scope::without) and completed by exactly one
//! operator call:
//!
//! ```rust
//! use record_filter_query::{Restriction, Operator};
//!
//! let mut r = Restriction::new("created_at", false);
//! r.between(("2009-01-01", "2009-02-01"));
//! assert_eq!(r.operator(), Some(Operator::Between));
//! ```

use std::ops::RangeInclusive;

use smol_str::SmolStr;

use crate::error::{FilterError, FilterResult};
use crate::sql::Binder;
use crate::value::FilterValue;

/// Comparison operator of a restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    EqualTo,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqualTo,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqualTo,
    /// `IN (?)`, the whole list bound as one value.
    In,
    /// `LIKE`
    Like,
    /// `IS NULL`
    IsNull,
    /// `BETWEEN ? AND ?`
    Between,
}

impl Operator {
    /// DSL name of the operator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::EqualTo => "equal_to",
            Self::LessThan => "less_than",
            Self::LessThanOrEqualTo => "less_than_or_equal_to",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqualTo => "greater_than_or_equal_to",
            Self::In => "in",
            Self::Like => "like",
            Self::IsNull => "is_null",
            Self::Between => "between",
        }
    }

    fn comparison_sql(&self) -> Option<&'static str> {
        match self {
            Self::EqualTo => Some("="),
            Self::LessThan => Some("<"),
            Self::LessThanOrEqualTo => Some("<="),
            Self::GreaterThan => Some(">"),
            Self::GreaterThanOrEqualTo => Some(">="),
            _ => None,
        }
    }
}

/// Values accepted by [`Restriction::between`].
///
/// Pairs, two-element arrays, inclusive ranges and list values all store the
/// bounds as `[start, finish]`.
pub trait IntoBetween {
    /// Convert into the stored operand.
    fn into_bounds(self) -> FilterValue;
}

impl<A: Into<FilterValue>, B: Into<FilterValue>> IntoBetween for (A, B) {
    fn into_bounds(self) -> FilterValue {
        FilterValue::List(vec![self.0.into(), self.1.into()])
    }
}

impl<T: Into<FilterValue>> IntoBetween for [T; 2] {
    fn into_bounds(self) -> FilterValue {
        FilterValue::List(self.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> IntoBetween for RangeInclusive<T> {
    fn into_bounds(self) -> FilterValue {
        let (start, finish) = self.into_inner();
        FilterValue::List(vec![start.into(), finish.into()])
    }
}

impl IntoBetween for FilterValue {
    fn into_bounds(self) -> FilterValue {
        self
    }
}

/// A predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Restriction {
    column: SmolStr,
    negated: bool,
    operator: Option<Operator>,
    operand: Option<FilterValue>,
}

impl Restriction {
    /// Create a restriction with no operator yet.
    pub fn new(column: impl AsRef<str>, negated: bool) -> Self {
        Self {
            column: SmolStr::new(column.as_ref()),
            negated,
            operator: None,
            operand: None,
        }
    }

    /// The column this restriction applies to.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Whether the restriction was created by `without`.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// The operator, once one has been set.
    pub fn operator(&self) -> Option<Operator> {
        self.operator
    }

    /// The stored operand.
    pub fn operand(&self) -> Option<&FilterValue> {
        self.operand.as_ref()
    }

    fn set(&mut self, operator: Operator, operand: Option<FilterValue>) -> &mut Self {
        self.operator = Some(operator);
        self.operand = operand;
        self
    }

    /// `column = value`
    pub fn equal_to(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.set(Operator::EqualTo, Some(value.into()))
    }

    /// `column < value`
    pub fn less_than(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.set(Operator::LessThan, Some(value.into()))
    }

    /// `column <= value`
    pub fn less_than_or_equal_to(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.set(Operator::LessThanOrEqualTo, Some(value.into()))
    }

    /// `column > value`
    pub fn greater_than(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.set(Operator::GreaterThan, Some(value.into()))
    }

    /// `column >= value`
    pub fn greater_than_or_equal_to(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.set(Operator::GreaterThanOrEqualTo, Some(value.into()))
    }

    /// Alias for [`greater_than`](Self::greater_than).
    pub fn gt(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.greater_than(value)
    }

    /// Alias for [`greater_than_or_equal_to`](Self::greater_than_or_equal_to).
    pub fn gte(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.greater_than_or_equal_to(value)
    }

    /// Alias for [`less_than`](Self::less_than).
    pub fn lt(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.less_than(value)
    }

    /// Alias for [`less_than_or_equal_to`](Self::less_than_or_equal_to).
    pub fn lte(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.less_than_or_equal_to(value)
    }

    /// `column IN (?)`. The operand must be a list.
    pub fn in_list(&mut self, values: impl Into<FilterValue>) -> &mut Self {
        self.set(Operator::In, Some(values.into()))
    }

    /// `column LIKE pattern`
    pub fn like(&mut self, pattern: impl Into<FilterValue>) -> &mut Self {
        self.set(Operator::Like, Some(pattern.into()))
    }

    /// `column IS NULL`
    pub fn is_null(&mut self) -> &mut Self {
        self.set(Operator::IsNull, None)
    }

    /// `column BETWEEN start AND finish`
    pub fn between(&mut self, bounds: impl IntoBetween) -> &mut Self {
        self.set(Operator::Between, Some(bounds.into_bounds()))
    }

    /// Equality shorthand; a null value becomes `is_null`.
    pub(crate) fn equal_to_or_null(&mut self, value: FilterValue) -> &mut Self {
        if value.is_null() {
            self.is_null()
        } else {
            self.set(Operator::EqualTo, Some(value))
        }
    }

    /// Render against an already qualified column name, binding operands.
    pub(crate) fn render(&self, qualified: &str, binder: &mut Binder) -> FilterResult<String> {
        let operator = self
            .operator
            .ok_or_else(|| FilterError::missing_operator(self.column.as_str()))?;

        let sql = match operator {
            Operator::IsNull => {
                if self.negated {
                    format!("{} IS NOT NULL", qualified)
                } else {
                    format!("{} IS NULL", qualified)
                }
            }
            Operator::Between => {
                let (start, finish) = self.bounds()?;
                let start = binder.bind(start.clone());
                let finish = binder.bind(finish.clone());
                let not = if self.negated { "NOT " } else { "" };
                format!("{} {}BETWEEN {} AND {}", qualified, not, start, finish)
            }
            Operator::In => {
                let values = self.required_operand(operator)?;
                if !values.is_list() {
                    return Err(FilterError::malformed_restriction(
                        self.column.as_str(),
                        format!("in expects a list but got {}", values.kind()),
                    ));
                }
                let placeholder = binder.bind(values.clone());
                let not = if self.negated { "NOT " } else { "" };
                format!("{} {}IN ({})", qualified, not, placeholder)
            }
            Operator::Like => {
                let pattern = self.required_operand(operator)?;
                let placeholder = binder.bind(pattern.clone());
                let not = if self.negated { "NOT " } else { "" };
                format!("{} {}LIKE {}", qualified, not, placeholder)
            }
            comparison => {
                let value = self.required_operand(comparison)?;
                let placeholder = binder.bind(value.clone());
                // Only the six comparison operators reach this arm.
                let op = comparison.comparison_sql().unwrap_or("=");
                let sql = format!("{} {} {}", qualified, op, placeholder);
                if self.negated {
                    format!("NOT ({})", sql)
                } else {
                    sql
                }
            }
        };

        Ok(sql)
    }

    fn required_operand(&self, operator: Operator) -> FilterResult<&FilterValue> {
        self.operand.as_ref().ok_or_else(|| {
            FilterError::malformed_restriction(
                self.column.as_str(),
                format!("{} requires an operand", operator.name()),
            )
        })
    }

    fn bounds(&self) -> FilterResult<(&FilterValue, &FilterValue)> {
        match self.operand.as_ref().and_then(FilterValue::as_list) {
            Some([start, finish]) if !start.is_null() && !finish.is_null() => Ok((start, finish)),
            _ => Err(FilterError::malformed_restriction(
                self.column.as_str(),
                "between requires both a start and a finish",
            )),
        }
    }
}
