//! WHERE-clause groups built by the translator.
//!
//! A [`WhereGroup`] is one parenthesised cluster of members. Every member
//! records the junction used to join it to the members before it, the
//! junction of the first member is ignored. Groups convert into a
//! `sea_query::Condition` for attachment to a statement, and render as text
//! for logging:
//!
//! ```text
//! And(age >= 18, status = 'active')  =>  ((AGE >= 18) AND (STATUS = 'active'))
//! ```

use crate::ast::Scalar;
use sea_query::extension::postgres::PgBinOper;
use sea_query::{
    Alias, BinOper, ColumnRef, Condition, ConditionExpression, Expr, IntoColumnRef, SimpleExpr,
};
use std::fmt;

/// How a member joins the members before it in its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Junction {
    And,
    Or,
}

impl Junction {
    pub fn from_or(or: bool) -> Self {
        if or {
            Junction::Or
        } else {
            Junction::And
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Junction::And => "AND",
            Junction::Or => "OR",
        }
    }

    fn open(self) -> Condition {
        match self {
            Junction::And => Condition::all(),
            Junction::Or => Condition::any(),
        }
    }
}

/// Column reference for a mapped identifier. Dots separate qualifiers,
/// so `users.age` is quoted as `"users"."age"`.
pub fn column_ref(ident: &str) -> ColumnRef {
    let mut parts = ident.splitn(3, '.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(schema), Some(table), Some(column)) => {
            (Alias::new(schema), Alias::new(table), Alias::new(column)).into_column_ref()
        }
        (Some(table), Some(column), None) => (Alias::new(table), Alias::new(column)).into_column_ref(),
        _ => Alias::new(ident).into_column_ref(),
    }
}

/// Comparison operators a predicate can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Like,
    ILike,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Like => "LIKE",
            CompareOp::ILike => "ILIKE",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }

    fn bin_oper(self) -> BinOper {
        match self {
            CompareOp::Eq => BinOper::Equal,
            CompareOp::Like => BinOper::Like,
            CompareOp::ILike => PgBinOper::ILike.into(),
            CompareOp::Gt => BinOper::GreaterThan,
            CompareOp::Gte => BinOper::GreaterThanOrEqual,
            CompareOp::Lt => BinOper::SmallerThan,
            CompareOp::Lte => BinOper::SmallerThanOrEqual,
        }
    }
}

/// A single `<ident> <op> <value>` comparison. The value is always bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub ident: String,
    pub op: CompareOp,
    pub value: Scalar,
}

impl Predicate {
    pub fn to_expr(&self) -> SimpleExpr {
        let value: sea_query::Value = self.value.clone().into();
        Expr::col(column_ref(&self.ident)).binary(self.op.bin_oper(), value)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.ident, self.op.as_sql(), self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Predicate(Predicate),
    Group(WhereGroup),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereGroup {
    members: Vec<(Junction, Member)>,
}

impl WhereGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, junction: Junction, predicate: Predicate) {
        self.members.push((junction, Member::Predicate(predicate)));
    }

    pub fn push_group(&mut self, junction: Junction, group: WhereGroup) {
        self.members.push((junction, Member::Group(group)));
    }

    pub fn members(&self) -> &[(Junction, Member)] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of predicates in this group and all nested groups.
    pub fn predicate_count(&self) -> usize {
        self.members
            .iter()
            .map(|(_, member)| match member {
                Member::Predicate(_) => 1,
                Member::Group(group) => group.predicate_count(),
            })
            .sum()
    }

    /// Number of nested groups, not counting this one.
    pub fn group_count(&self) -> usize {
        self.members
            .iter()
            .map(|(_, member)| match member {
                Member::Predicate(_) => 0,
                Member::Group(group) => 1 + group.group_count(),
            })
            .sum()
    }

    /// Convert into a sea-query condition.
    ///
    /// Consecutive members sharing a junction are collected into one
    /// `Condition::all()`/`Condition::any()`. When the junction changes the
    /// condition built so far becomes the first child of a new one, which
    /// keeps left-to-right evaluation order.
    pub fn into_condition(self) -> Condition {
        let mut members = self.members.into_iter();
        let Some((_, first)) = members.next() else {
            return Condition::all();
        };

        let mut current: Option<Junction> = None;
        let mut condition = Condition::all().add(first.into_expression());
        for (junction, member) in members {
            let expr = member.into_expression();
            condition = match current {
                Some(active) if active == junction => condition.add(expr),
                // a single-member condition can switch its junction in place
                None => match junction {
                    Junction::And => condition.add(expr),
                    Junction::Or => Condition::any().add(condition).add(expr),
                },
                Some(_) => junction.open().add(condition).add(expr),
            };
            current = Some(junction);
        }
        condition
    }
}

impl Member {
    fn into_expression(self) -> ConditionExpression {
        match self {
            Member::Predicate(predicate) => predicate.to_expr().into(),
            Member::Group(group) => group.into_condition().into(),
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Predicate(predicate) => write!(f, "{}", predicate),
            Member::Group(group) => write!(f, "({})", group),
        }
    }
}

/// Renders the members of the group without the surrounding parentheses.
///
/// A junction change wraps everything before it, matching the nesting of
/// [`WhereGroup::into_condition`]: `a OR b AND c` renders as `(a OR b) AND c`.
impl fmt::Display for WhereGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut members = self.members.iter();
        let Some((_, first)) = members.next() else {
            return Ok(());
        };

        let mut current: Option<Junction> = None;
        let mut text = first.to_string();
        for (junction, member) in members {
            if matches!(current, Some(active) if active != *junction) {
                text = format!("({})", text);
            }
            text = format!("{} {} {}", text, junction.keyword(), member);
            current = Some(*junction);
        }
        f.write_str(&text)
    }
}
