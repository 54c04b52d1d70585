//! Filter translator that appends WHERE groups and ORDER BY clauses to a query target.

use crate::ast::{Filter, FilterKind, OrderSpec, Parameter, QueryData};
use crate::condition::{CompareOp, Junction, Predicate, WhereGroup};
use crate::naming::{IdentMapper, Passthrough};
use crate::target::QueryTarget;
use std::fmt;
use tracing::{debug, trace};

/// Default nesting limit for filter trees.
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// The filter tree is nested deeper than the translator accepts.
    DepthExceeded { limit: usize },
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateError::DepthExceeded { limit } => {
                write!(f, "filter nesting exceeds the maximum depth of {}", limit)
            }
        }
    }
}

impl std::error::Error for TranslateError {}

impl From<&FilterKind> for CompareOp {
    fn from(kind: &FilterKind) -> Self {
        match kind {
            FilterKind::Like => CompareOp::Like,
            FilterKind::ILike => CompareOp::ILike,
            FilterKind::Gt => CompareOp::Gt,
            FilterKind::Gte => CompareOp::Gte,
            FilterKind::Lt => CompareOp::Lt,
            FilterKind::Lte => CompareOp::Lte,
            FilterKind::Eq | FilterKind::Other(_) => CompareOp::Eq,
        }
    }
}

/// Translates parsed filter expressions and orderings into query conditions.
///
/// The translator holds no per-call state, one instance can serve any
/// number of statements.
#[derive(Debug, Clone)]
pub struct Translator<M = Passthrough> {
    mapper: M,
    max_depth: usize,
}

impl Translator {
    pub fn new() -> Self {
        Self::with_mapper(Passthrough)
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: IdentMapper> Translator<M> {
    pub fn with_mapper(mapper: M) -> Self {
        Self {
            mapper,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the nesting limit. A lone parameter has depth 1, every And, Or
    /// or Negate above it adds one.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Append the filter and orderings of a parsed request to `target`.
    pub fn append_to<'q, T>(
        &self,
        target: &'q mut T,
        data: &QueryData,
    ) -> Result<&'q mut T, TranslateError>
    where
        T: QueryTarget + ?Sized,
    {
        self.apply(target, data.filter.as_ref(), &data.orders)
    }

    /// Append `filter` as one AND-combined WHERE group and `orders` as
    /// ORDER BY clauses, in sequence order.
    ///
    /// The filter is translated completely before the target is touched, so
    /// an error leaves the target unchanged.
    pub fn apply<'q, T>(
        &self,
        target: &'q mut T,
        filter: Option<&Filter>,
        orders: &[OrderSpec],
    ) -> Result<&'q mut T, TranslateError>
    where
        T: QueryTarget + ?Sized,
    {
        let group = filter.map(|filter| self.where_group(filter)).transpose()?;

        if let Some(group) = group {
            debug!(
                predicates = group.predicate_count(),
                groups = group.group_count(),
                orders = orders.len(),
                "translated filter: {}",
                group
            );
            target.where_group(group);
        } else {
            debug!(orders = orders.len(), "no filter to translate");
        }

        self.append_order(target, orders);
        Ok(target)
    }

    /// Build the WHERE group for `filter` without attaching it anywhere.
    pub fn where_group(&self, filter: &Filter) -> Result<WhereGroup, TranslateError> {
        let mut group = WhereGroup::new();
        self.append_filter(&mut group, filter, false, 1)?;
        Ok(group)
    }

    fn append_filter(
        &self,
        group: &mut WhereGroup,
        filter: &Filter,
        or: bool,
        depth: usize,
    ) -> Result<(), TranslateError> {
        if depth > self.max_depth {
            return Err(TranslateError::DepthExceeded {
                limit: self.max_depth,
            });
        }

        match filter {
            Filter::And { left, right } => {
                let mut sub = WhereGroup::new();
                self.append_filter(&mut sub, left, false, depth + 1)?;
                self.append_filter(&mut sub, right, false, depth + 1)?;
                group.push_group(Junction::from_or(or), sub);
            }
            Filter::Or { left, right } => {
                let mut sub = WhereGroup::new();
                self.append_filter(&mut sub, left, true, depth + 1)?;
                self.append_filter(&mut sub, right, true, depth + 1)?;
                group.push_group(Junction::from_or(or), sub);
            }
            // Grouping only, the comparison inside is not inverted.
            Filter::Negate { negated } => {
                let mut sub = WhereGroup::new();
                self.append_filter(&mut sub, negated, false, depth + 1)?;
                group.push_group(Junction::from_or(or), sub);
            }
            Filter::Parameter(parameter) => {
                self.append_parameter(group, parameter, or);
            }
        }

        Ok(())
    }

    fn append_parameter(&self, group: &mut WhereGroup, parameter: &Parameter, or: bool) {
        let predicate = Predicate {
            ident: self.mapper.convert(&parameter.name),
            op: CompareOp::from(&parameter.kind),
            value: parameter.value.clone(),
        };
        trace!(field = %parameter.name, or, "{}", predicate);
        group.push(Junction::from_or(or), predicate);
    }

    fn append_order<T>(&self, target: &mut T, orders: &[OrderSpec])
    where
        T: QueryTarget + ?Sized,
    {
        for order in orders {
            let ident = self.mapper.convert(&order.order_by);
            trace!(field = %order.order_by, %ident, descending = order.descending, "order by");
            target.order_expr(ident, order.descending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Scalar;
    use crate::naming::NameCase;
    use sea_query::{Alias, Asterisk, PostgresQueryBuilder, Query, QueryStatementWriter};
    use std::cell::Cell;

    /// Records what the translator writes, rendered as text.
    #[derive(Debug, Default, PartialEq)]
    struct Recorded {
        wheres: Vec<String>,
        orders: Vec<String>,
    }

    impl QueryTarget for Recorded {
        fn where_group(&mut self, group: WhereGroup) -> &mut Self {
            self.wheres.push(group.to_string());
            self
        }

        fn order_expr(&mut self, ident: String, descending: bool) -> &mut Self {
            let direction = if descending { "DESC" } else { "ASC" };
            self.orders.push(format!("{} {}", ident, direction));
            self
        }
    }

    fn upper(name: &str) -> String {
        name.to_uppercase()
    }

    fn p(name: &str, kind: &str, value: impl Into<Scalar>) -> Filter {
        Filter::param(name, FilterKind::from(kind), value)
    }

    fn render(translator: &Translator<impl IdentMapper>, filter: &Filter) -> String {
        translator.where_group(filter).unwrap().to_string()
    }

    #[test]
    fn test_operator_table() {
        let translator = Translator::new();
        let cases = [
            ("eq", "="),
            ("like", "LIKE"),
            ("ilike", "ILIKE"),
            ("gt", ">"),
            ("gte", ">="),
            ("lt", "<"),
            ("lte", "<="),
            ("neq", "="),
            ("", "="),
        ];

        for (kind, op) in cases {
            let rendered = render(&translator, &p("x", kind, 1));
            assert_eq!(rendered, format!("(x {} 1)", op), "kind {:?}", kind);
        }
    }

    #[test]
    fn test_and_with_uppercase_mapper() {
        let translator = Translator::with_mapper(upper);
        let filter = Filter::and(p("age", "gte", 18), p("status", "eq", "active"));

        assert_eq!(
            render(&translator, &filter),
            "((AGE >= 18) AND (STATUS = 'active'))"
        );
    }

    #[test]
    fn test_or_like_ilike() {
        let translator = Translator::with_mapper(upper);
        let filter = Filter::or(p("name", "like", "a%"), p("name", "ilike", "A%"));

        assert_eq!(
            render(&translator, &filter),
            "((NAME LIKE 'a%') OR (NAME ILIKE 'A%'))"
        );
    }

    #[test]
    fn test_nesting_is_not_flattened() {
        let translator = Translator::new();
        let filter = Filter::and(Filter::and(p("a", "eq", 1), p("b", "eq", 2)), p("c", "eq", 3));

        assert_eq!(
            render(&translator, &filter),
            "(((a = 1) AND (b = 2)) AND (c = 3))"
        );
    }

    #[test]
    fn test_or_over_and() {
        let translator = Translator::new();
        let filter = Filter::or(Filter::and(p("a", "eq", 1), p("b", "eq", 2)), p("c", "eq", 3));

        assert_eq!(
            render(&translator, &filter),
            "(((a = 1) AND (b = 2)) OR (c = 3))"
        );
    }

    #[test]
    fn test_and_over_or() {
        let translator = Translator::new();
        let filter = Filter::and(p("a", "eq", 1), Filter::or(p("b", "eq", 2), p("c", "eq", 3)));

        let group = translator.where_group(&filter).unwrap();
        assert_eq!(group.to_string(), "((a = 1) AND ((b = 2) OR (c = 3)))");
        assert_eq!(group.predicate_count(), 3);
        assert_eq!(group.group_count(), 2);
    }

    #[test]
    fn test_negate_only_groups() {
        let translator = Translator::new();
        let filter = Filter::negate(p("age", "gt", 30));
        assert_eq!(render(&translator, &filter), "((age > 30))");

        let filter = Filter::or(p("a", "eq", 1), Filter::negate(p("b", "lt", 2)));
        assert_eq!(render(&translator, &filter), "((a = 1) OR ((b < 2)))");
    }

    #[test]
    fn test_single_parameter() {
        let translator = Translator::new();
        let group = translator.where_group(&p("id", "eq", 7)).unwrap();
        assert_eq!(group.to_string(), "(id = 7)");
        assert_eq!(group.group_count(), 0);
    }

    #[test]
    fn test_mapper_called_once_per_reference() {
        let calls = Cell::new(0);
        let mapper = |name: &str| {
            calls.set(calls.get() + 1);
            format!("t_{}", name)
        };
        let translator = Translator::with_mapper(mapper);
        let filter = Filter::or(
            Filter::and(p("age", "gte", 18), p("age", "lte", 65)),
            Filter::negate(p("name", "like", "x%")),
        );
        let orders = [OrderSpec::asc("age"), OrderSpec::desc("name")];

        let mut recorded = Recorded::default();
        translator.apply(&mut recorded, Some(&filter), &orders).unwrap();

        assert_eq!(calls.get(), 5);
        assert_eq!(
            recorded.wheres,
            vec!["(((t_age >= 18) AND (t_age <= 65)) OR ((t_name LIKE 'x%')))".to_string()]
        );
        assert_eq!(recorded.orders, vec!["t_age ASC", "t_name DESC"]);
    }

    #[test]
    fn test_table_qualified_identifiers() {
        let translator = Translator::with_mapper(|name: &str| format!("users.{}", name));
        let mut select = Query::select();
        select.column(Asterisk).from(Alias::new("users"));
        translator
            .apply(&mut select, Some(&p("age", "gte", 18)), &[OrderSpec::asc("age")])
            .unwrap();

        let (sql, _) = select.build(PostgresQueryBuilder);
        assert!(sql.contains(r#""users"."age" >= $1"#), "{}", sql);
        assert!(sql.ends_with(r#"ORDER BY "users"."age" ASC"#), "{}", sql);
    }

    #[test]
    fn test_orders_only() {
        let translator = Translator::new();
        let orders = [OrderSpec::asc("age"), OrderSpec::desc("name")];

        let mut recorded = Recorded::default();
        translator.apply(&mut recorded, None, &orders).unwrap();
        assert!(recorded.wheres.is_empty());
        assert_eq!(recorded.orders, vec!["age ASC", "name DESC"]);

        let mut select = Query::select();
        select.column(Asterisk).from(Alias::new("people"));
        translator.apply(&mut select, None, &orders).unwrap();
        let sql = select.to_string(PostgresQueryBuilder);
        assert_eq!(sql, r#"SELECT * FROM "people" ORDER BY "age" ASC, "name" DESC"#);
    }

    #[test]
    fn test_order_sequence_preserved() {
        let translator = Translator::new();
        let orders = [
            OrderSpec::desc("b"),
            OrderSpec::asc("a"),
            OrderSpec::desc("b"),
        ];

        let mut recorded = Recorded::default();
        translator.apply(&mut recorded, None, &orders).unwrap();
        assert_eq!(recorded.orders, vec!["b DESC", "a ASC", "b DESC"]);
    }

    #[test]
    fn test_empty_input_touches_nothing() {
        let translator = Translator::new();
        let mut recorded = Recorded::default();
        translator.apply(&mut recorded, None, &[]).unwrap();
        assert_eq!(recorded, Recorded::default());
    }

    #[test]
    fn test_values_are_bound() {
        let translator = Translator::with_mapper(upper);
        let filter = Filter::and(p("age", "gte", 18), p("status", "eq", "active"));

        let mut select = Query::select();
        select.column(Asterisk).from(Alias::new("users"));
        translator.apply(&mut select, Some(&filter), &[]).unwrap();

        let (sql, values) = select.build(PostgresQueryBuilder);
        assert!(sql.contains(r#""AGE" >= $1"#), "{}", sql);
        assert!(sql.contains(r#""STATUS" = $2"#), "{}", sql);
        assert!(!sql.contains("active"), "{}", sql);
        assert_eq!(values.0.len(), 2);
        assert_eq!(values.0[1], sea_query::Value::String(Some(Box::new("active".to_string()))));
    }

    #[test]
    fn test_or_scenario_sql() {
        let translator = Translator::with_mapper(upper);
        let filter = Filter::or(p("name", "like", "a%"), p("name", "ilike", "A%"));

        let mut select = Query::select();
        select.column(Asterisk).from(Alias::new("users"));
        translator.apply(&mut select, Some(&filter), &[]).unwrap();

        let sql = select.to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#""NAME" LIKE 'a%' OR "NAME" ILIKE 'A%'"#), "{}", sql);
    }

    #[test]
    fn test_idempotent_over_fresh_builders() {
        let translator = Translator::with_mapper(NameCase::Snake);
        let filter = Filter::or(
            Filter::and(p("firstName", "ilike", "j%"), p("createdAt", "gt", 100)),
            Filter::negate(p("isActive", "eq", true)),
        );
        let orders = [OrderSpec::desc("createdAt")];

        let mut first = Query::select();
        first.column(Asterisk).from(Alias::new("users"));
        let mut second = first.clone();

        translator.apply(&mut first, Some(&filter), &orders).unwrap();
        translator.apply(&mut second, Some(&filter), &orders).unwrap();

        assert_eq!(first.build(PostgresQueryBuilder), second.build(PostgresQueryBuilder));
        assert!(first.to_string(PostgresQueryBuilder).contains(r#""first_name" ILIKE 'j%'"#));

        let mut a = Recorded::default();
        let mut b = Recorded::default();
        translator.apply(&mut a, Some(&filter), &orders).unwrap();
        translator.apply(&mut b, Some(&filter), &orders).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_append_to_query_data() {
        let translator = Translator::new();
        let data = QueryData {
            filter: Some(p("status", "eq", "open")),
            orders: vec![OrderSpec::asc("id")],
        };

        let mut recorded = Recorded::default();
        let out = translator.append_to(&mut recorded, &data).unwrap();
        out.order_expr("extra".to_string(), false);

        assert_eq!(recorded.wheres, vec!["(status = 'open')"]);
        assert_eq!(recorded.orders, vec!["id ASC", "extra ASC"]);
    }

    fn left_deep(depth: usize) -> Filter {
        let mut filter = p("f0", "eq", 0);
        for i in 1..depth {
            filter = Filter::and(filter, p(&format!("f{}", i), "eq", i as i64));
        }
        filter
    }

    #[test]
    fn test_depth_limit() {
        let translator = Translator::new().max_depth(4);

        // three Ands over a parameter: depth 4
        assert!(translator.where_group(&left_deep(4)).is_ok());

        let mut recorded = Recorded::default();
        let err = translator
            .apply(&mut recorded, Some(&left_deep(5)), &[OrderSpec::asc("id")])
            .unwrap_err();
        assert_eq!(err, TranslateError::DepthExceeded { limit: 4 });
        assert_eq!(recorded, Recorded::default());
        assert_eq!(err.to_string(), "filter nesting exceeds the maximum depth of 4");
    }

    #[test]
    fn test_default_depth_accepts_reasonable_trees() {
        let translator = Translator::default();
        let group = translator.where_group(&left_deep(DEFAULT_MAX_DEPTH)).unwrap();
        assert_eq!(group.predicate_count(), DEFAULT_MAX_DEPTH);
        assert!(translator.where_group(&left_deep(DEFAULT_MAX_DEPTH + 1)).is_err());
    }
}
