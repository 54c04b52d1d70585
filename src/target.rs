//! Statements the translator can write into.

use crate::condition::{column_ref, WhereGroup};
use sea_query::{
    ConditionalStatement, DeleteStatement, Order, OrderedStatement, SelectStatement, UpdateStatement,
};

/// The builder capabilities the translator needs: AND one condition group
/// into the WHERE clause, and append one ORDER BY expression.
pub trait QueryTarget {
    fn where_group(&mut self, group: WhereGroup) -> &mut Self;

    fn order_expr(&mut self, ident: String, descending: bool) -> &mut Self;
}

macro_rules! impl_query_target {
    ($($statement:ty),+ $(,)?) => {
        $(
            impl QueryTarget for $statement {
                fn where_group(&mut self, group: WhereGroup) -> &mut Self {
                    self.cond_where(group.into_condition())
                }

                fn order_expr(&mut self, ident: String, descending: bool) -> &mut Self {
                    let order = if descending { Order::Desc } else { Order::Asc };
                    self.order_by(column_ref(&ident), order)
                }
            }
        )+
    };
}

impl_query_target!(SelectStatement, UpdateStatement, DeleteStatement);
