use serde::{Deserialize, Serialize};
use std::fmt;

/// 一次完整的查询请求：过滤表达式 + 排序列表
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryData {
    /// 过滤表达式树, 为空时不产生 WHERE 子句
    #[serde(default)]
    pub filter: Option<Filter>,
    /// 排序列表, 顺序即 ORDER BY 的输出顺序
    #[serde(default)]
    pub orders: Vec<OrderSpec>,
}

/// 过滤表达式树, 例如：`(age >= 18 AND status = "active")`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// 逻辑与运算 (AND)
    And { left: Box<Filter>, right: Box<Filter> },
    /// 逻辑或运算 (OR)
    Or { left: Box<Filter>, right: Box<Filter> },
    /// 逻辑非运算, 只影响分组
    Negate { negated: Box<Filter> },
    /// 单个字段比较, 这是表达式的叶子节点
    Parameter(Parameter),
}

impl Filter {
    pub fn and(left: Filter, right: Filter) -> Self {
        Filter::And { left: Box::new(left), right: Box::new(right) }
    }

    pub fn or(left: Filter, right: Filter) -> Self {
        Filter::Or { left: Box::new(left), right: Box::new(right) }
    }

    pub fn negate(negated: Filter) -> Self {
        Filter::Negate { negated: Box::new(negated) }
    }

    pub fn param(name: impl Into<String>, kind: FilterKind, value: impl Into<Scalar>) -> Self {
        Filter::Parameter(Parameter {
            name: name.into(),
            kind,
            value: value.into(),
        })
    }
}

/// 叶子节点：`字段 运算符 值`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// 逻辑字段名, 由 IdentMapper 转换为物理列名
    pub name: String,
    /// 比较类型, 缺省为等值比较
    #[serde(default, alias = "filter")]
    pub kind: FilterKind,
    pub value: Scalar,
}

/// 比较类型标识
///
/// 无法识别的标识保留在 `Other` 中, 翻译时按等值比较处理。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterKind {
    #[default]
    Eq,
    Like,
    ILike,
    Gt,
    Gte,
    Lt,
    Lte,
    Other(String),
}

impl FilterKind {
    pub fn identification(&self) -> &str {
        match self {
            FilterKind::Eq => "eq",
            FilterKind::Like => "like",
            FilterKind::ILike => "ilike",
            FilterKind::Gt => "gt",
            FilterKind::Gte => "gte",
            FilterKind::Lt => "lt",
            FilterKind::Lte => "lte",
            FilterKind::Other(other) => other,
        }
    }
}

impl From<&str> for FilterKind {
    fn from(s: &str) -> Self {
        match s {
            "eq" => FilterKind::Eq,
            "like" => FilterKind::Like,
            "ilike" => FilterKind::ILike,
            "gt" => FilterKind::Gt,
            "gte" => FilterKind::Gte,
            "lt" => FilterKind::Lt,
            "lte" => FilterKind::Lte,
            other => FilterKind::Other(other.to_string()),
        }
    }
}

impl From<String> for FilterKind {
    fn from(s: String) -> Self {
        FilterKind::from(s.as_str())
    }
}

impl From<FilterKind> for String {
    fn from(kind: FilterKind) -> Self {
        kind.identification().to_string()
    }
}

/// 绑定值, 翻译器不解释其含义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Int(n.into())
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<Scalar> for sea_query::Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Null => sea_query::Value::String(None),
            Scalar::Bool(b) => sea_query::Value::Bool(Some(b)),
            Scalar::Int(n) => sea_query::Value::BigInt(Some(n)),
            Scalar::Float(f) => sea_query::Value::Double(Some(f)),
            Scalar::Text(s) => sea_query::Value::String(Some(Box::new(s))),
        }
    }
}

/// 以 SQL 字面量形式显示, 仅用于日志和测试
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "NULL"),
            Scalar::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

/// 单个排序项, 例如：`sort=-created_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub order_by: String,
    #[serde(default)]
    pub descending: bool,
}

impl OrderSpec {
    pub fn asc(order_by: impl Into<String>) -> Self {
        Self { order_by: order_by.into(), descending: false }
    }

    pub fn desc(order_by: impl Into<String>) -> Self {
        Self { order_by: order_by.into(), descending: true }
    }
}
