//! The SELECT statement tree
//!
//! SQL text in this tree comes only from the catalog or from fragments
//! rebuilt by the resolver's allow-patterns. Request values appear only as
//! [`ParamRef`]s into the statement's [`ParamList`].

use super::param::{ParamList, ParamRef};
use crate::query::Ordering;

/// A base relation: `schema.table alias`
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub table: String,
    pub alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: TableRef,
    pub on: String,
}

/// `expr AS alias`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: String,
    pub alias: String,
}

impl SelectItem {
    pub fn new(expr: impl Into<String>, alias: impl Into<String>) -> Self {
        SelectItem {
            expr: expr.into(),
            alias: alias.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    GtEq,
    LtEq,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::GtEq => ">=",
            CompareOp::LtEq => "<=",
        }
    }
}

/// A WHERE conjunct
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column <op> $n`
    Compare {
        column: String,
        op: CompareOp,
        param: ParamRef,
    },
    /// `column IN ($n, ...)`
    In { column: String, params: Vec<ParamRef> },
    /// `column BETWEEN $n AND $m`
    Between {
        column: String,
        low: ParamRef,
        high: ParamRef,
    },
    /// `column ILIKE $n`
    ILike { column: String, param: ParamRef },
}

impl Predicate {
    pub fn column(&self) -> &str {
        match self {
            Predicate::Compare { column, .. }
            | Predicate::In { column, .. }
            | Predicate::Between { column, .. }
            | Predicate::ILike { column, .. } => column,
        }
    }

    pub fn params(&self) -> Vec<ParamRef> {
        match self {
            Predicate::Compare { param, .. } | Predicate::ILike { param, .. } => vec![*param],
            Predicate::In { params, .. } => params.clone(),
            Predicate::Between { low, high, .. } => vec![*low, *high],
        }
    }
}

/// A complete statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub select: Vec<SelectItem>,
    pub from: TableRef,
    pub joins: Vec<JoinClause>,
    pub predicates: Vec<Predicate>,
    /// 1-based ordinals into `select`
    pub group_by: Vec<usize>,
    pub order_by: Option<Ordering>,
    pub limit: Option<u32>,
    pub params: ParamList,
}

impl SelectQuery {
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
    }
}
