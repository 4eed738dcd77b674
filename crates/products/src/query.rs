//! Query criteria for listing product abstracts.
//!
//! Criteria are plain values. Extensions contribute joins by registering
//! transformer functions on a [`QueryCriteriaExpander`], which applies them in
//! registration order starting from [`QueryCriteria::default`].

use pim_core::{LocaleId, TaxSetId};

/// Relation of the product abstract table that a query can join.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Relation {
    LocalizedAttributes,
    TaxSet,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// Only product abstracts with a matching related row are returned.
    #[default]
    Inner,
    /// Product abstracts are returned whether or not a related row matches.
    Left,
}

/// Extra predicate on the joined relation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum JoinCondition {
    LocaleIs(LocaleId),
    TaxSetIs(TaxSetId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryJoin {
    pub relation: Relation,
    pub join_type: JoinType,
    pub condition: Option<JoinCondition>,
}

impl QueryJoin {
    pub fn inner(relation: Relation) -> Self {
        Self {
            relation,
            join_type: JoinType::Inner,
            condition: None,
        }
    }

    pub fn left(relation: Relation) -> Self {
        Self {
            relation,
            join_type: JoinType::Left,
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: JoinCondition) -> Self {
        self.condition = Some(condition);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryCriteria {
    pub joins: Vec<QueryJoin>,
    pub sku_prefix: Option<String>,
    pub limit: Option<usize>,
}

impl QueryCriteria {
    pub fn with_join(mut self, join: QueryJoin) -> Self {
        self.joins.push(join);
        self
    }

    pub fn with_sku_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sku_prefix = Some(prefix.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

type Transformer = Box<dyn Fn(QueryCriteria) -> QueryCriteria + Send + Sync>;

/// Ordered list of pure criteria transformers.
#[derive(Default)]
pub struct QueryCriteriaExpander {
    transformers: Vec<Transformer>,
}

impl QueryCriteriaExpander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, transformer: F) -> Self
    where
        F: Fn(QueryCriteria) -> QueryCriteria + Send + Sync + 'static,
    {
        self.push(transformer);
        self
    }

    pub fn push<F>(&mut self, transformer: F)
    where
        F: Fn(QueryCriteria) -> QueryCriteria + Send + Sync + 'static,
    {
        self.transformers.push(Box::new(transformer));
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Apply every transformer, left to right, to `criteria`.
    pub fn expand(&self, criteria: QueryCriteria) -> QueryCriteria {
        self.transformers
            .iter()
            .fold(criteria, |acc, transform| transform(acc))
    }

    /// Expand the default (empty) criteria.
    pub fn build(&self) -> QueryCriteria {
        self.expand(QueryCriteria::default())
    }
}

impl core::fmt::Debug for QueryCriteriaExpander {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QueryCriteriaExpander")
            .field("transformers", &self.transformers.len())
            .finish()
    }
}
