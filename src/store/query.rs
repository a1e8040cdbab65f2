use serde_json::Value;

use super::schema::foreign_key_constraint;

/// Which relationship a nested select follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// To-one: the base row's `via` column points at the embedded row's id.
    Parent { via: &'static str },
    /// To-many: embedded rows' `via` column points at the base row's id.
    Children { via: &'static str },
}

/// A nested select of a related table, returned under the related table's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub table: &'static str,
    pub relation: Relation,
    pub columns: Vec<&'static str>,
}

impl Embed {
    pub fn parent(table: &'static str, via: &'static str, columns: &[&'static str]) -> Self {
        Self {
            table,
            relation: Relation::Parent { via },
            columns: columns.to_vec(),
        }
    }

    pub fn children(table: &'static str, via: &'static str, columns: &[&'static str]) -> Self {
        Self {
            table,
            relation: Relation::Children { via },
            columns: columns.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub direction: Direction,
}

/// A read against one table with optional equality filters, joins and ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: &'static str,
    pub columns: Vec<&'static str>,
    pub filters: Vec<(&'static str, Value)>,
    pub embeds: Vec<Embed>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
    /// Exactly one row must match; anything else is a store error.
    pub single: bool,
}

impl Select {
    pub fn from(table: &'static str) -> Self {
        Self {
            table,
            columns: vec!["*"],
            filters: Vec::new(),
            embeds: Vec::new(),
            order: None,
            limit: None,
            single: false,
        }
    }

    pub fn columns(mut self, columns: &[&'static str]) -> Self {
        self.columns = columns.to_vec();
        self
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push((column, value.into()));
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn order(mut self, column: &'static str, direction: Direction) -> Self {
        self.order = Some(Order { column, direction });
        self
    }

    pub fn newest_first(self) -> Self {
        self.order("created_at", Direction::Descending)
    }

    pub fn oldest_first(self) -> Self {
        self.order("created_at", Direction::Ascending)
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// PostgREST `select=` expression, e.g. `*,users!problems_posted_by_fkey(username,email)`.
    pub fn select_expression(&self) -> String {
        let mut parts = vec![self.columns.join(",")];
        for embed in &self.embeds {
            let columns = embed.columns.join(",");
            let part = match embed.relation {
                Relation::Parent { via } => format!(
                    "{}!{}({})",
                    embed.table,
                    foreign_key_constraint(self.table, via),
                    columns
                ),
                Relation::Children { .. } => format!("{}({})", embed.table, columns),
            };
            parts.push(part);
        }
        parts.join(",")
    }

    /// Query-string pairs for a PostgREST GET against `/rest/v1/<table>`.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.select_expression())];
        for (column, value) in &self.filters {
            pairs.push((column.to_string(), format!("eq.{}", filter_literal(value))));
        }
        if let Some(order) = &self.order {
            let direction = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            pairs.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

fn filter_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
