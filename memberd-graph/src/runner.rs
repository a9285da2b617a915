//! Batch query runner over Bolt
//!
//! The repository never touches the driver directly; it hands the runner a
//! list of parameterized statements and relies on two guarantees:
//!
//! - a batch executes inside one explicit transaction, all-or-nothing;
//! - statements marked as row-returning get their result bindings back,
//!   index-aligned with the input.
//!
//! Mutation outcomes a statement needs (did anything change, how many
//! labels went away) are computed by the statement itself and come back
//! as ordinary result bindings.

use neo4rs::{query, Graph, Query, Row};

use memberd_core::{Result, ServiceError};

use crate::labels::Label;

/// Default maximum number of statements accepted per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Connection settings for the graph database.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Maximum number of statements per submitted batch.
    pub batch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// A parameter value a statement can carry.
///
/// Absent optionals travel as explicit nulls so `SET n = {..}` property
/// maps clear what the payload left out.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    OptText(Option<String>),
    Int(i64),
    OptInt(Option<i64>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Option<String>> for ParamValue {
    fn from(value: Option<String>) -> Self {
        Self::OptText(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Option<i64>> for ParamValue {
    fn from(value: Option<i64>) -> Self {
        Self::OptInt(value)
    }
}

/// One parameterized Cypher statement.
///
/// Kept as plain data (text + typed params) so statement construction can
/// be unit-tested without a database.
#[derive(Debug, Clone)]
pub struct Statement {
    cypher: String,
    params: Vec<(&'static str, ParamValue)>,
    returns_rows: bool,
}

impl Statement {
    pub fn new(cypher: impl Into<String>) -> Self {
        Self {
            cypher: cypher.into(),
            params: Vec::new(),
            returns_rows: false,
        }
    }

    pub fn param(mut self, key: &'static str, value: impl Into<ParamValue>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    /// Mark this statement's result bindings as wanted when run in a batch.
    pub fn returning(mut self) -> Self {
        self.returns_rows = true;
        self
    }

    pub fn cypher(&self) -> &str {
        &self.cypher
    }

    pub fn params(&self) -> &[(&'static str, ParamValue)] {
        &self.params
    }

    /// Look up a parameter by key, for assertions in tests.
    pub fn param_value(&self, key: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    pub(crate) fn wants_rows(&self) -> bool {
        self.returns_rows
    }

    pub(crate) fn to_query(&self) -> Query {
        let mut q = query(&self.cypher);
        for (key, value) in &self.params {
            q = match value {
                ParamValue::Text(v) => q.param(key, v.clone()),
                ParamValue::OptText(v) => q.param(key, v.clone()),
                ParamValue::Int(v) => q.param(key, *v),
                ParamValue::OptInt(v) => q.param(key, *v),
            };
        }
        q
    }
}

/// Batch runner handle. Cheap to share; holds only the pooled driver and
/// the batch limit.
pub struct CypherRunner {
    graph: Graph,
    batch_size: usize,
}

impl CypherRunner {
    /// Connect to the graph database.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let graph = Graph::new(&config.uri, &config.user, &config.password)
            .await
            .map_err(ServiceError::backend)?;
        Ok(Self {
            graph,
            batch_size: config.batch_size,
        })
    }

    /// Run one read statement outside an explicit transaction and collect
    /// its rows.
    pub async fn fetch(&self, statement: Statement) -> Result<Vec<Row>> {
        let mut stream = self
            .graph
            .execute(statement.to_query())
            .await
            .map_err(ServiceError::backend)?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(ServiceError::backend)? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Run every statement inside one explicit transaction, all-or-nothing.
    ///
    /// The returned outer Vec is index-aligned with the input; statements
    /// not marked `returning` yield an empty row list.
    pub async fn batch(&self, statements: Vec<Statement>) -> Result<Vec<Vec<Row>>> {
        if statements.len() > self.batch_size {
            return Err(ServiceError::BatchTooLarge {
                got: statements.len(),
                limit: self.batch_size,
            });
        }

        let mut txn = self.graph.start_txn().await.map_err(ServiceError::backend)?;
        let mut results = Vec::with_capacity(statements.len());
        for statement in statements {
            if statement.wants_rows() {
                let mut rows = Vec::new();
                let mut stream = txn
                    .execute(statement.to_query())
                    .await
                    .map_err(ServiceError::backend)?;
                while let Some(row) = stream
                    .next(txn.handle())
                    .await
                    .map_err(ServiceError::backend)?
                {
                    rows.push(row);
                }
                results.push(rows);
            } else {
                txn.run(statement.to_query())
                    .await
                    .map_err(ServiceError::backend)?;
                results.push(Vec::new());
            }
        }
        txn.commit().await.map_err(ServiceError::backend)?;
        Ok(results)
    }

    /// Connectivity probe: one trivial statement must round-trip.
    pub async fn check(&self) -> Result<()> {
        self.fetch(Statement::new("RETURN 1 AS ok")).await.map(|_| ())
    }

    /// Ensure a uniqueness constraint exists for each (label, property)
    /// pair. Idempotent.
    pub async fn ensure_constraints(&self, pairs: &[(Label, &str)]) -> Result<()> {
        for (label, property) in pairs {
            let cypher = format!(
                "CREATE CONSTRAINT {name} IF NOT EXISTS FOR (n:{label}) REQUIRE n.{property} IS UNIQUE",
                name = constraint_name(*label, property),
            );
            self.graph
                .run(query(&cypher))
                .await
                .map_err(ServiceError::backend)?;
        }
        Ok(())
    }
}

fn constraint_name(label: Label, property: &str) -> String {
    format!("{}_{}", label.as_str().to_lowercase(), property)
}
