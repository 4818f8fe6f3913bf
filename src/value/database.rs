//! Whole-database value container
//!
//! Owns every table value plus the name index that reference checks
//! look up. Loading requires exactly one data source per declared
//! table; cross-table validation is meaningless on a partial database.

use std::collections::HashMap;

use crate::csv::Row;
use crate::schema::TypeGraph;

use super::errors::{ValueError, ValueResult};
use super::table::{TableLayout, TableValue};

/// Parsed rows for one table, ready to decode.
#[derive(Debug)]
pub struct TableData {
    pub table: String,
    pub rows: Vec<Row>,
    pub layout: TableLayout,
}

/// All table values of one compilation run.
#[derive(Debug)]
pub struct Database {
    tables: Vec<TableValue>,
    index: HashMap<String, usize>,
}

impl Database {
    /// Decode every table's rows against the resolved graph. Fails on
    /// the first format error or key duplicate; reference checks run
    /// later, once every table exists.
    pub fn load(graph: &TypeGraph, sources: Vec<TableData>) -> ValueResult<Database> {
        let mut tables = Vec::with_capacity(sources.len());
        let mut index = HashMap::new();
        for source in &sources {
            let table = graph
                .table_by_name(&source.table)
                .ok_or_else(|| ValueError::UnknownTable {
                    table: source.table.clone(),
                })?;
            if index.contains_key(&table.name) {
                return Err(ValueError::DuplicateSource {
                    table: table.name.clone(),
                });
            }
            let value = TableValue::build(graph, table, &source.rows, &source.layout)?;
            index.insert(table.name.clone(), tables.len());
            tables.push(value);
        }
        for table in graph.tables() {
            if !index.contains_key(&table.name) {
                return Err(ValueError::MissingTable {
                    table: table.name.clone(),
                });
            }
        }
        Ok(Database { tables, index })
    }

    /// Table values in load order.
    pub fn tables(&self) -> &[TableValue] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableValue> {
        self.index.get(name).map(|&i| &self.tables[i])
    }
}
