//! Rectangular catalog table.
//!
//! Rows are JSON objects keyed by column name (the same shape the parser
//! produces), while the ordered column list lives on the table. Every row
//! always holds exactly the table's columns: missing cells are stored as
//! `Null`, unknown keys are discarded on insert.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::cell_text;

/// One catalog row: column name → cell.
pub type Row = Map<String, Value>;

/// Ordered columns plus rows sharing exactly that column set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Build a table from rows, normalizing each row to `columns`.
    pub fn from_rows(columns: Vec<String>, rows: impl IntoIterator<Item = Row>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Build a table from JSON objects. Non-object records are ignored.
    pub fn from_records<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        records: impl IntoIterator<Item = Value>,
    ) -> Self {
        let columns = columns.into_iter().map(Into::into).collect();
        let rows = records.into_iter().filter_map(|record| match record {
            Value::Object(obj) => Some(obj),
            _ => None,
        });
        Self::from_rows(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// First candidate that exists verbatim among the columns.
    pub fn find_column<'a, S: AsRef<str>>(&'a self, candidates: &[S]) -> Option<&'a str> {
        candidates.iter().find_map(|candidate| {
            self.columns
                .iter()
                .find(|c| c.as_str() == candidate.as_ref())
                .map(String::as_str)
        })
    }

    /// Cell at (`row`, `column`).
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Iterate over one column's cells, `Null` for every row when absent.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().map(move |r| r.get(column).unwrap_or(&Value::Null))
    }

    /// Append a row, keeping only known columns and filling the rest with `Null`.
    pub fn push_row(&mut self, mut row: Row) {
        let mut normalized = Map::new();
        for column in &self.columns {
            let value = row.remove(column).unwrap_or(Value::Null);
            normalized.insert(column.clone(), value);
        }
        self.rows.push(normalized);
    }

    /// Set every cell of `column` from `f(index, row)`.
    ///
    /// An existing column is overwritten in place; a new one is appended last.
    pub fn set_column_with<F>(&mut self, column: &str, mut f: F)
    where
        F: FnMut(usize, &Row) -> Value,
    {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
        for (i, row) in self.rows.iter_mut().enumerate() {
            let value = f(i, row);
            row.insert(column.to_string(), value);
        }
    }

    /// Rewrite the cells of an existing column. No-op when absent.
    pub fn map_column<F>(&mut self, column: &str, mut f: F)
    where
        F: FnMut(&Value) -> Value,
    {
        if !self.has_column(column) {
            return;
        }
        for row in &mut self.rows {
            let current = row.get(column).unwrap_or(&Value::Null);
            let value = f(current);
            row.insert(column.to_string(), value);
        }
    }

    /// Copy without the named columns.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Table {
        let dropped = |c: &String| names.iter().any(|n| n.as_ref() == c);
        let columns: Vec<String> = self.columns.iter().filter(|c| !dropped(c)).cloned().collect();
        let rows = self.rows.iter().map(|row| {
            row.iter()
                .filter(|(k, _)| !dropped(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Row>()
        });
        Table::from_rows(columns, rows)
    }

    /// Copy restricted to the named columns that exist, in the given order.
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Table {
        let columns: Vec<String> = names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| self.has_column(n))
            .map(String::from)
            .collect();
        Table::from_rows(columns, self.rows.iter().cloned())
    }

    /// Copy holding the rows that satisfy `predicate`.
    pub fn filter<F>(&self, mut predicate: F) -> Table
    where
        F: FnMut(&Row) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    /// Copy holding the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().filter_map(|&i| self.rows.get(i).cloned()).collect(),
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Group row indices by the value of `column`.
    ///
    /// Groups come out in first-seen order and keep the rows' relative order.
    /// Numbers compare by value (`5` and `5.0` are one group), but a number
    /// and text never match (`5` and `"5"` are different groups).
    pub fn group_by(&self, column: &str) -> Vec<(Value, Vec<usize>)> {
        let mut groups: Vec<(Value, Vec<usize>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (i, value) in self.column_values(column).enumerate() {
            let key = group_key(value);
            match index.get(&key) {
                Some(&g) => groups[g].1.push(i),
                None => {
                    index.insert(key, groups.len());
                    groups.push((value.clone(), vec![i]));
                }
            }
        }

        groups
    }

    /// Copy sorted by `key`. Stable: equal keys keep their relative order.
    pub fn sorted_by_key<K, F>(&self, mut key: F) -> Table
    where
        K: Ord,
        F: FnMut(&Row) -> K,
    {
        let mut keyed: Vec<(K, usize)> = self.rows.iter().enumerate().map(|(i, r)| (key(r), i)).collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        let order: Vec<usize> = keyed.into_iter().map(|(_, i)| i).collect();
        self.select_rows(&order)
    }
}

fn group_key(value: &Value) -> String {
    match value {
        Value::Number(_) => format!("n:{}", cell_text(value)),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        Table::from_records(
            ["Rubro", "Marca", "Precio"],
            vec![
                json!({"Rubro": "2 - Bebidas", "Marca": "Zeta", "Precio": 10}),
                json!({"Rubro": "1 - Almacen", "Marca": "Alfa", "Precio": 20}),
                json!({"Rubro": "2 - Bebidas", "Marca": "Alfa", "Precio": 30}),
            ],
        )
    }

    #[test]
    fn test_rows_normalized_to_columns() {
        let table = Table::from_records(["a", "b"], vec![json!({"a": 1, "zzz": 2})]);
        let row = &table.rows()[0];
        assert_eq!(row.len(), 2);
        assert_eq!(row["a"], 1);
        assert_eq!(row["b"], Value::Null);
        assert!(row.get("zzz").is_none());
    }

    #[test]
    fn test_find_column_candidates_in_order() {
        let table = Table::new(vec!["LINEA".into(), "linea".into()]);
        assert_eq!(table.find_column(&["Linea", "linea", "LINEA"]), Some("linea"));
        assert_eq!(table.find_column(&["Línea"]), None);
    }

    #[test]
    fn test_set_column_appends_or_overwrites() {
        let mut table = sample();
        table.set_column_with("orden", |i, _| json!(i + 1));
        assert_eq!(table.columns().last().map(String::as_str), Some("orden"));

        table.set_column_with("Marca", |_, _| json!("X"));
        assert_eq!(table.columns()[1], "Marca");
        assert!(table.column_values("Marca").all(|v| v == "X"));
    }

    #[test]
    fn test_drop_columns() {
        let table = sample().drop_columns(&["Marca"]);
        assert_eq!(table.columns(), &["Rubro".to_string(), "Precio".to_string()]);
        assert!(table.rows().iter().all(|r| !r.contains_key("Marca")));
    }

    #[test]
    fn test_filter_leaves_source_untouched() {
        let table = sample();
        let filtered = table.filter(|r| r["Marca"] == "Alfa");
        assert_eq!(filtered.len(), 2);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_group_by_first_seen_order() {
        let table = sample();
        let groups = table.group_by("Rubro");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, json!("2 - Bebidas"));
        assert_eq!(groups[0].1, vec![0, 2]);
        assert_eq!(groups[1].1, vec![1]);
    }

    #[test]
    fn test_group_by_distinguishes_types() {
        let table = Table::from_records(["k"], vec![json!({"k": 5}), json!({"k": "5"}), json!({"k": null})]);
        assert_eq!(table.group_by("k").len(), 3);
    }

    #[test]
    fn test_group_by_integer_and_float_match() {
        let table = Table::from_records(["k"], vec![json!({"k": 5}), json!({"k": 5.0}), json!({"k": 5.5})]);
        let groups = table.group_by("k");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1, vec![0, 1]);
    }

    #[test]
    fn test_sorted_by_key_is_stable() {
        let table = sample();
        let sorted = table.sorted_by_key(|r| r["Marca"].as_str().unwrap_or("").to_string());
        let prices: Vec<_> = sorted.column_values("Precio").cloned().collect();
        assert_eq!(prices, vec![json!(20), json!(30), json!(10)]);
    }
}
