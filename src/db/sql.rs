use rusqlite::types::Value;

/// Builds an `UPDATE` statement from the fields that were actually set.
pub struct Update {
    table: &'static str,

    fields: Vec<&'static str>,
    wheres: Vec<&'static str>,
    values: Vec<Value>,
}

impl Update {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            fields: Vec::new(),
            wheres: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn add_field(&mut self, field: &'static str, value: Value) {
        self.fields.push(field);
        self.values.push(value);
    }

    pub fn add_where(&mut self, s: &'static str, value: Value) {
        self.wheres.push(s);
        self.values.push(value);
    }

    /// Returns an empty statement when no field was added. Fields must all be
    /// added before the first where clause so the values line up.
    pub fn build(self) -> (String, Vec<Value>) {
        if self.fields.is_empty() {
            return (String::new(), Vec::new());
        }
        let set = self
            .fields
            .iter()
            .map(|f| format!("{f} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("UPDATE {} SET {set}", self.table);

        if !self.wheres.is_empty() {
            sql.push_str(&format!(" WHERE {}", self.wheres.join(" AND ")));
        }

        (sql, self.values)
    }
}
