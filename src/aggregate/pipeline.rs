/// Composable read-query builder
///
/// A `Pipeline` is a declarative list of stages (match, lookup, computed
/// fields, projection, sort, skip, limit) over one source table. Column and
/// table names are `&'static str` chosen by the caller's code; every value
/// that can come from a request is carried as a [`Bind`] and pushed through
/// `QueryBuilder::push_bind`.
use crate::{
    aggregate::pagination::{Page, Pagination},
    error::ApiResult,
    ids::ObjectId,
};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Sqlite, SqlitePool};

/// A value bound into the rendered query
#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    Text(String),
    Integer(i64),
    Bool(bool),
    Null,
}

impl From<&str> for Bind {
    fn from(value: &str) -> Self {
        Bind::Text(value.to_string())
    }
}

impl From<String> for Bind {
    fn from(value: String) -> Self {
        Bind::Text(value)
    }
}

impl From<&ObjectId> for Bind {
    fn from(value: &ObjectId) -> Self {
        Bind::Text(value.to_string())
    }
}

impl From<Option<&ObjectId>> for Bind {
    fn from(value: Option<&ObjectId>) -> Self {
        value.map(Bind::from).unwrap_or(Bind::Null)
    }
}

impl From<i64> for Bind {
    fn from(value: i64) -> Self {
        Bind::Integer(value)
    }
}

impl From<bool> for Bind {
    fn from(value: bool) -> Self {
        Bind::Bool(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Unresolvable references yield NULL columns
    Left,
    /// Unresolvable references drop the row
    Inner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl Direction {
    /// Parse `asc` / `desc` (case-insensitive)
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Direction::Asc),
            "desc" => Some(Direction::Desc),
            _ => None,
        }
    }

    fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
enum Filter {
    Eq { column: &'static str, value: Bind },
    Either {
        first: (&'static str, Bind),
        second: (&'static str, Bind),
    },
    Contains { column: &'static str, needle: String },
}

#[derive(Debug, Clone)]
struct Lookup {
    kind: JoinKind,
    table: &'static str,
    alias: &'static str,
    foreign: &'static str,
    local: &'static str,
}

#[derive(Debug, Clone)]
enum Computed {
    Count {
        name: &'static str,
        table: &'static str,
        foreign: &'static str,
        local: &'static str,
    },
    Exists {
        name: &'static str,
        table: &'static str,
        foreign: &'static str,
        local: &'static str,
        column: &'static str,
        value: Bind,
    },
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    source: &'static str,
    alias: &'static str,
    filters: Vec<Filter>,
    lookups: Vec<Lookup>,
    computed: Vec<Computed>,
    fields: Vec<&'static str>,
    sort: Vec<(&'static str, Direction)>,
    skip: Option<i64>,
    limit: Option<i64>,
}

impl Pipeline {
    /// Start a pipeline over `source AS alias`
    pub fn over(source: &'static str, alias: &'static str) -> Self {
        Self {
            source,
            alias,
            filters: Vec::new(),
            lookups: Vec::new(),
            computed: Vec::new(),
            fields: Vec::new(),
            sort: Vec::new(),
            skip: None,
            limit: None,
        }
    }

    /// `column = value`; a `Bind::Null` value matches nothing
    pub fn match_eq(mut self, column: &'static str, value: impl Into<Bind>) -> Self {
        self.filters.push(Filter::Eq {
            column,
            value: value.into(),
        });
        self
    }

    /// `(first = a OR second = b)`; a `Bind::Null` side never matches
    pub fn match_either(
        mut self,
        first: &'static str,
        a: impl Into<Bind>,
        second: &'static str,
        b: impl Into<Bind>,
    ) -> Self {
        self.filters.push(Filter::Either {
            first: (first, a.into()),
            second: (second, b.into()),
        });
        self
    }

    /// Case-insensitive substring match
    pub fn match_contains(mut self, column: &'static str, needle: &str) -> Self {
        self.filters.push(Filter::Contains {
            column,
            needle: needle.to_lowercase(),
        });
        self
    }

    /// Join `table AS alias ON alias.foreign = local`
    pub fn lookup(
        mut self,
        kind: JoinKind,
        table: &'static str,
        alias: &'static str,
        foreign: &'static str,
        local: &'static str,
    ) -> Self {
        self.lookups.push(Lookup {
            kind,
            table,
            alias,
            foreign,
            local,
        });
        self
    }

    /// Computed field: number of `table` rows whose `foreign` column equals `local`
    pub fn add_count(
        mut self,
        name: &'static str,
        table: &'static str,
        foreign: &'static str,
        local: &'static str,
    ) -> Self {
        self.computed.push(Computed::Count {
            name,
            table,
            foreign,
            local,
        });
        self
    }

    /// Computed field: whether a `table` row links `local` (via `foreign`)
    /// with `value` (via `column`)
    pub fn add_exists(
        mut self,
        name: &'static str,
        table: &'static str,
        foreign: &'static str,
        local: &'static str,
        column: &'static str,
        value: impl Into<Bind>,
    ) -> Self {
        self.computed.push(Computed::Exists {
            name,
            table,
            foreign,
            local,
            column,
            value: value.into(),
        });
        self
    }

    /// Select these expressions; computed fields are appended after them
    pub fn project(mut self, fields: &[&'static str]) -> Self {
        self.fields.extend_from_slice(fields);
        self
    }

    pub fn sort(mut self, column: &'static str, direction: Direction) -> Self {
        self.sort.push((column, direction));
        self
    }

    pub fn skip(mut self, offset: i64) -> Self {
        self.skip = Some(offset.max(0));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render the full query
    pub fn build(&self) -> QueryBuilder<'static, Sqlite> {
        let mut query = QueryBuilder::new("SELECT ");

        let mut separated = false;
        for field in &self.fields {
            if separated {
                query.push(", ");
            }
            query.push(*field);
            separated = true;
        }
        if self.fields.is_empty() {
            query.push(self.alias).push(".*");
            separated = true;
        }
        for computed in &self.computed {
            if separated {
                query.push(", ");
            }
            self.push_computed(&mut query, computed);
            separated = true;
        }

        self.push_source(&mut query);

        if !self.sort.is_empty() {
            query.push(" ORDER BY ");
            for (i, (column, direction)) in self.sort.iter().enumerate() {
                if i > 0 {
                    query.push(", ");
                }
                query.push(*column).push(" ").push(direction.as_sql());
            }
        }

        match (self.limit, self.skip) {
            (Some(limit), skip) => {
                query.push(" LIMIT ").push_bind(limit);
                if let Some(skip) = skip {
                    query.push(" OFFSET ").push_bind(skip);
                }
            }
            (None, Some(skip)) => {
                query.push(" LIMIT -1 OFFSET ").push_bind(skip);
            }
            (None, None) => {}
        }

        query
    }

    /// Render `SELECT COUNT(*)` over the same source, lookups and matches
    pub fn count(&self) -> QueryBuilder<'static, Sqlite> {
        let mut query = QueryBuilder::new("SELECT COUNT(*)");
        self.push_source(&mut query);
        query
    }

    pub async fn fetch_all<T>(&self, db: &SqlitePool) -> ApiResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let mut query = self.build();
        let rows = query.build_query_as::<T>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn fetch_optional<T>(&self, db: &SqlitePool) -> ApiResult<Option<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let mut query = self.build();
        let row = query.build_query_as::<T>().fetch_optional(db).await?;
        Ok(row)
    }

    pub async fn fetch_count(&self, db: &SqlitePool) -> ApiResult<i64> {
        let mut query = self.count();
        let total = query.build_query_scalar::<i64>().fetch_one(db).await?;
        Ok(total)
    }

    /// Count all matches, then fetch the requested page
    pub async fn paginate<T>(self, db: &SqlitePool, pagination: Pagination) -> ApiResult<Page<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let total = self.fetch_count(db).await?;
        let docs = self
            .skip(pagination.offset())
            .limit(pagination.limit)
            .fetch_all(db)
            .await?;
        Ok(Page::new(docs, total, pagination))
    }

    fn push_source(&self, query: &mut QueryBuilder<'static, Sqlite>) {
        query
            .push(" FROM ")
            .push(self.source)
            .push(" ")
            .push(self.alias);

        for lookup in &self.lookups {
            let join = match lookup.kind {
                JoinKind::Left => " LEFT JOIN ",
                JoinKind::Inner => " INNER JOIN ",
            };
            query
                .push(join)
                .push(lookup.table)
                .push(" ")
                .push(lookup.alias)
                .push(" ON ")
                .push(lookup.alias)
                .push(".")
                .push(lookup.foreign)
                .push(" = ")
                .push(lookup.local);
        }

        for (i, filter) in self.filters.iter().enumerate() {
            query.push(if i == 0 { " WHERE " } else { " AND " });
            match filter {
                Filter::Eq { column, value } => {
                    query.push(*column).push(" = ");
                    push_value(query, value);
                }
                Filter::Either { first, second } => {
                    query.push("(").push(first.0).push(" = ");
                    push_value(query, &first.1);
                    query.push(" OR ").push(second.0).push(" = ");
                    push_value(query, &second.1);
                    query.push(")");
                }
                Filter::Contains { column, needle } => {
                    query
                        .push("LOWER(")
                        .push(*column)
                        .push(") LIKE ")
                        .push_bind(format!("%{}%", escape_like(needle)))
                        .push(" ESCAPE '\\'");
                }
            }
        }
    }

    fn push_computed(&self, query: &mut QueryBuilder<'static, Sqlite>, computed: &Computed) {
        match computed {
            Computed::Count {
                name,
                table,
                foreign,
                local,
            } => {
                query
                    .push("(SELECT COUNT(*) FROM ")
                    .push(*table)
                    .push(" WHERE ")
                    .push(*table)
                    .push(".")
                    .push(*foreign)
                    .push(" = ")
                    .push(*local)
                    .push(") AS ")
                    .push(*name);
            }
            Computed::Exists {
                name,
                table,
                foreign,
                local,
                column,
                value,
            } => {
                query
                    .push("EXISTS (SELECT 1 FROM ")
                    .push(*table)
                    .push(" WHERE ")
                    .push(*table)
                    .push(".")
                    .push(*foreign)
                    .push(" = ")
                    .push(*local)
                    .push(" AND ")
                    .push(*table)
                    .push(".")
                    .push(*column)
                    .push(" = ");
                push_value(query, value);
                query.push(") AS ").push(*name);
            }
        }
    }
}

fn push_value(query: &mut QueryBuilder<'static, Sqlite>, value: &Bind) {
    match value {
        Bind::Text(text) => query.push_bind(text.clone()),
        Bind::Integer(n) => query.push_bind(*n),
        Bind::Bool(b) => query.push_bind(*b),
        Bind::Null => query.push_bind(Option::<String>::None),
    };
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
