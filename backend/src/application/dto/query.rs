use serde_json::{json, Value};

/// Condition applied to a single database property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterCondition {
    /// `{ "status": { "equals": … } }`
    StatusEquals(String),
    /// `{ "rich_text": { "equals": … } }`
    RichTextEquals(String),
    /// `{ "multi_select": { "contains": … } }`
    MultiSelectContains(String),
}

impl FilterCondition {
    fn to_json(&self) -> (&'static str, Value) {
        match self {
            FilterCondition::StatusEquals(value) => ("status", json!({ "equals": value })),
            FilterCondition::RichTextEquals(value) => ("rich_text", json!({ "equals": value })),
            FilterCondition::MultiSelectContains(value) => {
                ("multi_select", json!({ "contains": value }))
            }
        }
    }
}

/// Server-side filter for a database query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseFilter {
    Property {
        property: String,
        condition: FilterCondition,
    },
    And(Vec<DatabaseFilter>),
}

impl DatabaseFilter {
    pub fn property(property: impl Into<String>, condition: FilterCondition) -> Self {
        DatabaseFilter::Property {
            property: property.into(),
            condition,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            DatabaseFilter::Property {
                property,
                condition,
            } => {
                let (kind, body) = condition.to_json();
                let mut filter = serde_json::Map::new();
                filter.insert("property".to_string(), Value::String(property.clone()));
                filter.insert(kind.to_string(), body);
                Value::Object(filter)
            }
            DatabaseFilter::And(filters) => {
                json!({ "and": filters.iter().map(DatabaseFilter::to_json).collect::<Vec<_>>() })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub property: String,
    pub direction: SortDirection,
}

/// Filter and ordering for listing pages of a database
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatabaseQuery {
    pub filter: Option<DatabaseFilter>,
    pub sorts: Vec<SortSpec>,
}

impl DatabaseQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages whose status property equals `status`, newest `sort_property` first
    pub fn published(
        status_property: impl Into<String>,
        status: impl Into<String>,
        sort_property: impl Into<String>,
    ) -> Self {
        DatabaseQuery::new()
            .with_filter(DatabaseFilter::property(
                status_property,
                FilterCondition::StatusEquals(status.into()),
            ))
            .sorted_by(sort_property, SortDirection::Descending)
    }

    pub fn with_filter(mut self, filter: DatabaseFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Add a condition, combining with any existing filter through `and`
    pub fn and_filter(mut self, filter: DatabaseFilter) -> Self {
        self.filter = Some(match self.filter.take() {
            None => filter,
            Some(DatabaseFilter::And(mut filters)) => {
                filters.push(filter);
                DatabaseFilter::And(filters)
            }
            Some(existing) => DatabaseFilter::And(vec![existing, filter]),
        });
        self
    }

    pub fn sorted_by(mut self, property: impl Into<String>, direction: SortDirection) -> Self {
        self.sorts.push(SortSpec {
            property: property.into(),
            direction,
        });
        self
    }

    /// Request body for one page of results
    pub fn to_request_body(&self, page_size: u32, start_cursor: Option<&str>) -> Value {
        let mut body = serde_json::Map::new();
        if let Some(filter) = &self.filter {
            body.insert("filter".to_string(), filter.to_json());
        }
        if !self.sorts.is_empty() {
            let sorts = self
                .sorts
                .iter()
                .map(|sort| json!({ "property": sort.property, "direction": sort.direction.as_str() }))
                .collect();
            body.insert("sorts".to_string(), Value::Array(sorts));
        }
        body.insert("page_size".to_string(), json!(page_size));
        if let Some(cursor) = start_cursor {
            body.insert("start_cursor".to_string(), json!(cursor));
        }
        Value::Object(body)
    }
}
