//! 通用查询条件
//!
//! 条件作用于实体序列化后的字段（支持 `a.b` 形式的嵌套路径）。
//! 内存实现直接对 JSON 求值，Postgres 实现翻译为 JSONB 运算，两者语义一致。

use serde_json::Value;

/// 单个查询条件
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// 字段文本等于给定值
    Eq { field: String, value: String },
    /// 字段文本属于给定集合之一
    In { field: String, values: Vec<String> },
    /// 数组字段包含给定值
    Contains { field: String, value: String },
}

/// 关键字搜索（不区分大小写的子串匹配，任一字段命中即可）
#[derive(Debug, Clone, PartialEq)]
pub struct TextSearch {
    pub fields: Vec<String>,
    pub term: String,
}

/// 排序方式（按创建时间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// 查询条件集合（条件之间为 AND）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    conditions: Vec<Condition>,
    search: Option<TextSearch>,
    sort: SortOrder,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl ToString) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// 值为 None 时忽略该条件
    pub fn eq_opt<V: ToString>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    pub fn any_of<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        self.conditions.push(Condition::In {
            field: field.to_string(),
            values: values.into_iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    pub fn contains(mut self, field: &str, value: impl ToString) -> Self {
        self.conditions.push(Condition::Contains {
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// 空白关键字忽略
    pub fn search(mut self, fields: &[&str], term: Option<&str>) -> Self {
        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
            self.search = Some(TextSearch {
                fields: fields.iter().map(|f| f.to_string()).collect(),
                term: term.to_string(),
            });
        }
        self
    }

    pub fn sort(mut self, order: SortOrder) -> Self {
        self.sort = order;
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn text_search(&self) -> Option<&TextSearch> {
        self.search.as_ref()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    /// 对实体的 JSON 形式求值
    pub fn matches(&self, doc: &Value) -> bool {
        let conditions_ok = self.conditions.iter().all(|condition| match condition {
            Condition::Eq { field, value } => {
                field_text(doc, field).is_some_and(|text| &text == value)
            }
            Condition::In { field, values } => {
                field_text(doc, field).is_some_and(|text| values.contains(&text))
            }
            Condition::Contains { field, value } => match lookup(doc, field) {
                Some(Value::Array(items)) => items
                    .iter()
                    .any(|item| scalar_text(item).is_some_and(|text| &text == value)),
                _ => false,
            },
        });

        if !conditions_ok {
            return false;
        }

        match &self.search {
            Some(search) => {
                let needle = search.term.to_lowercase();
                search.fields.iter().any(|field| {
                    field_text(doc, field).is_some_and(|text| text.to_lowercase().contains(&needle))
                })
            }
            None => true,
        }
    }
}

/// 拆分嵌套路径
pub fn field_path(field: &str) -> Vec<String> {
    field.split('.').map(str::to_string).collect()
}

fn lookup<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(doc, |current, segment| current.get(segment))
}

fn field_text(doc: &Value, field: &str) -> Option<String> {
    lookup(doc, field).and_then(scalar_text)
}

// 与 Postgres `#>>` 的文本化结果保持一致
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
