//! 用户列表查询：分页、排序（`field:order`）与搜索（`field:keyword`）

use super::models::User;
use crate::error::{Result, UserError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PAGE_NUMBER: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// 可排序 / 可搜索的用户字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserField {
    Id,
    Name,
    Email,
}

impl UserField {
    fn value<'a>(&self, user: &'a User) -> &'a str {
        match self {
            UserField::Id => &user.id,
            UserField::Name => &user.name,
            UserField::Email => &user.email,
        }
    }
}

impl FromStr for UserField {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "id" => Ok(UserField::Id),
            "name" => Ok(UserField::Name),
            "email" => Ok(UserField::Email),
            other => Err(UserError::Validation(format!("field tidak dikenal: {other}"))),
        }
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserField::Id => "id",
            UserField::Name => "name",
            UserField::Email => "email",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// 只有 `desc` 表示降序，其余一律升序
    fn parse_lenient(s: &str) -> Self {
        if s.trim() == "desc" {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// 排序规则，默认 `email:asc`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: UserField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: UserField::Email,
            order: SortOrder::Asc,
        }
    }
}

impl SortSpec {
    pub fn new(field: UserField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// 比较两个用户；字段相同时按 id 排，保证分页稳定
    pub fn compare(&self, a: &User, b: &User) -> Ordering {
        let ordering = self
            .field
            .value(a)
            .cmp(self.field.value(b))
            .then_with(|| a.id.cmp(&b.id));
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortSpec {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self> {
        let (field, order) = match s.split_once(':') {
            Some((field, order)) => (field, SortOrder::parse_lenient(order)),
            None => (s, SortOrder::Asc),
        };
        Ok(Self {
            field: field.parse()?,
            order,
        })
    }
}

/// 搜索条件：对指定字段做大小写不敏感的子串匹配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpec {
    pub field: UserField,
    pub term: String,
}

impl SearchSpec {
    pub fn new(field: UserField, term: impl Into<String>) -> Self {
        Self {
            field,
            term: term.into().to_lowercase(),
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        self.field.value(user).to_lowercase().contains(&self.term)
    }
}

impl FromStr for SearchSpec {
    type Err = UserError;

    /// `field:keyword`；不带字段名时按 email 搜索
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((field, term)) => Ok(Self::new(field.parse()?, term)),
            None => Ok(Self::new(UserField::Email, s)),
        }
    }
}

/// 已校验的列表查询参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page_number: u64,
    pub page_size: u64,
    pub sort: SortSpec,
    pub search: Option<SearchSpec>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page_number: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortSpec::default(),
            search: None,
        }
    }
}

impl ListQuery {
    /// 从原始字符串参数解析；空字符串视为缺省
    pub fn parse(
        page_number: Option<&str>,
        page_size: Option<&str>,
        sort: Option<&str>,
        search: Option<&str>,
    ) -> Result<Self> {
        let page_number = parse_positive("page_number", page_number)?.unwrap_or(DEFAULT_PAGE_NUMBER);
        let page_size = parse_positive("page_size", page_size)?.unwrap_or(DEFAULT_PAGE_SIZE);
        let sort = match non_empty(sort) {
            Some(raw) => raw.parse()?,
            None => SortSpec::default(),
        };
        let search = non_empty(search).map(str::parse).transpose()?;
        Ok(Self {
            page_number,
            page_size,
            sort,
            search,
        })
    }

    pub fn with_page(mut self, page_number: u64, page_size: u64) -> Self {
        self.page_number = page_number.max(1);
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_search(mut self, search: SearchSpec) -> Self {
        self.search = Some(search);
        self
    }

    /// 页码，至少为 1
    pub fn page(&self) -> u64 {
        self.page_number.max(1)
    }

    /// 每页条数，至少为 1
    pub fn limit(&self) -> u64 {
        self.page_size.max(1)
    }

    /// 需要跳过的记录数
    pub fn skip(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_positive(name: &str, raw: Option<&str>) -> Result<Option<u64>> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(value) if value >= 1 => Ok(Some(value)),
        _ => Err(UserError::Validation(format!(
            "{name} harus berupa bilangan bulat positif"
        ))),
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    pub page_number: u64,
    pub page_size: u64,
    /// 当前页记录数（不是总数）
    pub count: u64,
    pub total_pages: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(query: &ListQuery, total: u64, data: Vec<T>) -> Self {
        let page_number = query.page();
        let total_pages = total.div_ceil(query.limit());
        Self {
            page_number,
            page_size: query.limit(),
            count: data.len() as u64,
            total_pages,
            has_previous_page: page_number > 1,
            has_next_page: page_number < total_pages,
            data,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page_number: self.page_number,
            page_size: self.page_size,
            count: self.count,
            total_pages: self.total_pages,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}
