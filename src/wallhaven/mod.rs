use clap::ValueEnum;
use serde::Deserialize;

pub mod search;

pub use search::WallhavenApi;

/// Sort key accepted by the search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sorting {
    /// Newest uploads first
    DateAdded,
    Relevance,
    Random,
    Views,
    Favorites,
    /// Top-ranked wallpapers
    Toplist,
}

impl Sorting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sorting::DateAdded => "date_added",
            Sorting::Relevance => "relevance",
            Sorting::Random => "random",
            Sorting::Views => "views",
            Sorting::Favorites => "favorites",
            Sorting::Toplist => "toplist",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    Desc,
    Asc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Desc => "desc",
            Order::Asc => "asc",
        }
    }
}

/// One search result: a direct link to the full-size image
#[derive(Debug, Clone, Deserialize)]
pub struct Wallpaper {
    #[serde(default)]
    pub id: String,
    pub path: String,
}

/// Per-request parameters; categories and purity come from the client
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub sorting: Sorting,
    pub order: Order,
    pub page: u32,
    pub keyword: Option<String>,
}

impl SearchQuery {
    pub fn new(sorting: Sorting, order: Order) -> Self {
        Self {
            sorting,
            order,
            page: 1,
            keyword: None,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }
}
