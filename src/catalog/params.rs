//! Search parameters
//!
//! [`SearchParams`] is what arrives from the outside: every key optional,
//! numbers possibly sent as strings, lists possibly sent as one
//! comma-separated string. [`SearchQuery`] is the normalized form the search
//! runs on, with defaults applied and the `sort`/`stock` strings closed into
//! enums.

use serde::Deserialize;

use crate::query::{Filter, OrderDirection};

pub const DEFAULT_MIN_PRICE: f64 = 0.0;
pub const DEFAULT_MAX_PRICE: f64 = 100_000.0;
pub const DEFAULT_PAGE_NUMBER: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Raw, loosely-typed search input
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    pub category: Option<String>,
    pub colors: Option<ListParam>,
    pub sizes: Option<ListParam>,
    pub min_price: Option<NumberParam>,
    pub max_price: Option<NumberParam>,
    pub min_discount: Option<NumberParam>,
    pub sort: Option<String>,
    pub stock: Option<String>,
    pub page_number: Option<NumberParam>,
    pub page_size: Option<NumberParam>,
}

/// A list given either as a list or as one delimited string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListParam {
    List(Vec<String>),
    Delimited(String),
}

impl ListParam {
    /// `"red, blue"` becomes `["red", "blue"]`; a list is kept as given
    pub fn into_values(self) -> Vec<String> {
        match self {
            ListParam::List(values) => values,
            ListParam::Delimited(text) => text.split(',').map(|s| s.trim().to_string()).collect(),
        }
    }
}

/// A number given as a number or as text
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberParam {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumberParam {
    /// Integer value, reading only the leading digits of text (`"12abc"` is 12)
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            NumberParam::Int(i) => Some(*i),
            NumberParam::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            NumberParam::Float(_) => None,
            NumberParam::Text(text) => leading_integer(text),
        }
    }

    /// Numeric value; text must be a whole number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            NumberParam::Int(i) => Some(*i as f64),
            NumberParam::Float(f) => Some(*f),
            NumberParam::Text(text) => text.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        }
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

impl SearchParams {
    /// Parse a URL query string such as
    /// `category=shirts&colors=red,blue&minPrice=100&pageNumber=2`.
    ///
    /// A repeated `colors` or `sizes` key collects into a list. Unknown keys
    /// are ignored.
    pub fn from_query_string(query: &str) -> Self {
        let mut params = SearchParams::default();
        let mut colors = Vec::new();
        let mut sizes = Vec::new();

        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = value.into_owned();
            match key.as_ref() {
                "category" => params.category = Some(value),
                "colors" => colors.push(value),
                "sizes" => sizes.push(value),
                "minPrice" => params.min_price = Some(NumberParam::Text(value)),
                "maxPrice" => params.max_price = Some(NumberParam::Text(value)),
                "minDiscount" => params.min_discount = Some(NumberParam::Text(value)),
                "sort" => params.sort = Some(value),
                "stock" => params.stock = Some(value),
                "pageNumber" => params.page_number = Some(NumberParam::Text(value)),
                "pageSize" => params.page_size = Some(NumberParam::Text(value)),
                _ => {}
            }
        }

        params.colors = collect_list(colors);
        params.sizes = collect_list(sizes);
        params
    }
}

fn collect_list(mut values: Vec<String>) -> Option<ListParam> {
    match values.len() {
        0 => None,
        1 => values.pop().map(ListParam::Delimited),
        _ => Some(ListParam::List(values)),
    }
}

/// Sort order of search results, always by discounted price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    PriceLowToHigh,
    PriceHighToLow,
}

impl SortOrder {
    /// `price_low` or no value sorts ascending; any other value descending
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            None | Some("price_low") => SortOrder::PriceLowToHigh,
            Some(_) => SortOrder::PriceHighToLow,
        }
    }

    pub fn direction(self) -> OrderDirection {
        match self {
            SortOrder::PriceLowToHigh => OrderDirection::Asc,
            SortOrder::PriceHighToLow => OrderDirection::Desc,
        }
    }
}

/// Stock availability filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockFilter {
    InStock,
    OutOfStock,
    /// No constraint; also what unrecognized values mean
    #[default]
    Any,
}

impl StockFilter {
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("in_stock") => StockFilter::InStock,
            Some("out_of_stock") => StockFilter::OutOfStock,
            _ => StockFilter::Any,
        }
    }

    fn filter(self) -> Option<Filter> {
        match self {
            StockFilter::InStock => Some(Filter::gt("quantity", 0i64)),
            StockFilter::OutOfStock => Some(Filter::eq("quantity", 0i64)),
            StockFilter::Any => None,
        }
    }
}

/// Normalized search input
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub category: Option<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub min_price: f64,
    pub max_price: f64,
    pub min_discount: f64,
    pub sort: SortOrder,
    pub stock: StockFilter,
    pub page_number: i64,
    pub page_size: i64,
}

impl Default for SearchQuery {
    fn default() -> Self {
        SearchParams::default().into()
    }
}

impl From<SearchParams> for SearchQuery {
    fn from(params: SearchParams) -> Self {
        let number = |param: &Option<NumberParam>, default: f64| {
            param.as_ref().and_then(NumberParam::as_number).unwrap_or(default)
        };
        let integer = |param: &Option<NumberParam>, default: i64| {
            param.as_ref().and_then(NumberParam::as_integer).unwrap_or(default)
        };

        Self {
            // an empty name filters nothing
            category: params.category.clone().filter(|name| !name.is_empty()),
            colors: params.colors.clone().map(ListParam::into_values).unwrap_or_default(),
            sizes: params.sizes.clone().map(ListParam::into_values).unwrap_or_default(),
            min_price: number(&params.min_price, DEFAULT_MIN_PRICE),
            max_price: number(&params.max_price, DEFAULT_MAX_PRICE),
            min_discount: number(&params.min_discount, 0.0),
            sort: SortOrder::from_param(params.sort.as_deref()),
            stock: StockFilter::from_param(params.stock.as_deref()),
            page_number: integer(&params.page_number, DEFAULT_PAGE_NUMBER),
            page_size: integer(&params.page_size, DEFAULT_PAGE_SIZE),
        }
    }
}

impl SearchQuery {
    /// The product filter, given the id the category name resolved to
    pub fn filter(&self, category_id: Option<&str>) -> Filter {
        let mut parts = Vec::new();

        if let Some(id) = category_id {
            parts.push(Filter::eq("category", id));
        }
        if !self.colors.is_empty() {
            parts.push(Filter::is_in("color", self.colors.iter()));
        }
        if !self.sizes.is_empty() {
            parts.push(Filter::is_in("sizes.name", self.sizes.iter()));
        }

        parts.push(Filter::between("discountedPrice", self.min_price, self.max_price));

        if self.min_discount > 0.0 {
            parts.push(Filter::gte("discountPercent", self.min_discount));
        }
        parts.extend(self.stock.filter());

        Filter::and(parts)
    }

    /// `(offset, limit)` for the requested page. A page size of zero or less
    /// means no limit; a window starting before the first product starts at it.
    pub fn window(&self) -> (usize, Option<usize>) {
        let skip = self.page_number.saturating_sub(1).saturating_mul(self.page_size);
        let offset = usize::try_from(skip).unwrap_or(0);
        let limit = usize::try_from(self.page_size).ok().filter(|&size| size > 0);
        (offset, limit)
    }

    /// `ceil(total / page_size)`; an unlimited page holds everything
    pub fn total_pages(&self, total: usize) -> i64 {
        let total = i64::try_from(total).unwrap_or(i64::MAX);
        if self.page_size > 0 {
            (total + self.page_size - 1) / self.page_size
        } else {
            total.min(1)
        }
    }
}
