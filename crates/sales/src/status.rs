use serde::{Deserialize, Serialize};

/// Order export status.
///
/// Only the two export states are interpreted here; every other literal the
/// store holds is carried through untouched as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    /// Not yet written to any export file.
    NotExported,
    /// Included in a committed export.
    Exported,
    Other(String),
}

impl OrderStatus {
    pub const NOT_EXPORTED: &'static str = "未出力";
    pub const EXPORTED: &'static str = "CSV出力済み";

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::NotExported => Self::NOT_EXPORTED,
            OrderStatus::Exported => Self::EXPORTED,
            OrderStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            Self::NOT_EXPORTED => OrderStatus::NotExported,
            Self::EXPORTED => OrderStatus::Exported,
            other => OrderStatus::Other(other.to_string()),
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        OrderStatus::parse(&value)
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Status restriction applied to the export selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    All,
    Exactly(OrderStatus),
}

impl StatusFilter {
    pub const ALL: &'static str = "all";

    /// Resolve the request literal: `all`, missing or blank means no restriction.
    pub fn from_request(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(Self::ALL) => StatusFilter::All,
            Some(other) => StatusFilter::Exactly(OrderStatus::parse(other)),
        }
    }

    pub fn matches(&self, status: &OrderStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Exactly(wanted) => wanted == status,
        }
    }

    /// The exact status literal to match, if any (used for SQL binding).
    pub fn required_status(&self) -> Option<&str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Exactly(status) => Some(status.as_str()),
        }
    }

    pub fn as_str(&self) -> &str {
        self.required_status().unwrap_or(Self::ALL)
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        StatusFilter::Exactly(OrderStatus::NotExported)
    }
}

impl opsdesk_core::ValueObject for StatusFilter {}
