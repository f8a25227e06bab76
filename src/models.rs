use chrono::NaiveDate;

pub const UNKNOWN: &str = "unknown";
pub const UNKNOWN_ITEM: &str = "unknown_item";
pub const COMPUTED_TOTAL: &str = "computed_total";

/// The columns the cleaner understands. Anything else in the export is
/// carried through as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Item,
    Quantity,
    PricePerUnit,
    TotalSpent,
    PaymentMethod,
    Location,
    TransactionDate,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Item,
        Field::Quantity,
        Field::PricePerUnit,
        Field::TotalSpent,
        Field::PaymentMethod,
        Field::Location,
        Field::TransactionDate,
    ];

    /// Header as it appears in the raw export.
    pub fn source_header(&self) -> &'static str {
        match self {
            Self::Item => "Item",
            Self::Quantity => "Quantity",
            Self::PricePerUnit => "Price Per Unit",
            Self::TotalSpent => "Total Spent",
            Self::PaymentMethod => "Payment Method",
            Self::Location => "Location",
            Self::TransactionDate => "Transaction Date",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Quantity => "quantity",
            Self::PricePerUnit => "price_per_unit",
            Self::TotalSpent => "total_spent",
            Self::PaymentMethod => "payment_method",
            Self::Location => "location",
            Self::TransactionDate => "transaction_date",
        }
    }
}

/// Header row plus text cells straight from the CSV reader. A cell becomes
/// `None` once it has been recognised as a missing-value sentinel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Where a column's values live inside a [`Transaction`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Column {
    Field(Field),
    /// Index into [`Transaction::extra`].
    Passthrough(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    pub item: Option<String>,
    pub quantity: Option<f64>,
    pub price_per_unit: Option<f64>,
    pub total_spent: Option<f64>,
    pub payment_method: Option<String>,
    pub location: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub computed_total: Option<f64>,
    pub extra: Vec<Option<String>>,
}

impl Transaction {
    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Item => self.item.as_deref(),
            Field::PaymentMethod => self.payment_method.as_deref(),
            Field::Location => self.location.as_deref(),
            _ => None,
        }
    }
}

/// The working table. `headers[i]` names `columns[i]`; `computed_total` is
/// not listed and is always written last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTable {
    pub headers: Vec<String>,
    pub columns: Vec<Column>,
    pub rows: Vec<Transaction>,
}

impl SalesTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
