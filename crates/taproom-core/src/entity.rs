//! # Collections & Entities
//!
//! Every persisted type is an [`Entity`]: it names the collection it lives
//! in and exposes its primary key. The store is generic over this trait, so
//! adding a collection means adding an enum variant and an impl here.
//!
//! ```text
//! ┌──────────────────┬──────────────────┬──────────────────┐
//! │ Collection       │ Entity           │ Primary key      │
//! ├──────────────────┼──────────────────┼──────────────────┤
//! │ products         │ Product          │ id               │
//! │ sales            │ Sale             │ id               │
//! │ receipts         │ Receipt          │ saleId           │
//! │ audit_logs       │ AuditLogEntry    │ id               │
//! │ shifts           │ DayShift         │ YYYY-MM-DD       │
//! │ settings         │ AppSettings      │ "global"         │
//! │ ...              │ ...              │ id               │
//! └──────────────────┴──────────────────┴──────────────────┘
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::records::{
    AppSettings, AuditLogEntry, CashUp, DayShift, DaySnapshot, Employee, Expense, SuspendedOrder,
};
use crate::types::{Product, Receipt, Sale};
use crate::validation::{
    validate_identifier, validate_pin, validate_product_name, validate_quantity,
    validate_tax_rate_bps, ValidationResult,
};

/// Named collections of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Sales,
    Expenses,
    CashUps,
    Employees,
    Settings,
    Shifts,
    AuditLogs,
    Receipts,
    Snapshots,
    SuspendedOrders,
}

impl Collection {
    pub const ALL: [Collection; 11] = [
        Collection::Products,
        Collection::Sales,
        Collection::Expenses,
        Collection::CashUps,
        Collection::Employees,
        Collection::Settings,
        Collection::Shifts,
        Collection::AuditLogs,
        Collection::Receipts,
        Collection::Snapshots,
        Collection::SuspendedOrders,
    ];

    /// SQLite table backing this collection.
    pub const fn table_name(self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Sales => "sales",
            Collection::Expenses => "expenses",
            Collection::CashUps => "cashups",
            Collection::Employees => "employees",
            Collection::Settings => "settings",
            Collection::Shifts => "shifts",
            Collection::AuditLogs => "audit_logs",
            Collection::Receipts => "receipts",
            Collection::Snapshots => "snapshots",
            Collection::SuspendedOrders => "suspended_orders",
        }
    }

    /// Position in [`Collection::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// A document stored in one collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    const COLLECTION: Collection;

    /// Primary key.
    fn id(&self) -> &str;

    /// Checked before every write.
    fn validate(&self) -> ValidationResult<()> {
        validate_identifier("id", self.id())
    }
}

// =============================================================================
// Entity Implementations
// =============================================================================

impl Entity for Product {
    const COLLECTION: Collection = Collection::Products;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        Product::validate(self)
    }
}

impl Entity for Sale {
    const COLLECTION: Collection = Collection::Sales;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_identifier("id", &self.id)?;
        for item in &self.items {
            validate_quantity(item.quantity)?;
        }
        Ok(())
    }
}

impl Entity for Receipt {
    const COLLECTION: Collection = Collection::Receipts;

    fn id(&self) -> &str {
        &self.sale_id
    }
}

impl Entity for AuditLogEntry {
    const COLLECTION: Collection = Collection::AuditLogs;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for CashUp {
    const COLLECTION: Collection = Collection::CashUps;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for DayShift {
    const COLLECTION: Collection = Collection::Shifts;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        crate::validation::validate_day_key(&self.id)
    }
}

impl Entity for Expense {
    const COLLECTION: Collection = Collection::Expenses;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Employee {
    const COLLECTION: Collection = Collection::Employees;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_identifier("id", &self.id)?;
        validate_product_name(&self.name)?;
        validate_pin(&self.pin)
    }
}

impl Entity for AppSettings {
    const COLLECTION: Collection = Collection::Settings;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_identifier("id", &self.id)?;
        validate_pin(&self.admin_pin)?;
        validate_tax_rate_bps(self.vat_rate_bps)
    }
}

impl Entity for DaySnapshot {
    const COLLECTION: Collection = Collection::Snapshots;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for SuspendedOrder {
    const COLLECTION: Collection = Collection::SuspendedOrders;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_indexes_match_all() {
        for (i, collection) in Collection::ALL.iter().enumerate() {
            assert_eq!(collection.index(), i);
        }
    }

    #[test]
    fn test_table_names_unique() {
        let mut names: Vec<_> = Collection::ALL.iter().map(|c| c.table_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Collection::ALL.len());
    }
}
