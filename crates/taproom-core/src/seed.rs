//! # Seed Data
//!
//! Defaults written to a fresh store and used as the fallback when the
//! products, employees or settings collections are empty.

use crate::money::Money;
use crate::records::{AppSettings, Employee, Role, SETTINGS_ID};
use crate::types::{PourOption, Product};

/// Starting catalogue, staff and settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedData {
    pub products: Vec<Product>,
    pub employees: Vec<Employee>,
    pub settings: AppSettings,
}

fn pour(label: &str, volume: i64, price_major: i64) -> PourOption {
    PourOption {
        label: label.to_string(),
        volume,
        price: Money::from_major(price_major),
    }
}

fn employee(id: &str, company_id: &str, name: &str, role: Role, pin: &str) -> Employee {
    Employee {
        id: id.to_string(),
        company_id: company_id.to_string(),
        name: name.to_string(),
        role,
        pin: pin.to_string(),
    }
}

impl Default for SeedData {
    fn default() -> Self {
        let products = vec![
            Product::bottle(
                "1",
                "Guinness 500ml",
                Money::from_major(180),
                Money::from_major(250),
                45,
                10,
            ),
            Product::bottle(
                "2",
                "Tusker Lager",
                Money::from_major(150),
                Money::from_major(220),
                120,
                20,
            ),
            Product::drum(
                "drum-1",
                "Premium Whiskey Drum",
                Money::from_major(15000),
                50_000,
                35_000,
                vec![
                    pour("50ml", 50, 150),
                    pour("250ml", 250, 600),
                    pour("500ml", 500, 1100),
                    pour("1000ml", 1000, 2000),
                ],
                5_000,
            ),
        ];

        let employees = vec![
            employee("e1", "GXY-001", "John Admin", Role::Admin, "1234"),
            employee("e2", "GXY-002", "Alice Cashier", Role::Cashier, "0000"),
        ];

        let settings = AppSettings {
            id: SETTINGS_ID.to_string(),
            store_name: "Galaxy Inn".to_string(),
            store_phone: String::new(),
            store_address: String::new(),
            admin_pin: "1234".to_string(),
            locked_tabs: Vec::new(),
            webhook_url: None,
            boss_email: None,
            currency: "KSH".to_string(),
            vat_rate_bps: 1600,
            session_timeout: 15,
        };

        SeedData {
            products,
            employees,
            settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;

    #[test]
    fn test_seed_is_valid() {
        let seed = SeedData::default();
        for product in &seed.products {
            product.validate().unwrap();
        }
        for e in &seed.employees {
            Entity::validate(e).unwrap();
        }
        Entity::validate(&seed.settings).unwrap();
    }
}
