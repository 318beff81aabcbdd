// Rate Table
//
// Fixed per-resource-type rates and SKU size factors. Everything the mock
// prices is derived from this table, so identical inputs always price the
// same.

use lecout::model::billing_mode;

/// Hours in a billing month
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Storage assumed for per-GB-month resources
pub const ASSUMED_STORAGE_GB: f64 = 100.0;

/// Requests assumed for per-request resources
pub const ASSUMED_MONTHLY_REQUESTS: f64 = 1_000_000.0;

/// Pricing currency
pub const CURRENCY: &str = "USD";

/// One priced resource type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    /// Cloud provider
    pub provider: &'static str,
    /// Provider resource type
    pub resource_type: &'static str,
    /// Billing mode from [`billing_mode`]
    pub billing_mode: &'static str,
    /// Base price per unit, before SKU scaling
    pub rate_per_unit: f64,
    /// Billing unit
    pub unit: &'static str,
}

static RATES: [Rate; 6] = [
    Rate {
        provider: "aws",
        resource_type: "ec2",
        billing_mode: billing_mode::PER_HOUR,
        rate_per_unit: 0.0416,
        unit: "hour",
    },
    Rate {
        provider: "aws",
        resource_type: "rds",
        billing_mode: billing_mode::PER_HOUR,
        rate_per_unit: 0.068,
        unit: "hour",
    },
    Rate {
        provider: "aws",
        resource_type: "s3",
        billing_mode: billing_mode::PER_GB_MONTH,
        rate_per_unit: 0.023,
        unit: "GB-month",
    },
    Rate {
        provider: "aws",
        resource_type: "lambda",
        billing_mode: billing_mode::PER_REQUEST,
        rate_per_unit: 0.000_000_2,
        unit: "request",
    },
    Rate {
        provider: "azure",
        resource_type: "vm",
        billing_mode: billing_mode::PER_HOUR,
        rate_per_unit: 0.052,
        unit: "hour",
    },
    Rate {
        provider: "gcp",
        resource_type: "compute_engine",
        billing_mode: billing_mode::PER_HOUR,
        rate_per_unit: 0.0475,
        unit: "hour",
    },
];

/// Every priced resource type
pub fn all() -> &'static [Rate] {
    &RATES
}

/// Rate for a provider and resource type
pub fn lookup(provider: &str, resource_type: &str) -> Option<&'static Rate> {
    RATES
        .iter()
        .find(|r| r.provider == provider && r.resource_type == resource_type)
}

/// Size multiplier taken from the last dotted or dashed segment of a SKU
/// (`t3.medium` -> `medium`). Unknown or empty sizes price at 1.0.
pub fn sku_factor(sku: &str) -> f64 {
    let size = sku
        .rsplit(|c| c == '.' || c == '-' || c == '_')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match size.as_str() {
        "nano" => 0.125,
        "micro" => 0.25,
        "small" => 0.5,
        "medium" => 1.0,
        "large" => 2.0,
        "xlarge" => 4.0,
        "2xlarge" => 8.0,
        _ => 1.0,
    }
}

impl Rate {
    /// Unit price scaled by SKU size
    pub fn unit_price(&self, sku: &str) -> f64 {
        self.rate_per_unit * sku_factor(sku)
    }

    /// Monthly cost under the table's usage assumptions
    pub fn monthly_cost(&self, sku: &str) -> f64 {
        self.unit_price(sku) * self.monthly_units()
    }

    /// Units billed per month
    pub fn monthly_units(&self) -> f64 {
        match self.billing_mode {
            billing_mode::PER_HOUR => HOURS_PER_MONTH,
            billing_mode::PER_GB_MONTH => ASSUMED_STORAGE_GB,
            billing_mode::PER_REQUEST => ASSUMED_MONTHLY_REQUESTS,
            _ => 1.0,
        }
    }

    /// How the monthly figure is derived
    pub fn billing_detail(&self, sku: &str) -> String {
        format!(
            "{:.6} {CURRENCY}/{} x {} {}s",
            self.unit_price(sku),
            self.unit,
            self.monthly_units(),
            self.unit
        )
    }
}
