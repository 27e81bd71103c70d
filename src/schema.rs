/// Column-name constants for contract-summaries tables.
/// Single source of truth - exported to Python via PyO3.

// ── Spending table columns (contract_spending_by_date) ──────────────────────
pub mod spending {
    pub const OWNER_ORG: &str = "owner_org";
    pub const VENDOR: &str = "vendor_normalized";
    pub const CATEGORY: &str = "category";
    pub const IT_SUBCATEGORY: &str = "it_subcategory";
    pub const FISCAL_YEAR_SHORT: &str = "fiscal_year_short";
    pub const DAILY_VALUE: &str = "daily_contract_value";
    pub const DAILY_VALUE_CONSTANT: &str = "daily_contract_value_constant";

    pub const TEXT: [&str; 4] = [OWNER_ORG, VENDOR, CATEGORY, IT_SUBCATEGORY];
    pub const VALUES: [&str; 2] = [DAILY_VALUE, DAILY_VALUE_CONSTANT];

    pub const REQUIRED: [&str; 7] = [
        OWNER_ORG,
        VENDOR,
        CATEGORY,
        IT_SUBCATEGORY,
        FISCAL_YEAR_SHORT,
        DAILY_VALUE,
        DAILY_VALUE_CONSTANT,
    ];
}

// ── Owner-org reference columns ─────────────────────────────────────────────
pub mod owner_org_types {
    pub const OWNER_ORG: &str = "owner_org";
    pub const IS_CORE: &str = "is_core";
    pub const IS_DND: &str = "is_dnd";

    pub const REQUIRED: [&str; 3] = [OWNER_ORG, IS_CORE, IS_DND];
}

// ── Summary output columns ──────────────────────────────────────────────────
pub mod output {
    pub const FISCAL_YEAR: &str = "fiscal_year";
    pub const TOTAL: &str = "total";
    pub const TOTAL_CONSTANT_DOLLARS: &str = "total_constant_dollars";
    pub const PERCENTAGE: &str = "percentage";
    pub const COUNT: &str = "count";
    pub const COUNT_PERCENTAGE: &str = "count_percentage";
}

// ── Meta output columns ─────────────────────────────────────────────────────
pub mod meta {
    pub const VENDOR: &str = "vendor";
    pub const MEAN_ANNUAL_TOTAL: &str = "mean_annual_total";
    pub const START_FISCAL_YEAR: &str = "start_fiscal_year";
    pub const END_FISCAL_YEAR: &str = "end_fiscal_year";
    pub const COVERAGE_YEARS: &str = "coverage_years";
    pub const SUMMARY_TYPE: &str = "summary_type";
    pub const TOTAL_DISPLAY: &str = "total_display";
}

// ── Summary type tags ───────────────────────────────────────────────────────
pub mod summary_type {
    pub const CORE: &str = "core";
    pub const DND: &str = "dnd";
    pub const ALL: &str = "all";
}
