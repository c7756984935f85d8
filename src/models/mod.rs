// Models module - Database entity representations
//
// Query methods take `impl PgExecutor` so the same helpers run against the
// pool or inside a transaction.

pub mod check_in;
pub mod customer;
pub mod ledger_entry;
pub mod product;
pub mod redemption_request;
pub mod venue_settings;

pub use check_in::CheckIn;
pub use customer::{Customer, Tier};
pub use ledger_entry::{LedgerEntry, PointCategory};
pub use product::Product;
pub use redemption_request::{RedemptionRequest, RedemptionStatus};
pub use venue_settings::{Thresholds, VenueSettings};
