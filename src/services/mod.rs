// Services module - Business logic

pub mod check_in_tracker;
pub mod frequency;
pub mod ledger;
pub mod redemption;
pub mod tier;
