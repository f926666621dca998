//! Paper-trading position ledger
//!
//! Ordered record of every paper trade. Positions are never deleted; closing
//! or resolving one marks it terminal and fills in its audit fields.

mod position;

pub use position::{
    Ledger, LedgerError, OpenRequest, PortfolioStatus, Position, PositionStatus, Side,
};

use crate::store::JsonStore;

/// File-backed ledger store
pub type LedgerStore = JsonStore<Ledger>;
