//! Integration tests for poly-guard

mod e2e_test;
mod exit_test;
mod ledger_test;
mod monitor_test;
mod risk_test;
