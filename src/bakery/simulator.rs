//! Balance simulator for the bakery economy.
//! Run with: cargo test simulate_shop -- --nocapture
