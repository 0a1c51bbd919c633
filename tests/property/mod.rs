// tests/property/mod.rs

mod invariants_test;
