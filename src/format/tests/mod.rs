//! Unit tests for annotation-set serialization.
//!
//! These tests cover the JSON layout, validation of loaded sets, and
//! save/load round trips through the board.

mod roundtrip_tests;
