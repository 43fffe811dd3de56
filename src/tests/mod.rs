//! Top-level test harness: colocated unit tests live inside each module's
//! own `#[cfg(test)] mod tests`; this tree holds cross-cutting
//! property-based tests and the S1-S7 end-to-end scenarios instead.

mod property;
