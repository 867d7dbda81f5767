//! Cross-crate scenarios: scheduler, economy and registry wired through
//! the shared bus the way a host wires them.

pub mod economy;
#[cfg(test)]
pub mod fixtures;
pub mod flows;
