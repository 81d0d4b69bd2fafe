//! Fix family registry.
//!
//! Each vulnerability family is one ordered [`StrategyChain`]; the driver
//! routes a remediation call here by rule id.

pub mod xml_entities;

use crate::engine::StrategyChain;

/// Look up the fix family registered for a rule id.
pub fn family_for(rule_id: &str) -> Option<StrategyChain> {
    match rule_id {
        xml_entities::RULE_ID => Some(xml_entities::family()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_rule_resolves_to_its_family() {
        let chain = family_for("S2755").expect("registered family");
        assert_eq!(chain.rule_id, "S2755");
        assert_eq!(chain.strategies.len(), 3);
    }

    #[test]
    fn unknown_rule_has_no_family() {
        assert!(family_for("S0000").is_none());
    }
}
