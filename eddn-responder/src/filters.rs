//! Predicates deciding which inventory entries are reported.

use serde_json::Value;

/// Module shipped as standard equipment; EDDN has never accepted it in outfitting lists.
const EXCLUDED_MODULE: &str = "Int_PlanetApproachSuite";

/// A sku that marks Horizons-era content. It predates sku tagging of restricted items, so it
/// counts as public.
const LEGACY_PUBLIC_SKU: &str = "ELITE_HORIZONS_V_PLANETARY_LANDINGS";

/// Keep weapons and utilities (`Hpt_*`), standard and internal modules (`Int_*`) and armour
/// (`*_Armour_*`).
pub fn is_reportable_module(name: &str) -> bool {
    let category = starts_with_ignore_case(name, "Int_")
        || starts_with_ignore_case(name, "Hpt_")
        || name.contains("_Armour_")
        || name.contains("_armour_");

    category && name != EXCLUDED_MODULE
}

/// Entries without a sku are public. A sku marks PowerPlay or tech broker items, except the
/// legacy Horizons sku.
pub fn is_public_sku(sku: Option<&Value>) -> bool {
    match sku {
        None | Some(Value::Null) => true,
        Some(Value::String(sku)) => sku.is_empty() || sku.eq_ignore_ascii_case(LEGACY_PUBLIC_SKU),
        Some(Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_)) => false,
    }
}

/// Apply the visibility then the category filter to inventory entries, returning the names of
/// the modules to report. `name_key` differs between journal (`Name`) and CAPI (`name`) entries.
pub fn reportable_modules<'a>(
    entries: impl IntoIterator<Item = &'a Value>,
    name_key: &str,
) -> Vec<String> {
    entries
        .into_iter()
        .filter_map(Value::as_object)
        .filter(|entry| is_public_sku(entry.get("sku")))
        .filter_map(|entry| entry.get(name_key).and_then(Value::as_str))
        .filter(|name| is_reportable_module(name))
        .map(String::from)
        .collect()
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
