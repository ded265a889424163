/*!
 * Cart state container
 *
 * An explicit, injectable key-value store of cart lines with a running
 * item counter. The counter is maintained incrementally and must always
 * equal the sum of line quantities; `replace_all` recomputes it from
 * scratch when hydrating from persisted state.
 */

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Per-line personalization bag.
///
/// Known fields are typed; anything else the client sends rides along in
/// `extra` untouched so older servers never drop newer keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customizations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branding_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_method: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Customizations {
    pub fn is_empty(&self) -> bool {
        self.size.is_none()
            && self.color.is_none()
            && self.branding_text.is_none()
            && self.execution_method.is_none()
            && self.extra.is_empty()
    }

    /// Stable signature used to build cart keys, so the same product with
    /// different personalization forms distinct lines.
    pub fn signature(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for field in [
            &self.size,
            &self.color,
            &self.branding_text,
            &self.execution_method,
        ] {
            if let Some(v) = field {
                parts.push(v);
            }
        }
        parts.join("|")
    }
}

/// One line in the cart, keyed by its cart key in [`CartState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
    /// Price snapshot taken when the line was first added.
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Customizations::is_empty")]
    pub customizations: Customizations,
}

/// Derives the cart key for a product, folding in the customization
/// signature when personalization is present.
pub fn derive_cart_key(product_id: Uuid, customizations: &Customizations) -> String {
    let sig = customizations.signature();
    if sig.is_empty() {
        product_id.to_string()
    } else {
        format!("{product_id}:{sig}")
    }
}

/// Authoritative in-memory cart: cart key -> line, plus a running total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartState {
    lines: BTreeMap<String, CartLine>,
    total_items: u32,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of `product_id` under `cart_key` (derived from the
    /// customizations when not supplied). An existing line is incremented;
    /// otherwise a new line starts at quantity 1.
    pub fn add_line(
        &mut self,
        product_id: Uuid,
        cart_key: Option<String>,
        unit_price: Decimal,
        customizations: Option<Customizations>,
    ) -> &CartLine {
        let customizations = customizations.unwrap_or_default();
        let key = cart_key.unwrap_or_else(|| derive_cart_key(product_id, &customizations));
        let line = self.lines.entry(key).or_insert(CartLine {
            product_id,
            quantity: 0,
            unit_price,
            customizations,
        });
        line.quantity += 1;
        self.total_items += 1;
        line
    }

    /// Removes one unit; the line disappears when its quantity hits zero.
    /// Absent keys are a silent no-op and the counter never underflows.
    pub fn remove_line(&mut self, cart_key: &str) {
        if let Some(line) = self.lines.get_mut(cart_key) {
            line.quantity -= 1;
            self.total_items -= 1;
            if line.quantity == 0 {
                self.lines.remove(cart_key);
            }
        }
    }

    /// Drops the whole line regardless of quantity.
    pub fn delete_line(&mut self, cart_key: &str) {
        if let Some(line) = self.lines.remove(cart_key) {
            self.total_items -= line.quantity;
        }
    }

    /// Bulk-replaces the cart, recomputing the counter from the new lines.
    /// Zero-quantity lines are dropped rather than stored.
    pub fn replace_all(&mut self, map: BTreeMap<String, CartLine>) {
        self.lines = map;
        self.lines.retain(|_, line| line.quantity > 0);
        self.total_items = self.lines.values().map(|l| l.quantity).sum();
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.total_items = 0;
    }

    pub fn total_items(&self) -> u32 {
        self.total_items
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &BTreeMap<String, CartLine> {
        &self.lines
    }

    pub fn into_lines(self) -> BTreeMap<String, CartLine> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn pid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn add_then_add_increments_quantity() {
        let mut cart = CartState::new();
        cart.add_line(pid(1), None, dec!(9.99), None);
        cart.add_line(pid(1), None, dec!(9.99), None);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.lines().values().next().unwrap().quantity, 2);
    }

    #[test]
    fn different_customizations_make_distinct_lines() {
        let mut cart = CartState::new();
        let red = Customizations {
            color: Some("red".into()),
            ..Default::default()
        };
        let blue = Customizations {
            color: Some("blue".into()),
            ..Default::default()
        };
        cart.add_line(pid(1), None, dec!(5), Some(red));
        cart.add_line(pid(1), None, dec!(5), Some(blue));
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.total_items(), 2);
    }

    #[test]
    fn remove_on_absent_key_is_a_noop() {
        let mut cart = CartState::new();
        cart.remove_line("missing");
        assert_eq!(cart.total_items(), 0);
        cart.add_line(pid(1), None, dec!(1), None);
        cart.remove_line("also-missing");
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn remove_to_zero_deletes_the_line() {
        let mut cart = CartState::new();
        let key = cart.add_line(pid(1), None, dec!(1), None);
        let key = derive_cart_key(key.product_id, &key.customizations);
        cart.remove_line(&key);
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
    }

    #[test]
    fn delete_line_subtracts_full_quantity() {
        let mut cart = CartState::new();
        for _ in 0..3 {
            cart.add_line(pid(1), Some("k".into()), dec!(2), None);
        }
        cart.add_line(pid(2), Some("other".into()), dec!(2), None);
        cart.delete_line("k");
        assert_eq!(cart.total_items(), 1);
        assert!(!cart.lines().contains_key("k"));
    }

    #[test]
    fn replace_all_recomputes_counter_and_drops_empty_lines() {
        let mut cart = CartState::new();
        cart.add_line(pid(9), None, dec!(1), None);
        let mut map = BTreeMap::new();
        map.insert(
            "a".to_string(),
            CartLine {
                product_id: pid(1),
                quantity: 4,
                unit_price: dec!(3),
                customizations: Customizations::default(),
            },
        );
        map.insert(
            "ghost".to_string(),
            CartLine {
                product_id: pid(2),
                quantity: 0,
                unit_price: dec!(3),
                customizations: Customizations::default(),
            },
        );
        cart.replace_all(map);
        assert_eq!(cart.total_items(), 4);
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn unknown_customization_keys_round_trip() {
        let json = r#"{"size":"XL","engraving":"hi"}"#;
        let c: Customizations = serde_json::from_str(json).unwrap();
        assert_eq!(c.size.as_deref(), Some("XL"));
        assert_eq!(c.extra.get("engraving").unwrap(), "hi");
        let back = serde_json::to_value(&c).unwrap();
        assert_eq!(back["engraving"], "hi");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8, Option<&'static str>),
        Remove(u8),
        Delete(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..6, prop_oneof![Just(None), Just(Some("red")), Just(Some("blue"))])
                .prop_map(|(p, c)| Op::Add(p, c)),
            (0u8..8).prop_map(Op::Remove),
            (0u8..8).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn counter_always_equals_sum_of_quantities(ops in proptest::collection::vec(op_strategy(), 0..80)) {
            let mut cart = CartState::new();
            for op in ops {
                match op {
                    Op::Add(p, color) => {
                        let c = color.map(|c| Customizations {
                            color: Some(c.to_string()),
                            ..Default::default()
                        });
                        cart.add_line(pid(p as u128), None, dec!(1), c);
                    }
                    Op::Remove(p) => cart.remove_line(&pid(p as u128).to_string()),
                    Op::Delete(p) => cart.delete_line(&pid(p as u128).to_string()),
                }
                let sum: u32 = cart.lines().values().map(|l| l.quantity).sum();
                prop_assert_eq!(cart.total_items(), sum);
            }
        }
    }
}
