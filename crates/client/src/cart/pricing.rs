//! Cart totals.
//!
//! Catalog prices already include the 19% IVA, so the breakdown works
//! backwards from the gross sum: `net = round(gross / 1.19)`,
//! `iva = gross - net`. The same arithmetic applies to guest and
//! authenticated carts; shipping is added on top of the gross.

use autonorte_core::Pesos;

use crate::cart::CartLine;

/// Priced summary of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    /// Net merchandise value (gross minus IVA).
    pub net: Pesos,
    /// IVA contained in the gross merchandise value.
    pub iva: Pesos,
    /// Selected shipping cost; zero for pickup or before a quote is
    /// chosen.
    pub shipping: Pesos,
    /// `gross + shipping` - what the customer pays.
    pub grand_total: Pesos,
}

impl Totals {
    /// Gross merchandise value (IVA included, shipping excluded).
    #[must_use]
    pub fn gross(&self) -> Pesos {
        self.net + self.iva
    }

    /// Totals of an empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            net: Pesos::ZERO,
            iva: Pesos::ZERO,
            shipping: Pesos::ZERO,
            grand_total: Pesos::ZERO,
        }
    }
}

/// Price a set of cart lines with the given shipping cost.
#[must_use]
pub fn price_lines(lines: &[CartLine], shipping: Pesos) -> Totals {
    let gross: Pesos = lines.iter().map(|line| line.line_subtotal).sum();
    let net = gross.net_of_iva();
    Totals {
        net,
        iva: gross - net,
        shipping,
        grand_total: gross + shipping,
    }
}

#[cfg(test)]
mod tests {
    use autonorte_core::ProductId;

    use super::*;

    fn line(id: i32, unit_price: i64, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            name: format!("producto {id}"),
            unit_price: Pesos::new(unit_price),
            quantity,
            line_subtotal: Pesos::new(unit_price).times(quantity),
        }
    }

    #[test]
    fn test_mixed_cart_totals() {
        // Guest cart {5: 2, 7: 1}, prices 1190 and 2380 (IVA included).
        let lines = vec![line(5, 1190, 2), line(7, 2380, 1)];
        let totals = price_lines(&lines, Pesos::ZERO);

        assert_eq!(totals.gross(), Pesos::new(4760));
        assert_eq!(totals.net, Pesos::new(4000));
        assert_eq!(totals.iva, Pesos::new(760));
        assert_eq!(totals.grand_total, Pesos::new(4760));
    }

    #[test]
    fn test_shipping_added_on_top_of_gross() {
        let lines = vec![line(5, 1190, 2), line(7, 2380, 1)];
        let totals = price_lines(&lines, Pesos::new(3000));

        assert_eq!(totals.grand_total, Pesos::new(7760));
        // Net/IVA breakdown is unaffected by shipping.
        assert_eq!(totals.net, Pesos::new(4000));
        assert_eq!(totals.iva, Pesos::new(760));
    }

    #[test]
    fn test_net_plus_iva_equals_gross_for_many_amounts() {
        for unit in [1_i64, 7, 99, 990, 1190, 12_345, 999_999] {
            let lines = vec![line(1, unit, 3)];
            let totals = price_lines(&lines, Pesos::ZERO);
            assert_eq!(totals.net + totals.iva, totals.gross(), "unit {unit}");
        }
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let totals = price_lines(&[], Pesos::ZERO);
        assert_eq!(totals, Totals::empty());
    }
}
