// Calculs de prix purs (aucun accès BD).
//
//   prix final = coût × (1 + marge/100)
//   profit     = prix final - coût
//
// Toute division par zéro se résout localement (0 ou None), jamais en erreur.
// À l'écriture les montants sont bornés par la précision des colonnes et le
// prix est calculé avec checked_*. À la lecture les calculs saturent.

use rust_decimal::Decimal;

use crate::errors::{AppError, Result};

/// Marge appliquée quand le formulaire n'en fournit pas
pub fn default_margin() -> Decimal {
    Decimal::new(3000, 2)
}

/// Marge maximale acceptée (999.99 %)
pub fn max_margin() -> Decimal {
    Decimal::new(99999, 2)
}

/// Plus grand coût unitaire / quantité accepté: Decimal(10, 2)
pub fn max_unit_value() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Plus grand montant accepté: Decimal(12, 2)
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

fn markup(margin_percent: Decimal) -> Option<Decimal> {
    Decimal::ONE.checked_add(margin_percent.checked_div(Decimal::ONE_HUNDRED)?)
}

pub fn checked_final_price(base_cost: Decimal, margin_percent: Decimal) -> Option<Decimal> {
    base_cost.checked_mul(markup(margin_percent)?)
}

/// Prix final pour une écriture: doit tenir dans une colonne Decimal(12, 2)
pub fn price_for(base_cost: Decimal, margin_percent: Decimal) -> Result<Decimal> {
    checked_final_price(base_cost, margin_percent)
        .filter(|price| *price <= max_amount())
        .ok_or_else(|| AppError::validation("base_cost", "resulting price is too large"))
}

/// Montant × quantité pour une écriture
pub fn line_total(unit_price: Decimal, quantity: Decimal) -> Result<Decimal> {
    unit_price
        .checked_mul(quantity)
        .ok_or_else(|| AppError::validation("quantity", "sale total is too large"))
}

pub fn final_price(base_cost: Decimal, margin_percent: Decimal) -> Decimal {
    checked_final_price(base_cost, margin_percent)
        .unwrap_or_else(|| saturated(base_cost.is_sign_negative()))
}

pub fn profit(base_cost: Decimal, margin_percent: Decimal) -> Decimal {
    final_price(base_cost, margin_percent).saturating_sub(base_cost)
}

fn saturated(negative: bool) -> Decimal {
    if negative { Decimal::MIN } else { Decimal::MAX }
}

/// Marge réalisée d'une vente: profit / coût × 100, 0 si le coût est nul
pub fn realized_margin(profit: Decimal, cost: Decimal) -> Decimal {
    ratio_percent(profit, cost)
}

/// numerator / denominator × 100, 0 si denominator = 0
pub fn ratio_percent(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator
            .checked_div(denominator)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or_else(|| {
                saturated(numerator.is_sign_negative() != denominator.is_sign_negative())
            })
    }
}

/// Variation en % par rapport à `previous`.
/// None quand previous = 0 (variation non définie) ou si le calcul déborde.
/// Le dénominateur est |previous| pour qu'un passage de -100 à -50 reste une hausse.
pub fn percent_change(current: Decimal, previous: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        None
    } else {
        current
            .checked_sub(previous)?
            .checked_div(previous.abs())?
            .checked_mul(Decimal::ONE_HUNDRED)
    }
}

/// Arrondi monétaire pour l'affichage (2 décimales)
pub fn money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded
}
