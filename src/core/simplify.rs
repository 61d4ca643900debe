//! Greedy debt simplification over a balance snapshot.
//!
//! Repeatedly matches the largest remaining debtor with the largest remaining
//! creditor and settles the smaller of the two amounts. This produces at most
//! `participants - 1` payments; it is not guaranteed to be the global minimum.

use rust_decimal::Decimal;

use crate::core::models::balance::UserBalance;
use crate::core::models::settlement::{DebtSimplification, SettlementSuggestion};
use crate::core::money::{self, Currency, Money};

struct Position {
    user_id: String,
    remaining: Money,
}

/// Index of the largest remaining amount, ties broken by the lowest user id so
/// results do not depend on snapshot order.
fn largest(positions: &[Position]) -> Option<usize> {
    positions
        .iter()
        .enumerate()
        .filter(|(_, p)| p.remaining > Decimal::ZERO)
        .max_by(|(_, a), (_, b)| {
            a.remaining
                .cmp(&b.remaining)
                .then_with(|| b.user_id.cmp(&a.user_id))
        })
        .map(|(i, _)| i)
}

pub fn simplify(currency: Currency, balances: &[UserBalance]) -> DebtSimplification {
    let mut debtors: Vec<Position> = Vec::new();
    let mut creditors: Vec<Position> = Vec::new();
    for balance in balances.iter().filter(|b| b.currency == currency) {
        if balance.is_debtor() {
            debtors.push(Position {
                user_id: balance.user_id.clone(),
                remaining: balance.balance,
            });
        } else if balance.is_creditor() {
            creditors.push(Position {
                user_id: balance.user_id.clone(),
                remaining: balance.balance.abs(),
            });
        }
    }

    let original_transaction_count = debtors.len() * creditors.len();
    let mut suggestions = Vec::new();

    while let (Some(d), Some(c)) = (largest(&debtors), largest(&creditors)) {
        let amount = money::round(debtors[d].remaining.min(creditors[c].remaining));
        if amount.is_zero() {
            break;
        }
        suggestions.push(SettlementSuggestion {
            from_user_id: debtors[d].user_id.clone(),
            to_user_id: creditors[c].user_id.clone(),
            amount,
            currency,
        });
        debtors[d].remaining -= amount;
        creditors[c].remaining -= amount;
    }

    let simplified_transaction_count = suggestions.len();
    DebtSimplification {
        currency,
        original_transaction_count,
        simplified_transaction_count,
        savings: original_transaction_count.saturating_sub(simplified_transaction_count),
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn balance(user_id: &str, amount: Decimal) -> UserBalance {
        UserBalance {
            group_id: "g".to_string(),
            user_id: user_id.to_string(),
            currency: Currency::Usd,
            balance: amount,
        }
    }

    fn pay(from: &str, to: &str, amount: Decimal) -> SettlementSuggestion {
        SettlementSuggestion {
            from_user_id: from.to_string(),
            to_user_id: to.to_string(),
            amount,
            currency: Currency::Usd,
        }
    }

    #[test]
    fn single_debtor_pays_each_creditor() {
        let result = simplify(
            Currency::Usd,
            &[balance("a", dec!(50.00)), balance("b", dec!(-30.00)), balance("c", dec!(-20.00))],
        );
        assert_eq!(result.suggestions, vec![pay("a", "b", dec!(30.00)), pay("a", "c", dec!(20.00))]);
        assert_eq!(result.original_transaction_count, 2);
        assert_eq!(result.simplified_transaction_count, 2);
        assert_eq!(result.savings, 0);
    }

    #[test]
    fn many_to_many_collapses() {
        let result = simplify(
            Currency::Usd,
            &[
                balance("a", dec!(40.00)),
                balance("b", dec!(20.00)),
                balance("c", dec!(-30.00)),
                balance("d", dec!(-30.00)),
            ],
        );
        assert_eq!(result.original_transaction_count, 4);
        assert_eq!(result.simplified_transaction_count, 3);
        assert_eq!(result.savings, 1);
        assert_eq!(
            result.suggestions,
            vec![pay("a", "c", dec!(30.00)), pay("b", "d", dec!(20.00)), pay("a", "d", dec!(10.00))]
        );
    }

    #[test]
    fn ties_resolve_by_user_id_regardless_of_order() {
        let forward = simplify(
            Currency::Usd,
            &[balance("x", dec!(10.00)), balance("y", dec!(10.00)), balance("z", dec!(-20.00))],
        );
        let reversed = simplify(
            Currency::Usd,
            &[balance("z", dec!(-20.00)), balance("y", dec!(10.00)), balance("x", dec!(10.00))],
        );
        assert_eq!(forward.suggestions, reversed.suggestions);
        assert_eq!(forward.suggestions[0].from_user_id, "x");
    }

    #[test]
    fn settled_group_needs_no_payments() {
        let result = simplify(Currency::Usd, &[balance("a", dec!(0.00)), balance("b", dec!(0.00))]);
        assert!(result.suggestions.is_empty());
        assert_eq!(result.original_transaction_count, 0);
        assert_eq!(result.savings, 0);

        let empty = simplify(Currency::Usd, &[]);
        assert!(empty.suggestions.is_empty());
    }

    #[test]
    fn suggestions_cover_every_debt() {
        let balances = [
            balance("a", dec!(12.34)),
            balance("b", dec!(0.66)),
            balance("c", dec!(-5.00)),
            balance("d", dec!(-8.00)),
        ];
        let result = simplify(Currency::Usd, &balances);
        let paid: Decimal = result.suggestions.iter().map(|s| s.amount).sum();
        assert_eq!(paid, dec!(13.00));
        assert!(result.simplified_transaction_count <= balances.len() - 1);
    }

    #[test]
    fn other_currencies_are_ignored() {
        let mut eur = balance("e", dec!(99.00));
        eur.currency = Currency::Eur;
        let result = simplify(Currency::Usd, &[eur, balance("a", dec!(5.00)), balance("b", dec!(-5.00))]);
        assert_eq!(result.suggestions, vec![pay("a", "b", dec!(5.00))]);
    }
}
