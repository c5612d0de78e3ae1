//! Dense price->quantity order-book views.
//!
//! Both the public book and the maker's own resting orders are reduced to
//! the same shape: a dense mapping `price in 1..=99 -> quantity`, with
//! missing levels filled with zero. This is what the reconciler (see
//! `market_maker::reconciler`) diffs against the desired ladder.

/// A single resting order as reported by `GET .../orders?status=resting`.
#[derive(Debug, Clone)]
pub struct RestingOrder {
    pub order_id: String,
    pub price: u8,
    pub is_yes: bool,
    pub remaining_count: u32,
}

/// A dense price -> quantity map over the full 1..=99 price domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseBook([u32; 99]);

impl DenseBook {
    pub fn empty() -> Self {
        DenseBook([0; 99])
    }

    /// Build from a sparse list of `(price, quantity)` levels, zero-filling
    /// every other price. Prices outside `1..=99` are ignored: the
    /// exchange's wire format never emits them, but a defensive caller
    /// should not propagate attacker-controlled prices into an index.
    pub fn from_levels<I: IntoIterator<Item = (u8, u32)>>(levels: I) -> Self {
        let mut book = Self::empty();
        for (price, qty) in levels {
            if (1..=99).contains(&price) {
                book.0[(price - 1) as usize] += qty;
            }
        }
        book
    }

    /// Quantity resting at `price` (0 if out of range or empty).
    pub fn get(&self, price: u8) -> u32 {
        if (1..=99).contains(&price) {
            self.0[(price - 1) as usize]
        } else {
            0
        }
    }

    /// All prices with nonzero quantity, ascending by price.
    pub fn nonzero_levels(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, &q)| q > 0)
            .map(|(i, &q)| ((i + 1) as u8, q))
    }
}

/// Derive the maker's own yes/no dense books by grouping resting orders by
/// `(price, is_yes)` and summing `remaining_count`.
pub fn own_books_from_orders(orders: &[RestingOrder]) -> (DenseBook, DenseBook) {
    let yes = DenseBook::from_levels(
        orders
            .iter()
            .filter(|o| o.is_yes)
            .map(|o| (o.price, o.remaining_count)),
    );
    let no = DenseBook::from_levels(
        orders
            .iter()
            .filter(|o| !o.is_yes)
            .map(|o| (o.price, o.remaining_count)),
    );
    (yes, no)
}

/// Derive dense yes/no books from the public order book's raw
/// `[[price, quantity], ...]` levels.
pub fn public_books_from_levels(
    yes_levels: &[(u8, u32)],
    no_levels: &[(u8, u32)],
) -> (DenseBook, DenseBook) {
    (
        DenseBook::from_levels(yes_levels.iter().copied()),
        DenseBook::from_levels(no_levels.iter().copied()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_resting_orders_is_empty_book() {
        let (yes, no) = own_books_from_orders(&[]);
        assert_eq!(yes.nonzero_levels().count(), 0);
        assert_eq!(no.nonzero_levels().count(), 0);
    }

    #[test]
    fn groups_by_price_and_side_summing_counts() {
        let orders = vec![
            RestingOrder {
                order_id: "a".into(),
                price: 48,
                is_yes: true,
                remaining_count: 10,
            },
            RestingOrder {
                order_id: "b".into(),
                price: 48,
                is_yes: true,
                remaining_count: 5,
            },
            RestingOrder {
                order_id: "c".into(),
                price: 52,
                is_yes: false,
                remaining_count: 7,
            },
        ];
        let (yes, no) = own_books_from_orders(&orders);
        assert_eq!(yes.get(48), 15);
        assert_eq!(no.get(52), 7);
        assert_eq!(yes.get(52), 0);
    }

    #[test]
    fn round_trip_preserves_nonzero_multiset() {
        let levels = vec![(10u8, 3u32), (20, 7), (99, 1)];
        let book = DenseBook::from_levels(levels.clone());
        let mut round_tripped: Vec<_> = book.nonzero_levels().collect();
        round_tripped.sort();
        let mut expected = levels;
        expected.sort();
        assert_eq!(round_tripped, expected);
    }

    #[test]
    fn out_of_range_prices_are_ignored() {
        let book = DenseBook::from_levels(vec![(0, 5), (100, 5), (50, 3)]);
        assert_eq!(book.nonzero_levels().collect::<Vec<_>>(), vec![(50, 3)]);
    }
}
