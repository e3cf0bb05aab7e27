//! Pure ranking policy: pick the best offer for a priority and compute
//! runner-ups. No engine state, no randomness.

use crate::domain::offer::Offer;
use crate::domain::request::Priority;
use crate::errors::DomainError;

fn metric(offer: &Offer, priority: Priority) -> f64 {
    match priority {
        Priority::Speed => f64::from(offer.delivery_days),
        Priority::Carbon => offer.carbon_footprint,
        Priority::Price => offer.price as f64,
    }
}

/// Collapse a full offer history to the most recent offer per seller,
/// preserving the order sellers first appeared in.
pub fn latest_offers(all_offers: &[Offer]) -> Vec<Offer> {
    let mut latest: Vec<Offer> = Vec::new();
    for offer in all_offers {
        match latest.iter_mut().find(|existing| existing.seller_id == offer.seller_id) {
            Some(existing) => *existing = offer.clone(),
            None => latest.push(offer.clone()),
        }
    }
    latest
}

/// The winning offer under the given priority. Ties keep the
/// first-encountered offer.
pub fn best_offer(offers: &[Offer], priority: Priority) -> Result<&Offer, DomainError> {
    offers
        .iter()
        .fold(None::<&Offer>, |best, candidate| match best {
            Some(current) if metric(candidate, priority) < metric(current, priority) => {
                Some(candidate)
            }
            Some(current) => Some(current),
            None => Some(candidate),
        })
        .ok_or(DomainError::EmptyOfferSet)
}

/// Runner-up offers: everything but the winner, ascending by the priority
/// metric, top two. Stable sort keeps insertion order on ties.
pub fn alternatives(offers: &[Offer], winner: &Offer, priority: Priority) -> Vec<Offer> {
    let mut remaining: Vec<Offer> =
        offers.iter().filter(|offer| offer.id != winner.id).cloned().collect();
    remaining.sort_by(|a, b| {
        metric(a, priority).partial_cmp(&metric(b, priority)).unwrap_or(std::cmp::Ordering::Equal)
    });
    remaining.truncate(2);
    remaining
}

#[cfg(test)]
mod tests {
    use crate::domain::offer::{Offer, SellerId};
    use crate::domain::request::Priority;
    use crate::errors::DomainError;

    use super::{alternatives, best_offer, latest_offers};

    fn offer(seller: &str, price: i64, days: u32, carbon: f64) -> Offer {
        Offer::new(SellerId(seller.to_owned()), seller.to_uppercase(), price, carbon, days, vec![])
    }

    #[test]
    fn picks_the_minimum_for_each_priority() {
        let offers = vec![offer("a", 10, 5, 20.0), offer("b", 8, 7, 15.0)];

        assert_eq!(best_offer(&offers, Priority::Price).expect("price").seller_id.0, "b");
        assert_eq!(best_offer(&offers, Priority::Speed).expect("speed").seller_id.0, "a");
        assert_eq!(best_offer(&offers, Priority::Carbon).expect("carbon").seller_id.0, "b");
    }

    #[test]
    fn ties_keep_the_first_encountered_offer() {
        let offers = vec![offer("first", 10, 3, 9.0), offer("second", 10, 3, 9.0)];
        assert_eq!(best_offer(&offers, Priority::Price).expect("tie").seller_id.0, "first");
    }

    #[test]
    fn empty_offer_set_is_a_domain_error() {
        assert_eq!(best_offer(&[], Priority::Price).expect_err("empty"), DomainError::EmptyOfferSet);
    }

    #[test]
    fn latest_offers_keep_one_entry_per_seller_in_first_seen_order() {
        let history = vec![
            offer("a", 100, 5, 12.0),
            offer("b", 95, 1, 18.0),
            offer("a", 92, 5, 12.0),
            offer("b", 88, 1, 18.0),
        ];

        let latest = latest_offers(&history);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].seller_id.0, "a");
        assert_eq!(latest[0].price, 92);
        assert_eq!(latest[1].price, 88);
    }

    #[test]
    fn alternatives_exclude_the_winner_and_cap_at_two() {
        let offers = vec![
            offer("a", 100, 5, 12.0),
            offer("b", 80, 1, 18.0),
            offer("c", 70, 10, 22.0),
            offer("d", 90, 7, 16.0),
        ];
        let winner = best_offer(&offers, Priority::Price).expect("winner").clone();
        assert_eq!(winner.seller_id.0, "c");

        let runner_ups = alternatives(&offers, &winner, Priority::Price);
        assert_eq!(runner_ups.len(), 2);
        assert_eq!(runner_ups[0].seller_id.0, "b");
        assert_eq!(runner_ups[1].seller_id.0, "d");
    }

    #[test]
    fn alternatives_are_empty_for_a_lone_offer() {
        let offers = vec![offer("solo", 50, 2, 8.0)];
        let winner = offers[0].clone();
        assert!(alternatives(&offers, &winner, Priority::Speed).is_empty());
    }
}
