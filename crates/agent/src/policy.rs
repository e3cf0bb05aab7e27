//! The seller-side pricing/logistics simulation. This is negotiation
//! dynamics, not text generation: every round each seller runs this numeric
//! policy locally, no model call involved.
//!
//! Draw order per offer (tests script it): stubbornness roll, price increase
//! (early-round hold-outs only), price jitter magnitude, price jitter sign,
//! urgency roll (urgent buyers only), speed-bias roll (speed priority only),
//! carbon jitter magnitude, carbon jitter sign.

use parley_core::config::ConcessionRates;
use parley_core::{Flexibility, Offer, Priority, SellerProfile, SustainabilityFocus};

use crate::rng::RandomSource;

/// Per-run multiplier set simulating differences between alternative backing
/// providers. Identity by default.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProviderVariant {
    pub price_factor: f64,
    pub carbon_factor: f64,
    pub delivery_shift: i32,
}

impl Default for ProviderVariant {
    fn default() -> Self {
        Self { price_factor: 1.0, carbon_factor: 1.0, delivery_shift: 0 }
    }
}

#[derive(Clone, Debug)]
pub struct OfferPolicy {
    /// Unit price never drops below this fraction of the seller's base price.
    price_floor: f64,
    concession: ConcessionRates,
    variant: ProviderVariant,
}

impl OfferPolicy {
    pub fn new(price_floor: f64, concession: ConcessionRates, variant: ProviderVariant) -> Self {
        Self { price_floor, concession, variant }
    }

    pub fn generate(
        &self,
        profile: &SellerProfile,
        quantity: u32,
        buyer_message: &str,
        round: u32,
        priority: Priority,
        rng: &mut dyn RandomSource,
    ) -> Offer {
        let price = self.price(profile, quantity, round, rng);
        let delivery_days = self.delivery_days(profile, buyer_message, priority, rng);
        let carbon = self.carbon(profile, quantity, priority, rng);

        Offer::new(
            profile.id.clone(),
            profile.name.clone(),
            price,
            carbon,
            delivery_days,
            profile.inventory.certifications.clone(),
        )
    }

    fn price(
        &self,
        profile: &SellerProfile,
        quantity: u32,
        round: u32,
        rng: &mut dyn RandomSource,
    ) -> i64 {
        let base = profile.inventory.base_price;
        let rate = self.concession.rate_for(profile.personality.flexibility);
        let stubbornness = rng.next_f64();

        // An early-round seller occasionally tests the buyer by raising the
        // price instead of conceding.
        let factor = if round <= 2 && stubbornness < 0.15 {
            1.0 + rng.in_range(0.0, 0.05)
        } else {
            let effective_rate = if stubbornness < 0.3 {
                rate * 0.3
            } else if stubbornness < 0.6 {
                rate * 0.7
            } else {
                rate
            };
            1.0 - f64::from(round) * effective_rate
        };

        let floor = base * self.price_floor;
        let mut unit = (base * factor).max(floor);

        let jitter = rng.in_range(0.03, 0.06);
        let sign = if rng.chance(0.5) { -1.0 } else { 1.0 };
        unit = (unit * self.variant.price_factor * (1.0 + sign * jitter)).max(floor);

        (unit * f64::from(quantity)).round().max(1.0) as i64
    }

    fn delivery_days(
        &self,
        profile: &SellerProfile,
        buyer_message: &str,
        priority: Priority,
        rng: &mut dyn RandomSource,
    ) -> u32 {
        let mut days =
            i64::from(profile.inventory.base_delivery_days) + i64::from(self.variant.delivery_shift);

        let message = buyer_message.to_lowercase();
        if message.contains("urgent") || message.contains("fast") {
            // Most sellers shave two days for an urgent buyer; some refuse.
            if rng.chance(0.7) {
                days -= 2;
            }
        }

        if priority == Priority::Speed {
            let shorten_probability = match profile.personality.flexibility {
                Flexibility::VeryHigh => 0.70,
                Flexibility::High => 0.60,
                Flexibility::Medium => 0.45,
                Flexibility::Low => 0.30,
            };
            let roll = rng.next_f64();
            if roll < shorten_probability {
                days -= 1;
            } else if roll > 0.9 {
                days += 1;
            }
        }

        days.max(1) as u32
    }

    fn carbon(
        &self,
        profile: &SellerProfile,
        quantity: u32,
        priority: Priority,
        rng: &mut dyn RandomSource,
    ) -> f64 {
        let mut unit = profile.inventory.base_carbon * self.variant.carbon_factor;

        let jitter = rng.in_range(0.02, 0.06);
        let sign = if rng.chance(0.5) { -1.0 } else { 1.0 };
        unit *= 1.0 + sign * jitter;

        if priority == Priority::Carbon {
            unit *= match profile.personality.sustainability_focus {
                SustainabilityFocus::VeryHigh => 0.85,
                SustainabilityFocus::High => 0.90,
                SustainabilityFocus::Medium => 0.97,
                SustainabilityFocus::Low => 1.0,
            };
        }

        (unit * f64::from(quantity)).max(1.0)
    }
}
