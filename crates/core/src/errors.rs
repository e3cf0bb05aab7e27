use thiserror::Error;

use crate::domain::offer::SellerId;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("no offers available to rank")]
    EmptyOfferSet,
    #[error("seller `{0}` is not part of the negotiation roster")]
    UnknownSeller(SellerId),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[cfg(test)]
mod tests {
    use crate::domain::offer::SellerId;

    use super::DomainError;

    #[test]
    fn unknown_seller_message_names_the_seller() {
        let error = DomainError::UnknownSeller(SellerId("seller_missing".to_owned()));
        assert_eq!(error.to_string(), "seller `seller_missing` is not part of the negotiation roster");
    }

    #[test]
    fn empty_offer_set_has_stable_message() {
        assert_eq!(DomainError::EmptyOfferSet.to_string(), "no offers available to rank");
    }
}
