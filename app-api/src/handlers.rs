//! Business-domain request handlers

pub mod baskets;
pub mod deposit_points;
pub mod orders;
pub mod wishes;
