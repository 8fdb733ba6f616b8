use crate::error::{AppResult, MarketError};
use crate::models::{GeoPoint, ListingPayload, NewListing};

/// Fail-fast validation of a submission: presence, then price/quantity, then
/// coordinates. The first violated rule decides the error.
pub fn validate_listing(payload: ListingPayload) -> AppResult<NewListing> {
    let ListingPayload {
        food_type,
        location,
        price,
        quantity,
        notes,
    } = payload;

    let food_type = food_type.filter(|f| !f.trim().is_empty());
    let point = location.and_then(|loc| Some((loc.lat?, loc.lng?)));
    let (Some(food_type), Some((lat, lng)), Some(price), Some(quantity)) =
        (food_type, point, price, quantity)
    else {
        return Err(MarketError::MissingFields);
    };

    if !price.is_finite() || price < 0.0 {
        return Err(MarketError::InvalidQuantity);
    }
    let quantity = i32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or(MarketError::InvalidQuantity)?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(MarketError::InvalidLocation);
    }

    Ok(NewListing {
        food_type,
        location: GeoPoint { lat, lng },
        price,
        quantity,
        notes: notes.filter(|n| !n.trim().is_empty()),
    })
}
