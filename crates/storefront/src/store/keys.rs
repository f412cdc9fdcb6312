//! Local store key names. Each key is serialized independently.

/// Cart lines: `[{"productId": "...", "qty": n}]`.
pub const CART: &str = "cart";
/// Wishlist product ids.
pub const WISHLIST: &str = "wishlist";
/// Locally registered users with credential material.
pub const USERS: &str = "users";
/// Session marker of the signed-in user.
pub const SESSION: &str = "session";
/// Public profile of the signed-in user.
pub const CURRENT_USER: &str = "current_user";
/// Saved delivery addresses of every local user.
pub const ADDRESSES: &str = "addresses";
/// Product reviews written on this profile.
pub const REVIEWS: &str = "reviews";
/// Most recent delivery location selection.
pub const DELIVERY_LOCATION: &str = "delivery_location";
/// Colour theme.
pub const THEME: &str = "theme";
/// Emails waiting for the launch announcement.
pub const NOTIFY_EMAILS: &str = "notify_emails";

/// Every key, for full resynchronization.
pub const ALL: [&str; 10] = [
    CART,
    WISHLIST,
    USERS,
    SESSION,
    CURRENT_USER,
    ADDRESSES,
    REVIEWS,
    DELIVERY_LOCATION,
    THEME,
    NOTIFY_EMAILS,
];
