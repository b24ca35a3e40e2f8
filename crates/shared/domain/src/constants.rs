//! Domain-level constants.
//!
//! These constants define the stored representation of statuses and the
//! built-in category tables used by the matcher.

// =============================================================================
// Booking Status
// =============================================================================

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CONFIRMED: &str = "confirmed";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_DECLINED: &str = "declined";
pub const STATUS_CANCELLED: &str = "cancelled";

/// All valid status values
pub const VALID_STATUSES: &[&str] = &[
    STATUS_PENDING,
    STATUS_CONFIRMED,
    STATUS_COMPLETED,
    STATUS_DECLINED,
    STATUS_CANCELLED,
];

// =============================================================================
// Payment
// =============================================================================

pub const PAYMENT_UNPAID: &str = "unpaid";
pub const PAYMENT_PAID: &str = "paid";
pub const PAYMENT_REFUNDED: &str = "refunded";

// =============================================================================
// Category Tables
// =============================================================================

/// Provider role label -> canonical category.
pub const DEFAULT_ROLE_CATEGORIES: &[(&str, &str)] = &[
    ("electrician", "electrical"),
    ("plumber", "plumbing"),
    ("carpenter", "carpentry"),
    ("painter", "painting"),
    ("cleaner", "cleaning"),
    ("gardener", "gardening"),
    ("ac technician", "ac repair"),
    ("hvac technician", "ac repair"),
    ("appliance technician", "appliance repair"),
    ("pest controller", "pest control"),
    ("mason", "masonry"),
    ("locksmith", "locksmith"),
];

/// Service name -> canonical category (exact match after normalization).
pub const DEFAULT_SERVICE_CATEGORIES: &[(&str, &str)] = &[
    ("electrical", "electrical"),
    ("electrical repair", "electrical"),
    ("wiring", "electrical"),
    ("plumbing", "plumbing"),
    ("pipe repair", "plumbing"),
    ("carpentry", "carpentry"),
    ("furniture repair", "carpentry"),
    ("painting", "painting"),
    ("cleaning", "cleaning"),
    ("deep cleaning", "cleaning"),
    ("gardening", "gardening"),
    ("lawn care", "gardening"),
    ("ac repair", "ac repair"),
    ("ac service", "ac repair"),
    ("appliance repair", "appliance repair"),
    ("pest control", "pest control"),
    ("masonry", "masonry"),
    ("locksmith", "locksmith"),
];

/// Keyword variants tried by substring when no exact or category match exists.
pub const DEFAULT_KEYWORD_CATEGORIES: &[(&str, &str)] = &[
    ("electric", "electrical"),
    ("wiring", "electrical"),
    ("plumb", "plumbing"),
    ("pipe", "plumbing"),
    ("drain", "plumbing"),
    ("carpent", "carpentry"),
    ("wood", "carpentry"),
    ("furniture", "carpentry"),
    ("paint", "painting"),
    ("clean", "cleaning"),
    ("garden", "gardening"),
    ("lawn", "gardening"),
    ("air condition", "ac repair"),
    ("hvac", "ac repair"),
    ("appliance", "appliance repair"),
    ("pest", "pest control"),
    ("termite", "pest control"),
    ("brick", "masonry"),
    ("lock", "locksmith"),
];
