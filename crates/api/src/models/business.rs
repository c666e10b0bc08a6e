//! Business domain type.

use serde::Serialize;

use bazaar_core::{BusinessId, Owned, UserId};

/// Well-known default logo asset. Never deleted, even when "replaced".
pub const DEFAULT_LOGO_PATH: &str = "/static/images/default.jpg";

/// A registered business (domain type).
///
/// The owner is set at creation and never changes.
#[derive(Debug, Clone, Serialize)]
pub struct Business {
    /// Unique business ID.
    pub id: BusinessId,
    /// Unique business name.
    pub business_name: String,
    /// City, defaults to "Unspecified".
    pub city: String,
    /// Region, defaults to "Unspecified".
    pub region: String,
    /// Optional free-form description.
    pub business_description: Option<String>,
    /// Stored logo path; defaults to [`DEFAULT_LOGO_PATH`].
    pub logo: String,
    /// Owning user.
    pub owner_id: UserId,
}

impl Owned for Business {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}
