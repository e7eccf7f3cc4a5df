//! Intake request types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Caller-supplied identifier of a single garment (usually a product id).
pub type GarmentId = String;

/// Maximum images (subject + garments) accepted on the trial tier.
pub const TRIAL_MAX_TOTAL_IMAGES: usize = 3;

/// The caller's service level. Gates request size at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Trial,
    Premium,
}

impl Tier {
    /// Lowercase wire name (`"trial"` / `"premium"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Trial => "trial",
            Tier::Premium => "premium",
        }
    }

    /// Title-cased label used in notification subjects and bodies.
    pub fn label(self) -> &'static str {
        match self {
            Tier::Trial => "Trial",
            Tier::Premium => "Premium",
        }
    }

    /// Upper bound on subject + garment images, if the tier has one.
    pub fn max_total_images(self) -> Option<usize> {
        match self {
            Tier::Trial => Some(TRIAL_MAX_TOTAL_IMAGES),
            Tier::Premium => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated try-on request handed from intake to the pipeline.
///
/// `garments` keeps the caller's insertion order. That order is the only
/// key available for matching batch outputs back to garments, so it must
/// survive unchanged from deserialization through batch submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryOnRequest {
    /// Owner of the results (the caller's user id).
    pub owner_id: String,
    /// Where the result notification is sent.
    pub notify_address: String,
    /// URL of the subject (person) image.
    pub subject_image_url: String,
    /// Ordered `garment_id -> image URL` mapping.
    pub garments: IndexMap<GarmentId, String>,
    pub tier: Tier,
}

impl TryOnRequest {
    /// Subject plus garments.
    pub fn total_images(&self) -> usize {
        self.garments.len() + 1
    }
}
