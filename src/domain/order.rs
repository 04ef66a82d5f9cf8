use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Asset;
use crate::error::ValidationError;

/// Number of accessory slots offered per category.
pub const MAX_SLOTS_PER_CATEGORY: usize = 5;

/// The base figure a customer configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureKind {
    Individual,
    Pet,
    Couple,
}

impl FigureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FigureKind::Individual => "individual",
            FigureKind::Pet => "pet",
            FigureKind::Couple => "couple",
        }
    }
}

impl Display for FigureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gender or pet selection; each variant belongs to exactly one [`FigureKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Female,
    Male,
    Dog,
    Cat,
    OtherPet,
    FemaleMale,
    FemaleFemale,
    MaleMale,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Female => "female",
            Variant::Male => "male",
            Variant::Dog => "dog",
            Variant::Cat => "cat",
            Variant::OtherPet => "other_pet",
            Variant::FemaleMale => "female_male",
            Variant::FemaleFemale => "female_female",
            Variant::MaleMale => "male_male",
        }
    }

    pub fn fits(self, kind: FigureKind) -> bool {
        use Variant::*;
        matches!(
            (kind, self),
            (FigureKind::Individual, Female | Male)
                | (FigureKind::Pet, Dog | Cat | OtherPet)
                | (FigureKind::Couple, FemaleMale | FemaleFemale | MaleMale)
        )
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessoryCategory {
    Accessories,
    Pets,
    Extras,
}

impl AccessoryCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessoryCategory::Accessories => "accessories",
            AccessoryCategory::Pets => "pets",
            AccessoryCategory::Extras => "extras",
        }
    }
}

impl Display for AccessoryCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of an accessory in the persisted map, e.g. `pets_2`.
pub fn accessory_key(category: AccessoryCategory, slot: usize) -> String {
    format!("{category}_{slot}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }
}

/// One accessory slot as filled in by the customer. Either half may be missing.
#[derive(Debug, Clone)]
pub struct AccessorySlot {
    pub category: AccessoryCategory,
    pub slot: usize,
    pub image: Option<Asset>,
    pub description: String,
}

impl AccessorySlot {
    pub fn new(
        category: AccessoryCategory,
        slot: usize,
        image: Option<Asset>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category,
            slot,
            image,
            description: description.into(),
        }
    }

    pub fn key(&self) -> String {
        accessory_key(self.category, self.slot)
    }

    /// A slot counts only when it has both an image and a non-blank description.
    pub fn is_complete(&self) -> bool {
        self.image.is_some() && !self.description.trim().is_empty()
    }
}

/// A complete accessory slot waiting for its image upload.
#[derive(Debug, Clone)]
pub struct PendingAccessory {
    pub category: AccessoryCategory,
    pub slot: usize,
    pub image: Asset,
    pub description: String,
}

impl PendingAccessory {
    pub fn key(&self) -> String {
        accessory_key(self.category, self.slot)
    }

    pub fn into_entry(self, image_url: String) -> AccessoryEntry {
        AccessoryEntry {
            category: self.category,
            slot: self.slot,
            image_url,
            description: self.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryEntry {
    pub category: AccessoryCategory,
    pub slot: usize,
    pub image_url: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
}

/// Figure order as submitted by the customer, before any checks.
#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    pub kind: Option<FigureKind>,
    pub variant: Option<Variant>,
    pub description: String,
    pub photo: Option<Asset>,
    pub contact: Contact,
    pub accessories: Vec<AccessorySlot>,
}

/// A draft that passed local validation. Only complete accessory slots remain.
#[derive(Debug, Clone)]
pub struct ValidatedOrder {
    pub kind: FigureKind,
    pub variant: Variant,
    pub description: String,
    pub photo: Asset,
    pub contact: Contact,
    pub accessories: Vec<PendingAccessory>,
}

impl OrderDraft {
    /// Checks everything that can be checked without touching the network.
    ///
    /// Incomplete accessory slots are dropped rather than rejected; slots that
    /// are out of range or repeated are rejected even when incomplete.
    pub fn validate(self) -> Result<ValidatedOrder, ValidationError> {
        let kind = self.kind.ok_or(ValidationError::MissingField("figureType"))?;
        let variant = self.variant.ok_or(ValidationError::MissingField("variant"))?;
        if !variant.fits(kind) {
            return Err(ValidationError::VariantMismatch { kind, variant });
        }

        let photo = self.photo.ok_or(ValidationError::MissingField("photo"))?;
        if !photo.is_image() {
            return Err(ValidationError::NotAnImage(photo.file_name));
        }

        let contact = Contact {
            name: self.contact.name.trim().to_string(),
            phone: self.contact.phone.trim().to_string(),
        };
        if contact.name.is_empty() {
            return Err(ValidationError::MissingField("userName"));
        }
        if contact.phone.is_empty() {
            return Err(ValidationError::MissingField("userPhone"));
        }

        let mut seen = HashSet::new();
        let mut accessories = Vec::new();
        for slot in self.accessories {
            if slot.slot >= MAX_SLOTS_PER_CATEGORY {
                return Err(ValidationError::SlotOutOfRange {
                    category: slot.category,
                    slot: slot.slot,
                });
            }
            if !seen.insert(slot.key()) {
                return Err(ValidationError::DuplicateSlot(slot.key()));
            }
            if !slot.is_complete() {
                continue;
            }

            let AccessorySlot {
                category,
                slot,
                image,
                description,
            } = slot;
            let Some(image) = image else { continue };
            if !image.is_image() {
                return Err(ValidationError::NotAnImage(image.file_name));
            }
            accessories.push(PendingAccessory {
                category,
                slot,
                image,
                description: description.trim().to_string(),
            });
        }

        Ok(ValidatedOrder {
            kind,
            variant,
            description: self.description.trim().to_string(),
            photo,
            contact,
            accessories,
        })
    }
}

/// The document persisted for a figure order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "figureType")]
    pub kind: FigureKind,
    pub variant: Variant,
    pub description: String,
    pub photo_url: String,
    pub user_name: String,
    pub user_phone: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub accessories: BTreeMap<String, AccessoryEntry>,
}

impl Order {
    pub fn new(
        kind: FigureKind,
        variant: Variant,
        description: impl Into<String>,
        photo_url: impl Into<String>,
        contact: Contact,
        accessories: BTreeMap<String, AccessoryEntry>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            variant,
            description: description.into(),
            photo_url: photo_url.into(),
            user_name: contact.name,
            user_phone: contact.phone,
            created_at,
            status: OrderStatus::Pending,
            accessories,
        }
    }
}

/// What the customer gets back once an order is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order_id: String,
    pub photo_url: String,
    pub accessories: Vec<String>,
}
