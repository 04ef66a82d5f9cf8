use std::fmt::{Debug, Display, Formatter};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OrderStatus;
use crate::error::ValidationError;

/// Model formats the print shop can slice.
pub const MODEL_EXTENSIONS: [&str; 4] = ["stl", "obj", "3mf", "amf"];

/// 2.4 GiB.
pub const DEFAULT_MAX_MODEL_BYTES: u64 = 2_576_980_377;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    #[serde(rename = "PLA")]
    Pla,
    #[serde(rename = "ABS")]
    Abs,
    #[serde(rename = "PETG")]
    Petg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    White,
    Black,
    Red,
    Blue,
    Green,
    Yellow,
    Natural,
    Transparent,
}

impl Material {
    pub const ALL: [Material; 3] = [Material::Pla, Material::Abs, Material::Petg];

    pub fn as_str(self) -> &'static str {
        match self {
            Material::Pla => "PLA",
            Material::Abs => "ABS",
            Material::Petg => "PETG",
        }
    }

    /// Colors stocked for this material; the first one is the default.
    pub fn colors(self) -> &'static [Color] {
        use Color::*;
        match self {
            Material::Pla => &[White, Black, Red, Blue, Green, Yellow, Natural],
            Material::Abs => &[White, Black, Red, Blue, Natural],
            Material::Petg => &[Transparent, White, Black, Blue],
        }
    }

    pub fn offers(self, color: Color) -> bool {
        self.colors().contains(&color)
    }

    pub fn default_color(self) -> Color {
        self.colors()[0]
    }
}

impl Display for Material {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Natural => "natural",
            Color::Transparent => "transparent",
        }
    }

    /// CSS value used to render the color chip.
    pub fn swatch(self) -> &'static str {
        match self {
            Color::White => "#FFFFFF",
            Color::Black => "#000000",
            Color::Red => "#FF0000",
            Color::Blue => "#0000FF",
            Color::Green => "#00FF00",
            Color::Yellow => "#FFFF00",
            Color::Natural => "#F5E7C1",
            Color::Transparent => "rgba(255,255,255,0.3)",
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq)]
pub struct ModelFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl ModelFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl Debug for ModelFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelFile")
            .field("file_name", &self.file_name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Checks a model's name and size before its content is read or sent anywhere.
pub fn check_model(file_name: &str, size: u64, max_bytes: u64) -> Result<(), ValidationError> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !MODEL_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationError::UnsupportedFormat(file_name.to_string()));
    }
    if size > max_bytes {
        return Err(ValidationError::FileTooLarge {
            size,
            max: max_bytes,
        });
    }
    Ok(())
}

/// 3D-print order as submitted by the customer.
#[derive(Debug, Clone, Default)]
pub struct PrintDraft {
    pub file: Option<ModelFile>,
    pub material: Option<Material>,
    pub color: Option<Color>,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ValidatedPrint {
    pub file: ModelFile,
    pub material: Material,
    pub color: Color,
    pub email: String,
    pub name: Option<String>,
}

impl PrintDraft {
    pub fn validate(self, max_model_bytes: u64) -> Result<ValidatedPrint, ValidationError> {
        let file = self.file.ok_or(ValidationError::MissingField("fileData"))?;
        check_model(&file.file_name, file.size(), max_model_bytes)?;

        let material = self.material.ok_or(ValidationError::MissingField("material"))?;
        let color = self.color.unwrap_or_else(|| material.default_color());
        if !material.offers(color) {
            return Err(ValidationError::ColorUnavailable { material, color });
        }

        let email = self.email.trim().to_string();
        if email.is_empty() {
            return Err(ValidationError::MissingField("userEmail"));
        }
        if !looks_like_email(&email) {
            return Err(ValidationError::InvalidEmail(email));
        }

        let name = Some(self.name.trim().to_string()).filter(|name| !name.is_empty());

        Ok(ValidatedPrint {
            file,
            material,
            color,
            email,
            name,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// The document persisted for a print order; the model itself travels by email.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOrder {
    pub file_name: String,
    pub file_size: u64,
    pub material: Material,
    pub color: Color,
    pub user_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

impl ValidatedPrint {
    pub fn to_order(&self, created_at: DateTime<Utc>) -> PrintOrder {
        PrintOrder {
            file_name: self.file.file_name.clone(),
            file_size: self.file.size(),
            material: self.material,
            color: self.color,
            user_email: self.email.clone(),
            user_name: self.name.clone(),
            created_at,
            status: OrderStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintReceipt {
    pub order_id: String,
    pub file_attached: bool,
    pub message: String,
}

impl PrintReceipt {
    /// A model over the attachment limit never reaches the shop, so the
    /// customer is told to expect a follow-up instead.
    pub fn new(order_id: String, file_attached: bool) -> Self {
        let message = if file_attached {
            "Order received. Your model was sent to the shop.".to_string()
        } else {
            "Order received. Your model is too large to send by email and was not delivered; \
             the shop will contact you to collect it."
                .to_string()
        };
        Self {
            order_id,
            file_attached,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> PrintDraft {
        PrintDraft {
            file: Some(ModelFile::new("Dragon.STL", vec![0u8; 64])),
            material: Some(Material::Petg),
            color: Some(Color::Transparent),
            email: "maker@example.com".to_string(),
            name: String::new(),
        }
    }

    #[test]
    fn accepts_supported_model() {
        let print = draft().validate(1024).unwrap();
        assert_eq!(print.material, Material::Petg);
        assert_eq!(print.color, Color::Transparent);
        assert_eq!(print.name, None);
    }

    #[test]
    fn rejects_oversized_model() {
        let err = draft().validate(63).unwrap_err();
        assert_eq!(err, ValidationError::FileTooLarge { size: 64, max: 63 });
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = PrintDraft {
            file: Some(ModelFile::new("dragon.blend", vec![1])),
            ..draft()
        }
        .validate(1024)
        .unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedFormat("dragon.blend".to_string()));
        assert!(check_model("noextension", 1, 10).is_err());
    }

    #[test]
    fn color_must_be_stocked_for_material() {
        let err = PrintDraft {
            material: Some(Material::Abs),
            color: Some(Color::Transparent),
            ..draft()
        }
        .validate(1024)
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::ColorUnavailable {
                material: Material::Abs,
                color: Color::Transparent
            }
        );
    }

    #[test]
    fn missing_color_defaults_to_first_stocked() {
        let print = PrintDraft {
            material: Some(Material::Petg),
            color: None,
            ..draft()
        }
        .validate(1024)
        .unwrap();
        assert_eq!(print.color, Color::Transparent);
        assert_eq!(Material::Pla.default_color(), Color::White);
    }

    #[test]
    fn requires_plausible_email() {
        let missing = PrintDraft {
            email: "  ".to_string(),
            ..draft()
        }
        .validate(1024)
        .unwrap_err();
        assert_eq!(missing, ValidationError::MissingField("userEmail"));

        for bad in ["maker", "maker@localhost", "@example.com", "ma ker@example.com"] {
            let err = PrintDraft {
                email: bad.to_string(),
                ..draft()
            }
            .validate(1024)
            .unwrap_err();
            assert_eq!(err, ValidationError::InvalidEmail(bad.to_string()));
        }
    }

    #[test]
    fn print_order_serializes_material_upper_case() {
        let order = draft().validate(1024).unwrap().to_order(Utc::now());
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["material"], "PETG");
        assert_eq!(value["color"], "transparent");
        assert_eq!(value["fileSize"], 64);
        assert!(value.get("userName").is_none());
    }
}
