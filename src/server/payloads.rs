//! JSON bodies accepted and returned by the HTTP routes.
//!
//! Binary files arrive base64 encoded, optionally as a `data:` URL.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{
    check_model, AccessoryCategory, AccessorySlot, Asset, Color, Contact, FigureKind, Material, ModelFile,
    OrderDraft, PrintDraft, Variant,
};
use crate::error::{OrderError, ValidationError};

use super::error::AppError;

pub const CONTACT_FIELDS: [&str; 3] = ["userName", "userPhone", "emailContent"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePayload {
    pub file_name: String,
    #[serde(default)]
    pub content_type: String,
    pub data: String,
}

impl FilePayload {
    fn into_asset(self) -> Result<Asset, AppError> {
        let bytes = decode_base64(&self.data).map_err(|e| invalid(&self.file_name, e))?;
        Ok(Asset::new(self.file_name, self.content_type, bytes))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryPayload {
    pub category: AccessoryCategory,
    pub slot: usize,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<FilePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    #[serde(default)]
    pub figure_type: Option<FigureKind>,
    #[serde(default)]
    pub variant: Option<Variant>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub photo: Option<FilePayload>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_phone: Option<String>,
    #[serde(default)]
    pub accessories: Vec<AccessoryPayload>,
}

impl OrderPayload {
    pub fn into_draft(self) -> Result<OrderDraft, AppError> {
        let accessories = self
            .accessories
            .into_iter()
            .map(|accessory| {
                let image = accessory.image.map(FilePayload::into_asset).transpose()?;
                Ok(AccessorySlot::new(
                    accessory.category,
                    accessory.slot,
                    image,
                    accessory.description.unwrap_or_default(),
                ))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(OrderDraft {
            kind: self.figure_type,
            variant: self.variant,
            description: self.description.unwrap_or_default(),
            photo: self.photo.map(FilePayload::into_asset).transpose()?,
            contact: Contact::new(
                self.user_name.unwrap_or_default(),
                self.user_phone.unwrap_or_default(),
            ),
            accessories,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintPayload {
    #[serde(default)]
    pub file_data: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub material: Option<Material>,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

impl PrintPayload {
    /// Rejects an unsupported or oversized model from the encoded length
    /// alone, before spending any memory on decoding it.
    pub fn into_draft(self, max_model_bytes: u64) -> Result<PrintDraft, AppError> {
        let file = match self.file_data {
            Some(data) if !data.trim().is_empty() => {
                let file_name = self
                    .file_name
                    .filter(|name| !name.trim().is_empty())
                    .ok_or(ValidationError::MissingField("fileName"))
                    .map_err(OrderError::from)?;
                check_model(&file_name, decoded_len(&data), max_model_bytes).map_err(OrderError::from)?;
                let bytes = decode_base64(&data).map_err(|e| invalid(&file_name, e))?;
                Some(ModelFile::new(file_name, bytes))
            }
            _ => None,
        };

        Ok(PrintDraft {
            file,
            material: self.material,
            color: self.color,
            email: self.user_email.unwrap_or_default(),
            name: self.user_name.unwrap_or_default(),
        })
    }
}

/// Fields of a contact request that are absent or falsy, in checking order.
pub fn missing_contact_fields(body: &Map<String, Value>) -> Vec<&'static str> {
    CONTACT_FIELDS
        .into_iter()
        .filter(|field| body.get(*field).map_or(true, is_falsy))
        .collect()
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Renders a contact field as text; non-string values keep their JSON form.
pub fn field_text(body: &Map<String, Value>, field: &str) -> String {
    match body.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Created<T> {
    pub success: bool,
    #[serde(flatten)]
    pub receipt: T,
}

impl<T> Created<T> {
    pub fn new(receipt: T) -> Self {
        Self {
            success: true,
            receipt,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ColorView {
    pub name: Color,
    pub swatch: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MaterialView {
    pub name: Material,
    pub colors: Vec<ColorView>,
}

pub fn materials() -> Vec<MaterialView> {
    Material::ALL
        .into_iter()
        .map(|material| MaterialView {
            name: material,
            colors: material
                .colors()
                .iter()
                .map(|&color| ColorView {
                    name: color,
                    swatch: color.swatch(),
                })
                .collect(),
        })
        .collect()
}

fn strip_data_url(data: &str) -> &str {
    let data = data.trim();
    match data.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
        Some((_, payload)) => payload,
        None => data,
    }
}

fn decode_base64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(strip_data_url(data))
}

/// Byte length the payload will have once decoded.
fn decoded_len(data: &str) -> u64 {
    let payload = strip_data_url(data).trim_end_matches('=');
    (payload.len() as u64).saturating_mul(3) / 4
}

fn invalid(file_name: &str, e: base64::DecodeError) -> AppError {
    OrderError::from(ValidationError::InvalidFileData(format!("{file_name}: {e}"))).into()
}
