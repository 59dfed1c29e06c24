//! `/admin/product` endpoints

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use tracing::debug;

use super::{scalar_text, ApiClient, ApiResponse, Endpoint, Payload, Session};
use crate::data::ScenarioRecord;
use crate::error::E2eResult;
use crate::report::AttachmentKind;

/// Form field → scenario column
const TEXT_FIELDS: [(&str, &str); 9] = [
    ("category", "Category"),
    ("title", "Title"),
    ("description", "Description"),
    ("price", "Price"),
    ("texture", "Texture"),
    ("wash", "Wash"),
    ("place", "Place of Product"),
    ("note", "Note"),
    ("story", "Story"),
];

const IMAGE_FIELDS: [(&str, &str); 3] = [
    ("main_image", "Main Image"),
    ("other_images", "Other Image 1"),
    ("other_images", "Other Image 2"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub field: &'static str,
    pub path: PathBuf,
}

impl ImageUpload {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Multipart body of a product creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductForm {
    pub fields: Vec<(&'static str, String)>,
    pub color_ids: Vec<String>,
    pub sizes: Vec<String>,
    pub images: Vec<ImageUpload>,
}

impl ProductForm {
    /// Build from an API product-creation row. `ColorIDs` and `Sizes` are
    /// comma separated and sent as repeated fields, blanks included.
    pub fn from_record(record: &ScenarioRecord) -> E2eResult<Self> {
        let mut fields = Vec::with_capacity(TEXT_FIELDS.len());
        for (field, column) in TEXT_FIELDS {
            fields.push((field, record.get(column)?.to_string()));
        }

        let split = |column: &str| -> E2eResult<Vec<String>> {
            Ok(record.get(column)?.split(',').map(str::to_string).collect())
        };

        let mut images = Vec::new();
        for (field, column) in IMAGE_FIELDS {
            if let Some(path) = record.optional_path(column)? {
                images.push(ImageUpload { field, path });
            }
        }

        Ok(Self {
            fields,
            color_ids: split("ColorIDs")?,
            sizes: split("Sizes")?,
            images,
        })
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn title(&self) -> &str {
        self.field("title").unwrap_or_default()
    }

    /// The submitted form as one JSON mapping
    pub fn payload(&self) -> Value {
        let mut map = Map::new();
        for (field, value) in &self.fields {
            map.insert(field.to_string(), Value::String(value.clone()));
        }
        map.insert("color_ids".to_string(), json!(self.color_ids));
        map.insert("sizes".to_string(), json!(self.sizes));
        Value::Object(map)
    }

    /// Uploaded file names in submission order
    pub fn image_names(&self) -> Vec<String> {
        self.images.iter().map(ImageUpload::file_name).collect()
    }
}

pub struct AdminApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AdminApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// POST `admin/product` as multipart. Image files are read inside the
    /// call and no handle outlives it.
    pub async fn create_product(&self, session: &Session, form: &ProductForm) -> E2eResult<ApiResponse> {
        let attachments = self.client.attachments();
        attachments.json("Payload", &form.payload())?;

        let mut multipart = Form::new();
        for (field, value) in &form.fields {
            multipart = multipart.text(*field, value.clone());
        }
        for id in &form.color_ids {
            multipart = multipart.text("color_ids", id.clone());
        }
        for size in &form.sizes {
            multipart = multipart.text("sizes", size.clone());
        }
        for image in &form.images {
            let bytes = tokio::fs::read(&image.path).await?;
            debug!("Uploading {} as {}", image.path.display(), image.field);
            attachments.attach(&image.file_name(), AttachmentKind::Jpeg, &bytes)?;

            let part = Part::bytes(bytes)
                .file_name(image.file_name())
                .mime_str("image/jpeg")?;
            multipart = multipart.part(image.field, part);
        }

        self.client
            .send(Method::POST, &Endpoint::new("admin/product"), session, Payload::Multipart(multipart))
            .await
    }

    pub async fn delete_product(&self, session: &Session, product_id: &str) -> E2eResult<ApiResponse> {
        self.client
            .send(
                Method::DELETE,
                &Endpoint::new(format!("admin/product/{}", product_id)),
                session,
                Payload::Empty,
            )
            .await
    }
}

/// `data.product_id` of a creation response
pub fn created_product_id(response: &ApiResponse) -> Option<String> {
    response
        .data()
        .and_then(|data| data.get("product_id"))
        .and_then(scalar_text)
}
