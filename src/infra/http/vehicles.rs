use std::path::Path;

use bytes::Bytes;
use motorhub_api_types::{EditVehicleData, Message, NewVehicleData, Vehicle, VehicleId};
use reqwest::multipart::{Form, Part};

use super::client::ApiClient;
use crate::application::error::ApiError;

const PHOTOS_FIELD: &str = "photos[]";
const DELETED_PHOTOS_FIELD: &str = "deletedPhotos[]";

/// A local image attached to a vehicle form.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl PhotoUpload {
    /// Content type is guessed from the file name.
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            content_type,
            data: data.into(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, ApiError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|err| ApiError::Storage(format!("failed to read {}: {err}", path.display())))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("photo.bin")
            .to_string();
        Ok(Self::new(file_name, data))
    }

    fn into_part(self) -> Result<Part, ApiError> {
        Ok(Part::bytes(self.data.to_vec())
            .file_name(self.file_name)
            .mime_str(&self.content_type)?)
    }
}

fn vehicle_form(fields: &NewVehicleData, photos: Vec<PhotoUpload>) -> Result<Form, ApiError> {
    let mut form = Form::new()
        .text("make", fields.make.clone())
        .text("model", fields.model.clone())
        .text("year", fields.year.to_string())
        .text("description", fields.description.clone());
    for photo in photos {
        form = form.part(PHOTOS_FIELD, photo.into_part()?);
    }
    Ok(form)
}

impl ApiClient {
    pub async fn vehicle(&self, id: VehicleId) -> Result<Vehicle, ApiError> {
        self.get(&format!("vehicles/{id}"), &[]).await
    }

    pub async fn create_vehicle(
        &self,
        data: &NewVehicleData,
        photos: Vec<PhotoUpload>,
    ) -> Result<Vehicle, ApiError> {
        let form = vehicle_form(data, photos)?;
        self.post_multipart("vehicles/register", form).await
    }

    /// Multipart bodies cannot be sent with PUT to the backend, so the edit
    /// goes out as POST with a `_method=PUT` override.
    pub async fn edit_vehicle(
        &self,
        id: VehicleId,
        data: &EditVehicleData,
        photos: Vec<PhotoUpload>,
    ) -> Result<Vehicle, ApiError> {
        let mut form = vehicle_form(&data.fields, photos)?.text("_method", "PUT");
        for photo_id in &data.deleted_photos {
            form = form.text(DELETED_PHOTOS_FIELD, photo_id.to_string());
        }
        self.post_multipart(&format!("vehicles/{id}"), form).await
    }

    pub async fn delete_vehicle(&self, id: VehicleId) -> Result<Message, ApiError> {
        self.delete(&format!("vehicles/{id}")).await
    }
}
