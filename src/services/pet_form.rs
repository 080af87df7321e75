//! The four-step posting form: field rules, step navigation and photo checks.

use std::borrow::Cow;
use std::collections::BTreeMap;

use validator::{Validate, ValidationError};

use crate::models::{PetAge, PetGender, PetRow, PetSize, PetStatus, PetType};

pub const CREATE_STEPS: [&str; 4] = ["Datos básicos", "Características", "Ubicación", "Fotos"];
pub const EDIT_STEPS: [&str; 4] = ["Datos básicos", "Características", "Ubicación", "Estado y fotos"];

const STEP_FIELDS: [&[&str]; 4] = [
    &["title", "description", "pet_type"],
    &["pet_size", "pet_gender", "pet_age", "pet_color"],
    &["address", "latitude", "longitude"],
    &["status"],
];
pub const LAST_STEP: usize = STEP_FIELDS.len() - 1;

pub const MAX_IMAGES: usize = 5;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "gif"];

pub const NO_IMAGES_MESSAGE: &str = "Debes agregar al menos una foto de la mascota";

/// Field name to its first error message.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, Validate)]
pub struct PetForm {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(custom(function = "validate_description"))]
    pub description: String,
    #[validate(custom(function = "validate_pet_type"))]
    pub pet_type: String,
    #[validate(custom(function = "validate_pet_size"))]
    pub pet_size: String,
    #[validate(custom(function = "validate_pet_gender"))]
    pub pet_gender: String,
    #[validate(custom(function = "validate_pet_age"))]
    pub pet_age: String,
    #[validate(length(max = 50, message = "El color no puede tener más de 50 caracteres"))]
    pub pet_color: String,
    #[validate(length(max = 200, message = "La dirección no puede tener más de 200 caracteres"))]
    pub address: String,
    #[validate(custom(function = "validate_latitude"))]
    pub latitude: String,
    #[validate(custom(function = "validate_longitude"))]
    pub longitude: String,
    #[validate(custom(function = "validate_status"))]
    pub status: String,
}

impl PetForm {
    pub fn for_create() -> Self {
        Self {
            status: PetStatus::Activo.as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn from_pet(pet: &PetRow) -> Self {
        let coord = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
        Self {
            title: pet.title.clone(),
            description: pet.description.clone(),
            pet_type: pet.pet_type.clone(),
            pet_size: pet.pet_size.clone().unwrap_or_default(),
            pet_gender: pet.pet_gender.clone().unwrap_or_default(),
            pet_age: pet.pet_age.clone().unwrap_or_default(),
            pet_color: pet.pet_color.clone().unwrap_or_default(),
            address: pet.address.clone().unwrap_or_default(),
            latitude: coord(pet.latitude),
            longitude: coord(pet.longitude),
            status: pet.status.clone(),
        }
    }

    /// Sets a field from a submitted form value; unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        let slot = match name {
            "title" => &mut self.title,
            "description" => &mut self.description,
            "pet_type" => &mut self.pet_type,
            "pet_size" => &mut self.pet_size,
            "pet_gender" => &mut self.pet_gender,
            "pet_age" => &mut self.pet_age,
            "pet_color" => &mut self.pet_color,
            "address" => &mut self.address,
            "latitude" => &mut self.latitude,
            "longitude" => &mut self.longitude,
            "status" => &mut self.status,
            _ => return,
        };
        *slot = value.trim().to_string();
    }

    pub fn field_errors(&self) -> FieldErrors {
        let Err(errors) = self.validate() else {
            return FieldErrors::new();
        };
        errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Valor no válido".to_string());
                (field.to_string(), message)
            })
            .collect()
    }

    pub fn optional(value: &str) -> Option<String> {
        Some(value.trim().to_string()).filter(|v| !v.is_empty())
    }

    pub fn coordinates(&self) -> (Option<f64>, Option<f64>) {
        let parse = |v: &str| v.trim().parse::<f64>().ok();
        match (parse(&self.latitude), parse(&self.longitude)) {
            (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
            _ => (None, None),
        }
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_title(value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len < 5 {
        return Err(invalid("title_short", "El título debe tener al menos 5 caracteres"));
    }
    if len > 100 {
        return Err(invalid("title_long", "El título no puede tener más de 100 caracteres"));
    }
    Ok(())
}

fn validate_description(value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len < 20 {
        return Err(invalid(
            "description_short",
            "La descripción debe tener al menos 20 caracteres",
        ));
    }
    if len > 1000 {
        return Err(invalid(
            "description_long",
            "La descripción no puede tener más de 1000 caracteres",
        ));
    }
    Ok(())
}

fn validate_pet_type(value: &str) -> Result<(), ValidationError> {
    PetType::parse(value)
        .map(|_| ())
        .ok_or_else(|| invalid("pet_type", "Selecciona un tipo de mascota válido"))
}

fn validate_pet_size(value: &str) -> Result<(), ValidationError> {
    PetSize::parse(value)
        .map(|_| ())
        .ok_or_else(|| invalid("pet_size", "Selecciona el tamaño de la mascota"))
}

fn validate_pet_gender(value: &str) -> Result<(), ValidationError> {
    PetGender::parse(value)
        .map(|_| ())
        .ok_or_else(|| invalid("pet_gender", "Selecciona el género de la mascota"))
}

fn validate_pet_age(value: &str) -> Result<(), ValidationError> {
    PetAge::parse(value)
        .map(|_| ())
        .ok_or_else(|| invalid("pet_age", "Selecciona la edad aproximada"))
}

fn validate_status(value: &str) -> Result<(), ValidationError> {
    PetStatus::parse(value)
        .map(|_| ())
        .ok_or_else(|| invalid("status", "Selecciona un estado válido"))
}

fn validate_coordinate(value: &str, limit: f64) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() && n.abs() <= limit => Ok(()),
        _ => Err(invalid("coordinate", "La ubicación seleccionada no es válida")),
    }
}

fn validate_latitude(value: &str) -> Result<(), ValidationError> {
    validate_coordinate(value, 90.0)
}

fn validate_longitude(value: &str) -> Result<(), ValidationError> {
    validate_coordinate(value, 180.0)
}

pub fn step_of_field(field: &str) -> Option<usize> {
    STEP_FIELDS.iter().position(|fields| fields.contains(&field))
}

pub fn errors_for_step(errors: &FieldErrors, step: usize) -> FieldErrors {
    errors
        .iter()
        .filter(|(field, _)| step_of_field(field) == Some(step))
        .map(|(f, m)| (f.clone(), m.clone()))
        .collect()
}

pub fn first_error_step(errors: &FieldErrors) -> Option<usize> {
    errors.keys().filter_map(|f| step_of_field(f)).min()
}

/// Message of the earliest failing field in form order.
pub fn first_error_message(errors: &FieldErrors) -> Option<&str> {
    STEP_FIELDS
        .iter()
        .flat_map(|fields| fields.iter())
        .find_map(|field| errors.get(*field))
        .or_else(|| errors.values().next())
        .map(String::as_str)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Back,
    Next,
    Submit,
}

impl FormAction {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "back" => FormAction::Back,
            "next" => FormAction::Next,
            _ => FormAction::Submit,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum StepFlow {
    /// Render the form at `step` with these errors (empty when just moving).
    Show { step: usize, errors: FieldErrors },
    /// Every field is valid; go ahead with the save.
    Save,
}

/// Back never validates; next validates only the current step; submit
/// validates everything and lands on the step holding the first error.
pub fn advance(form: &PetForm, current_step: usize, action: FormAction) -> StepFlow {
    let current_step = current_step.min(LAST_STEP);
    let errors = form.field_errors();
    match action {
        FormAction::Back => StepFlow::Show {
            step: current_step.saturating_sub(1),
            errors: FieldErrors::new(),
        },
        FormAction::Next => {
            let step_errors = errors_for_step(&errors, current_step);
            if step_errors.is_empty() {
                StepFlow::Show {
                    step: (current_step + 1).min(LAST_STEP),
                    errors: FieldErrors::new(),
                }
            } else {
                StepFlow::Show {
                    step: current_step,
                    errors: step_errors,
                }
            }
        }
        FormAction::Submit => match first_error_step(&errors) {
            Some(step) => StepFlow::Show { step, errors },
            None => StepFlow::Save,
        },
    }
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.trim().to_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageRules {
    pub required: bool,
    pub max_count: usize,
}

impl ImageRules {
    pub const CREATE: ImageRules = ImageRules {
        required: true,
        max_count: MAX_IMAGES,
    };
    /// Editing only replaces the main photo.
    pub const EDIT: ImageRules = ImageRules {
        required: false,
        max_count: 1,
    };
}

pub fn validate_images(images: &[ImageUpload], rules: ImageRules) -> Result<(), String> {
    if images.is_empty() {
        return if rules.required {
            Err(NO_IMAGES_MESSAGE.to_string())
        } else {
            Ok(())
        };
    }
    if images.len() > rules.max_count {
        return Err(format!("Puedes subir como máximo {} imágenes", rules.max_count));
    }
    for image in images {
        let allowed = image
            .extension()
            .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        if !allowed {
            return Err(format!(
                "El archivo {} no es una imagen válida (jpeg, jpg, png o gif)",
                image.file_name
            ));
        }
        if image.bytes.len() > MAX_IMAGE_BYTES {
            return Err(format!(
                "La imagen {} supera el tamaño máximo de 5 MB",
                image.file_name
            ));
        }
    }
    Ok(())
}
