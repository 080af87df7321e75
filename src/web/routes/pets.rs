use askama::Template;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::models::{PetAge, PetGender, PetSize, PetStatus, PetType};
use crate::services::pet_form::{
    advance, FieldErrors, FormAction, ImageUpload, PetForm, StepFlow, CREATE_STEPS, EDIT_STEPS,
    LAST_STEP, MAX_IMAGES,
};
use crate::services::pets_service::{self, PetDetailView};
use crate::services::storage_service::{self, PET_IMAGES_BUCKET};
use crate::state::AppState;
use crate::web::layout::{query_string, select_options, PageContext, SelectOption};
use crate::web::middleware::auth::{AuthenticatedUser, CurrentUser};
use crate::web::{render, safe_return_path, with_notice};

fn status_options(current: &str) -> Vec<SelectOption> {
    select_options(PetStatus::ALL.map(|s| (s.as_str(), s.label())), current)
}

#[derive(Template)]
#[template(path = "pet_detail.html")]
pub struct PetDetailTemplate {
    pub ctx: PageContext,
    pub pet: PetDetailView,
    pub can_manage: bool,
    pub status_options: Vec<SelectOption>,
    pub mailto_url: String,
    pub whatsapp_url: Option<String>,
    pub share_url: String,
    pub tile_url: String,
}

pub async fn detail_page(
    ctx: PageContext,
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(pet_id): Path<String>,
) -> AppResult<Response> {
    let pet = pets_service::load_detail_view(&state.pool, &state.config.baas.url, &pet_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let can_manage = current
        .0
        .as_ref()
        .map(|u| u.id == pet.user_id || u.is_admin)
        .unwrap_or(false);
    // Mail clients read `+` literally, so spaces go as %20.
    let subject_text = format!("Interés en: {}", pet.card.title);
    let subject = query_string(&[("subject", subject_text.as_str())])
        .replace('+', "%20");
    let mailto_url = format!(
        "mailto:{}?{}",
        pet.card.owner_email.as_deref().unwrap_or_default(),
        subject
    );
    let whatsapp_url = pet.owner_phone.as_deref().map(|phone| {
        let digits: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
        format!("https://wa.me/{}", digits)
    });
    let page_url = format!("{}/pets/{}", state.config.public_site_url, pet.card.id);
    let share_url = format!(
        "https://wa.me/?{}",
        query_string(&[("text", format!("{} {}", pet.card.title, page_url).as_str())])
    );

    let template = PetDetailTemplate {
        ctx,
        status_options: status_options(&pet.card.status),
        can_manage,
        mailto_url,
        whatsapp_url,
        share_url,
        tile_url: state.config.tile_url.clone(),
        pet,
    };
    Ok(render(&template)?.into_response())
}

pub struct StepTab {
    pub number: usize,
    pub label: &'static str,
    pub current: bool,
    pub done: bool,
}

#[derive(Template)]
#[template(path = "pet_form.html")]
pub struct PetFormTemplate {
    pub ctx: PageContext,
    pub editing: bool,
    pub action_url: String,
    pub cancel_url: String,
    pub steps: Vec<StepTab>,
    pub step: usize,
    pub last_step: usize,
    pub form: PetForm,
    pub errors: FieldErrors,
    pub general_error: Option<String>,
    pub type_options: Vec<SelectOption>,
    pub size_options: Vec<SelectOption>,
    pub gender_options: Vec<SelectOption>,
    pub age_options: Vec<SelectOption>,
    pub status_options: Vec<SelectOption>,
    pub current_image: Option<String>,
    pub max_images: usize,
    pub tile_url: String,
}

impl PetFormTemplate {
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }
}

struct FormPage {
    editing: bool,
    action_url: String,
    cancel_url: String,
    current_image: Option<String>,
    tile_url: String,
}

fn form_template(
    ctx: PageContext,
    page: FormPage,
    form: PetForm,
    step: usize,
    errors: FieldErrors,
    general_error: Option<String>,
) -> PetFormTemplate {
    let step = step.min(LAST_STEP);
    let labels = if page.editing { EDIT_STEPS } else { CREATE_STEPS };
    let steps = labels
        .iter()
        .enumerate()
        .map(|(i, label)| StepTab {
            number: i + 1,
            label,
            current: i == step,
            done: i < step,
        })
        .collect();

    PetFormTemplate {
        ctx,
        editing: page.editing,
        action_url: page.action_url,
        cancel_url: page.cancel_url,
        steps,
        step,
        last_step: LAST_STEP,
        type_options: select_options(PetType::ALL.map(|t| (t.as_str(), t.label())), &form.pet_type),
        size_options: select_options(PetSize::ALL.map(|s| (s.as_str(), s.label())), &form.pet_size),
        gender_options: select_options(
            PetGender::ALL.map(|g| (g.as_str(), g.label())),
            &form.pet_gender,
        ),
        age_options: select_options(PetAge::ALL.map(|a| (a.as_str(), a.label())), &form.pet_age),
        status_options: status_options(&form.status),
        form,
        errors,
        general_error,
        current_image: page.current_image,
        max_images: if page.editing { 1 } else { MAX_IMAGES },
        tile_url: page.tile_url,
    }
}

struct PetSubmission {
    form: PetForm,
    step: usize,
    action: FormAction,
    images: Vec<ImageUpload>,
}

fn unreadable_form(e: MultipartError) -> AppError {
    warn!("Multipart form could not be read: {}", e);
    AppError::Validation("No se pudo leer el formulario enviado".to_string())
}

/// Text fields override `form`; empty file inputs are skipped.
async fn read_submission(mut multipart: Multipart, mut form: PetForm) -> AppResult<PetSubmission> {
    let mut step = 0;
    let mut action = FormAction::Submit;
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(unreadable_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "images" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(unreadable_form)?;
                if file_name.is_empty() || bytes.is_empty() {
                    continue;
                }
                images.push(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "step" => {
                step = field
                    .text()
                    .await
                    .map_err(unreadable_form)?
                    .trim()
                    .parse()
                    .unwrap_or(0);
            }
            "action" => action = FormAction::parse(&field.text().await.map_err(unreadable_form)?),
            _ => {
                let value = field.text().await.map_err(unreadable_form)?;
                form.set_field(&name, value);
            }
        }
    }

    Ok(PetSubmission {
        form,
        step,
        action,
        images,
    })
}

pub async fn create_page(ctx: PageContext, State(state): State<AppState>) -> AppResult<Response> {
    let template = form_template(
        ctx,
        FormPage {
            editing: false,
            action_url: "/pets/create".to_string(),
            cancel_url: "/my-pets".to_string(),
            current_image: None,
            tile_url: state.config.tile_url.clone(),
        },
        PetForm::for_create(),
        0,
        FieldErrors::new(),
        None,
    );
    Ok(render(&template)?.into_response())
}

pub async fn create_submit(
    ctx: PageContext,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    multipart: Multipart,
) -> AppResult<Response> {
    let submission = read_submission(multipart, PetForm::for_create()).await?;
    let page = || FormPage {
        editing: false,
        action_url: "/pets/create".to_string(),
        cancel_url: "/my-pets".to_string(),
        current_image: None,
        tile_url: state.config.tile_url.clone(),
    };

    match advance(&submission.form, submission.step, submission.action) {
        StepFlow::Show { step, errors } => {
            let template = form_template(ctx, page(), submission.form, step, errors, None);
            Ok(render(&template)?.into_response())
        }
        StepFlow::Save => {
            match pets_service::create_pet(
                &state.pool,
                &state.baas,
                user.actor(),
                &submission.form,
                submission.images,
            )
            .await
            {
                Ok(id) => Ok(Redirect::to(&with_notice(&format!("/pets/{}", id), "created")).into_response()),
                Err(e @ (AppError::Validation(_) | AppError::Baas(_))) => {
                    warn!("Pet creation by {} rejected: {}", user.id, e);
                    let template = form_template(
                        ctx,
                        page(),
                        submission.form,
                        LAST_STEP,
                        FieldErrors::new(),
                        Some(e.public_message()),
                    );
                    Ok(render(&template)?.into_response())
                }
                Err(e) => Err(e),
            }
        }
    }
}

fn edit_page_for(state: &AppState, pet_id: &str, image_path: Option<&str>) -> FormPage {
    FormPage {
        editing: true,
        action_url: format!("/pets/edit/{}", pet_id),
        cancel_url: format!("/pets/{}", pet_id),
        current_image: image_path
            .filter(|p| !p.trim().is_empty())
            .map(|p| storage_service::public_url(&state.config.baas.url, PET_IMAGES_BUCKET, Some(p))),
        tile_url: state.config.tile_url.clone(),
    }
}

pub async fn edit_page(
    ctx: PageContext,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(pet_id): Path<String>,
) -> AppResult<Response> {
    let pet = pets_service::load_managed_pet(&state.pool, user.actor(), &pet_id).await?;
    let template = form_template(
        ctx,
        edit_page_for(&state, &pet.id, pet.image_url.as_deref()),
        PetForm::from_pet(&pet),
        0,
        FieldErrors::new(),
        None,
    );
    Ok(render(&template)?.into_response())
}

pub async fn edit_submit(
    ctx: PageContext,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(pet_id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let pet = pets_service::load_managed_pet(&state.pool, user.actor(), &pet_id).await?;
    let submission = read_submission(multipart, PetForm::from_pet(&pet)).await?;
    let show = |ctx: PageContext,
                form: PetForm,
                step: usize,
                errors: FieldErrors,
                general_error: Option<String>| {
        let template = form_template(
            ctx,
            edit_page_for(&state, &pet.id, pet.image_url.as_deref()),
            form,
            step,
            errors,
            general_error,
        );
        render(&template).map(IntoResponse::into_response)
    };

    match advance(&submission.form, submission.step, submission.action) {
        StepFlow::Show { step, errors } => show(ctx, submission.form, step, errors, None),
        StepFlow::Save => {
            match pets_service::update_pet(
                &state.pool,
                &state.baas,
                user.actor(),
                &pet.id,
                &submission.form,
                submission.images,
            )
            .await
            {
                Ok(()) => Ok(Redirect::to(&with_notice(&format!("/pets/{}", pet.id), "updated")).into_response()),
                Err(e @ (AppError::Validation(_) | AppError::Baas(_))) => {
                    warn!("Pet {} update by {} rejected: {}", pet.id, user.id, e);
                    show(
                        ctx,
                        submission.form,
                        LAST_STEP,
                        FieldErrors::new(),
                        Some(e.public_message()),
                    )
                }
                Err(e) => Err(e),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub return_to: Option<String>,
}

/// Maps a failed mutation to the notice code shown after the redirect.
pub fn failure_notice(e: &AppError) -> &'static str {
    match e {
        AppError::Forbidden => "forbidden",
        AppError::NotFound => "not_found",
        _ => "error",
    }
}

pub async fn delete_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(pet_id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    let target = safe_return_path(form.return_to.as_deref(), "/my-pets");
    let notice = match pets_service::delete_pet(&state.pool, &state.baas, user.actor(), &pet_id).await {
        Ok(()) => "deleted",
        Err(e) => {
            warn!("Pet {} delete by {} failed: {}", pet_id, user.id, e);
            failure_notice(&e)
        }
    };
    Redirect::to(&with_notice(target, notice)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    pub return_to: Option<String>,
}

pub async fn status_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(pet_id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Response {
    let default_target = format!("/pets/{}", pet_id);
    let target = safe_return_path(form.return_to.as_deref(), &default_target);
    let notice = match pets_service::change_status(&state.pool, user.actor(), &pet_id, &form.status).await {
        Ok(()) => "status",
        Err(e) => {
            warn!("Pet {} status change by {} failed: {}", pet_id, user.id, e);
            failure_notice(&e)
        }
    };
    Redirect::to(&with_notice(target, notice)).into_response()
}
