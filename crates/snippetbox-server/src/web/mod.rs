// ABOUTME: Web UI route handlers serving HTML via Askama templates.
// ABOUTME: Home page, snippet view, and the create form with server-side validation.

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::{Datelike, Utc};
use snippetbox_core::{CreateSnippetForm, Snippet, human_date};

use crate::app_state::SharedState;
use crate::error::AppError;
use crate::session::Session;

use askama::Template;

pub const FLASH_KEY: &str = "flash";

/// Data every page renders through the base layout.
pub struct PageContext {
    pub current_year: i32,
    pub flash: Option<String>,
}

impl PageContext {
    /// Builds the page context. The flash message is only read here; `render`
    /// consumes it once the page carrying it has rendered.
    fn new(session: &Session) -> Self {
        Self {
            current_year: Utc::now().year(),
            flash: session.get(FLASH_KEY),
        }
    }
}

/// Snippet fields prepared for display.
pub struct SnippetView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: String,
    pub expires: String,
}

impl SnippetView {
    fn from_snippet(snippet: &Snippet) -> Self {
        Self {
            id: snippet.id,
            title: snippet.title.clone(),
            content: snippet.content.clone(),
            created: human_date(&snippet.created),
            expires: human_date(&snippet.expires),
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub snippets: Vec<SnippetView>,
}

#[derive(Template)]
#[template(path = "view.html")]
pub struct ViewTemplate {
    pub page: PageContext,
    pub snippet: SnippetView,
}

#[derive(Template)]
#[template(path = "create.html")]
pub struct CreateTemplate {
    pub page: PageContext,
    pub form: CreateSnippetForm,
}

/// Render a template to a string first so a failure becomes a clean 500
/// instead of a truncated page under the intended status.
fn render<T: Template>(
    session: &Session,
    status: StatusCode,
    template: &T,
) -> Result<Response, AppError> {
    respond(session, status, template.render())
}

/// A failed render leaves the flash in the session for the next page.
fn respond(
    session: &Session,
    status: StatusCode,
    rendered: Result<String, askama::Error>,
) -> Result<Response, AppError> {
    let html = rendered?;
    session.pop(FLASH_KEY);
    Ok((status, Html(html)).into_response())
}

/// GET / - The ten newest live snippets.
pub async fn home(
    State(state): State<SharedState>,
    session: Session,
) -> Result<Response, AppError> {
    let snippets = state.snippets.latest().await?;

    render(
        &session,
        StatusCode::OK,
        &HomeTemplate {
            page: PageContext::new(&session),
            snippets: snippets.iter().map(SnippetView::from_snippet).collect(),
        },
    )
}

/// GET /snippet/view/{id} - A single snippet, or 404 if it is missing or expired.
pub async fn snippet_view(
    State(state): State<SharedState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = match id.parse::<i64>() {
        Ok(id) if id >= 1 => id,
        _ => return Err(AppError::NotFound),
    };

    let snippet = state.snippets.get(id).await?;

    render(
        &session,
        StatusCode::OK,
        &ViewTemplate {
            page: PageContext::new(&session),
            snippet: SnippetView::from_snippet(&snippet),
        },
    )
}

/// GET /snippet/create - An empty create form.
pub async fn snippet_create_form(session: Session) -> Result<Response, AppError> {
    render(
        &session,
        StatusCode::OK,
        &CreateTemplate {
            page: PageContext::new(&session),
            form: CreateSnippetForm::new(),
        },
    )
}

/// POST /snippet/create - Validate and store a snippet, then redirect to it.
pub async fn snippet_create_post(
    State(state): State<SharedState>,
    session: Session,
    form: Result<Form<CreateSnippetForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(mut form) = form.map_err(|rejection| {
        tracing::debug!(%rejection, "undecodable create form");
        AppError::Client(StatusCode::BAD_REQUEST)
    })?;

    if !form.validate() {
        return render(
            &session,
            StatusCode::UNPROCESSABLE_ENTITY,
            &CreateTemplate {
                page: PageContext::new(&session),
                form,
            },
        );
    }

    let id = state
        .snippets
        .insert(form.title, form.content, form.expires)
        .await?;

    tracing::info!(id, "snippet created");
    session.put(FLASH_KEY, "Snippet successfully created!");

    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}

/// Fallback for unmatched routes.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
