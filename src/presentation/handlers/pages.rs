//! Server-rendered surface. Refusals are rendered for a browser: anonymous
//! callers are redirected to the login page, ownership failures get the 403
//! page, and validation failures re-render the form with inline errors.

use actix_web::http::header::{ContentType, LOCATION};
use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::application::post_service::PostService;
use crate::data::post_repository::PostgresPostRepository;
use crate::data::user_repository::PostgresUserRepository;
use crate::domain::error::{DomainError, FieldError};
use crate::domain::identity::Identity;
use crate::domain::post::PostPatch;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::security::{clear_session_cookie, session_cookie};
use crate::presentation::forms::{
    LoginForm, PostForm, SignupForm, validate_login, validate_post, validate_signup,
};
use crate::presentation::templates;

const HOME_PAGE_SIZE: usize = 50;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .service(home_create)
        .service(update_form)
        .service(update_submit)
        .service(delete_confirm)
        .service(delete_submit)
        .service(signup_form)
        .service(signup_submit)
        .service(login_form)
        .service(login_submit)
        .service(logout);
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

fn html(markup: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(markup)
}

fn render_error(identity: &Identity, err: DomainError) -> HttpResponse {
    match err {
        DomainError::PostNotFound(_) => HttpResponse::NotFound()
            .content_type(ContentType::html())
            .body(templates::error_page(identity, 404, "Post not found.")),
        DomainError::Forbidden => HttpResponse::Forbidden()
            .content_type(ContentType::html())
            .body(templates::error_page(
                identity,
                403,
                "You can only modify your own posts.",
            )),
        DomainError::Unauthorized | DomainError::InvalidCredentials => redirect("/login/"),
        _ => HttpResponse::InternalServerError()
            .content_type(ContentType::html())
            .body(templates::error_page(identity, 500, "Something went wrong.")),
    }
}

async fn home_with(
    identity: &Identity,
    posts: &PostService<PostgresPostRepository>,
    form: &PostForm,
    errors: &[FieldError],
) -> HttpResponse {
    match posts.list(Some(HOME_PAGE_SIZE), None).await {
        Ok(page) => html(templates::home_page(identity, &page.posts, form, errors)),
        Err(err) => render_error(identity, err),
    }
}

#[get("/")]
async fn home(
    identity: Identity,
    posts: web::Data<PostService<PostgresPostRepository>>,
) -> HttpResponse {
    home_with(&identity, posts.get_ref(), &PostForm::default(), &[]).await
}

#[post("/")]
async fn home_create(
    identity: Identity,
    posts: web::Data<PostService<PostgresPostRepository>>,
    form: web::Form<PostForm>,
) -> HttpResponse {
    if !identity.is_authenticated() {
        return redirect("/login/");
    }

    let form = form.into_inner();
    if let Err(errors) = validate_post(&form.title, &form.content) {
        return home_with(&identity, posts.get_ref(), &form, &errors).await;
    }

    match posts
        .create(&identity, form.title.trim().to_string(), form.content.clone())
        .await
    {
        Ok(created) => {
            info!(post_id = %created.id, "post created via web");
            redirect("/")
        }
        Err(err) => render_error(&identity, err),
    }
}

#[get("/update/{id}")]
async fn update_form(
    identity: Identity,
    posts: web::Data<PostService<PostgresPostRepository>>,
    path: web::Path<i64>,
) -> HttpResponse {
    if !identity.is_authenticated() {
        return redirect("/login/");
    }

    let post_id = path.into_inner();
    match posts.get_owned(&identity, post_id).await {
        Ok(found) => {
            let form = PostForm {
                title: found.post.title.clone(),
                content: found.post.content.clone(),
            };
            html(templates::update_page(&identity, post_id, &form, &[]))
        }
        Err(err) => render_error(&identity, err),
    }
}

#[post("/update/{id}")]
async fn update_submit(
    identity: Identity,
    posts: web::Data<PostService<PostgresPostRepository>>,
    path: web::Path<i64>,
    form: web::Form<PostForm>,
) -> HttpResponse {
    if !identity.is_authenticated() {
        return redirect("/login/");
    }

    let post_id = path.into_inner();
    // ownership first, so a non-owner never sees the validation round-trip
    if let Err(err) = posts.get_owned(&identity, post_id).await {
        return render_error(&identity, err);
    }

    let form = form.into_inner();
    if let Err(errors) = validate_post(&form.title, &form.content) {
        return html(templates::update_page(&identity, post_id, &form, &errors));
    }

    let patch = PostPatch {
        title: Some(form.title.trim().to_string()),
        content: Some(form.content.clone()),
    };
    match posts.update(&identity, post_id, patch).await {
        Ok(_) => {
            info!(post_id = %post_id, "post updated via web");
            redirect("/")
        }
        Err(err) => render_error(&identity, err),
    }
}

#[get("/delete/{id}")]
async fn delete_confirm(
    identity: Identity,
    posts: web::Data<PostService<PostgresPostRepository>>,
    path: web::Path<i64>,
) -> HttpResponse {
    if !identity.is_authenticated() {
        return redirect("/login/");
    }

    match posts.get_owned(&identity, path.into_inner()).await {
        Ok(found) => html(templates::delete_page(&identity, &found)),
        Err(err) => render_error(&identity, err),
    }
}

#[post("/delete/{id}")]
async fn delete_submit(
    identity: Identity,
    posts: web::Data<PostService<PostgresPostRepository>>,
    path: web::Path<i64>,
) -> HttpResponse {
    if !identity.is_authenticated() {
        return redirect("/login/");
    }

    let post_id = path.into_inner();
    match posts.delete(&identity, post_id).await {
        Ok(()) => {
            info!(post_id = %post_id, "post deleted via web");
            redirect("/")
        }
        Err(err) => render_error(&identity, err),
    }
}

#[get("/signup")]
async fn signup_form(identity: Identity) -> HttpResponse {
    if identity.is_authenticated() {
        return redirect("/");
    }
    html(templates::signup_page(&SignupForm::default(), &[]))
}

#[post("/signup")]
async fn signup_submit(
    identity: Identity,
    service: web::Data<AuthService<PostgresUserRepository>>,
    form: web::Form<SignupForm>,
) -> HttpResponse {
    if identity.is_authenticated() {
        return redirect("/");
    }

    let form = form.into_inner();
    if let Err(errors) = validate_signup(&form) {
        return html(templates::signup_page(&form, &errors));
    }

    match service.register(form.clone().into_account()).await {
        Ok(user) => {
            info!(username = %user.username, "user registered via web");
            redirect("/login/?registered=1")
        }
        Err(DomainError::UsernameTaken(_)) => {
            let errors = vec![FieldError::new("username", "username already taken")];
            html(templates::signup_page(&form, &errors))
        }
        Err(err) => render_error(&identity, err),
    }
}

#[derive(Debug, Deserialize)]
struct LoginPageQuery {
    registered: Option<String>,
}

#[get("/login")]
async fn login_form(query: web::Query<LoginPageQuery>) -> HttpResponse {
    let notice = query
        .registered
        .as_deref()
        .map(|_| "Successfully registered. Please log in.");
    html(templates::login_page(&LoginForm::default(), &[], notice))
}

#[post("/login")]
async fn login_submit(
    service: web::Data<AuthService<PostgresUserRepository>>,
    config: web::Data<AppConfig>,
    form: web::Form<LoginForm>,
) -> HttpResponse {
    let form = form.into_inner();
    if let Err(errors) = validate_login(&form) {
        return html(templates::login_page(&form, &errors, None));
    }

    match service.login(form.username.trim(), &form.password).await {
        Ok((user, token)) => {
            info!(username = %user.username, "user logged in via web");
            HttpResponse::SeeOther()
                .insert_header((LOCATION, "/"))
                .cookie(session_cookie(token, config.cookie_secure))
                .finish()
        }
        Err(DomainError::InvalidCredentials) => {
            let errors = vec![FieldError::new("credentials", "Invalid credentials")];
            html(templates::login_page(&form, &errors, None))
        }
        Err(err) => render_error(&Identity::Anonymous, err),
    }
}

#[get("/logout")]
async fn logout(identity: Identity) -> HttpResponse {
    if let Some(profile) = identity.profile() {
        info!(username = %profile.username, "user logged out via web");
    }
    HttpResponse::SeeOther()
        .insert_header((LOCATION, "/login/"))
        .cookie(clear_session_cookie())
        .finish()
}
