use actix_web::{HttpMessage, HttpRequest, HttpResponse, delete, get, post, route, web};
use tracing::info;

use crate::application::post_service::{Page, PostService};
use crate::data::post_repository::PostgresPostRepository;
use crate::domain::error::DomainError;
use crate::domain::post::PostPatch;
use crate::presentation::dto::{
    CreatePostRequest, ListQuery, PostListResponse, PostResponse, UpdatePostRequest,
};
use crate::presentation::forms::{validate_post, validate_post_patch};
use crate::presentation::middleware::RequireAuth;
use crate::presentation::utils::AuthenticatedUser;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/blogs")
            .wrap(RequireAuth)
            .service(my_blogs)
            .service(get_posts)
            .service(create_post)
            .service(get_post)
            .service(update_post)
            .service(delete_post),
    );
}

fn page_response(page: Page) -> PostListResponse {
    PostListResponse {
        posts: page.posts.into_iter().map(PostResponse::from).collect(),
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    }
}

#[get("")]
async fn get_posts(
    req: HttpRequest,
    posts: web::Data<PostService<PostgresPostRepository>>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = posts.list(query.limit, query.offset).await?;

    info!(request_id = %request_id(&req), "posts retrieved");

    Ok(HttpResponse::Ok().json(page_response(page)))
}

#[get("/my_blogs")]
async fn my_blogs(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService<PostgresPostRepository>>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = posts
        .my_posts(&user.identity(), query.limit, query.offset)
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        "own posts retrieved"
    );

    Ok(HttpResponse::Ok().json(page_response(page)))
}

#[get("/{id}")]
async fn get_post(
    posts: web::Data<PostService<PostgresPostRepository>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let found = posts.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PostResponse::from(found)))
}

#[post("")]
async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService<PostgresPostRepository>>,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    validate_post(&payload.title, &payload.content).map_err(DomainError::Validation)?;

    let created = posts
        .create(
            &user.identity(),
            payload.title.trim().to_string(),
            payload.content.clone(),
        )
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %created.id,
        "post created"
    );

    Ok(HttpResponse::Created().json(PostResponse::from_parts(created, user.0.clone())))
}

#[route("/{id}", method = "PUT", method = "PATCH")]
async fn update_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService<PostgresPostRepository>>,
    payload: web::Json<UpdatePostRequest>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    validate_post_patch(payload.title.as_deref(), payload.content.as_deref())
        .map_err(DomainError::Validation)?;

    let patch = PostPatch {
        title: payload.title.as_ref().map(|t| t.trim().to_string()),
        content: payload.content.clone(),
    };
    let updated = posts.update(&user.identity(), post_id, patch).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post_id,
        "post updated"
    );

    // ownership held, so the acting user is the author
    Ok(HttpResponse::Ok().json(PostResponse::from_parts(updated, user.0.clone())))
}

#[delete("/{id}")]
async fn delete_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService<PostgresPostRepository>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    posts.delete(&user.identity(), post_id).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post_id,
        "post deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}

fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<crate::presentation::middleware::RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}
