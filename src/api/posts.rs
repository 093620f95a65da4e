// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use std::collections::HashMap;

use super::types::{AuthorSummary, PageQuery, PostRequest, PostResponse};
use crate::app_state::AppState;
use crate::error::ApiError;
use crate::iam::{AuthRequest, UserServices, ensure_owner};
use crate::security::validate_post_fields;
use crate::store::{NewPost, Post, PostId, PostUpdate, StoreError, UserId};

const POST_NOT_FOUND: &str = "Post not found";

fn author_summary(
    user_services: &UserServices,
    author_id: UserId,
) -> Result<Option<AuthorSummary>, ApiError> {
    Ok(user_services
        .find_user(author_id)?
        .as_ref()
        .map(AuthorSummary::from))
}

/// Attach author summaries, looking each author up once.
fn with_authors(
    user_services: &UserServices,
    posts: Vec<Post>,
) -> Result<Vec<PostResponse>, ApiError> {
    let mut authors: HashMap<UserId, Option<AuthorSummary>> = HashMap::new();
    let mut responses = Vec::with_capacity(posts.len());
    for post in posts {
        let author = match authors.get(&post.author_id) {
            Some(author) => author.clone(),
            None => {
                let author = author_summary(user_services, post.author_id)?;
                authors.insert(post.author_id, author.clone());
                author
            }
        };
        responses.push(PostResponse::new(post, author));
    }
    Ok(responses)
}

fn subject(req: &HttpRequest) -> Result<UserId, ApiError> {
    req.subject_id().ok_or(ApiError::Authentication)
}

pub async fn create_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    user_services: web::Data<UserServices>,
    payload: web::Json<PostRequest>,
) -> Result<HttpResponse, ApiError> {
    let author_id = subject(&req)?;
    let PostRequest { title, body } = payload.into_inner();
    validate_post_fields(&title, &body).map_err(ApiError::Validation)?;

    let post = state.posts.create_post(NewPost {
        title,
        body,
        author_id,
    })?;
    log::info!("User {} created post {}", author_id, post.id);

    let author = author_summary(&user_services, author_id)?;
    Ok(HttpResponse::Created().json(PostResponse::new(post, author)))
}

pub async fn update_post(
    req: HttpRequest,
    path: web::Path<PostId>,
    state: web::Data<AppState>,
    user_services: web::Data<UserServices>,
    payload: web::Json<PostRequest>,
) -> Result<HttpResponse, ApiError> {
    let subject_id = subject(&req)?;
    let post_id = path.into_inner();

    let existing = state
        .posts
        .get_post(post_id)?
        .ok_or_else(|| ApiError::NotFound(POST_NOT_FOUND.to_string()))?;
    ensure_owner(subject_id, &existing).map_err(|err| {
        log::warn!("Rejected update of post {}: {}", post_id, err);
        ApiError::Authorization
    })?;

    let PostRequest { title, body } = payload.into_inner();
    validate_post_fields(&title, &body).map_err(ApiError::Validation)?;

    let post = match state
        .posts
        .update_post(post_id, subject_id, PostUpdate { title, body })
    {
        Ok(post) => post,
        // Deleted or reassigned since the ownership check.
        Err(StoreError::NotFound(_)) => {
            return Err(ApiError::NotFound(POST_NOT_FOUND.to_string()));
        }
        Err(err) => return Err(err.into()),
    };
    log::info!("User {} updated post {}", subject_id, post.id);

    let author = author_summary(&user_services, post.author_id)?;
    Ok(HttpResponse::Ok().json(PostResponse::new(post, author)))
}

pub async fn get_post(
    path: web::Path<PostId>,
    state: web::Data<AppState>,
    user_services: web::Data<UserServices>,
) -> Result<HttpResponse, ApiError> {
    let post = state
        .posts
        .get_post(path.into_inner())?
        .ok_or_else(|| ApiError::NotFound(POST_NOT_FOUND.to_string()))?;
    let author = author_summary(&user_services, post.author_id)?;
    Ok(HttpResponse::Ok().json(PostResponse::new(post, author)))
}

pub async fn list_posts(
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
    user_services: web::Data<UserServices>,
) -> Result<HttpResponse, ApiError> {
    let posts = state.posts.list_posts(query.limit(), query.offset())?;
    Ok(HttpResponse::Ok().json(with_authors(&user_services, posts)?))
}

pub async fn list_user_posts(
    path: web::Path<UserId>,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
    user_services: web::Data<UserServices>,
) -> Result<HttpResponse, ApiError> {
    let posts =
        state
            .posts
            .list_posts_by_author(path.into_inner(), query.limit(), query.offset())?;
    Ok(HttpResponse::Ok().json(with_authors(&user_services, posts)?))
}
