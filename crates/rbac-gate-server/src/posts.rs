// crates/rbac-gate-server/src/posts.rs
// ============================================================================
// Module: Posts Resource
// Description: In-memory post store, mutation service, and HTTP handlers.
// Purpose: Provide an owned resource type with cache-backed ownership checks.
// Dependencies: rbac-gate-core, axum, serde
// ============================================================================

//! ## Overview
//! Posts are owned by their author. [`PostOwnerSource`] exposes authorship to
//! the ownership checker registered for `posts`, and [`PostService`] spawns a
//! cache invalidation after every update or delete without awaiting it.
//!
//! Handlers assume the authorization middleware already ran: an update or
//! delete that reaches a handler has been permitted by policy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use async_trait::async_trait;
use axum::Extension;
use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use rbac_gate_core::OwnerSource;
use rbac_gate_core::OwnershipCache;
use rbac_gate_core::PrincipalId;
use rbac_gate_core::SourceError;
use rbac_gate_core::spawn_invalidation;
use serde::Deserialize;
use serde::Serialize;

use crate::auth::Principal;
use crate::middleware::error_response;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Resource type served by this module.
pub const POSTS_RESOURCE_TYPE: &str = "posts";
/// Default page size for listings.
const DEFAULT_PAGE_SIZE: usize = 10;
/// Maximum page size for listings.
const MAX_PAGE_SIZE: usize = 100;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Stored post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    /// Post identifier.
    pub id: u64,
    /// Owning principal.
    pub author_id: PrincipalId,
    /// Title.
    pub title: String,
    /// Body text.
    pub body: String,
}

/// In-memory post table.
#[derive(Debug, Default)]
pub struct PostStore {
    /// Posts keyed by identifier, plus the last issued identifier.
    inner: RwLock<(BTreeMap<u64, Post>, u64)>,
}

impl PostStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new post and returns it.
    pub fn create(&self, author_id: PrincipalId, title: String, body: String) -> Post {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let (posts, last_id) = &mut *guard;
        *last_id += 1;
        let post = Post {
            id: *last_id,
            author_id,
            title,
            body,
        };
        posts.insert(post.id, post.clone());
        post
    }

    /// Returns a post by identifier.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<Post> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).0.get(&id).cloned()
    }

    /// Applies an edit and returns the updated post.
    pub fn update(&self, id: u64, edit: PostEdit) -> Option<Post> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let post = guard.0.get_mut(&id)?;
        if let Some(title) = edit.title {
            post.title = title;
        }
        if let Some(body) = edit.body {
            post.body = body;
        }
        Some(post.clone())
    }

    /// Removes a post; returns true when it existed.
    pub fn delete(&self, id: u64) -> bool {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).0.remove(&id).is_some()
    }

    /// Returns one page of posts in identifier order, plus the total count.
    #[must_use]
    pub fn list(&self, page: usize, per_page: usize) -> (Vec<Post>, usize) {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        let posts = guard.0.values().skip(offset).take(per_page).cloned().collect();
        (posts, guard.0.len())
    }
}

// ============================================================================
// SECTION: Ownership
// ============================================================================

/// Authoritative post authorship for the ownership checker.
#[derive(Debug, Clone)]
pub struct PostOwnerSource {
    /// Backing store.
    store: Arc<PostStore>,
}

impl PostOwnerSource {
    /// Wraps a post store.
    #[must_use]
    pub const fn new(store: Arc<PostStore>) -> Self {
        Self {
            store,
        }
    }
}

#[async_trait]
impl OwnerSource for PostOwnerSource {
    async fn load_owner(&self, resource_id: &str) -> Result<Option<PrincipalId>, SourceError> {
        let Some(id) = parse_post_id(resource_id) else {
            return Ok(None);
        };
        Ok(self.store.get(id).map(|post| post.author_id))
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Partial post update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostEdit {
    /// Replacement title.
    #[serde(default)]
    pub title: Option<String>,
    /// Replacement body.
    #[serde(default)]
    pub body: Option<String>,
}

/// Post mutation path with ownership cache invalidation.
#[derive(Debug, Clone)]
pub struct PostService {
    /// Backing store.
    store: Arc<PostStore>,
    /// Shared ownership cache.
    cache: Arc<OwnershipCache>,
}

impl PostService {
    /// Creates a service over a store and the shared ownership cache.
    #[must_use]
    pub const fn new(store: Arc<PostStore>, cache: Arc<OwnershipCache>) -> Self {
        Self {
            store,
            cache,
        }
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<PostStore> {
        &self.store
    }

    /// Creates a post owned by `author_id`.
    pub fn create(&self, author_id: PrincipalId, title: String, body: String) -> Post {
        self.store.create(author_id, title, body)
    }

    /// Updates a post and schedules ownership invalidation.
    pub fn update(&self, id: u64, edit: PostEdit) -> Option<Post> {
        let updated = self.store.update(id, edit);
        if updated.is_some() {
            self.invalidate(id);
        }
        updated
    }

    /// Deletes a post and schedules ownership invalidation.
    pub fn delete(&self, id: u64) -> bool {
        let deleted = self.store.delete(id);
        if deleted {
            self.invalidate(id);
        }
        deleted
    }

    /// Spawns the cache invalidation for `id`; never awaited.
    fn invalidate(&self, id: u64) {
        drop(spawn_invalidation(&self.cache, POSTS_RESOURCE_TYPE, &id.to_string()));
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// New post payload.
#[derive(Debug, Deserialize)]
pub struct NewPost {
    /// Title.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub body: String,
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// One-based page number.
    #[serde(default)]
    pub page: Option<usize>,
    /// Page size.
    #[serde(default)]
    pub per_page: Option<usize>,
}

/// One page of posts.
#[derive(Debug, Serialize)]
pub struct PostPage {
    /// Posts on this page.
    pub posts: Vec<Post>,
    /// One-based page number.
    pub page: usize,
    /// Page size.
    pub per_page: usize,
    /// Total number of posts.
    pub total: usize,
}

/// `GET /posts`
pub async fn list_posts(
    State(service): State<Arc<PostService>>,
    Query(query): Query<ListQuery>,
) -> Json<PostPage> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let (posts, total) = service.store().list(page, per_page);
    Json(PostPage {
        posts,
        page,
        per_page,
        total,
    })
}

/// `POST /posts`
pub async fn create_post(
    State(service): State<Arc<PostService>>,
    principal: Option<Extension<Principal>>,
    Json(payload): Json<NewPost>,
) -> Response {
    let Some(Extension(principal)) = principal else {
        return error_response(StatusCode::UNAUTHORIZED, "missing credential");
    };
    if payload.title.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "title must be non-empty");
    }
    let post = service.create(principal.id, payload.title, payload.body);
    (StatusCode::CREATED, Json(post)).into_response()
}

/// `GET /posts/{id}`
pub async fn get_post(
    State(service): State<Arc<PostService>>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_post_id(&id) else {
        return invalid_id();
    };
    service.store().get(id).map_or_else(not_found, |post| Json(post).into_response())
}

/// `PUT /posts/{id}`
pub async fn update_post(
    State(service): State<Arc<PostService>>,
    Path(id): Path<String>,
    Json(edit): Json<PostEdit>,
) -> Response {
    let Some(id) = parse_post_id(&id) else {
        return invalid_id();
    };
    service.update(id, edit).map_or_else(not_found, |post| Json(post).into_response())
}

/// `DELETE /posts/{id}`
pub async fn delete_post(
    State(service): State<Arc<PostService>>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_post_id(&id) else {
        return invalid_id();
    };
    if service.delete(id) { StatusCode::NO_CONTENT.into_response() } else { not_found() }
}

/// Parses a post identifier path segment.
///
/// Only the canonical decimal form is accepted. `"042"` and `"+42"` are
/// rejected so ownership checks, cache keys, and handlers agree on one id.
fn parse_post_id(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|id| id.to_string() == raw)
}

/// 400 response for a malformed identifier.
fn invalid_id() -> Response {
    error_response(StatusCode::BAD_REQUEST, "invalid post id")
}

/// 404 response for a missing post.
fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "post not found")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
