//! Pre-launch gate.
//!
//! Shop pages redirect to `/launch` while launch mode is on. `/preview-shop`
//! (exactly, not its sub-paths) stays reachable with the preview key,
//! regardless of launch mode. The redirect never carries the original query
//! string.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::state::Storefront;

/// Where gated requests are sent.
pub const LAUNCH_PATH: &str = "/launch";

const PREVIEW_PATH: &str = "/preview-shop";

/// `path` without one trailing slash, keeping `/` as is.
fn trim_slash(path: &str) -> &str {
    path.strip_suffix('/').filter(|p| !p.is_empty()).unwrap_or(path)
}

/// Whether `path` is subject to the gate.
#[must_use]
pub fn is_gated(path: &str) -> bool {
    let path = trim_slash(path);
    matches!(path, "/shop" | "/offers" | "/shade-quiz" | "/category" | PREVIEW_PATH)
        || path.starts_with("/category/")
}

fn preview_key(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(name, _)| name == "key")
        .map(|(_, value)| value.into_owned())
}

/// Redirect gated paths to [`LAUNCH_PATH`].
pub async fn launch_gate_middleware(
    State(storefront): State<Storefront>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if !is_gated(path) {
        return next.run(request).await;
    }

    let launch = storefront.launch();
    let allowed = if trim_slash(path) == PREVIEW_PATH {
        preview_key(request.uri().query()).as_deref() == Some(launch.preview_token.as_str())
    } else {
        !launch.enabled
    };

    if allowed {
        next.run(request).await
    } else {
        tracing::debug!(path, "gated path redirected to launch page");
        Redirect::temporary(LAUNCH_PATH).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header::LOCATION},
        middleware::from_fn_with_state,
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::LaunchConfig;
    use crate::state::{IdentityBacking, StorefrontOptions};
    use crate::store::MemoryStore;
    use neemon_core::remote::MemoryRemote;

    fn app(enabled: bool) -> Router {
        let storefront = Storefront::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryRemote::new()),
            IdentityBacking::Local,
            StorefrontOptions {
                launch: LaunchConfig {
                    enabled,
                    ..LaunchConfig::default()
                },
                ..StorefrontOptions::default()
            },
        );
        Router::new()
            .route("/shop", get(|| async { "shop" }))
            .route("/category/{slug}", get(|| async { "category" }))
            .route("/preview-shop", get(|| async { "preview" }))
            .route("/preview-shop/", get(|| async { "preview" }))
            .route("/cart", get(|| async { "cart" }))
            .layer(from_fn_with_state(storefront.clone(), launch_gate_middleware))
            .with_state(storefront)
    }

    async fn get_path(app: Router, uri: &str) -> (StatusCode, Option<String>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let location = response
            .headers()
            .get(LOCATION)
            .map(|v| v.to_str().unwrap().to_owned());
        (response.status(), location)
    }

    #[test]
    fn test_is_gated() {
        assert!(is_gated("/shop"));
        assert!(is_gated("/category/makeup"));
        assert!(is_gated("/preview-shop"));
        assert!(is_gated("/shop/"));
        assert!(!is_gated("/shopping"));
        assert!(!is_gated("/product/velvet-lipstick"));
        assert!(!is_gated("/"));
    }

    #[tokio::test]
    async fn test_gated_paths_redirect_in_launch_mode() {
        let (status, location) = get_path(app(true), "/category/makeup?sort=price").await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location.as_deref(), Some("/launch"));

        let (status, _) = get_path(app(true), "/cart").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_gated_paths_open_after_launch() {
        let (status, _) = get_path(app(false), "/shop").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_preview_requires_key_even_after_launch() {
        let (status, location) = get_path(app(false), "/preview-shop?key=nope").await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location.as_deref(), Some("/launch"));

        let (status, _) = get_path(app(true), "/preview-shop?key=NEEMONPREVIEW").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_preview_path_matches_exactly() {
        assert!(is_gated("/preview-shop/"));
        assert!(!is_gated("/preview-shop/looks"));
        assert!(!is_gated("/preview-shopping"));
        assert!(!is_gated("/"));
    }

    #[tokio::test]
    async fn test_preview_trailing_slash_still_needs_key() {
        let (status, location) = get_path(app(false), "/preview-shop/").await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location.as_deref(), Some("/launch"));
    }
}
