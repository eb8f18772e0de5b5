//! Request identity resolution.
//!
//! Login itself lives outside this service; requests prove who they are with
//! a token issued elsewhere, carried either as `Authorization: Bearer <tok>`
//! or a `session=<tok>` cookie. The router only needs the three-way outcome:
//! anonymous, known non-admin, or admin.

use std::collections::HashMap;

use axum::http::{header, HeaderMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visitor {
    Anonymous,
    Known { name: String, is_admin: bool },
}

impl Visitor {
    pub fn name(&self) -> Option<&str> {
        match self {
            Visitor::Anonymous => None,
            Visitor::Known { name, .. } => Some(name),
        }
    }
}

pub trait Authenticator: Send + Sync {
    fn identify(&self, headers: &HeaderMap) -> Visitor;
}

/// Resolves tokens against the two maps from configuration. A token present
/// in both maps counts as admin.
pub struct TokenAuthenticator {
    admin_tokens: HashMap<String, String>,
    viewer_tokens: HashMap<String, String>,
}

impl TokenAuthenticator {
    pub fn new(
        admin_tokens: HashMap<String, String>,
        viewer_tokens: HashMap<String, String>,
    ) -> Self {
        Self {
            admin_tokens,
            viewer_tokens,
        }
    }
}

impl Authenticator for TokenAuthenticator {
    fn identify(&self, headers: &HeaderMap) -> Visitor {
        let Some(token) = extract_token(headers) else {
            return Visitor::Anonymous;
        };
        if let Some(name) = self.admin_tokens.get(&token) {
            return Visitor::Known {
                name: name.clone(),
                is_admin: true,
            };
        }
        if let Some(name) = self.viewer_tokens.get(&token) {
            return Visitor::Known {
                name: name.clone(),
                is_admin: false,
            };
        }
        Visitor::Anonymous
    }
}

/// Bearer header wins over the session cookie when both are present.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim().to_owned());
            }
        }
    }

    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else { continue };
        for pair in value.split(';') {
            if let Some(token) = pair.trim().strip_prefix("session=") {
                return Some(token.to_owned());
            }
        }
    }

    None
}
