//! Local persistence for the cart and session stores.
//!
//! The embedder keeps cart lines and the current session in small JSON
//! files between runs, the way a browser build keeps them in local
//! storage. Reads are lenient: a missing file is an empty state, unknown
//! fields are ignored, rows without a product reference are dropped with a
//! warning, and a missing quantity is treated as zero. Writes are
//! whole-file replacements.

use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tamarind_core::types::{AuthSession, CartLine, ImageRef, ProductRef, Role};

/// Errors from reading or writing a store file.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed store file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// Cart file
// =============================================================================

/// Cart line as stored on disk. Everything except the product reference is
/// optional so an old or hand-edited file still loads.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedLine {
    product_ref: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: Decimal,
    #[serde(default)]
    quantity: u32,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

impl From<&CartLine> for PersistedLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_ref: line.product_ref.as_str().to_owned(),
            name: line.name.clone(),
            price: line.price,
            quantity: line.quantity,
            size: line.size.clone(),
            color: line.color.clone(),
            image: line.image.as_ref().map(|i| i.as_str().to_owned()),
        }
    }
}

impl PersistedLine {
    fn into_line(self) -> CartLine {
        CartLine {
            product_ref: ProductRef::new(self.product_ref),
            name: self.name,
            price: self.price,
            quantity: self.quantity,
            size: self.size,
            color: self.color,
            image: self.image.map(ImageRef::new),
        }
    }
}

/// Load cart lines from `path`. A missing file is an empty cart.
///
/// # Errors
///
/// Returns [`PersistError::Io`] if the file exists but cannot be read and
/// [`PersistError::Malformed`] if it is not a JSON array of lines.
pub fn load_cart(path: &Path) -> Result<Vec<CartLine>, PersistError> {
    let Some(raw) = read_if_present(path)? else {
        debug!(path = %path.display(), "no cart file; starting empty");
        return Ok(Vec::new());
    };

    let rows: Vec<serde_json::Value> =
        serde_json::from_str(&raw).map_err(|source| PersistError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<PersistedLine>(row) {
            Ok(line) => lines.push(line.into_line()),
            Err(error) => {
                warn!(path = %path.display(), %error, "dropping unreadable cart row");
            }
        }
    }
    debug!(path = %path.display(), count = lines.len(), "cart file loaded");
    Ok(lines)
}

/// Write `lines` to `path`, replacing whatever was there.
///
/// # Errors
///
/// Returns [`PersistError::Io`] if the parent directory cannot be created
/// or the file cannot be written.
pub fn save_cart(path: &Path, lines: &[CartLine]) -> Result<(), PersistError> {
    let rows: Vec<PersistedLine> = lines.iter().map(PersistedLine::from).collect();
    write_json(path, &rows)
}

// =============================================================================
// Session file
// =============================================================================

/// Session as stored on disk. The token is written in the clear, like a
/// browser keeps it in local storage; the file is for a single-user
/// machine, not a shared secret store.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    token: String,
    user_name: String,
    #[serde(default)]
    profile_image: Option<String>,
    #[serde(default)]
    role: Role,
}

/// Load the saved session from `path`, if any.
///
/// # Errors
///
/// Returns [`PersistError::Io`] if the file exists but cannot be read and
/// [`PersistError::Malformed`] if it does not parse.
pub fn load_session(path: &Path) -> Result<Option<AuthSession>, PersistError> {
    let Some(raw) = read_if_present(path)? else {
        return Ok(None);
    };

    let stored: PersistedSession =
        serde_json::from_str(&raw).map_err(|source| PersistError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    let mut session = AuthSession::new(stored.token, stored.user_name, stored.role);
    if let Some(image) = stored.profile_image {
        session = session.with_profile_image(ImageRef::new(image));
    }
    debug!(path = %path.display(), "session file loaded");
    Ok(Some(session))
}

/// Write `session` to `path`, replacing whatever was there.
///
/// # Errors
///
/// Returns [`PersistError::Io`] if the parent directory cannot be created
/// or the file cannot be written.
pub fn save_session(path: &Path, session: &AuthSession) -> Result<(), PersistError> {
    let stored = PersistedSession {
        token: session.token.expose_secret().to_owned(),
        user_name: session.user_name.clone(),
        profile_image: session.profile_image.as_ref().map(|i| i.as_str().to_owned()),
        role: session.role,
    };
    write_json(path, &stored)
}

/// Remove the session file. Absent is fine.
///
/// # Errors
///
/// Returns [`PersistError::Io`] for anything other than "not found".
pub fn clear_session(path: &Path) -> Result<(), PersistError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PersistError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

fn read_if_present(path: &Path) -> Result<Option<String>, PersistError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PersistError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
    let io_err = |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let json = serde_json::to_string_pretty(value).map_err(|source| PersistError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join("tamarind-tests")
            .join(uuid::Uuid::new_v4().to_string())
            .join(name)
    }

    fn line(product: &str, quantity: u32) -> CartLine {
        CartLine {
            product_ref: ProductRef::new(product),
            name: format!("Product {product}"),
            price: Decimal::new(2500, 2),
            quantity,
            size: Some("M".to_owned()),
            color: None,
            image: None,
        }
    }

    #[test]
    fn cart_round_trips() {
        let path = scratch_file("cart.json");
        let lines = vec![line("p-1", 2), line("p-2", 1)];

        save_cart(&path, &lines).unwrap();
        let loaded = load_cart(&path).unwrap();
        assert_eq!(loaded, lines);

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn missing_cart_file_is_empty() {
        let path = scratch_file("absent.json");
        assert!(load_cart(&path).unwrap().is_empty());
    }

    #[test]
    fn unreadable_rows_are_dropped_not_fatal() {
        let path = scratch_file("cart.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"[
                {"product_ref": "p-1", "name": "Keeper", "price": "10.00", "quantity": 1},
                {"name": "No product ref"},
                {"product_ref": "p-2", "extra_field": true}
            ]"#,
        )
        .unwrap();

        let loaded = load_cart(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].product_ref.as_str(), "p-1");
        // Missing quantity is zero, not an error.
        assert_eq!(loaded[1].quantity, 0);

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn garbage_cart_file_is_reported() {
        let path = scratch_file("cart.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            load_cart(&path),
            Err(PersistError::Malformed { .. })
        ));

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn session_round_trips_with_role_and_image() {
        let path = scratch_file("session.json");
        let session = AuthSession::new("tok-42", "ada", Role::Admin)
            .with_profile_image(ImageRef::new("avatars/ada.png"));

        save_session(&path, &session).unwrap();
        let loaded = load_session(&path).unwrap().unwrap();
        assert_eq!(loaded, session);

        clear_session(&path).unwrap();
        assert!(load_session(&path).unwrap().is_none());
        // Clearing twice is fine.
        clear_session(&path).unwrap();

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn old_session_file_without_role_defaults_to_customer() {
        let path = scratch_file("session.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"token": "tok-1", "user_name": "ada"}"#).unwrap();

        let loaded = load_session(&path).unwrap().unwrap();
        assert_eq!(loaded.role, Role::Customer);
        assert!(loaded.profile_image.is_none());

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
