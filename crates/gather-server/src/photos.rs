//! Photo manager: profile photo storage, replacement, and serving.
//!
//! Route handlers never touch the file system directly. They go through
//! [`PhotoManager`], which names uploads, keeps the content directory free of
//! orphans when a user's photo changes, and resolves stored names to URLs.
//! The byte storage itself sits behind [`PhotoStorage`].

use std::{
  future::Future,
  io,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use gather_core::{store::GatherStore, user::User};
use rand_core::{OsRng, RngCore as _};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWriteExt as _};
use tracing::{debug, warn};

/// Path under which stored photos are served, relative to the origin.
pub const PHOTO_ROUTE_PREFIX: &str = "/api/user/photo";

/// How many fresh names to try if a generated name already exists.
const MAX_NAME_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum PhotoError {
  #[error("photo not found")]
  NotFound,

  #[error("could not allocate an unused photo name")]
  NameCollision,

  #[error("photo storage error: {0}")]
  Io(#[from] io::Error),
}

/// An open photo, ready to stream.
pub struct PhotoStream<R> {
  pub reader: R,
  pub len:    u64,
}

// ─── Storage backend ─────────────────────────────────────────────────────────

/// Where photo bytes live. Implemented for the local disk; an object store
/// would slot in here without touching route logic.
pub trait PhotoStorage: Send + Sync + 'static {
  type Reader: AsyncRead + Send + Unpin + 'static;

  /// Write a new object. Must fail with [`io::ErrorKind::AlreadyExists`]
  /// instead of overwriting.
  fn put<'a>(
    &'a self,
    name: &'a str,
    bytes: &'a [u8],
  ) -> impl Future<Output = io::Result<()>> + Send + 'a;

  fn remove<'a>(&'a self, name: &'a str) -> impl Future<Output = io::Result<()>> + Send + 'a;

  /// Open an object for reading. Returns `None` if it does not exist.
  fn open<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = io::Result<Option<PhotoStream<Self::Reader>>>> + Send + 'a;
}

/// Photos stored as files in one flat content directory.
#[derive(Debug, Clone)]
pub struct DiskPhotoStorage {
  dir: PathBuf,
}

impl DiskPhotoStorage {
  /// The directory is created on first write if it does not exist.
  pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

  pub fn dir(&self) -> &Path { &self.dir }
}

impl PhotoStorage for DiskPhotoStorage {
  type Reader = tokio::fs::File;

  async fn put(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
    tokio::fs::create_dir_all(&self.dir).await?;
    let mut file = tokio::fs::OpenOptions::new()
      .write(true)
      .create_new(true)
      .open(self.dir.join(name))
      .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(())
  }

  async fn remove(&self, name: &str) -> io::Result<()> {
    tokio::fs::remove_file(self.dir.join(name)).await
  }

  async fn open(&self, name: &str) -> io::Result<Option<PhotoStream<tokio::fs::File>>> {
    let file = match tokio::fs::File::open(self.dir.join(name)).await {
      Ok(file) => file,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e),
    };
    let meta = file.metadata().await?;
    if !meta.is_file() {
      return Ok(None);
    }
    Ok(Some(PhotoStream { reader: file, len: meta.len() }))
  }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

pub struct PhotoManager<P = DiskPhotoStorage> {
  storage: P,
}

impl<P: PhotoStorage> PhotoManager<P> {
  pub fn new(storage: P) -> Self { Self { storage } }

  pub fn storage(&self) -> &P { &self.storage }

  /// Persist an upload under a fresh stored name and return that name.
  ///
  /// The name is decoupled from `original_name`; only its extension is kept.
  pub async fn store(&self, bytes: &[u8], original_name: &str) -> Result<String, PhotoError> {
    for _ in 0..MAX_NAME_ATTEMPTS {
      let name = stored_name(original_name, Utc::now());
      match self.storage.put(&name, bytes).await {
        Ok(()) => {
          debug!(name, size = bytes.len(), "stored photo");
          return Ok(name);
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
          warn!(name, "generated photo name already exists; retrying");
        }
        Err(e) => return Err(e.into()),
      }
    }
    Err(PhotoError::NameCollision)
  }

  /// Point `user` at `new_name` and remove the photo it replaces.
  ///
  /// The reference is persisted first; the old file is removed afterwards and
  /// a failed removal is logged and left in place. If persisting fails, the
  /// new file is removed instead so it does not become an orphan.
  pub async fn replace<S: GatherStore>(
    &self,
    store: &S,
    user: &User,
    new_name: String,
  ) -> Result<User, gather_core::Error> {
    let updated = match store.set_user_photo(user.user_id, Some(new_name.clone())).await {
      Ok(updated) => updated,
      Err(e) => {
        self.discard(&new_name).await;
        return Err(e.into());
      }
    };

    if let Some(old) = user.photo.as_deref()
      && old != new_name
    {
      self.discard(old).await;
    }

    Ok(updated)
  }

  /// Open a stored photo for streaming. Unknown or unsafe names are a plain
  /// [`PhotoError::NotFound`].
  pub async fn serve(&self, name: &str) -> Result<PhotoStream<P::Reader>, PhotoError> {
    if !is_stored_name(name) {
      return Err(PhotoError::NotFound);
    }
    self.storage.open(name).await?.ok_or(PhotoError::NotFound)
  }

  async fn discard(&self, name: &str) {
    if !is_stored_name(name) {
      warn!(name, "refusing to remove photo with unsafe name");
      return;
    }
    match self.storage.remove(name).await {
      Ok(()) => debug!(name, "removed photo"),
      Err(e) => warn!(name, error = %e, "could not remove stale photo; leaving it in place"),
    }
  }
}

// ─── Naming ──────────────────────────────────────────────────────────────────

/// `<unix-millis>-<9 random digits><.ext>`; the extension is lowercased and
/// dropped if it is not plain alphanumeric.
pub fn stored_name(original_name: &str, now: DateTime<Utc>) -> String {
  let suffix = OsRng.next_u32() % 1_000_000_000;
  format!("{}-{suffix:09}{}", now.timestamp_millis(), extension(original_name))
}

fn extension(original_name: &str) -> String {
  // Browsers on Windows may send a full path; only the last component counts.
  let file_name = original_name.rsplit(['/', '\\']).next().unwrap_or(original_name);
  Path::new(file_name)
    .extension()
    .and_then(|ext| ext.to_str())
    .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
    .unwrap_or_default()
}

/// A name that cannot escape the content directory.
fn is_stored_name(name: &str) -> bool {
  !name.is_empty()
    && !name.starts_with('.')
    && name
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Absolute URL for a stored photo as seen from `origin`
/// (e.g. `http://localhost:8000`).
pub fn resolve_url(stored_name: &str, origin: &str) -> String {
  format!("{}{PHOTO_ROUTE_PREFIX}/{stored_name}", origin.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
  use gather_core::user::{NewUser, Role};
  use gather_store_sqlite::SqliteStore;
  use tokio::io::AsyncReadExt as _;

  use super::*;

  fn manager(dir: &Path) -> PhotoManager {
    PhotoManager::new(DiskPhotoStorage::new(dir.join("uploads")))
  }

  async fn user_with_store() -> (SqliteStore, User) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let user = store
      .create_user(NewUser {
        first_name:    "Ada".into(),
        last_name:     "Lovelace".into(),
        email:         "ada@x.com".into(),
        password_hash: "$argon2id$placeholder".into(),
        role:          Role::Student,
      })
      .await
      .unwrap();
    (store, user)
  }

  #[test]
  fn stored_name_keeps_only_extension() {
    let now = Utc::now();
    let name = stored_name("My Holiday.JPG", now);
    assert!(name.starts_with(&format!("{}-", now.timestamp_millis())));
    assert!(name.ends_with(".jpg"));
    assert!(!name.contains("Holiday"));
    assert!(is_stored_name(&name));
  }

  #[test]
  fn stored_name_handles_odd_originals() {
    let now = Utc::now();
    assert!(!stored_name("README", now).contains('.'));
    assert!(stored_name(r"C:\fakepath\me.png", now).ends_with(".png"));
    assert!(!stored_name("evil.p/hp", now).contains('/'));
    assert!(!stored_name("x.tar.g z", now).contains(' '));
  }

  #[test]
  fn stored_names_differ() {
    let now = Utc::now();
    assert_ne!(stored_name("a.png", now), stored_name("a.png", now));
  }

  #[test]
  fn unsafe_names_are_rejected() {
    for name in ["", ".", "..", "../etc/passwd", "a/b.png", r"a\b.png", ".hidden"] {
      assert!(!is_stored_name(name), "{name:?}");
    }
    assert!(is_stored_name("1700000000000-000000042.png"));
  }

  #[test]
  fn resolve_url_joins_origin_and_prefix() {
    assert_eq!(
      resolve_url("1-2.png", "http://localhost:8000/"),
      "http://localhost:8000/api/user/photo/1-2.png"
    );
  }

  #[tokio::test]
  async fn store_creates_directory_and_writes_bytes() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = manager(tmp.path());

    let name = photos.store(b"\x89PNG fake", "a.png").await.unwrap();
    let url = resolve_url(&name, "http://events.test");
    assert!(url.starts_with("http://events.test"));
    assert!(url.ends_with(".png"));

    let on_disk = std::fs::read(photos.storage().dir().join(&name)).unwrap();
    assert_eq!(on_disk, b"\x89PNG fake");
  }

  #[tokio::test]
  async fn put_never_overwrites() {
    let tmp = tempfile::tempdir().unwrap();
    let storage = DiskPhotoStorage::new(tmp.path());
    storage.put("x.png", b"first").await.unwrap();
    let err = storage.put("x.png", b"second").await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    assert_eq!(std::fs::read(tmp.path().join("x.png")).unwrap(), b"first");
  }

  #[tokio::test]
  async fn serve_streams_existing_photo() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = manager(tmp.path());
    let name = photos.store(b"pixels", "a.gif").await.unwrap();

    let mut stream = photos.serve(&name).await.unwrap();
    assert_eq!(stream.len, 6);
    let mut buf = Vec::new();
    stream.reader.read_to_end(&mut buf).await.unwrap();
    assert_eq!(buf, b"pixels");
  }

  #[tokio::test]
  async fn serve_missing_or_unsafe_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = manager(tmp.path());
    assert!(matches!(photos.serve("nope.png").await, Err(PhotoError::NotFound)));
    assert!(matches!(photos.serve("../secret").await, Err(PhotoError::NotFound)));
  }

  #[tokio::test]
  async fn replace_removes_previous_photo() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = manager(tmp.path());
    let (store, user) = user_with_store().await;

    let first = photos.store(b"one", "a.png").await.unwrap();
    let user = photos.replace(&store, &user, first.clone()).await.unwrap();
    assert_eq!(user.photo.as_deref(), Some(first.as_str()));

    let second = photos.store(b"two", "b.png").await.unwrap();
    let user = photos.replace(&store, &user, second.clone()).await.unwrap();
    assert_eq!(user.photo.as_deref(), Some(second.as_str()));

    let dir = photos.storage().dir();
    assert!(!dir.join(&first).exists());
    assert!(dir.join(&second).exists());

    let stored = store.get_user(user.user_id).await.unwrap().unwrap();
    assert_eq!(stored.photo.as_deref(), Some(second.as_str()));
  }

  #[tokio::test]
  async fn replace_tolerates_missing_old_file() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = manager(tmp.path());
    let (store, user) = user_with_store().await;
    let user = store
      .set_user_photo(user.user_id, Some("1-000000001.png".into()))
      .await
      .unwrap();

    let name = photos.store(b"new", "c.png").await.unwrap();
    let updated = photos.replace(&store, &user, name.clone()).await.unwrap();
    assert_eq!(updated.photo, Some(name));
  }

  #[tokio::test]
  async fn replace_for_unknown_user_discards_upload() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = manager(tmp.path());
    let (store, mut ghost) = user_with_store().await;
    ghost.user_id = uuid::Uuid::new_v4();

    let name = photos.store(b"orphan", "d.png").await.unwrap();
    let err = photos.replace(&store, &ghost, name.clone()).await.unwrap_err();
    assert!(matches!(err, gather_core::Error::UserNotFound(_)));
    assert!(!photos.storage().dir().join(&name).exists());
  }
}
