use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use uuid::Uuid;

use crate::cart::{Cart, CartError, CartLine, CartSnapshot};
use crate::models::Product;

/// Process-wide owner of the register's single cart.
///
/// Handlers share one instance through `AppState`. Every mutation rewrites
/// the snapshot file before returning, so a restarted process resumes the
/// order it was holding, and publishes the new state on a watch channel for
/// any view that wants to re-render on change.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<Inner>,
}

struct Inner {
    cart: Mutex<Cart>,
    path: PathBuf,
    tx: watch::Sender<CartSnapshot>,
}

impl CartStore {
    /// Open the store backed by the snapshot file at `path`. A missing file
    /// starts an empty cart; an unreadable or corrupt one is discarded with
    /// a warning, the same recovery a browser gets from bad local storage.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cart = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Vec<CartLine>>(&bytes) {
                Ok(lines) => Cart::from_lines(lines),
                Err(err) => {
                    tracing::warn!(error = %err, path = %path.display(), "discarding corrupt cart snapshot");
                    Cart::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Cart::new(),
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "cart snapshot unreadable, starting empty");
                Cart::new()
            }
        };
        let (tx, _) = watch::channel(cart.snapshot());
        Self {
            inner: Arc::new(Inner {
                cart: Mutex::new(cart),
                path,
                tx,
            }),
        }
    }

    /// Current state without mutating anything.
    pub fn snapshot(&self) -> CartSnapshot {
        self.lock().snapshot()
    }

    /// Observe cart changes. The receiver always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.tx.subscribe()
    }

    pub fn add_item(&self, product: &Product) -> Result<CartSnapshot, CartError> {
        self.mutate(|cart| {
            cart.add_item(product);
            Ok(())
        })
    }

    pub fn remove_item(&self, product_id: Uuid) -> Result<CartSnapshot, CartError> {
        self.mutate(|cart| {
            cart.remove_item(product_id);
            Ok(())
        })
    }

    pub fn update_quantity(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartSnapshot, CartError> {
        self.mutate(|cart| cart.update_quantity(product_id, quantity))
    }

    pub fn clear(&self) -> Result<CartSnapshot, CartError> {
        self.mutate(|cart| {
            cart.clear();
            Ok(())
        })
    }

    fn mutate(
        &self,
        op: impl FnOnce(&mut Cart) -> Result<(), CartError>,
    ) -> Result<CartSnapshot, CartError> {
        let mut cart = self.lock();
        op(&mut cart)?;
        self.persist(&cart)?;
        let snapshot = cart.snapshot();
        self.inner.tx.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    fn persist(&self, cart: &Cart) -> Result<(), CartError> {
        let bytes = serde_json::to_vec(cart.lines()).map_err(CartError::Encode)?;
        // Write through a temp file so a crash mid-write never leaves a
        // half-written snapshot behind.
        let tmp = self.inner.path.with_extension("tmp");
        fs::write(&tmp, &bytes).map_err(CartError::Snapshot)?;
        fs::rename(&tmp, &self.inner.path).map_err(CartError::Snapshot)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Cart> {
        self.inner
            .cart
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
