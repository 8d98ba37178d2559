use crate::error::ModelError;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

type Loader<T> = Box<dyn Fn() -> Result<Arc<T>, ModelError> + Send + Sync>;

/// A model built on first use and shared afterwards.
///
/// Concurrent first callers wait on a single load. A failed load leaves the
/// slot empty, so the next call runs the loader again.
pub struct LazyModel<T: ?Sized> {
    name: &'static str,
    cell: OnceCell<Arc<T>>,
    loader: Loader<T>,
}

impl<T: ?Sized + Send + Sync + 'static> LazyModel<T> {
    pub fn new<F>(name: &'static str, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<T>, ModelError> + Send + Sync + 'static,
    {
        Self {
            name,
            cell: OnceCell::new(),
            loader: Box::new(loader),
        }
    }

    /// A slot that is already loaded.
    pub fn ready(name: &'static str, model: Arc<T>) -> Self {
        Self {
            name,
            cell: OnceCell::new_with(Some(model)),
            loader: Box::new(move || -> Result<Arc<T>, ModelError> {
                Err(ModelError::Configuration(format!("{name} has no loader")))
            }),
        }
    }

    pub async fn get(&self) -> Result<Arc<T>, ModelError> {
        let model = self
            .cell
            .get_or_try_init(|| async {
                let model = (self.loader)()?;
                info!(model = self.name, "model loaded");
                Ok::<_, ModelError>(model)
            })
            .await?;
        Ok(Arc::clone(model))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}
