// MiniSvc
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Persistence of the book catalog.

use crate::model::Book;
use async_trait::async_trait;
use log::debug;
use minisvc_core::db::{DbError, DbResult};
use std::io;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Abstraction over the storage of the whole catalog.
///
/// The catalog is small enough to be loaded and saved as a unit, and callers are responsible for
/// serializing read-modify-write cycles.
#[async_trait]
pub trait BookStore {
    /// Loads all books in the catalog, in storage order.
    async fn load(&self) -> DbResult<Vec<Book>>;

    /// Replaces the catalog contents with `books`.
    async fn save(&self, books: &[Book]) -> DbResult<()>;
}

/// Converts an I/O error on `path` to a database error.
fn io_error_to_db_error(path: &std::path::Path, e: io::Error) -> DbError {
    DbError::BackendError(format!("{}: {}", path.display(), e))
}

/// Catalog stored as a JSON array in a local file.
pub struct FileBookStore {
    /// Path to the JSON file.
    path: PathBuf,
}

impl FileBookStore {
    /// Creates a store backed by the file at `path`, which need not exist yet.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the scratch file used while saving.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl BookStore for FileBookStore {
    async fn load(&self) -> DbResult<Vec<Book>> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Catalog {} does not exist yet; assuming empty", self.path.display());
                return Ok(vec![]);
            }
            Err(e) => return Err(io_error_to_db_error(&self.path, e)),
        };
        serde_json::from_slice(&content).map_err(|e| {
            DbError::DataIntegrityError(format!("Invalid catalog {}: {}", self.path.display(), e))
        })
    }

    async fn save(&self, books: &[Book]) -> DbResult<()> {
        let content = serde_json::to_vec(books)
            .map_err(|e| DbError::BackendError(format!("Cannot serialize catalog: {}", e)))?;

        let tmp_path = self.tmp_path();
        let write_tmp = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(&content).await?;
            file.sync_all().await
        };
        write_tmp.await.map_err(|e| io_error_to_db_error(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| io_error_to_db_error(&self.path, e))?;
        Ok(())
    }
}
