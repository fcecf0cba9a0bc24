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

//! Operations on the book catalog.

use crate::driver::Driver;
use crate::model::{Book, BookId};
use log::info;
use minisvc_core::driver::{DriverError, DriverResult};
use std::collections::HashSet;

/// Error message returned when a book cannot be found.
const NOT_FOUND: &str = "Book not found";

impl Driver {
    /// Returns all books in the catalog.
    pub(crate) async fn get_books(self) -> DriverResult<Vec<Book>> {
        let _guard = self.lock.lock().await;
        Ok(self.store.load().await?)
    }

    /// Returns the book identified by `id`.
    pub(crate) async fn get_book(self, id: &BookId) -> DriverResult<Book> {
        let _guard = self.lock.lock().await;
        let books = self.store.load().await?;
        books
            .into_iter()
            .find(|b| b.id == *id)
            .ok_or_else(|| DriverError::NotFound(NOT_FOUND.to_owned()))
    }

    /// Appends `new_books` to the catalog.
    ///
    /// Fails without modifying the catalog if any of the ids already exists or if the same id
    /// appears more than once in `new_books`.
    pub(crate) async fn add_books(self, new_books: Vec<Book>) -> DriverResult<()> {
        let _guard = self.lock.lock().await;
        let mut books = self.store.load().await?;

        let mut ids: HashSet<&BookId> = books.iter().map(|b| &b.id).collect();
        for book in &new_books {
            if !ids.insert(&book.id) {
                return Err(DriverError::AlreadyExists(format!(
                    "Book {} already exists",
                    book.id
                )));
            }
        }

        info!("Adding {} books to the catalog", new_books.len());
        books.extend(new_books);
        self.store.save(&books).await?;
        Ok(())
    }

    /// Replaces the book that has the same id as `book`.
    pub(crate) async fn update_book(self, book: Book) -> DriverResult<()> {
        let _guard = self.lock.lock().await;
        let mut books = self.store.load().await?;

        match books.iter_mut().find(|b| b.id == book.id) {
            Some(existing) => *existing = book,
            None => return Err(DriverError::NotFound(NOT_FOUND.to_owned())),
        }

        self.store.save(&books).await?;
        Ok(())
    }

    /// Removes the book identified by `id`.
    pub(crate) async fn delete_book(self, id: &BookId) -> DriverResult<()> {
        let _guard = self.lock.lock().await;
        let mut books = self.store.load().await?;

        let Some(pos) = books.iter().position(|b| b.id == *id) else {
            return Err(DriverError::NotFound(NOT_FOUND.to_owned()));
        };
        books.remove(pos);

        info!("Deleting book {} from the catalog", id);
        self.store.save(&books).await?;
        Ok(())
    }
}
