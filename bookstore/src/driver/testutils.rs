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

//! Test utilities for the business layer.

use crate::driver::Driver;
use crate::model::{Book, BookId};
use crate::store::BookStore;
use crate::store::testutils::MemoryBookStore;
use std::sync::Arc;

pub(crate) struct TestContext {
    store: Arc<MemoryBookStore>,
    driver: Driver,
}

impl TestContext {
    pub(crate) fn setup() -> Self {
        let _can_fail = env_logger::builder().is_test(true).try_init();
        let store = Arc::new(MemoryBookStore::default());
        let driver = Driver::new(store.clone());
        Self { store, driver }
    }

    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    pub(crate) async fn put_books(&self, books: &[Book]) {
        self.store.save(books).await.unwrap();
    }

    pub(crate) async fn books(&self) -> Vec<Book> {
        self.store.load().await.unwrap()
    }

    pub(crate) async fn get_book(&self, id: &str) -> Option<Book> {
        let id = BookId::new(id).unwrap();
        self.books().await.into_iter().find(|b| b.id == id)
    }
}
