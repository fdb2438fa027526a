//! # Repository Module
//!
//! Database repository implementations for the catalog.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  companion CatalogState                                                │
//! │       │                                                                 │
//! │       │  db.products().search("lait")                                  │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── create(&self, form)                                               │
//! │  ├── get_by_id(&self, id) / get_by_barcode(&self, code)                │
//! │  ├── list_all(&self)                                                   │
//! │  ├── update(&self, product)                                            │
//! │  └── search(&self, query)                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and search

pub mod product;
