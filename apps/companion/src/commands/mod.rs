//! # Commands Module
//!
//! Every function the mobile shell calls. Each takes only the state it
//! needs and returns `Result<_, ApiError>` (or a plain value when it
//! cannot fail).
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── product.rs  ◄─── Catalog list, add, edit, search
//! └── session.rs  ◄─── Connect, sales, lock, barcode forwarding
//! ```
//!
//! ## State Injection
//! ```rust,ignore
//! // Only needs the catalog
//! product::search_products(&app.catalog, query).await
//!
//! // Catalog plus notices for the success toast
//! product::create_product(&app.catalog, &app.notices, form).await
//!
//! // Session commands
//! session::new_sale(&app.link, &app.notices).await
//! ```

pub mod product;
pub mod session;
