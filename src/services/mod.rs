pub mod theme_store;
