pub mod repository;
pub mod service;

pub use repository::{QueryOptions, Repository, SortOrder, UpdateOptions};
pub use service::{CrudService, Page, PageRequest, Pagination};
