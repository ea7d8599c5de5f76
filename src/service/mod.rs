//! CrudService: generic CRUD using the safe SQL builder.

mod crud;
mod preprocess;
pub use crud::{CrudService, DEFAULT_LIMIT, DEFAULT_SKIP};
pub use preprocess::{ensure_required, parse_date, preprocess, DATE_FORMAT};
